//! Stock ledger service
//!
//! The append-only log of quantity movements. Appending is a pure insert
//! with no business logic; it always happens inside the transaction of the
//! business event that caused the movement.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::{StockChangeType, StockLogEntry};

/// Stock ledger service
#[derive(Clone)]
pub struct StockLogService {
    db: PgPool,
}

type StockLogRow = (
    Uuid,
    Uuid,
    Uuid,
    Option<Uuid>,
    String,
    i32,
    String,
    DateTime<Utc>,
);

fn entry_from_row(row: StockLogRow) -> AppResult<StockLogEntry> {
    let change_type = StockChangeType::from_str(&row.4).ok_or_else(|| {
        AppError::LedgerInconsistency(format!("Unknown stock change type '{}' in ledger", row.4))
    })?;
    Ok(StockLogEntry {
        id: row.0,
        shop_id: row.1,
        product_id: row.2,
        batch_id: row.3,
        change_type,
        quantity: row.5,
        reason: row.6,
        created_at: row.7,
    })
}

impl StockLogService {
    /// Create a new StockLogService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Append one movement to the ledger.
    ///
    /// `quantity_delta` is the signed delta applied to the inventory
    /// aggregate; callers are responsible for the sign convention
    /// (`StockChangeType::signed_delta`).
    pub async fn append(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shop_id: Uuid,
        product_id: Uuid,
        change_type: StockChangeType,
        quantity_delta: i32,
        reason: &str,
        batch_id: Option<Uuid>,
    ) -> AppResult<StockLogEntry> {
        let row = sqlx::query_as::<_, StockLogRow>(
            r#"
            INSERT INTO stock_logs (shop_id, product_id, batch_id, change_type, quantity, reason)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, shop_id, product_id, batch_id, change_type, quantity, reason, created_at
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .bind(batch_id)
        .bind(change_type.as_str())
        .bind(quantity_delta)
        .bind(reason)
        .fetch_one(&mut **tx)
        .await?;

        entry_from_row(row)
    }

    /// Movement history for a (shop, product), newest first.
    pub async fn movements(
        &self,
        shop_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Vec<StockLogEntry>> {
        let rows = sqlx::query_as::<_, StockLogRow>(
            r#"
            SELECT id, shop_id, product_id, batch_id, change_type, quantity, reason, created_at
            FROM stock_logs
            WHERE shop_id = $1 AND product_id = $2
            ORDER BY created_at DESC
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }

    /// Movement history for a single batch, newest first.
    pub async fn batch_history(&self, batch_id: Uuid) -> AppResult<Vec<StockLogEntry>> {
        let rows = sqlx::query_as::<_, StockLogRow>(
            r#"
            SELECT id, shop_id, product_id, batch_id, change_type, quantity, reason, created_at
            FROM stock_logs
            WHERE batch_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(batch_id)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(entry_from_row).collect()
    }
}

//! Inventory aggregate service
//!
//! Owns the per-(shop, product) quantity counter that mirrors the sum of
//! batch remainders. Every adjustment locks the row first, so concurrent
//! sales serialize per (shop, product) and can never drive the counter
//! negative.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::services::stock_log::StockLogService;
use shared::{
    InventoryRecord, PaginatedResponse, Pagination, PaginationMeta, StockChangeType,
};

/// Inventory aggregate service
#[derive(Clone)]
pub struct InventoryService {
    db: PgPool,
}

#[derive(Debug, FromRow)]
struct InventoryRow {
    id: Uuid,
    shop_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    warehouse_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InventoryRow> for InventoryRecord {
    fn from(row: InventoryRow) -> Self {
        InventoryRecord {
            id: row.id,
            shop_id: row.shop_id,
            product_id: row.product_id,
            quantity: row.quantity,
            warehouse_id: row.warehouse_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl InventoryService {
    /// Create a new InventoryService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Apply `delta` to the (shop, product) counter, creating the record
    /// on first receipt.
    ///
    /// The existing row is read `FOR UPDATE`, so two concurrent writers
    /// cannot both observe the same quantity. A result below zero fails
    /// with `NegativeInventory`; going negative is a bug to surface, not
    /// something to clamp.
    pub async fn upsert_and_adjust(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shop_id: Uuid,
        product_id: Uuid,
        delta: i32,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<InventoryRecord> {
        let existing = sqlx::query_as::<_, (Uuid, i32)>(
            "SELECT id, quantity FROM inventory WHERE shop_id = $1 AND product_id = $2 FOR UPDATE",
        )
        .bind(shop_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

        let row = match existing {
            Some((id, quantity)) => {
                let new_quantity = quantity + delta;
                if new_quantity < 0 {
                    return Err(AppError::NegativeInventory {
                        shop_id,
                        product_id,
                        current: quantity,
                        delta,
                    });
                }

                sqlx::query_as::<_, InventoryRow>(
                    r#"
                    UPDATE inventory
                    SET quantity = $1, updated_at = now()
                    WHERE id = $2
                    RETURNING id, shop_id, product_id, quantity, warehouse_id, created_at, updated_at
                    "#,
                )
                .bind(new_quantity)
                .bind(id)
                .fetch_one(&mut **tx)
                .await?
            }
            None => {
                if delta < 0 {
                    return Err(AppError::NegativeInventory {
                        shop_id,
                        product_id,
                        current: 0,
                        delta,
                    });
                }

                sqlx::query_as::<_, InventoryRow>(
                    r#"
                    INSERT INTO inventory (shop_id, product_id, quantity, warehouse_id)
                    VALUES ($1, $2, $3, $4)
                    RETURNING id, shop_id, product_id, quantity, warehouse_id, created_at, updated_at
                    "#,
                )
                .bind(shop_id)
                .bind(product_id)
                .bind(delta)
                .bind(warehouse_id)
                .fetch_one(&mut **tx)
                .await?
            }
        };

        Ok(row.into())
    }

    /// Read the (shop, product) counter inside an open transaction with
    /// the row locked. Returns `None` when no record exists yet.
    pub async fn get_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        shop_id: Uuid,
        product_id: Uuid,
    ) -> AppResult<Option<InventoryRecord>> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT id, shop_id, product_id, quantity, warehouse_id, created_at, updated_at
            FROM inventory
            WHERE shop_id = $1 AND product_id = $2
            FOR UPDATE
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get the current inventory record for a (shop, product).
    pub async fn get(&self, shop_id: Uuid, product_id: Uuid) -> AppResult<InventoryRecord> {
        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT id, shop_id, product_id, quantity, warehouse_id, created_at, updated_at
            FROM inventory
            WHERE shop_id = $1 AND product_id = $2
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Inventory record".to_string()))?;

        Ok(row.into())
    }

    /// Explicitly create an inventory record. Fails when one already
    /// exists for the (shop, product).
    pub async fn create(
        &self,
        shop_id: Uuid,
        product_id: Uuid,
        quantity: i32,
        warehouse_id: Option<Uuid>,
    ) -> AppResult<InventoryRecord> {
        if quantity < 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Initial quantity cannot be negative".to_string(),
            });
        }

        let row = sqlx::query_as::<_, InventoryRow>(
            r#"
            INSERT INTO inventory (shop_id, product_id, quantity, warehouse_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, shop_id, product_id, quantity, warehouse_id, created_at, updated_at
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .bind(quantity)
        .bind(warehouse_id)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateEntry("inventory".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(row.into())
    }

    /// Apply a signed manual adjustment and log it, in one transaction.
    ///
    /// Adjustments move the aggregate counter only. They never create or
    /// touch batches, so a sustained positive adjustment can later surface
    /// as a ledger inconsistency during allocation. That is intentional;
    /// stock without a batch is a condition to reconcile, not to hide.
    pub async fn adjust(
        &self,
        shop_id: Uuid,
        product_id: Uuid,
        delta: i32,
        reason: &str,
    ) -> AppResult<InventoryRecord> {
        if delta == 0 {
            return Err(AppError::Validation {
                field: "delta".to_string(),
                message: "Adjustment delta cannot be zero".to_string(),
            });
        }
        if reason.trim().is_empty() {
            return Err(AppError::Validation {
                field: "reason".to_string(),
                message: "An adjustment needs a reason".to_string(),
            });
        }

        let mut tx = self.db.begin().await?;

        let record = self
            .upsert_and_adjust(&mut tx, shop_id, product_id, delta, None)
            .await?;

        StockLogService::new(self.db.clone())
            .append(
                &mut tx,
                shop_id,
                product_id,
                StockChangeType::ManualAdjustment,
                StockChangeType::ManualAdjustment.signed_delta(delta),
                reason,
                None,
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            %shop_id,
            %product_id,
            delta,
            "manual stock adjustment"
        );

        Ok(record)
    }

    /// Inventory records for a shop, paginated.
    pub async fn list_by_shop(
        &self,
        shop_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<InventoryRecord>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM inventory WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT id, shop_id, product_id, quantity, warehouse_id, created_at, updated_at
            FROM inventory
            WHERE shop_id = $1
            ORDER BY updated_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(shop_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows.into_iter().map(Into::into).collect(),
            meta: PaginationMeta::new(pagination, total),
        })
    }

    /// Inventory records below a stock threshold for a shop.
    pub async fn low_stock(
        &self,
        shop_id: Uuid,
        threshold: i32,
    ) -> AppResult<Vec<InventoryRecord>> {
        let rows = sqlx::query_as::<_, InventoryRow>(
            r#"
            SELECT id, shop_id, product_id, quantity, warehouse_id, created_at, updated_at
            FROM inventory
            WHERE shop_id = $1 AND quantity < $2
            ORDER BY quantity ASC
            "#,
        )
        .bind(shop_id)
        .bind(threshold)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

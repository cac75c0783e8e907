//! Batch store service
//!
//! Owns the set of `ProductBatch` records per product. Batches are created
//! once when a purchase is received, consumed in FEFO order by sales and
//! supplier returns, and never deleted.

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use shared::ProductBatch;

/// Batch store service
#[derive(Clone)]
pub struct BatchService {
    db: PgPool,
}

/// Input for creating a batch on purchase receipt
#[derive(Debug, Clone)]
pub struct NewBatch {
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub supplier_batch_id: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub manufacturing_date: Option<NaiveDate>,
}

#[derive(Debug, FromRow)]
struct BatchRow {
    id: Uuid,
    batch_number: String,
    supplier_batch_id: Option<String>,
    purchase_id: Uuid,
    product_id: Uuid,
    quantity: i32,
    remaining_qty: i32,
    unit_price: Decimal,
    manufacturing_date: Option<NaiveDate>,
    expiry_date: Option<NaiveDate>,
    created_at: DateTime<Utc>,
}

impl From<BatchRow> for ProductBatch {
    fn from(row: BatchRow) -> Self {
        ProductBatch {
            id: row.id,
            batch_number: row.batch_number,
            supplier_batch_id: row.supplier_batch_id,
            purchase_id: row.purchase_id,
            product_id: row.product_id,
            quantity: row.quantity,
            remaining_qty: row.remaining_qty,
            unit_price: row.unit_price,
            manufacturing_date: row.manufacturing_date,
            expiry_date: row.expiry_date,
            created_at: row.created_at,
        }
    }
}

/// Generate a batch number: millisecond timestamp plus a random suffix.
///
/// Uniqueness is not guaranteed by construction; the unique constraint on
/// `product_batches.batch_number` is the authority, and a collision
/// surfaces as a conflict error rather than being silently ignored.
pub fn generate_batch_number() -> String {
    const SUFFIX_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| SUFFIX_CHARS[rng.gen_range(0..SUFFIX_CHARS.len())] as char)
        .collect();
    format!("BATCH-{}-{}", Utc::now().timestamp_millis(), suffix)
}

impl BatchService {
    /// Create a new BatchService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Create a batch for a received purchase line. `remaining_qty` starts
    /// equal to the received quantity.
    pub async fn create_batch(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        input: NewBatch,
    ) -> AppResult<ProductBatch> {
        if input.quantity <= 0 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: "Batch quantity must be greater than zero".to_string(),
            });
        }

        let batch_number = generate_batch_number();

        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            INSERT INTO product_batches (batch_number, supplier_batch_id, purchase_id, product_id,
                                         quantity, remaining_qty, unit_price, manufacturing_date,
                                         expiry_date)
            VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8)
            RETURNING id, batch_number, supplier_batch_id, purchase_id, product_id,
                      quantity, remaining_qty, unit_price, manufacturing_date, expiry_date,
                      created_at
            "#,
        )
        .bind(&batch_number)
        .bind(&input.supplier_batch_id)
        .bind(input.purchase_id)
        .bind(input.product_id)
        .bind(input.quantity)
        .bind(input.unit_price)
        .bind(input.manufacturing_date)
        .bind(input.expiry_date)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                AppError::DuplicateEntry("batch number".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        Ok(row.into())
    }

    /// Batches with remaining stock for a product, in FEFO order: dated
    /// batches before undated ones, earliest expiry first, ties broken by
    /// earliest creation. This ordering is load-bearing for allocation.
    ///
    /// When `shop_id` is given, only batches whose purchase was received
    /// into that shop are returned.
    pub async fn available_batches(
        &self,
        product_id: Uuid,
        shop_id: Option<Uuid>,
    ) -> AppResult<Vec<ProductBatch>> {
        let rows = match shop_id {
            Some(shop_id) => {
                sqlx::query_as::<_, BatchRow>(
                    r#"
                    SELECT pb.id, pb.batch_number, pb.supplier_batch_id, pb.purchase_id,
                           pb.product_id, pb.quantity, pb.remaining_qty, pb.unit_price,
                           pb.manufacturing_date, pb.expiry_date, pb.created_at
                    FROM product_batches pb
                    JOIN purchases p ON p.id = pb.purchase_id
                    WHERE pb.product_id = $1 AND pb.remaining_qty > 0 AND p.shop_id = $2
                    ORDER BY pb.expiry_date ASC NULLS LAST, pb.created_at ASC
                    "#,
                )
                .bind(product_id)
                .bind(shop_id)
                .fetch_all(&self.db)
                .await?
            }
            None => {
                sqlx::query_as::<_, BatchRow>(
                    r#"
                    SELECT id, batch_number, supplier_batch_id, purchase_id, product_id,
                           quantity, remaining_qty, unit_price, manufacturing_date, expiry_date,
                           created_at
                    FROM product_batches
                    WHERE product_id = $1 AND remaining_qty > 0
                    ORDER BY expiry_date ASC NULLS LAST, created_at ASC
                    "#,
                )
                .bind(product_id)
                .fetch_all(&self.db)
                .await?
            }
        };

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Same as `available_batches` scoped to a shop, but inside an open
    /// transaction with the batch rows locked, so concurrent sales cannot
    /// both allocate from the same remainder.
    pub async fn available_batches_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        product_id: Uuid,
        shop_id: Uuid,
    ) -> AppResult<Vec<ProductBatch>> {
        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT pb.id, pb.batch_number, pb.supplier_batch_id, pb.purchase_id,
                   pb.product_id, pb.quantity, pb.remaining_qty, pb.unit_price,
                   pb.manufacturing_date, pb.expiry_date, pb.created_at
            FROM product_batches pb
            JOIN purchases p ON p.id = pb.purchase_id
            WHERE pb.product_id = $1 AND pb.remaining_qty > 0 AND p.shop_id = $2
            ORDER BY pb.expiry_date ASC NULLS LAST, pb.created_at ASC
            FOR UPDATE OF pb
            "#,
        )
        .bind(product_id)
        .bind(shop_id)
        .fetch_all(&mut **tx)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Reduce a batch's remaining quantity. Locks the row, so the check
    /// against `remaining_qty` and the update are race-free.
    ///
    /// There is deliberately no generic increment: stock leaves batches
    /// through sales and supplier returns, it never re-enters them.
    pub async fn decrement_remaining(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        batch_id: Uuid,
        amount: i32,
    ) -> AppResult<ProductBatch> {
        if amount <= 0 {
            return Err(AppError::Validation {
                field: "amount".to_string(),
                message: "Decrement amount must be greater than zero".to_string(),
            });
        }

        let batch = sqlx::query_as::<_, (String, i32)>(
            "SELECT batch_number, remaining_qty FROM product_batches WHERE id = $1 FOR UPDATE",
        )
        .bind(batch_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        if amount > batch.1 {
            return Err(AppError::InsufficientBatchStock {
                batch_number: batch.0,
                requested: amount,
                remaining: batch.1,
            });
        }

        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            UPDATE product_batches
            SET remaining_qty = remaining_qty - $1
            WHERE id = $2
            RETURNING id, batch_number, supplier_batch_id, purchase_id, product_id,
                      quantity, remaining_qty, unit_price, manufacturing_date, expiry_date,
                      created_at
            "#,
        )
        .bind(amount)
        .bind(batch_id)
        .fetch_one(&mut **tx)
        .await?;

        Ok(row.into())
    }

    /// Look up a batch by its system-generated batch number.
    pub async fn get_by_number(&self, batch_number: &str) -> AppResult<ProductBatch> {
        let row = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, batch_number, supplier_batch_id, purchase_id, product_id,
                   quantity, remaining_qty, unit_price, manufacturing_date, expiry_date,
                   created_at
            FROM product_batches
            WHERE batch_number = $1
            "#,
        )
        .bind(batch_number)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Batch".to_string()))?;

        Ok(row.into())
    }

    /// Batches with remaining stock expiring within the next `days` days.
    pub async fn expiring_within(&self, days: i64) -> AppResult<Vec<ProductBatch>> {
        let today = Utc::now().date_naive();
        let cutoff = today + chrono::Duration::days(days);

        let rows = sqlx::query_as::<_, BatchRow>(
            r#"
            SELECT id, batch_number, supplier_batch_id, purchase_id, product_id,
                   quantity, remaining_qty, unit_price, manufacturing_date, expiry_date,
                   created_at
            FROM product_batches
            WHERE expiry_date IS NOT NULL
              AND expiry_date >= $1
              AND expiry_date <= $2
              AND remaining_qty > 0
            ORDER BY expiry_date ASC
            "#,
        )
        .bind(today)
        .bind(cutoff)
        .fetch_all(&self.db)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_number_shape() {
        let number = generate_batch_number();
        let parts: Vec<&str> = number.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "BATCH");
        assert!(parts[1].chars().all(|c| c.is_ascii_digit()));
        assert_eq!(parts[2].len(), 6);
        assert!(parts[2].chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    #[test]
    fn batch_numbers_vary() {
        let a = generate_batch_number();
        let b = generate_batch_number();
        // Same millisecond is possible; the random suffix still differs.
        assert_ne!(a, b);
    }
}

//! Purchase orchestration
//!
//! Receiving a purchase is one transaction that touches four stores: the
//! purchase record itself, a fresh batch per line, the inventory counter,
//! and the stock ledger. Either all of them move or none do.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::batch::{BatchService, NewBatch};
use crate::services::inventory::InventoryService;
use crate::services::stock_log::StockLogService;
use shared::{
    PaginatedResponse, Pagination, PaginationMeta, Purchase, PurchaseItem, PurchaseStatus,
    PurchaseWithItems, StockChangeType,
};

/// Purchase orchestration service
#[derive(Clone)]
pub struct PurchaseService {
    db: PgPool,
    batches: BatchService,
    inventory: InventoryService,
    stock_log: StockLogService,
}

/// One requested purchase line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePurchaseItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Item quantity must be greater than zero"))]
    pub quantity: i32,
    pub unit_price: Decimal,
    pub supplier_batch_id: Option<String>,
    pub manufacturing_date: Option<chrono::NaiveDate>,
    pub expiry_date: Option<chrono::NaiveDate>,
}

/// Request to record a received purchase
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePurchaseRequest {
    pub shop_id: Uuid,
    pub supplier_id: Uuid,
    pub warehouse_id: Option<Uuid>,
    #[validate(length(min = 1, message = "A purchase needs at least one item"))]
    pub items: Vec<CreatePurchaseItem>,
}

/// Request to return part of a purchase line to the supplier
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ReturnToSupplierRequest {
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub shop_id: Uuid,
    pub batch_id: Uuid,
    #[validate(range(min = 1, message = "Return quantity must be greater than zero"))]
    pub quantity: i32,
    #[validate(custom = "non_blank_reason")]
    pub reason: String,
}

fn non_blank_reason(reason: &str) -> Result<(), validator::ValidationError> {
    if reason.trim().is_empty() {
        let mut error = validator::ValidationError::new("non_blank");
        error.message = Some("A return needs a reason".into());
        return Err(error);
    }
    Ok(())
}

type PurchaseRow = (
    Uuid,
    Uuid,
    Uuid,
    Decimal,
    String,
    Option<Uuid>,
    chrono::DateTime<chrono::Utc>,
);

fn purchase_from_row(row: PurchaseRow) -> AppResult<Purchase> {
    let status = PurchaseStatus::from_str(&row.4).ok_or_else(|| {
        AppError::LedgerInconsistency(format!("Unknown purchase status '{}'", row.4))
    })?;
    Ok(Purchase {
        id: row.0,
        shop_id: row.1,
        supplier_id: row.2,
        total_amount: row.3,
        status,
        created_by: row.5,
        created_at: row.6,
    })
}

type PurchaseItemRow = (Uuid, Uuid, Uuid, i32, Decimal, i32, i32, Option<Uuid>);

fn item_from_row(row: PurchaseItemRow) -> PurchaseItem {
    PurchaseItem {
        id: row.0,
        purchase_id: row.1,
        product_id: row.2,
        quantity: row.3,
        unit_price: row.4,
        received_qty: row.5,
        returned_qty: row.6,
        batch_id: row.7,
    }
}

impl PurchaseService {
    /// Create a new PurchaseService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            batches: BatchService::new(db.clone()),
            inventory: InventoryService::new(db.clone()),
            stock_log: StockLogService::new(db.clone()),
            db,
        }
    }

    /// Record a received purchase.
    ///
    /// Per line item, inside one transaction: insert the line with
    /// `received_qty` equal to the ordered quantity, mint a batch whose
    /// `remaining_qty` starts at that quantity, bump the (shop, product)
    /// inventory counter, and append a `PURCHASE_IN` ledger entry keyed to
    /// the new batch.
    pub async fn create_purchase(
        &self,
        request: CreatePurchaseRequest,
        created_by: Option<Uuid>,
    ) -> AppResult<PurchaseWithItems> {
        request.validate()?;
        for item in &request.items {
            item.validate()?;
            if item.unit_price < Decimal::ZERO {
                return Err(AppError::Validation {
                    field: "unit_price".to_string(),
                    message: "Unit price cannot be negative".to_string(),
                });
            }
        }

        self.ensure_exists("shops", "Shop", request.shop_id).await?;
        self.ensure_exists("suppliers", "Supplier", request.supplier_id)
            .await?;
        for item in &request.items {
            self.ensure_exists("products", "Product", item.product_id)
                .await?;
        }

        let total_amount: Decimal = request
            .items
            .iter()
            .map(|item| Decimal::from(item.quantity) * item.unit_price)
            .sum();

        let mut tx = self.db.begin().await?;

        let purchase_row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            INSERT INTO purchases (shop_id, supplier_id, total_amount, status, created_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, shop_id, supplier_id, total_amount, status, created_by, created_at
            "#,
        )
        .bind(request.shop_id)
        .bind(request.supplier_id)
        .bind(total_amount)
        .bind(PurchaseStatus::Received.as_str())
        .bind(created_by)
        .fetch_one(&mut *tx)
        .await?;
        let purchase = purchase_from_row(purchase_row)?;

        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let item_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO purchase_items (purchase_id, product_id, quantity, unit_price,
                                            received_qty, returned_qty)
                VALUES ($1, $2, $3, $4, $3, 0)
                RETURNING id
                "#,
            )
            .bind(purchase.id)
            .bind(item.product_id)
            .bind(item.quantity)
            .bind(item.unit_price)
            .fetch_one(&mut *tx)
            .await?;

            let batch = self
                .batches
                .create_batch(
                    &mut tx,
                    NewBatch {
                        purchase_id: purchase.id,
                        product_id: item.product_id,
                        quantity: item.quantity,
                        unit_price: item.unit_price,
                        supplier_batch_id: item.supplier_batch_id.clone(),
                        expiry_date: item.expiry_date,
                        manufacturing_date: item.manufacturing_date,
                    },
                )
                .await?;

            sqlx::query("UPDATE purchase_items SET batch_id = $1 WHERE id = $2")
                .bind(batch.id)
                .bind(item_id)
                .execute(&mut *tx)
                .await?;

            self.inventory
                .upsert_and_adjust(
                    &mut tx,
                    request.shop_id,
                    item.product_id,
                    StockChangeType::PurchaseIn.signed_delta(item.quantity),
                    request.warehouse_id,
                )
                .await?;

            self.stock_log
                .append(
                    &mut tx,
                    request.shop_id,
                    item.product_id,
                    StockChangeType::PurchaseIn,
                    StockChangeType::PurchaseIn.signed_delta(item.quantity),
                    "New Purchase",
                    Some(batch.id),
                )
                .await?;

            items.push(PurchaseItem {
                id: item_id,
                purchase_id: purchase.id,
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                received_qty: item.quantity,
                returned_qty: 0,
                batch_id: Some(batch.id),
            });
        }

        tx.commit().await?;

        tracing::info!(
            purchase_id = %purchase.id,
            shop_id = %purchase.shop_id,
            items = items.len(),
            "purchase received"
        );

        Ok(PurchaseWithItems { purchase, items })
    }

    /// Return part of a received purchase line to the supplier.
    ///
    /// The quantity comes back out of the named batch, the inventory
    /// counter drops, and a negative `RETURN_TO_SUPPLIER` ledger entry is
    /// appended, all in one transaction. The batch must be the one minted
    /// for this purchase line.
    pub async fn return_to_supplier(
        &self,
        request: ReturnToSupplierRequest,
    ) -> AppResult<PurchaseItem> {
        request.validate()?;

        let mut tx = self.db.begin().await?;

        // A purchase can carry several lines of the same product (one per
        // lot), so the batch id is what names the line being returned.
        let line = sqlx::query_as::<_, (Uuid, i32, i32)>(
            r#"
            SELECT id, received_qty, returned_qty
            FROM purchase_items
            WHERE purchase_id = $1 AND product_id = $2 AND batch_id = $3
            FOR UPDATE
            "#,
        )
        .bind(request.purchase_id)
        .bind(request.product_id)
        .bind(request.batch_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase item".to_string()))?;

        if request.quantity > line.1 {
            return Err(AppError::Validation {
                field: "quantity".to_string(),
                message: format!(
                    "Cannot return {} units; only {} were received",
                    request.quantity, line.1
                ),
            });
        }

        self.batches
            .decrement_remaining(&mut tx, request.batch_id, request.quantity)
            .await?;

        let updated = sqlx::query_as::<_, PurchaseItemRow>(
            r#"
            UPDATE purchase_items
            SET returned_qty = returned_qty + $1, received_qty = received_qty - $1
            WHERE id = $2
            RETURNING id, purchase_id, product_id, quantity, unit_price,
                      received_qty, returned_qty, batch_id
            "#,
        )
        .bind(request.quantity)
        .bind(line.0)
        .fetch_one(&mut *tx)
        .await?;

        self.inventory
            .upsert_and_adjust(
                &mut tx,
                request.shop_id,
                request.product_id,
                StockChangeType::ReturnToSupplier.signed_delta(request.quantity),
                None,
            )
            .await?;

        self.stock_log
            .append(
                &mut tx,
                request.shop_id,
                request.product_id,
                StockChangeType::ReturnToSupplier,
                StockChangeType::ReturnToSupplier.signed_delta(request.quantity),
                &request.reason,
                Some(request.batch_id),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(
            purchase_id = %request.purchase_id,
            batch_id = %request.batch_id,
            quantity = request.quantity,
            "returned to supplier"
        );

        Ok(item_from_row(updated))
    }

    /// Fetch a purchase with its line items.
    pub async fn get_purchase(&self, id: Uuid) -> AppResult<PurchaseWithItems> {
        let row = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, shop_id, supplier_id, total_amount, status, created_by, created_at
            FROM purchases
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Purchase".to_string()))?;
        let purchase = purchase_from_row(row)?;

        let items = sqlx::query_as::<_, PurchaseItemRow>(
            r#"
            SELECT id, purchase_id, product_id, quantity, unit_price,
                   received_qty, returned_qty, batch_id
            FROM purchase_items
            WHERE purchase_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(PurchaseWithItems {
            purchase,
            items: items.into_iter().map(item_from_row).collect(),
        })
    }

    /// Purchases for a shop, newest first, paginated.
    pub async fn list_by_shop(
        &self,
        shop_id: Uuid,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Purchase>> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM purchases WHERE shop_id = $1")
            .bind(shop_id)
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, PurchaseRow>(
            r#"
            SELECT id, shop_id, supplier_id, total_amount, status, created_by, created_at
            FROM purchases
            WHERE shop_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(shop_id)
        .bind(pagination.limit())
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        Ok(PaginatedResponse {
            data: rows
                .into_iter()
                .map(purchase_from_row)
                .collect::<AppResult<Vec<_>>>()?,
            meta: PaginationMeta::new(pagination, total),
        })
    }

    async fn ensure_exists(&self, table: &str, entity: &str, id: Uuid) -> AppResult<()> {
        let query = format!("SELECT EXISTS(SELECT 1 FROM {} WHERE id = $1)", table);
        let exists = sqlx::query_scalar::<_, bool>(&query)
            .bind(id)
            .fetch_one(&self.db)
            .await?;
        if !exists {
            return Err(AppError::NotFound(entity.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn return_request(quantity: i32, reason: &str) -> ReturnToSupplierRequest {
        ReturnToSupplierRequest {
            purchase_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            shop_id: Uuid::new_v4(),
            batch_id: Uuid::new_v4(),
            quantity,
            reason: reason.to_string(),
        }
    }

    #[test]
    fn empty_purchase_fails_validation() {
        let request = CreatePurchaseRequest {
            shop_id: Uuid::new_v4(),
            supplier_id: Uuid::new_v4(),
            warehouse_id: None,
            items: vec![],
        };

        let err = AppError::from(request.validate().unwrap_err());
        assert!(matches!(err, AppError::Validation { field, .. } if field == "items"));
    }

    #[test]
    fn zero_quantity_return_fails_validation() {
        let err = AppError::from(return_request(0, "damaged").validate().unwrap_err());
        assert!(matches!(err, AppError::Validation { field, .. } if field == "quantity"));
    }

    #[test]
    fn blank_reason_fails_validation() {
        assert!(return_request(3, "   ").validate().is_err());
        assert!(return_request(3, "").validate().is_err());
        assert!(return_request(3, "expired on arrival").validate().is_ok());
    }
}

//! Sale orchestration
//!
//! A sale is planned fully before anything moves: every line's inventory
//! counter and FEFO batch rows are locked and an allocation plan is built,
//! and only then are the sale, its items, the counter decrements, the batch
//! draws, and the ledger entries written. Any failure rolls the whole
//! transaction back.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{Acquire, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::services::allocation::plan_allocations;
use crate::services::batch::BatchService;
use crate::services::inventory::InventoryService;
use crate::services::invoice_number::{self, MAX_INVOICE_ATTEMPTS};
use crate::services::stock_log::StockLogService;
use shared::{
    calculate_invoice_totals, BatchAllocation, PaginatedResponse, Pagination, PaginationMeta,
    PaymentMode, Sale, SaleItem, SaleWithItems, StockChangeType,
};

/// Sale orchestration service
#[derive(Clone)]
pub struct SaleService {
    db: PgPool,
    batches: BatchService,
    inventory: InventoryService,
    stock_log: StockLogService,
}

/// One requested sale line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSaleItem {
    pub product_id: Uuid,
    #[validate(range(min = 1, message = "Item quantity must be greater than zero"))]
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Request to record a sale
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateSaleRequest {
    pub shop_id: Uuid,
    pub customer_id: Uuid,
    #[serde(default)]
    pub discount_percent: Option<Decimal>,
    pub payment_mode: PaymentMode,
    #[validate(length(min = 1, message = "A sale needs at least one item"))]
    pub items: Vec<CreateSaleItem>,
}

/// Lines are planned in product id order so concurrent sales lock
/// inventory and batch rows in the same order.
fn plan_order(items: &[CreateSaleItem]) -> Vec<&CreateSaleItem> {
    let mut ordered: Vec<&CreateSaleItem> = items.iter().collect();
    ordered.sort_by(|a, b| a.product_id.cmp(&b.product_id));
    ordered
}

type SaleRow = (
    Uuid,
    Uuid,
    Uuid,
    String,
    Decimal,
    Decimal,
    String,
    chrono::DateTime<chrono::Utc>,
    Option<Uuid>,
);

fn sale_from_row(row: SaleRow) -> AppResult<Sale> {
    let payment_mode = PaymentMode::from_str(&row.6).ok_or_else(|| {
        AppError::LedgerInconsistency(format!("Unknown payment mode '{}'", row.6))
    })?;
    Ok(Sale {
        id: row.0,
        shop_id: row.1,
        customer_id: row.2,
        invoice_no: row.3,
        total_amount: row.4,
        discount_percent: row.5,
        payment_mode,
        sale_date: row.7,
        created_by: row.8,
    })
}

struct LinePlan {
    product_id: Uuid,
    quantity: i32,
    unit_price: Decimal,
    allocations: Vec<BatchAllocation>,
}

impl SaleService {
    /// Create a new SaleService instance
    pub fn new(db: PgPool) -> Self {
        Self {
            batches: BatchService::new(db.clone()),
            inventory: InventoryService::new(db.clone()),
            stock_log: StockLogService::new(db.clone()),
            db,
        }
    }

    /// Record a sale.
    ///
    /// The invoice number's first candidate is derived from the same-day
    /// sale count; uniqueness is decided by the insert against the unique
    /// constraint, retried under a savepoint with random candidates up to
    /// `MAX_INVOICE_ATTEMPTS` before failing with `InvoiceNumberExhausted`.
    pub async fn create_sale(
        &self,
        request: CreateSaleRequest,
        created_by: Option<Uuid>,
    ) -> AppResult<SaleWithItems> {
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
        let discount_percent = request.discount_percent.unwrap_or(Decimal::ZERO);
        if discount_percent < Decimal::ZERO || discount_percent > Decimal::from(100) {
            return Err(AppError::Validation {
                field: "discount_percent".to_string(),
                message: "Discount must be between 0 and 100".to_string(),
            });
        }

        self.ensure_exists("shops", "Shop", request.shop_id).await?;
        self.ensure_exists("customers", "Customer", request.customer_id)
            .await?;

        let mut tx = self.db.begin().await?;

        // Plan every line before mutating anything. Inventory counters and
        // batch rows are locked here, so the plan stays valid until commit.
        let mut plans = Vec::with_capacity(request.items.len());
        for item in plan_order(&request.items) {
            let product_name = sqlx::query_scalar::<_, String>(
                "SELECT name FROM products WHERE id = $1",
            )
            .bind(item.product_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| AppError::NotFound("Product".to_string()))?;

            let aggregate_qty = self
                .inventory
                .get_for_update(&mut tx, request.shop_id, item.product_id)
                .await?
                .map(|record| record.quantity)
                .unwrap_or(0);

            if aggregate_qty < item.quantity {
                return Err(AppError::InsufficientInventory {
                    product: product_name,
                    missing: item.quantity - aggregate_qty,
                });
            }

            let batches = self
                .batches
                .available_batches_for_update(&mut tx, item.product_id, request.shop_id)
                .await?;

            let allocations =
                plan_allocations(&product_name, aggregate_qty, &batches, item.quantity)?;

            plans.push(LinePlan {
                product_id: item.product_id,
                quantity: item.quantity,
                unit_price: item.unit_price,
                allocations,
            });
        }

        let totals = calculate_invoice_totals(
            &request
                .items
                .iter()
                .map(|item| (item.quantity, item.unit_price))
                .collect::<Vec<_>>(),
            discount_percent,
        );

        let sale_date = Utc::now().date_naive();
        let mut candidate = invoice_number::first_candidate(&mut tx, sale_date).await?;

        let mut inserted: Option<Sale> = None;
        for _ in 0..MAX_INVOICE_ATTEMPTS {
            let mut sp = tx.begin().await?;
            let result = sqlx::query_as::<_, SaleRow>(
                r#"
                INSERT INTO sales (shop_id, customer_id, invoice_no, total_amount,
                                   discount_percent, payment_mode, created_by)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                RETURNING id, shop_id, customer_id, invoice_no, total_amount,
                          discount_percent, payment_mode, sale_date, created_by
                "#,
            )
            .bind(request.shop_id)
            .bind(request.customer_id)
            .bind(&candidate)
            .bind(totals.total_amount)
            .bind(discount_percent)
            .bind(request.payment_mode.as_str())
            .bind(created_by)
            .fetch_one(&mut *sp)
            .await;

            match result {
                Ok(row) => {
                    sp.commit().await?;
                    inserted = Some(sale_from_row(row)?);
                    break;
                }
                Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                    sp.rollback().await?;
                    candidate = invoice_number::random_candidate(sale_date);
                }
                Err(e) => return Err(e.into()),
            }
        }
        let sale = inserted.ok_or(AppError::InvoiceNumberExhausted)?;

        let mut items = Vec::with_capacity(plans.len());
        let reason = format!("Sale - Invoice: {}", sale.invoice_no);
        for plan in &plans {
            let item_id = sqlx::query_scalar::<_, Uuid>(
                r#"
                INSERT INTO sale_items (sale_id, product_id, quantity, unit_price)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(sale.id)
            .bind(plan.product_id)
            .bind(plan.quantity)
            .bind(plan.unit_price)
            .fetch_one(&mut *tx)
            .await?;

            self.inventory
                .upsert_and_adjust(
                    &mut tx,
                    request.shop_id,
                    plan.product_id,
                    StockChangeType::SaleOut.signed_delta(plan.quantity),
                    None,
                )
                .await?;

            for allocation in &plan.allocations {
                self.batches
                    .decrement_remaining(&mut tx, allocation.batch_id, allocation.quantity)
                    .await?;

                self.stock_log
                    .append(
                        &mut tx,
                        request.shop_id,
                        plan.product_id,
                        StockChangeType::SaleOut,
                        StockChangeType::SaleOut.signed_delta(allocation.quantity),
                        &reason,
                        Some(allocation.batch_id),
                    )
                    .await?;
            }

            items.push(SaleItem {
                id: item_id,
                sale_id: sale.id,
                product_id: plan.product_id,
                quantity: plan.quantity,
                unit_price: plan.unit_price,
            });
        }

        tx.commit().await?;

        tracing::info!(
            sale_id = %sale.id,
            invoice_no = %sale.invoice_no,
            shop_id = %sale.shop_id,
            items = items.len(),
            "sale recorded"
        );

        Ok(SaleWithItems { sale, items })
    }

    /// Fetch a sale with its line items.
    pub async fn get_sale(&self, id: Uuid) -> AppResult<SaleWithItems> {
        let row = sqlx::query_as::<_, SaleRow>(
            r#"
            SELECT id, shop_id, customer_id, invoice_no, total_amount,
                   discount_percent, payment_mode, sale_date, created_by
            FROM sales
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;
        let sale = sale_from_row(row)?;

        let items = sqlx::query_as::<_, (Uuid, Uuid, Uuid, i32, Decimal)>(
            r#"
            SELECT id, sale_id, product_id, quantity, unit_price
            FROM sale_items
            WHERE sale_id = $1
            ORDER BY id
            "#,
        )
        .bind(id)
        .fetch_all(&self.db)
        .await?;

        Ok(SaleWithItems {
            sale,
            items: items
                .into_iter()
                .map(|(id, sale_id, product_id, quantity, unit_price)| SaleItem {
                    id,
                    sale_id,
                    product_id,
                    quantity,
                    unit_price,
                })
                .collect(),
        })
    }

    /// Fetch a sale by its invoice number.
    pub async fn get_by_invoice(&self, invoice_no: &str) -> AppResult<SaleWithItems> {
        let id = sqlx::query_scalar::<_, Uuid>("SELECT id FROM sales WHERE invoice_no = $1")
            .bind(invoice_no)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Sale".to_string()))?;
        self.get_sale(id).await
    }

    /// Sales, newest first, optionally scoped to a shop, paginated.
    pub async fn list_sales(
        &self,
        shop_id: Option<Uuid>,
        pagination: Pagination,
    ) -> AppResult<PaginatedResponse<Sale>> {
        let (total, rows) = match shop_id {
            Some(shop_id) => {
                let total =
                    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales WHERE shop_id = $1")
                        .bind(shop_id)
                        .fetch_one(&self.db)
                        .await?;
                let rows = sqlx::query_as::<_, SaleRow>(
                    r#"
                    SELECT id, shop_id, customer_id, invoice_no, total_amount,
                           discount_percent, payment_mode, sale_date, created_by
                    FROM sales
                    WHERE shop_id = $1
                    ORDER BY sale_date DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(shop_id)
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?;
                (total, rows)
            }
            None => {
                let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM sales")
                    .fetch_one(&self.db)
                    .await?;
                let rows = sqlx::query_as::<_, SaleRow>(
                    r#"
                    SELECT id, shop_id, customer_id, invoice_no, total_amount,
                           discount_percent, payment_mode, sale_date, created_by
                    FROM sales
                    ORDER BY sale_date DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(pagination.limit())
                .bind(pagination.offset())
                .fetch_all(&self.db)
                .await?;
                (total, rows)
            }
        };

        Ok(PaginatedResponse {
            data: rows
                .into_iter()
                .map(sale_from_row)
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

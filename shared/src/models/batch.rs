//! Product batch models
//!
//! A batch is one discrete lot of a product received from a single
//! purchase, tracked independently so stock can be consumed oldest-expiry
//! first and traced back to its supplier.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One lot of a product received from a supplier.
///
/// `quantity` is fixed at receipt; only `remaining_qty` moves, and only
/// downwards (sales and supplier returns). Batches are never deleted so
/// fully consumed lots stay available for audit and expiry reporting.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductBatch {
    pub id: Uuid,
    /// System-generated, globally unique, human-diagnosable.
    pub batch_number: String,
    /// Reference the supplier printed on the physical lot, if any.
    pub supplier_batch_id: Option<String>,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    /// Original received quantity. Immutable.
    pub quantity: i32,
    /// Units still on hand from this batch. `0 <= remaining_qty <= quantity`.
    pub remaining_qty: i32,
    pub unit_price: Decimal,
    pub manufacturing_date: Option<NaiveDate>,
    pub expiry_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

/// A planned draw against one batch, produced by the allocation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchAllocation {
    pub batch_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

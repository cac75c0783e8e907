//! Stock ledger models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kind of movement a stock-log entry records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockChangeType {
    PurchaseIn,
    SaleOut,
    ReturnToSupplier,
    ManualAdjustment,
}

impl StockChangeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockChangeType::PurchaseIn => "PURCHASE_IN",
            StockChangeType::SaleOut => "SALE_OUT",
            StockChangeType::ReturnToSupplier => "RETURN_TO_SUPPLIER",
            StockChangeType::ManualAdjustment => "MANUAL_ADJUSTMENT",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PURCHASE_IN" => Some(StockChangeType::PurchaseIn),
            "SALE_OUT" => Some(StockChangeType::SaleOut),
            "RETURN_TO_SUPPLIER" => Some(StockChangeType::ReturnToSupplier),
            "MANUAL_ADJUSTMENT" => Some(StockChangeType::ManualAdjustment),
            _ => None,
        }
    }

    /// Sign the raw movement quantity according to the ledger convention:
    /// receipts are positive, sales and supplier returns are negative,
    /// manual adjustments keep the sign the caller gave them.
    pub fn signed_delta(&self, quantity: i32) -> i32 {
        match self {
            StockChangeType::PurchaseIn => quantity.abs(),
            StockChangeType::SaleOut | StockChangeType::ReturnToSupplier => -quantity.abs(),
            StockChangeType::ManualAdjustment => quantity,
        }
    }
}

/// An immutable audit record of one quantity movement.
///
/// Append-only: entries are written in the same transaction as the
/// inventory/batch mutation they describe and never touched again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockLogEntry {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub product_id: Uuid,
    /// The batch that was moved, when the movement is batch-backed.
    pub batch_id: Option<Uuid>,
    pub change_type: StockChangeType,
    /// Signed delta applied to the inventory aggregate.
    pub quantity: i32,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

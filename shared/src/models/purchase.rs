//! Purchasing models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status of a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PurchaseStatus {
    Pending,
    Received,
    Cancelled,
}

impl PurchaseStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PurchaseStatus::Pending => "PENDING",
            PurchaseStatus::Received => "RECEIVED",
            PurchaseStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(PurchaseStatus::Pending),
            "RECEIVED" => Some(PurchaseStatus::Received),
            "CANCELLED" => Some(PurchaseStatus::Cancelled),
            _ => None,
        }
    }
}

/// A purchase of goods from a supplier into a shop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub supplier_id: Uuid,
    pub total_amount: Decimal,
    pub status: PurchaseStatus,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// One line of a purchase.
///
/// `batch_id` links the line to the batch created when the goods were
/// received. `received_qty` and `returned_qty` move together when items
/// go back to the supplier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseItem {
    pub id: Uuid,
    pub purchase_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub received_qty: i32,
    pub returned_qty: i32,
    pub batch_id: Option<Uuid>,
}

/// Purchase together with its line items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseWithItems {
    #[serde(flatten)]
    pub purchase: Purchase,
    pub items: Vec<PurchaseItem>,
}

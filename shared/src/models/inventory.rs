//! Inventory aggregate models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Current on-hand quantity of one product at one shop.
///
/// `(shop_id, product_id)` is unique. The quantity mirrors the sum of
/// `remaining_qty` over all batches received into the shop for the
/// product; every mutation happens in the same transaction as the batch
/// and stock-log writes that justify it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: Uuid,
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub warehouse_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

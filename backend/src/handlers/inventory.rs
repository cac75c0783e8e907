//! HTTP handlers for inventory endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{InventoryService, StockLogService};
use crate::AppState;
use shared::{InventoryRecord, PaginatedResponse, Pagination, StockLogEntry};

#[derive(Deserialize)]
pub struct CreateInventoryRequest {
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub warehouse_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct AdjustStockRequest {
    pub shop_id: Uuid,
    pub product_id: Uuid,
    pub delta: i32,
    pub reason: String,
}

#[derive(Deserialize)]
pub struct ListInventoryQuery {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Deserialize)]
pub struct LowStockQuery {
    pub threshold: Option<i32>,
}

/// Create an inventory record
pub async fn create_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(request): Json<CreateInventoryRequest>,
) -> AppResult<(StatusCode, Json<InventoryRecord>)> {
    let service = InventoryService::new(state.db);
    let record = service
        .create(
            request.shop_id,
            request.product_id,
            request.quantity,
            request.warehouse_id,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Get the inventory record for a (shop, product)
pub async fn get_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((shop_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<InventoryRecord>> {
    let service = InventoryService::new(state.db);
    let record = service.get(shop_id, product_id).await?;
    Ok(Json(record))
}

/// List inventory records for a shop
pub async fn list_inventory(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shop_id): Path<Uuid>,
    Query(query): Query<ListInventoryQuery>,
) -> AppResult<Json<PaginatedResponse<InventoryRecord>>> {
    let defaults = Pagination::default();
    let pagination = Pagination {
        page: query.page.unwrap_or(defaults.page),
        per_page: query.per_page.unwrap_or(defaults.per_page),
    };
    let service = InventoryService::new(state.db);
    let records = service.list_by_shop(shop_id, pagination).await?;
    Ok(Json(records))
}

/// Inventory records below a stock threshold
pub async fn low_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shop_id): Path<Uuid>,
    Query(query): Query<LowStockQuery>,
) -> AppResult<Json<Vec<InventoryRecord>>> {
    let service = InventoryService::new(state.db);
    let records = service
        .low_stock(shop_id, query.threshold.unwrap_or(10))
        .await?;
    Ok(Json(records))
}

/// Apply a signed manual stock adjustment
pub async fn adjust_stock(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(request): Json<AdjustStockRequest>,
) -> AppResult<Json<InventoryRecord>> {
    let service = InventoryService::new(state.db);
    let record = service
        .adjust(
            request.shop_id,
            request.product_id,
            request.delta,
            &request.reason,
        )
        .await?;
    Ok(Json(record))
}

/// Ledger movements for a (shop, product), newest first
pub async fn stock_movements(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((shop_id, product_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<Vec<StockLogEntry>>> {
    let service = StockLogService::new(state.db);
    let entries = service.movements(shop_id, product_id).await?;
    Ok(Json(entries))
}

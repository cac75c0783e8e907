//! HTTP handlers for batch endpoints

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::{BatchService, StockLogService};
use crate::AppState;
use shared::{ProductBatch, StockLogEntry};

#[derive(Deserialize)]
pub struct AvailableBatchesQuery {
    pub shop_id: Option<Uuid>,
}

#[derive(Deserialize)]
pub struct ExpiringQuery {
    pub days: Option<i64>,
}

/// Batches with remaining stock for a product, in FEFO order
pub async fn available_batches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Query(query): Query<AvailableBatchesQuery>,
) -> AppResult<Json<Vec<ProductBatch>>> {
    let service = BatchService::new(state.db);
    let batches = service.available_batches(product_id, query.shop_id).await?;
    Ok(Json(batches))
}

/// Look up a batch by its batch number
pub async fn get_batch_by_number(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(batch_number): Path<String>,
) -> AppResult<Json<ProductBatch>> {
    let service = BatchService::new(state.db);
    let batch = service.get_by_number(&batch_number).await?;
    Ok(Json(batch))
}

/// Ledger history for a single batch
pub async fn batch_history(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(batch_id): Path<Uuid>,
) -> AppResult<Json<Vec<StockLogEntry>>> {
    let service = StockLogService::new(state.db);
    let entries = service.batch_history(batch_id).await?;
    Ok(Json(entries))
}

/// Batches with remaining stock expiring soon
pub async fn expiring_batches(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ExpiringQuery>,
) -> AppResult<Json<Vec<ProductBatch>>> {
    let service = BatchService::new(state.db);
    let batches = service.expiring_within(query.days.unwrap_or(30)).await?;
    Ok(Json(batches))
}

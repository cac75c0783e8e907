//! HTTP handlers for purchasing endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::purchase::{CreatePurchaseRequest, ReturnToSupplierRequest};
use crate::services::PurchaseService;
use crate::AppState;
use shared::{PaginatedResponse, Pagination, Purchase, PurchaseItem, PurchaseWithItems};

#[derive(Deserialize)]
pub struct ListPurchasesQuery {
    pub shop_id: Uuid,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListPurchasesQuery {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Record a received purchase
pub async fn create_purchase(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreatePurchaseRequest>,
) -> AppResult<(StatusCode, Json<PurchaseWithItems>)> {
    let service = PurchaseService::new(state.db);
    let purchase = service
        .create_purchase(request, Some(current_user.0.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// Get a purchase with its items
pub async fn get_purchase(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(purchase_id): Path<Uuid>,
) -> AppResult<Json<PurchaseWithItems>> {
    let service = PurchaseService::new(state.db);
    let purchase = service.get_purchase(purchase_id).await?;
    Ok(Json(purchase))
}

/// List purchases for a shop
pub async fn list_purchases(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListPurchasesQuery>,
) -> AppResult<Json<PaginatedResponse<Purchase>>> {
    let service = PurchaseService::new(state.db);
    let purchases = service.list_by_shop(query.shop_id, query.pagination()).await?;
    Ok(Json(purchases))
}

/// Return part of a purchase line to the supplier
pub async fn return_to_supplier(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(request): Json<ReturnToSupplierRequest>,
) -> AppResult<Json<PurchaseItem>> {
    let service = PurchaseService::new(state.db);
    let item = service.return_to_supplier(request).await?;
    Ok(Json(item))
}

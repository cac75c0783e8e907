//! HTTP handlers for sales endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::sale::CreateSaleRequest;
use crate::services::SaleService;
use crate::AppState;
use shared::{PaginatedResponse, Pagination, Sale, SaleWithItems};

#[derive(Deserialize)]
pub struct ListSalesQuery {
    pub shop_id: Option<Uuid>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ListSalesQuery {
    fn pagination(&self) -> Pagination {
        let defaults = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(defaults.page),
            per_page: self.per_page.unwrap_or(defaults.per_page),
        }
    }
}

/// Record a sale
pub async fn create_sale(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<CreateSaleRequest>,
) -> AppResult<(StatusCode, Json<SaleWithItems>)> {
    let service = SaleService::new(state.db);
    let sale = service
        .create_sale(request, Some(current_user.0.user_id))
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// Get a sale with its items
pub async fn get_sale(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(sale_id): Path<Uuid>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SaleService::new(state.db);
    let sale = service.get_sale(sale_id).await?;
    Ok(Json(sale))
}

/// Get a sale by invoice number
pub async fn get_sale_by_invoice(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(invoice_no): Path<String>,
) -> AppResult<Json<SaleWithItems>> {
    let service = SaleService::new(state.db);
    let sale = service.get_by_invoice(&invoice_no).await?;
    Ok(Json(sale))
}

/// List sales for a shop
pub async fn sales_by_shop(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(shop_id): Path<Uuid>,
    Query(query): Query<ListSalesQuery>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let service = SaleService::new(state.db);
    let sales = service
        .list_sales(Some(shop_id), query.pagination())
        .await?;
    Ok(Json(sales))
}

/// List sales, optionally scoped to a shop
pub async fn list_sales(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListSalesQuery>,
) -> AppResult<Json<PaginatedResponse<Sale>>> {
    let service = SaleService::new(state.db);
    let sales = service.list_sales(query.shop_id, query.pagination()).await?;
    Ok(Json(sales))
}

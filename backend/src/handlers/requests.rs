//! HTTP handlers for fund and inventory requests

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{FundRequest, InventoryRequest, NewFundRequest, NewInventoryRequest};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::requests::AdvanceRequestInput;
use crate::services::RequestService;
use crate::store::RequestKind;
use crate::AppState;

// ============================================================================
// Fund requests
// ============================================================================

pub async fn list_fund_requests(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<FundRequest>>> {
    let service = RequestService::new(state.store);
    let requests = service.list_fund_requests(current_user.role()).await?;
    Ok(Json(requests))
}

pub async fn create_fund_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewFundRequest>,
) -> AppResult<(StatusCode, Json<FundRequest>)> {
    let service = RequestService::new(state.store);
    let request = service
        .create_fund_request(current_user.role(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn advance_fund_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(input): Json<AdvanceRequestInput>,
) -> AppResult<Json<FundRequest>> {
    let service = RequestService::new(state.store);
    let request = service
        .advance_fund_request(current_user.role(), request_id, input.status)
        .await?;
    Ok(Json(request))
}

pub async fn delete_fund_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = RequestService::new(state.store);
    service
        .delete_request(current_user.role(), RequestKind::Fund, request_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Inventory requests
// ============================================================================

pub async fn list_inventory_requests(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<InventoryRequest>>> {
    let service = RequestService::new(state.store);
    let requests = service.list_inventory_requests(current_user.role()).await?;
    Ok(Json(requests))
}

pub async fn create_inventory_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewInventoryRequest>,
) -> AppResult<(StatusCode, Json<InventoryRequest>)> {
    let service = RequestService::new(state.store);
    let request = service
        .create_inventory_request(current_user.role(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

pub async fn advance_inventory_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
    Json(input): Json<AdvanceRequestInput>,
) -> AppResult<Json<InventoryRequest>> {
    let service = RequestService::new(state.store);
    let request = service
        .advance_inventory_request(current_user.role(), request_id, input.status)
        .await?;
    Ok(Json(request))
}

pub async fn delete_inventory_request(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(request_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = RequestService::new(state.store);
    service
        .delete_request(current_user.role(), RequestKind::Inventory, request_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

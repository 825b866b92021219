//! HTTP handlers for the remittance ledger

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{NewRemittance, Remittance, RemittancePurpose, RemittanceTotals, RemittanceUpdate};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::RemittanceService;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct TotalsQuery {
    pub purpose: Option<RemittancePurpose>,
}

pub async fn list_remittances(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<Remittance>>> {
    let service = RemittanceService::new(state.store);
    let remittances = service.list(current_user.role()).await?;
    Ok(Json(remittances))
}

pub async fn create_remittance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewRemittance>,
) -> AppResult<(StatusCode, Json<Remittance>)> {
    let service = RemittanceService::new(state.store);
    let remittance = service.create(current_user.role(), input).await?;
    Ok((StatusCode::CREATED, Json(remittance)))
}

pub async fn get_remittance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(remittance_id): Path<Uuid>,
) -> AppResult<Json<Remittance>> {
    let service = RemittanceService::new(state.store);
    let remittance = service.get(current_user.role(), remittance_id).await?;
    Ok(Json(remittance))
}

pub async fn update_remittance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(remittance_id): Path<Uuid>,
    Json(input): Json<RemittanceUpdate>,
) -> AppResult<Json<Remittance>> {
    let service = RemittanceService::new(state.store);
    let remittance = service
        .edit(current_user.role(), remittance_id, input)
        .await?;
    Ok(Json(remittance))
}

pub async fn delete_remittance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(remittance_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = RemittanceService::new(state.store);
    service.delete(current_user.role(), remittance_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Mark a transfer as received in Russia
pub async fn confirm_remittance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(remittance_id): Path<Uuid>,
) -> AppResult<Json<Remittance>> {
    let service = RemittanceService::new(state.store);
    let remittance = service.confirm(current_user.role(), remittance_id).await?;
    Ok(Json(remittance))
}

pub async fn remittance_totals(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<TotalsQuery>,
) -> AppResult<Json<RemittanceTotals>> {
    let service = RemittanceService::new(state.store);
    let totals = service
        .sum_confirmed(current_user.role(), query.purpose)
        .await?;
    Ok(Json(totals))
}

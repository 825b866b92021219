//! HTTP handlers for staff payroll ledgers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use shared::{NewStaffLedger, StaffLedger, StaffProfileUpdate};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::payroll::{CompensateInput, PaymentInput, SetupCostInput};
use crate::services::PayrollService;
use crate::store::StaffChange;
use crate::AppState;

pub async fn list_staff(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Vec<StaffLedger>>> {
    let service = PayrollService::new(state.store);
    let ledgers = service.list_staff(current_user.role()).await?;
    Ok(Json(ledgers))
}

pub async fn create_staff(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<NewStaffLedger>,
) -> AppResult<(StatusCode, Json<StaffLedger>)> {
    let service = PayrollService::new(state.store);
    let ledger = service.create_staff(current_user.role(), input).await?;
    Ok((StatusCode::CREATED, Json(ledger)))
}

pub async fn get_staff(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
) -> AppResult<Json<StaffLedger>> {
    let service = PayrollService::new(state.store);
    let ledger = service.get_staff(current_user.role(), staff_id).await?;
    Ok(Json(ledger))
}

pub async fn update_staff(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
    Json(input): Json<StaffProfileUpdate>,
) -> AppResult<Json<StaffLedger>> {
    let service = PayrollService::new(state.store);
    let ledger = service
        .update_profile(current_user.role(), staff_id, input)
        .await?;
    Ok(Json(ledger))
}

pub async fn delete_staff(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = PayrollService::new(state.store);
    service.delete_staff(current_user.role(), staff_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn record_salary(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
    Json(input): Json<PaymentInput>,
) -> AppResult<Json<StaffChange>> {
    let service = PayrollService::new(state.store);
    let change = service
        .record_salary_payment(current_user.role(), staff_id, input)
        .await?;
    Ok(Json(change))
}

pub async fn record_advance(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
    Json(input): Json<PaymentInput>,
) -> AppResult<Json<StaffChange>> {
    let service = PayrollService::new(state.store);
    let change = service
        .record_advance(current_user.role(), staff_id, input)
        .await?;
    Ok(Json(change))
}

pub async fn record_setup_recovery(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
    Json(input): Json<PaymentInput>,
) -> AppResult<Json<StaffChange>> {
    let service = PayrollService::new(state.store);
    let change = service
        .record_setup_recovery(current_user.role(), staff_id, input)
        .await?;
    Ok(Json(change))
}

pub async fn initialize_setup_cost(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
    Json(input): Json<SetupCostInput>,
) -> AppResult<Json<StaffChange>> {
    let service = PayrollService::new(state.store);
    let change = service
        .initialize_setup_cost(current_user.role(), staff_id, input)
        .await?;
    Ok(Json(change))
}

/// Append an offsetting entry for an earlier one
pub async fn compensate_entry(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(staff_id): Path<Uuid>,
    Json(input): Json<CompensateInput>,
) -> AppResult<Json<StaffChange>> {
    let service = PayrollService::new(state.store);
    let change = service
        .compensate(current_user.role(), staff_id, input)
        .await?;
    Ok(Json(change))
}

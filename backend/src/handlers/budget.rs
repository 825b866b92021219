//! Budget handlers

use axum::{extract::State, Json};
use shared::BudgetSnapshot;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::BudgetService;
use crate::AppState;

pub async fn get_budget(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<BudgetSnapshot>> {
    let service = BudgetService::new(
        state.store,
        state.config.alerts.procurement_gap_warning_rub,
    );
    let snapshot = service.snapshot(current_user.role()).await?;
    Ok(Json(snapshot))
}

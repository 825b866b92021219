//! Maintenance handlers

use axum::{extract::State, Json};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::MaintenanceService;
use crate::store::ResetCounts;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(default)]
    pub confirm: bool,
}

/// Wipe every ledger; requires `{"confirm": true}`
pub async fn reset_all(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(body): Json<ResetRequest>,
) -> AppResult<Json<ResetCounts>> {
    let service = MaintenanceService::new(state.store);
    let counts = service.reset_all(current_user.role(), body.confirm).await?;
    Ok(Json(counts))
}

//! Dashboard handler

use axum::{extract::State, Json};
use chrono::Utc;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::dashboard::Dashboard;
use crate::services::DashboardService;
use crate::AppState;

pub async fn get_dashboard(
    State(state): State<AppState>,
    current_user: CurrentUser,
) -> AppResult<Json<Dashboard>> {
    let service = DashboardService::new(
        state.store,
        state.config.alert_thresholds(),
        state.config.dashboard.clone(),
    );
    let dashboard = service.build(current_user.role(), Utc::now()).await?;
    Ok(Json(dashboard))
}

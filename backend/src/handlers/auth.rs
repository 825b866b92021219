//! Authentication handlers

use axum::{extract::State, Json};
use serde::Serialize;
use shared::{Operation, Role};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::auth::{LoginInput, LoginResponse};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub role: Role,
    pub capabilities: Vec<Operation>,
}

/// PIN login endpoint handler
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginInput>,
) -> AppResult<Json<LoginResponse>> {
    let response = state.auth.login(&body.pin).await?;
    Ok(Json(response))
}

/// Role and capabilities of the token holder
pub async fn me(current_user: CurrentUser) -> Json<MeResponse> {
    let role = current_user.role();
    Json(MeResponse {
        role,
        capabilities: role.capabilities(),
    })
}

//! Authentication middleware
//!
//! Resolves the bearer token to the caller's role. Authorisation of the
//! individual operation happens in the services.

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use shared::Role;

use crate::error::{AppError, ErrorDetail, ErrorResponse};
use crate::AppState;

/// Authenticated caller extracted from the JWT
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub role: Role,
}

/// Authentication middleware that validates JWT tokens
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return AppError::Unauthorized("Missing or invalid Authorization header".to_string())
            .into_response();
    };

    let claims = match state.auth.validate_token(token) {
        Ok(claims) => claims,
        Err(err) => return err.into_response(),
    };

    request
        .extensions_mut()
        .insert(AuthUser { role: claims.role });

    next.run(request).await
}

/// Extractor for authenticated user
/// Use this in handlers to get the caller's role
#[derive(Clone, Copy, Debug)]
pub struct CurrentUser(pub AuthUser);

impl CurrentUser {
    pub fn role(&self) -> Role {
        self.0.role
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .map(CurrentUser)
            .ok_or_else(|| {
                let error = ErrorResponse {
                    error: ErrorDetail {
                        code: "UNAUTHORIZED".to_string(),
                        message: "Authentication required".to_string(),
                        field: None,
                    },
                };
                (StatusCode::UNAUTHORIZED, Json(error))
            })
    }
}

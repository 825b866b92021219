//! Reporting handlers for data export

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ReportingService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ExportQuery {
    pub format: Option<String>, // "json" or "csv"
}

fn render<T: Serialize>(rows: Vec<T>, format: Option<&str>, filename: &str) -> AppResult<Response> {
    if format == Some("csv") {
        let csv = ReportingService::export_to_csv(&rows)?;
        let disposition = format!("attachment; filename=\"{}\"", filename);
        Ok((
            [
                (header::CONTENT_TYPE, "text/csv".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            csv,
        )
            .into_response())
    } else {
        Ok(Json(rows).into_response())
    }
}

pub async fn export_remittances(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.store);
    let rows = service.remittance_rows(current_user.role()).await?;
    render(rows, query.format.as_deref(), "remittances.csv")
}

pub async fn export_purchases(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.store);
    let rows = service.purchase_rows(current_user.role()).await?;
    render(rows, query.format.as_deref(), "purchases.csv")
}

pub async fn export_payroll(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Query(query): Query<ExportQuery>,
) -> AppResult<Response> {
    let service = ReportingService::new(state.store);
    let rows = service.payroll_rows(current_user.role()).await?;
    render(rows, query.format.as_deref(), "payroll.csv")
}

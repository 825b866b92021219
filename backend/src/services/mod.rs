//! Ledger services for the Spice Ledger backend
//!
//! Every public service method takes the caller's role and re-checks it
//! before touching the store.

pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod maintenance;
pub mod payroll;
pub mod remittance;
pub mod reporting;
pub mod requests;
pub mod stock;

pub use auth::AuthService;
pub use budget::BudgetService;
pub use dashboard::DashboardService;
pub use maintenance::MaintenanceService;
pub use payroll::PayrollService;
pub use remittance::RemittanceService;
pub use reporting::ReportingService;
pub use requests::RequestService;
pub use stock::StockService;

use shared::{Operation, Role};

use crate::error::{AppError, AppResult};

/// Capability check shared by all services
pub fn authorize(role: Role, operation: Operation) -> AppResult<()> {
    if role.can(operation) {
        Ok(())
    } else {
        tracing::warn!(role = %role, operation = %operation, "Operation denied");
        Err(AppError::InsufficientPermissions {
            operation: operation.to_string(),
        })
    }
}

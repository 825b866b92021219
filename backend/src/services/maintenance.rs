//! Administrative maintenance operations

use std::sync::Arc;

use shared::{Operation, Role};

use super::authorize;
use crate::error::{AppError, AppResult};
use crate::store::{LedgerStore, ResetCounts};

#[derive(Clone)]
pub struct MaintenanceService {
    store: Arc<dyn LedgerStore>,
}

impl MaintenanceService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Delete every record of every entity in one step
    pub async fn reset_all(&self, role: Role, confirmed: bool) -> AppResult<ResetCounts> {
        authorize(role, Operation::ResetData)?;
        if !confirmed {
            return Err(AppError::validation(
                "confirm",
                "reset must be explicitly confirmed",
            ));
        }

        let counts = self.store.reset_all().await?;
        tracing::warn!(
            items = counts.inventory_items,
            purchases = counts.inventory_purchases,
            consumptions = counts.inventory_consumptions,
            remittances = counts.remittances,
            staff = counts.staff_ledgers,
            "All ledger data reset"
        );
        Ok(counts)
    }
}

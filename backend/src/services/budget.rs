//! Procurement budget service

use std::sync::Arc;

use rust_decimal::Decimal;

use shared::{BudgetSnapshot, Operation, RemittancePurpose, Role};

use super::authorize;
use crate::error::AppResult;
use crate::store::LedgerStore;

/// Budget tracker; derives the procurement gap on every call
#[derive(Clone)]
pub struct BudgetService {
    store: Arc<dyn LedgerStore>,
    gap_warning_rub: Decimal,
}

impl BudgetService {
    pub fn new(store: Arc<dyn LedgerStore>, gap_warning_rub: Decimal) -> Self {
        Self {
            store,
            gap_warning_rub,
        }
    }

    pub async fn snapshot(&self, role: Role) -> AppResult<BudgetSnapshot> {
        authorize(role, Operation::ViewDashboard)?;
        self.derive().await
    }

    /// Unchecked derivation, for callers that already authorised
    pub(crate) async fn derive(&self) -> AppResult<BudgetSnapshot> {
        let (grocery, total_purchased, other_purposes) = tokio::try_join!(
            self.store.sum_confirmed(Some(RemittancePurpose::Groceries)),
            self.store.sum_purchases(None),
            self.store.sum_purchases_linked_to_other_purposes(),
        )?;

        Ok(BudgetSnapshot::from_totals(
            grocery.amount_rub,
            total_purchased,
            other_purposes,
            self.gap_warning_rub,
        ))
    }
}

//! Remittance ledger service

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use shared::{
    NewRemittance, Operation, Remittance, RemittancePurpose, RemittanceTotals, RemittanceUpdate,
    Role,
};

use super::authorize;
use crate::error::AppResult;
use crate::store::LedgerStore;

/// Remittance ledger service
#[derive(Clone)]
pub struct RemittanceService {
    store: Arc<dyn LedgerStore>,
}

impl RemittanceService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self, role: Role) -> AppResult<Vec<Remittance>> {
        authorize(role, Operation::ViewRemittances)?;
        self.store.list_remittances().await
    }

    pub async fn get(&self, role: Role, id: Uuid) -> AppResult<Remittance> {
        authorize(role, Operation::ViewRemittances)?;
        self.store.get_remittance(id).await
    }

    /// Record a transfer; the RUB amount is derived and frozen here
    pub async fn create(&self, role: Role, input: NewRemittance) -> AppResult<Remittance> {
        authorize(role, Operation::CreateRemittance)?;
        let remittance = Remittance::from_new(input, Utc::now())?;
        let remittance = self.store.insert_remittance(remittance).await?;
        tracing::info!(
            remittance_id = %remittance.id,
            amount_inr = %remittance.amount_inr,
            rubal_rate = %remittance.rubal_rate,
            amount_rub = %remittance.amount_rub,
            purpose = %remittance.purpose,
            "Remittance recorded"
        );
        Ok(remittance)
    }

    /// One-way sent → confirmed
    pub async fn confirm(&self, role: Role, id: Uuid) -> AppResult<Remittance> {
        authorize(role, Operation::ConfirmRemittance)?;
        let remittance = self.store.confirm_remittance(id, Utc::now()).await?;
        tracing::info!(
            remittance_id = %id,
            amount_rub = %remittance.amount_rub,
            "Remittance confirmed"
        );
        Ok(remittance)
    }

    pub async fn edit(
        &self,
        role: Role,
        id: Uuid,
        update: RemittanceUpdate,
    ) -> AppResult<Remittance> {
        authorize(role, Operation::EditRemittance)?;
        let remittance = self.store.update_remittance(id, update, Utc::now()).await?;
        tracing::info!(
            remittance_id = %id,
            amount_rub = %remittance.amount_rub,
            "Remittance edited"
        );
        Ok(remittance)
    }

    pub async fn delete(&self, role: Role, id: Uuid) -> AppResult<()> {
        authorize(role, Operation::DeleteRemittance)?;
        self.store.delete_remittance(id).await?;
        tracing::info!(remittance_id = %id, "Remittance deleted");
        Ok(())
    }

    /// Σ over confirmed remittances, optionally for one purpose
    pub async fn sum_confirmed(
        &self,
        role: Role,
        purpose: Option<RemittancePurpose>,
    ) -> AppResult<RemittanceTotals> {
        authorize(role, Operation::ViewRemittances)?;
        self.store.sum_confirmed(purpose).await
    }
}

//! Staff payroll service

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use uuid::Uuid;

use shared::{
    NewStaffLedger, Operation, PayrollEntryType, Role, StaffLedger, StaffMutation,
    StaffProfileUpdate,
};

use super::authorize;
use crate::error::{AppError, AppResult};
use crate::store::{LedgerStore, StaffChange};

/// Input for a salary, advance or setup-recovery payment
#[derive(Debug, Deserialize)]
pub struct PaymentInput {
    pub amount: Decimal,
    pub note: Option<String>,
}

/// Input for offsetting an earlier history entry
#[derive(Debug, Deserialize)]
pub struct CompensateInput {
    pub entry_id: Uuid,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SetupCostInput {
    pub amount: Decimal,
}

/// Payroll ledger service
#[derive(Clone)]
pub struct PayrollService {
    store: Arc<dyn LedgerStore>,
}

impl PayrollService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn create_staff(&self, role: Role, input: NewStaffLedger) -> AppResult<StaffLedger> {
        authorize(role, Operation::ManageStaff)?;
        let ledger = StaffLedger::from_new(input, Utc::now())?;
        let ledger = self.store.insert_staff(ledger).await?;
        tracing::info!(staff_id = %ledger.id, staff = %ledger.staff_name, "Staff ledger created");
        Ok(ledger)
    }

    /// Ledgers visible to the caller's role
    pub async fn list_staff(&self, role: Role) -> AppResult<Vec<StaffLedger>> {
        authorize(role, Operation::ViewPayroll)?;
        let ledgers = self.store.list_staff().await?;
        Ok(ledgers
            .into_iter()
            .filter(|l| role.can_see_staff(&l.staff_name))
            .collect())
    }

    pub async fn get_staff(&self, role: Role, id: Uuid) -> AppResult<StaffLedger> {
        authorize(role, Operation::ViewPayroll)?;
        let ledger = self.store.get_staff(id).await?;
        if !role.can_see_staff(&ledger.staff_name) {
            return Err(AppError::NotFound(format!("Staff ledger {}", id)));
        }
        Ok(ledger)
    }

    async fn record(
        &self,
        role: Role,
        id: Uuid,
        entry_type: PayrollEntryType,
        input: PaymentInput,
    ) -> AppResult<StaffChange> {
        authorize(role, Operation::RecordPayroll)?;
        let change = self
            .store
            .mutate_staff(
                id,
                role,
                StaffMutation::Record {
                    entry_type,
                    amount: input.amount,
                    note: input.note,
                    at: Utc::now(),
                },
            )
            .await?;
        tracing::info!(
            staff_id = %id,
            entry_type = entry_type.as_str(),
            amount = %input.amount,
            pending = %change.ledger.pending_balance(),
            "Payroll entry recorded"
        );
        Ok(change)
    }

    pub async fn record_salary_payment(
        &self,
        role: Role,
        id: Uuid,
        input: PaymentInput,
    ) -> AppResult<StaffChange> {
        self.record(role, id, PayrollEntryType::SalaryPaid, input).await
    }

    pub async fn record_advance(
        &self,
        role: Role,
        id: Uuid,
        input: PaymentInput,
    ) -> AppResult<StaffChange> {
        self.record(role, id, PayrollEntryType::AdvanceIssued, input).await
    }

    pub async fn record_setup_recovery(
        &self,
        role: Role,
        id: Uuid,
        input: PaymentInput,
    ) -> AppResult<StaffChange> {
        self.record(role, id, PayrollEntryType::SetupRecovered, input).await
    }

    /// Set the onboarding debt; allowed once
    pub async fn initialize_setup_cost(
        &self,
        role: Role,
        id: Uuid,
        input: SetupCostInput,
    ) -> AppResult<StaffChange> {
        authorize(role, Operation::ManageStaff)?;
        let change = self
            .store
            .mutate_staff(
                id,
                role,
                StaffMutation::InitializeSetupCost {
                    amount: input.amount,
                    at: Utc::now(),
                },
            )
            .await?;
        tracing::info!(staff_id = %id, amount = %input.amount, "Setup cost initialised");
        Ok(change)
    }

    pub async fn compensate(
        &self,
        role: Role,
        id: Uuid,
        input: CompensateInput,
    ) -> AppResult<StaffChange> {
        authorize(role, Operation::ManageStaff)?;
        let change = self
            .store
            .mutate_staff(
                id,
                role,
                StaffMutation::Compensate {
                    entry_id: input.entry_id,
                    note: input.note,
                    at: Utc::now(),
                },
            )
            .await?;
        tracing::info!(
            staff_id = %id,
            compensated_entry = %input.entry_id,
            "Payroll entry compensated"
        );
        Ok(change)
    }

    pub async fn update_profile(
        &self,
        role: Role,
        id: Uuid,
        update: StaffProfileUpdate,
    ) -> AppResult<StaffLedger> {
        authorize(role, Operation::ManageStaff)?;
        let change = self
            .store
            .mutate_staff(
                id,
                role,
                StaffMutation::UpdateProfile {
                    update,
                    at: Utc::now(),
                },
            )
            .await?;
        tracing::info!(staff_id = %id, "Staff profile updated");
        Ok(change.ledger)
    }

    /// Whole-record deletion; the only way history is dropped
    pub async fn delete_staff(&self, role: Role, id: Uuid) -> AppResult<()> {
        authorize(role, Operation::ManageStaff)?;
        self.get_staff(role, id).await?;
        self.store.delete_staff(id).await?;
        tracing::info!(staff_id = %id, "Staff ledger deleted");
        Ok(())
    }
}

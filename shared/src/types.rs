//! Common types used across the platform

use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// Caller roles resolved by the PIN login
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Cook,
}

impl Role {
    /// Operations this role may perform
    pub fn capabilities(&self) -> Vec<Operation> {
        Operation::ALL
            .into_iter()
            .filter(|op| self.can(*op))
            .collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Manager => "manager",
            Role::Cook => "cook",
        }
    }

    /// Capability lookup; every ledger operation re-checks this server side
    pub fn can(&self, operation: Operation) -> bool {
        use Operation::*;
        match self {
            Role::Admin => true,
            Role::Manager => matches!(
                operation,
                ManageItems
                    | RecordPurchase
                    | RecordConsumption
                    | RecordPayroll
                    | ViewPayroll
                    | ViewInventory
                    | ViewRemittances
                    | ViewDashboard
                    | RaiseRequest
                    | FulfillRequest
            ),
            Role::Cook => matches!(
                operation,
                RecordConsumption | ViewPayroll | ViewInventory | RaiseRequest
            ),
        }
    }

    /// Whether a staff ledger is visible to this role.
    ///
    /// Managers do not see other managers' pay; cooks only see cook ledgers.
    pub fn can_see_staff(&self, staff_name: &str) -> bool {
        let name = staff_name.to_lowercase();
        match self {
            Role::Admin => true,
            Role::Manager => !name.contains("manager"),
            Role::Cook => name.contains("cook"),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "manager" => Ok(Role::Manager),
            "cook" => Ok(Role::Cook),
            other => Err(LedgerError::validation(
                "role",
                &format!("unknown role '{}'", other),
            )),
        }
    }
}

/// Operations gated by role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    ManageItems,
    RecordPurchase,
    RecordConsumption,
    AuditStock,
    CreateRemittance,
    EditRemittance,
    DeleteRemittance,
    ConfirmRemittance,
    ViewRemittances,
    ManageStaff,
    RecordPayroll,
    ViewPayroll,
    ViewInventory,
    ViewDashboard,
    RaiseRequest,
    ReviewRequest,
    FulfillRequest,
    ResetData,
}

impl Operation {
    pub const ALL: [Operation; 18] = [
        Operation::ManageItems,
        Operation::RecordPurchase,
        Operation::RecordConsumption,
        Operation::AuditStock,
        Operation::CreateRemittance,
        Operation::EditRemittance,
        Operation::DeleteRemittance,
        Operation::ConfirmRemittance,
        Operation::ViewRemittances,
        Operation::ManageStaff,
        Operation::RecordPayroll,
        Operation::ViewPayroll,
        Operation::ViewInventory,
        Operation::ViewDashboard,
        Operation::RaiseRequest,
        Operation::ReviewRequest,
        Operation::FulfillRequest,
        Operation::ResetData,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::ManageItems => "manage_items",
            Operation::RecordPurchase => "record_purchase",
            Operation::RecordConsumption => "record_consumption",
            Operation::AuditStock => "audit_stock",
            Operation::CreateRemittance => "create_remittance",
            Operation::EditRemittance => "edit_remittance",
            Operation::DeleteRemittance => "delete_remittance",
            Operation::ConfirmRemittance => "confirm_remittance",
            Operation::ViewRemittances => "view_remittances",
            Operation::ManageStaff => "manage_staff",
            Operation::RecordPayroll => "record_payroll",
            Operation::ViewPayroll => "view_payroll",
            Operation::ViewInventory => "view_inventory",
            Operation::ViewDashboard => "view_dashboard",
            Operation::RaiseRequest => "raise_request",
            Operation::ReviewRequest => "review_request",
            Operation::FulfillRequest => "fulfill_request",
            Operation::ResetData => "reset_data",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to an opaque proof blob (invoice photo, transfer screenshot).
///
/// The contents are never inspected; only presence is enforced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ProofReference(String);

impl ProofReference {
    pub fn new(field: &str, value: impl Into<String>) -> LedgerResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(LedgerError::validation(field, "proof image is required"));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

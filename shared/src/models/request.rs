//! Fund and inventory request workflow

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::validation::{normalize_note, validate_positive, validate_required_text};

/// Lifecycle of a request. Requests never touch ledger balances.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Fulfilled,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Rejected => "rejected",
            RequestStatus::Fulfilled => "fulfilled",
        }
    }

    pub fn can_transition_to(&self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Approved, RequestStatus::Fulfilled)
                | (RequestStatus::Approved, RequestStatus::Rejected)
        )
    }

    pub fn transition(self, next: RequestStatus) -> LedgerResult<RequestStatus> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(LedgerError::InvalidState(format!(
                "cannot move request from {} to {}",
                self.as_str(),
                next.as_str()
            )))
        }
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "rejected" => Ok(RequestStatus::Rejected),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            other => Err(LedgerError::validation(
                "status",
                &format!("unknown request status '{}'", other),
            )),
        }
    }
}

/// Request for money to be sent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FundRequest {
    pub id: Uuid,
    pub amount_rub: Decimal,
    pub purpose: String,
    pub requested_by: String,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub date_requested: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewFundRequest {
    pub amount_rub: Decimal,
    pub purpose: String,
    pub notes: Option<String>,
}

impl FundRequest {
    pub fn from_new(input: NewFundRequest, requested_by: &str, now: DateTime<Utc>) -> LedgerResult<Self> {
        validate_positive("amount_rub", input.amount_rub)?;
        Ok(Self {
            id: Uuid::new_v4(),
            amount_rub: input.amount_rub,
            purpose: validate_required_text("purpose", &input.purpose)?,
            requested_by: requested_by.to_string(),
            status: RequestStatus::Pending,
            notes: normalize_note(input.notes),
            date_requested: now,
            updated_at: now,
        })
    }

    pub fn advance(&mut self, next: RequestStatus, now: DateTime<Utc>) -> LedgerResult<()> {
        self.status = self.status.transition(next)?;
        self.updated_at = now;
        Ok(())
    }
}

/// Request for stock to be bought
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryRequest {
    pub id: Uuid,
    pub item_name: String,
    pub quantity_needed: Decimal,
    pub unit: String,
    pub requested_by: String,
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub date_requested: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryRequest {
    pub item_name: String,
    pub quantity_needed: Decimal,
    pub unit: String,
    pub notes: Option<String>,
}

impl InventoryRequest {
    pub fn from_new(
        input: NewInventoryRequest,
        requested_by: &str,
        now: DateTime<Utc>,
    ) -> LedgerResult<Self> {
        validate_positive("quantity_needed", input.quantity_needed)?;
        Ok(Self {
            id: Uuid::new_v4(),
            item_name: validate_required_text("item_name", &input.item_name)?,
            quantity_needed: input.quantity_needed,
            unit: validate_required_text("unit", &input.unit)?,
            requested_by: requested_by.to_string(),
            status: RequestStatus::Pending,
            notes: normalize_note(input.notes),
            date_requested: now,
            updated_at: now,
        })
    }

    pub fn advance(&mut self, next: RequestStatus, now: DateTime<Utc>) -> LedgerResult<()> {
        self.status = self.status.transition(next)?;
        self.updated_at = now;
        Ok(())
    }
}

//! Dashboard inputs owned by the wider system: income and meal contracts

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Active,
    Paused,
    Ended,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Active => "active",
            ContractStatus::Paused => "paused",
            ContractStatus::Ended => "ended",
        }
    }
}

impl std::str::FromStr for ContractStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ContractStatus::Active),
            "paused" => Ok(ContractStatus::Paused),
            "ended" => Ok(ContractStatus::Ended),
            other => Err(LedgerError::validation(
                "status",
                &format!("unknown contract status '{}'", other),
            )),
        }
    }
}

/// A student's meal subscription
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealContract {
    pub id: Uuid,
    pub student_name: String,
    pub monthly_fee_inr: Decimal,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl MealContract {
    /// Active status and not yet ended on `day`
    pub fn is_active_on(&self, day: NaiveDate) -> bool {
        self.status == ContractStatus::Active && self.end_date >= day
    }
}

/// Money received in India
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Income {
    pub id: Uuid,
    pub amount_inr: Decimal,
    pub source: String,
    pub date: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contract(status: ContractStatus, end: NaiveDate) -> MealContract {
        MealContract {
            id: Uuid::new_v4(),
            student_name: "Arjun".into(),
            monthly_fee_inr: Decimal::new(9000, 0),
            status,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: end,
        }
    }

    #[test]
    fn test_active_on() {
        let today = NaiveDate::from_ymd_opt(2026, 6, 1).unwrap();
        assert!(contract(ContractStatus::Active, today).is_active_on(today));
        assert!(!contract(ContractStatus::Active, today.pred_opt().unwrap()).is_active_on(today));
        assert!(!contract(ContractStatus::Paused, today).is_active_on(today));
    }
}

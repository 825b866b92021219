//! Staff payroll ledger
//!
//! Cumulative totals only grow through recorded entries. History is
//! append-only: a wrong entry is offset by a compensating entry, never edited.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{LedgerError, LedgerResult};
use crate::validation::{
    normalize_note, validate_non_negative, validate_positive, validate_required_text,
};

/// Kind of payroll movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PayrollEntryType {
    SalaryPaid,
    AdvanceIssued,
    SetupRecovered,
}

impl PayrollEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayrollEntryType::SalaryPaid => "salary_paid",
            PayrollEntryType::AdvanceIssued => "advance_issued",
            PayrollEntryType::SetupRecovered => "setup_recovered",
        }
    }
}

impl std::str::FromStr for PayrollEntryType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "salary_paid" => Ok(PayrollEntryType::SalaryPaid),
            "advance_issued" => Ok(PayrollEntryType::AdvanceIssued),
            "setup_recovered" => Ok(PayrollEntryType::SetupRecovered),
            other => Err(LedgerError::validation(
                "entry_type",
                &format!("unknown payroll entry type '{}'", other),
            )),
        }
    }
}

/// One line of a staff member's payroll history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PayrollEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    /// Negative only for compensating entries
    pub amount: Decimal,
    pub entry_type: PayrollEntryType,
    pub note: Option<String>,
    /// The entry this one offsets, if it is a correction
    pub compensates: Option<Uuid>,
}

impl PayrollEntry {
    pub fn is_compensation(&self) -> bool {
        self.compensates.is_some()
    }
}

/// monthly salary − (salary paid + advances + setup recovered)
pub fn pending_balance(
    monthly_salary_rub: Decimal,
    salary_paid_rub: Decimal,
    advances_rub: Decimal,
    setup_cost_paid_rub: Decimal,
) -> Decimal {
    monthly_salary_rub - (salary_paid_rub + advances_rub + setup_cost_paid_rub)
}

/// Per-staff payroll ledger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StaffLedger {
    pub id: Uuid,
    pub staff_name: String,
    pub monthly_salary_rub: Decimal,
    pub salary_paid_rub: Decimal,
    pub advances_rub: Decimal,
    /// Onboarding cost (visa, travel) fronted by the business; set once
    pub setup_cost_owed_rub: Decimal,
    pub setup_cost_paid_rub: Decimal,
    pub history: Vec<PayrollEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for opening a staff ledger
#[derive(Debug, Clone, Deserialize)]
pub struct NewStaffLedger {
    pub staff_name: String,
    pub monthly_salary_rub: Decimal,
    pub setup_cost_owed_rub: Option<Decimal>,
}

/// Editable profile fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StaffProfileUpdate {
    pub staff_name: Option<String>,
    pub monthly_salary_rub: Option<Decimal>,
}

/// A single atomic change to a staff ledger
#[derive(Debug, Clone)]
pub enum StaffMutation {
    Record {
        entry_type: PayrollEntryType,
        amount: Decimal,
        note: Option<String>,
        at: DateTime<Utc>,
    },
    Compensate {
        entry_id: Uuid,
        note: Option<String>,
        at: DateTime<Utc>,
    },
    InitializeSetupCost {
        amount: Decimal,
        at: DateTime<Utc>,
    },
    UpdateProfile {
        update: StaffProfileUpdate,
        at: DateTime<Utc>,
    },
}

impl StaffLedger {
    pub fn from_new(input: NewStaffLedger, now: DateTime<Utc>) -> LedgerResult<Self> {
        let staff_name = validate_required_text("staff_name", &input.staff_name)?;
        validate_positive("monthly_salary_rub", input.monthly_salary_rub)?;
        let setup_cost_owed_rub = input.setup_cost_owed_rub.unwrap_or(Decimal::ZERO);
        validate_non_negative("setup_cost_owed_rub", setup_cost_owed_rub)?;

        Ok(Self {
            id: Uuid::new_v4(),
            staff_name,
            monthly_salary_rub: input.monthly_salary_rub,
            salary_paid_rub: Decimal::ZERO,
            advances_rub: Decimal::ZERO,
            setup_cost_owed_rub,
            setup_cost_paid_rub: Decimal::ZERO,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn pending_balance(&self) -> Decimal {
        pending_balance(
            self.monthly_salary_rub,
            self.salary_paid_rub,
            self.advances_rub,
            self.setup_cost_paid_rub,
        )
    }

    pub fn setup_owed_remaining(&self) -> Decimal {
        self.setup_cost_owed_rub - self.setup_cost_paid_rub
    }

    fn cumulative_mut(&mut self, entry_type: PayrollEntryType) -> &mut Decimal {
        match entry_type {
            PayrollEntryType::SalaryPaid => &mut self.salary_paid_rub,
            PayrollEntryType::AdvanceIssued => &mut self.advances_rub,
            PayrollEntryType::SetupRecovered => &mut self.setup_cost_paid_rub,
        }
    }

    /// Increment the matching cumulative field and append to history
    pub fn record(
        &mut self,
        entry_type: PayrollEntryType,
        amount: Decimal,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<PayrollEntry> {
        validate_positive("amount", amount)?;

        let entry = PayrollEntry {
            id: Uuid::new_v4(),
            date: at,
            amount,
            entry_type,
            note: normalize_note(note),
            compensates: None,
        };
        *self.cumulative_mut(entry_type) += amount;
        self.history.push(entry.clone());
        self.updated_at = at;
        Ok(entry)
    }

    pub fn record_salary_payment(
        &mut self,
        amount: Decimal,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<PayrollEntry> {
        self.record(PayrollEntryType::SalaryPaid, amount, note, at)
    }

    pub fn record_advance(
        &mut self,
        amount: Decimal,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<PayrollEntry> {
        self.record(PayrollEntryType::AdvanceIssued, amount, note, at)
    }

    pub fn record_setup_recovery(
        &mut self,
        amount: Decimal,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<PayrollEntry> {
        self.record(PayrollEntryType::SetupRecovered, amount, note, at)
    }

    /// Offset an earlier entry with a negative, cross-referenced entry.
    ///
    /// Each entry can be offset once and corrections themselves cannot be
    /// offset.
    pub fn compensate(
        &mut self,
        entry_id: Uuid,
        note: Option<String>,
        at: DateTime<Utc>,
    ) -> LedgerResult<PayrollEntry> {
        let original = self
            .history
            .iter()
            .find(|e| e.id == entry_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("Payroll entry {}", entry_id)))?;

        if original.is_compensation() {
            return Err(LedgerError::InvalidState(
                "a compensating entry cannot itself be compensated".to_string(),
            ));
        }
        if self.history.iter().any(|e| e.compensates == Some(entry_id)) {
            return Err(LedgerError::InvalidState(format!(
                "payroll entry {} has already been compensated",
                entry_id
            )));
        }

        let entry = PayrollEntry {
            id: Uuid::new_v4(),
            date: at,
            amount: -original.amount,
            entry_type: original.entry_type,
            note: normalize_note(note),
            compensates: Some(entry_id),
        };
        *self.cumulative_mut(original.entry_type) -= original.amount;
        self.history.push(entry.clone());
        self.updated_at = at;
        Ok(entry)
    }

    /// Set the setup cost owed. Allowed once, while nothing is owed yet.
    pub fn initialize_setup_cost(&mut self, amount: Decimal, at: DateTime<Utc>) -> LedgerResult<()> {
        validate_positive("setup_cost_owed_rub", amount)?;
        if !self.setup_cost_owed_rub.is_zero() {
            return Err(LedgerError::InvalidState(format!(
                "setup cost for {} is already set",
                self.staff_name
            )));
        }
        self.setup_cost_owed_rub = amount;
        self.updated_at = at;
        Ok(())
    }

    pub fn update_profile(&mut self, update: StaffProfileUpdate, at: DateTime<Utc>) -> LedgerResult<()> {
        let name = update
            .staff_name
            .map(|n| validate_required_text("staff_name", &n))
            .transpose()?;
        if let Some(salary) = update.monthly_salary_rub {
            validate_positive("monthly_salary_rub", salary)?;
        }

        if let Some(name) = name {
            self.staff_name = name;
        }
        if let Some(salary) = update.monthly_salary_rub {
            self.monthly_salary_rub = salary;
        }
        self.updated_at = at;
        Ok(())
    }

    /// Apply one mutation; returns the history entry it appended, if any
    pub fn apply(&mut self, mutation: StaffMutation) -> LedgerResult<Option<PayrollEntry>> {
        match mutation {
            StaffMutation::Record {
                entry_type,
                amount,
                note,
                at,
            } => self.record(entry_type, amount, note, at).map(Some),
            StaffMutation::Compensate { entry_id, note, at } => {
                self.compensate(entry_id, note, at).map(Some)
            }
            StaffMutation::InitializeSetupCost { amount, at } => {
                self.initialize_setup_cost(amount, at).map(|_| None)
            }
            StaffMutation::UpdateProfile { update, at } => {
                self.update_profile(update, at).map(|_| None)
            }
        }
    }
}

/// Totals across all staff
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PayrollTotals {
    pub salary_paid_rub: Decimal,
    pub pending_rub: Decimal,
    pub staff_count: i64,
}

pub fn payroll_totals(ledgers: &[StaffLedger]) -> PayrollTotals {
    ledgers
        .iter()
        .fold(PayrollTotals::default(), |mut acc, ledger| {
            acc.salary_paid_rub += ledger.salary_paid_rub;
            acc.pending_rub += ledger.pending_balance();
            acc.staff_count += 1;
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn ledger(salary: &str, setup: Option<&str>) -> StaffLedger {
        StaffLedger::from_new(
            NewStaffLedger {
                staff_name: "Cook Olga".into(),
                monthly_salary_rub: dec(salary),
                setup_cost_owed_rub: setup.map(dec),
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_pending_balance_after_three_entries() {
        let mut l = ledger("5000", Some("2000"));
        let now = Utc::now();
        l.record_salary_payment(dec("1000"), None, now).unwrap();
        l.record_advance(dec("200"), Some("festival".into()), now).unwrap();
        l.record_setup_recovery(dec("300"), None, now).unwrap();

        assert_eq!(l.pending_balance(), dec("3500"));
        assert_eq!(l.setup_owed_remaining(), dec("1700"));
        assert_eq!(l.history.len(), 3);
        assert_eq!(l.history[1].entry_type, PayrollEntryType::AdvanceIssued);
    }

    #[test]
    fn test_non_positive_amount_rejected() {
        let mut l = ledger("5000", None);
        let now = Utc::now();
        assert!(l.record_salary_payment(Decimal::ZERO, None, now).is_err());
        assert!(l.record_advance(dec("-5"), None, now).is_err());
        assert!(l.history.is_empty());
        assert_eq!(l.pending_balance(), dec("5000"));
    }

    #[test]
    fn test_setup_cost_set_once() {
        let mut l = ledger("5000", None);
        let now = Utc::now();
        l.initialize_setup_cost(dec("10000"), now).unwrap();
        assert_eq!(l.setup_cost_owed_rub, dec("10000"));
        assert!(matches!(
            l.initialize_setup_cost(dec("5"), now),
            Err(LedgerError::InvalidState(_))
        ));

        let mut preset = ledger("5000", Some("800"));
        assert!(preset.initialize_setup_cost(dec("900"), now).is_err());
    }

    #[test]
    fn test_compensation_offsets_entry() {
        let mut l = ledger("5000", None);
        let now = Utc::now();
        let wrong = l.record_salary_payment(dec("1000"), None, now).unwrap();

        let fix = l.compensate(wrong.id, Some("typo".into()), now).unwrap();
        assert_eq!(fix.amount, dec("-1000"));
        assert_eq!(fix.compensates, Some(wrong.id));
        assert_eq!(l.salary_paid_rub, Decimal::ZERO);
        assert_eq!(l.history.len(), 2);

        assert!(matches!(
            l.compensate(wrong.id, None, now),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            l.compensate(fix.id, None, now),
            Err(LedgerError::InvalidState(_))
        ));
        assert!(matches!(
            l.compensate(Uuid::new_v4(), None, now),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_profile_update_keeps_setup_cost() {
        let mut l = ledger("5000", Some("2000"));
        l.apply(StaffMutation::UpdateProfile {
            update: StaffProfileUpdate {
                staff_name: Some("Cook Olga P.".into()),
                monthly_salary_rub: Some(dec("6000")),
            },
            at: Utc::now(),
        })
        .unwrap();
        assert_eq!(l.staff_name, "Cook Olga P.");
        assert_eq!(l.monthly_salary_rub, dec("6000"));
        assert_eq!(l.setup_cost_owed_rub, dec("2000"));
    }

    #[test]
    fn test_totals() {
        let now = Utc::now();
        let mut a = ledger("5000", None);
        a.record_salary_payment(dec("1000"), None, now).unwrap();
        let mut b = ledger("3000", None);
        b.record_advance(dec("500"), None, now).unwrap();

        let totals = payroll_totals(&[a, b]);
        assert_eq!(totals.salary_paid_rub, dec("1000"));
        assert_eq!(totals.pending_rub, dec("6500"));
        assert_eq!(totals.staff_count, 2);
    }
}

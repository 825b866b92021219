//! Remittance models: INR sent from India, received as RUB in Russia

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::currency::ConversionSnapshot;
use crate::error::{LedgerError, LedgerResult};
use crate::types::ProofReference;
use crate::validation::{normalize_note, require, validate_required_text};

/// What the money was sent for
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum RemittancePurpose {
    Groceries,
    Salary,
    Advance,
    Emergency,
}

impl RemittancePurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemittancePurpose::Groceries => "Groceries",
            RemittancePurpose::Salary => "Salary",
            RemittancePurpose::Advance => "Advance",
            RemittancePurpose::Emergency => "Emergency",
        }
    }
}

impl std::fmt::Display for RemittancePurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RemittancePurpose {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Groceries" => Ok(RemittancePurpose::Groceries),
            "Salary" => Ok(RemittancePurpose::Salary),
            "Advance" => Ok(RemittancePurpose::Advance),
            "Emergency" => Ok(RemittancePurpose::Emergency),
            other => Err(LedgerError::validation(
                "purpose",
                &format!("unknown purpose '{}'", other),
            )),
        }
    }
}

/// Transfer status; moves one way from sent to confirmed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum RemittanceStatus {
    Sent,
    Confirmed,
}

impl RemittanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RemittanceStatus::Sent => "sent",
            RemittanceStatus::Confirmed => "confirmed",
        }
    }
}

impl std::str::FromStr for RemittanceStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sent" => Ok(RemittanceStatus::Sent),
            "confirmed" => Ok(RemittanceStatus::Confirmed),
            other => Err(LedgerError::validation(
                "status",
                &format!("unknown remittance status '{}'", other),
            )),
        }
    }
}

/// A recorded money transfer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Remittance {
    pub id: Uuid,
    pub amount_inr: Decimal,
    /// RUB per INR used for this transfer
    pub rubal_rate: Decimal,
    /// `amount_inr * rubal_rate`, frozen at write time
    pub amount_rub: Decimal,
    pub sent_to: String,
    pub purpose: RemittancePurpose,
    pub status: RemittanceStatus,
    pub proof_image_url: String,
    pub notes: Option<String>,
    pub date: DateTime<Utc>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording a remittance
#[derive(Debug, Clone, Deserialize)]
pub struct NewRemittance {
    pub amount_inr: Decimal,
    pub rubal_rate: Decimal,
    pub sent_to: String,
    pub purpose: RemittancePurpose,
    pub proof_image_url: Option<String>,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

/// Partial edit of a remittance; status is changed only by confirmation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemittanceUpdate {
    pub amount_inr: Option<Decimal>,
    pub rubal_rate: Option<Decimal>,
    pub sent_to: Option<String>,
    pub purpose: Option<RemittancePurpose>,
    pub proof_image_url: Option<String>,
    pub notes: Option<String>,
    pub date: Option<DateTime<Utc>>,
}

impl Remittance {
    pub fn from_new(input: NewRemittance, now: DateTime<Utc>) -> LedgerResult<Self> {
        let snapshot = ConversionSnapshot::take(input.amount_inr, input.rubal_rate)?;
        let sent_to = validate_required_text("sent_to", &input.sent_to)?;
        let proof = ProofReference::new(
            "proof_image_url",
            require("proof_image_url", input.proof_image_url)?,
        )?;

        Ok(Self {
            id: Uuid::new_v4(),
            amount_inr: snapshot.amount_inr,
            rubal_rate: snapshot.rate,
            amount_rub: snapshot.amount_rub,
            sent_to,
            purpose: input.purpose,
            status: RemittanceStatus::Sent,
            proof_image_url: proof.into_inner(),
            notes: normalize_note(input.notes),
            date: input.date.unwrap_or(now),
            confirmed_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_confirmed(&self) -> bool {
        self.status == RemittanceStatus::Confirmed
    }

    /// One-way transition to confirmed
    pub fn confirm(&mut self, now: DateTime<Utc>) -> LedgerResult<()> {
        if self.is_confirmed() {
            return Err(LedgerError::InvalidState(format!(
                "remittance {} is already confirmed",
                self.id
            )));
        }
        self.status = RemittanceStatus::Confirmed;
        self.confirmed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Apply an edit. The RUB amount is recomputed from the stored amount and
    /// rate whenever either of them changes.
    pub fn apply_update(&mut self, update: RemittanceUpdate, now: DateTime<Utc>) -> LedgerResult<()> {
        let snapshot = ConversionSnapshot::take(
            update.amount_inr.unwrap_or(self.amount_inr),
            update.rubal_rate.unwrap_or(self.rubal_rate),
        )?;
        let sent_to = update
            .sent_to
            .map(|s| validate_required_text("sent_to", &s))
            .transpose()?;
        let proof = update
            .proof_image_url
            .map(|p| ProofReference::new("proof_image_url", p))
            .transpose()?;

        self.amount_inr = snapshot.amount_inr;
        self.rubal_rate = snapshot.rate;
        self.amount_rub = snapshot.amount_rub;
        if let Some(sent_to) = sent_to {
            self.sent_to = sent_to;
        }
        if let Some(purpose) = update.purpose {
            self.purpose = purpose;
        }
        if let Some(proof) = proof {
            self.proof_image_url = proof.into_inner();
        }
        if update.notes.is_some() {
            self.notes = normalize_note(update.notes);
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn snapshot(&self) -> ConversionSnapshot {
        ConversionSnapshot {
            amount_inr: self.amount_inr,
            rate: self.rubal_rate,
            amount_rub: self.amount_rub,
        }
    }
}

/// Sums over a set of remittances
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemittanceTotals {
    pub amount_inr: Decimal,
    pub amount_rub: Decimal,
    pub count: i64,
}

/// Sum confirmed remittances, optionally restricted to one purpose
pub fn sum_confirmed<'a, I>(remittances: I, purpose: Option<RemittancePurpose>) -> RemittanceTotals
where
    I: IntoIterator<Item = &'a Remittance>,
{
    remittances
        .into_iter()
        .filter(|r| r.is_confirmed())
        .filter(|r| purpose.map_or(true, |p| r.purpose == p))
        .fold(RemittanceTotals::default(), |mut acc, r| {
            acc.amount_inr += r.amount_inr;
            acc.amount_rub += r.amount_rub;
            acc.count += 1;
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

    fn new_remittance(inr: &str, rate: &str, purpose: RemittancePurpose) -> Remittance {
        Remittance::from_new(
            NewRemittance {
                amount_inr: dec(inr),
                rubal_rate: dec(rate),
                sent_to: "Olga".into(),
                purpose,
                proof_image_url: Some("proof.png".into()),
                notes: None,
                date: None,
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn test_amount_rub_derived_at_write() {
        let r = new_remittance("1000", "0.9", RemittancePurpose::Groceries);
        assert_eq!(r.amount_rub, dec("900"));
        assert_eq!(r.status, RemittanceStatus::Sent);
        assert!(r.snapshot().is_consistent());
    }

    #[test]
    fn test_proof_required() {
        let result = Remittance::from_new(
            NewRemittance {
                amount_inr: dec("1000"),
                rubal_rate: dec("0.9"),
                sent_to: "Olga".into(),
                purpose: RemittancePurpose::Salary,
                proof_image_url: None,
                notes: None,
                date: None,
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(LedgerError::Validation { .. })));
    }

    #[test]
    fn test_confirm_is_one_way() {
        let mut r = new_remittance("1000", "0.9", RemittancePurpose::Groceries);
        r.confirm(Utc::now()).unwrap();
        assert!(r.is_confirmed());
        assert!(r.confirmed_at.is_some());
        assert!(matches!(r.confirm(Utc::now()), Err(LedgerError::InvalidState(_))));
    }

    #[test]
    fn test_edit_recomputes_rub() {
        let mut r = new_remittance("1000", "0.9", RemittancePurpose::Groceries);
        r.apply_update(
            RemittanceUpdate {
                rubal_rate: Some(dec("1.1")),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(r.amount_rub, dec("1100"));

        r.apply_update(
            RemittanceUpdate {
                amount_inr: Some(dec("2000")),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(r.amount_rub, dec("2200"));
    }

    #[test]
    fn test_invalid_edit_is_rejected_whole() {
        let mut r = new_remittance("1000", "0.9", RemittancePurpose::Groceries);
        let before = r.clone();
        let result = r.apply_update(
            RemittanceUpdate {
                purpose: Some(RemittancePurpose::Salary),
                rubal_rate: Some(Decimal::ZERO),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(result.is_err());
        assert_eq!(r, before);
    }

    #[test]
    fn test_sum_confirmed_by_purpose() {
        let mut groceries = new_remittance("1000", "0.9", RemittancePurpose::Groceries);
        let mut salary = new_remittance("500", "1", RemittancePurpose::Salary);
        let unconfirmed = new_remittance("700", "1", RemittancePurpose::Groceries);
        groceries.confirm(Utc::now()).unwrap();
        salary.confirm(Utc::now()).unwrap();
        let all = vec![groceries, salary, unconfirmed];

        let grocery = sum_confirmed(&all, Some(RemittancePurpose::Groceries));
        assert_eq!(grocery.amount_rub, dec("900"));
        assert_eq!(grocery.count, 1);

        let total = sum_confirmed(&all, None);
        assert_eq!(total.amount_inr, dec("1500"));
        assert_eq!(total.amount_rub, dec("1400"));
    }

    #[test]
    fn test_purpose_wire_names() {
        assert_eq!(
            serde_json::to_string(&RemittancePurpose::Groceries).unwrap(),
            "\"Groceries\""
        );
        assert_eq!(
            RemittancePurpose::from_str("Emergency").unwrap(),
            RemittancePurpose::Emergency
        );
        assert_eq!(serde_json::to_string(&RemittanceStatus::Sent).unwrap(), "\"sent\"");
    }
}

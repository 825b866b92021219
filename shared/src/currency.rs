//! INR/RUB conversion with an explicitly supplied rate

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// The two currencies the business moves money between
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Inr,
    Rub,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Inr => "INR",
            Currency::Rub => "RUB",
        }
    }
}

/// Roubles received per one rupee
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    pub fn new(rub_per_inr: Decimal) -> LedgerResult<Self> {
        if rub_per_inr <= Decimal::ZERO {
            return Err(LedgerError::validation(
                "rubal_rate",
                "exchange rate must be positive",
            ));
        }
        Ok(Self(rub_per_inr))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

/// Convert rupees to roubles
pub fn convert_inr_to_rub(amount_inr: Decimal, rate: ExchangeRate) -> Decimal {
    amount_inr * rate.0
}

/// Convert roubles back to rupees
pub fn convert_rub_to_inr(amount_rub: Decimal, rate: ExchangeRate) -> Decimal {
    amount_rub / rate.0
}

/// A conversion frozen at write time together with the rate that produced it
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversionSnapshot {
    pub amount_inr: Decimal,
    pub rate: Decimal,
    pub amount_rub: Decimal,
}

impl ConversionSnapshot {
    pub fn take(amount_inr: Decimal, rate: Decimal) -> LedgerResult<Self> {
        if amount_inr <= Decimal::ZERO {
            return Err(LedgerError::validation(
                "amount_inr",
                "amount must be positive",
            ));
        }
        let rate = ExchangeRate::new(rate)?;
        Ok(Self {
            amount_inr,
            rate: rate.value(),
            amount_rub: convert_inr_to_rub(amount_inr, rate),
        })
    }

    /// Whether the stored result still matches its inputs
    pub fn is_consistent(&self) -> bool {
        self.amount_inr * self.rate == self.amount_rub
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_inr_to_rub() {
        let rate = ExchangeRate::new(dec("0.9")).unwrap();
        assert_eq!(convert_inr_to_rub(dec("1000"), rate), dec("900"));
    }

    #[test]
    fn test_rub_to_inr() {
        let rate = ExchangeRate::new(dec("1.25")).unwrap();
        assert_eq!(convert_rub_to_inr(dec("500"), rate), dec("400"));
    }

    #[test]
    fn test_rate_must_be_positive() {
        assert!(ExchangeRate::new(Decimal::ZERO).is_err());
        assert!(ExchangeRate::new(dec("-1.1")).is_err());
    }

    #[test]
    fn test_snapshot_rejects_non_positive_amount() {
        assert!(ConversionSnapshot::take(Decimal::ZERO, dec("0.9")).is_err());
        assert!(ConversionSnapshot::take(dec("100"), Decimal::ZERO).is_err());
    }

    #[test]
    fn test_snapshot_keeps_rate() {
        let snap = ConversionSnapshot::take(dec("1000"), dec("0.9")).unwrap();
        assert_eq!(snap.rate, dec("0.9"));
        assert_eq!(snap.amount_rub, dec("900"));
        assert!(snap.is_consistent());
    }

    #[test]
    fn test_currency_codes() {
        assert_eq!(Currency::Inr.code(), "INR");
        assert_eq!(Currency::Rub.code(), "RUB");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Converting is exact multiplication with the supplied rate
        #[test]
        fn prop_snapshot_is_deterministic(
            inr in 1i64..=10_000_000i64,
            rate in 1i64..=100_000i64
        ) {
            let amount = Decimal::new(inr, 2);
            let rate = Decimal::new(rate, 4);
            let first = ConversionSnapshot::take(amount, rate).unwrap();
            let second = ConversionSnapshot::take(amount, rate).unwrap();
            prop_assert_eq!(first, second);
            prop_assert!(first.is_consistent());
        }
    }
}

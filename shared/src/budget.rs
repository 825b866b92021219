//! Procurement budget derivation
//!
//! Recomputed from the ledgers on every read; nothing here is cached.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Reading of the procurement gap against the idle-cash threshold
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BudgetStatus {
    /// More was spent than was sent for groceries
    Overspent,
    /// Unspent grocery cash above the warning threshold
    Idle,
    Balanced,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub grocery_remitted_rub: Decimal,
    /// All purchases, whatever remittance they link to
    pub total_purchased_rub: Decimal,
    pub procurement_gap_rub: Decimal,
    /// Informational: purchases linked to non-grocery remittances
    pub purchases_linked_to_other_purposes_rub: Decimal,
    pub status: BudgetStatus,
}

impl BudgetSnapshot {
    pub fn from_totals(
        grocery_remitted_rub: Decimal,
        total_purchased_rub: Decimal,
        purchases_linked_to_other_purposes_rub: Decimal,
        gap_warning_rub: Decimal,
    ) -> Self {
        let procurement_gap_rub = grocery_remitted_rub - total_purchased_rub;
        let status = if procurement_gap_rub < Decimal::ZERO {
            BudgetStatus::Overspent
        } else if procurement_gap_rub > gap_warning_rub {
            BudgetStatus::Idle
        } else {
            BudgetStatus::Balanced
        };

        Self {
            grocery_remitted_rub,
            total_purchased_rub,
            procurement_gap_rub,
            purchases_linked_to_other_purposes_rub,
            status,
        }
    }
}

/// Rolling purchase cost per active contract per day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CostMetric {
    pub window_days: i64,
    pub window_purchases_rub: Decimal,
    pub active_contracts: i64,
    pub cost_per_contract_per_day_rub: Decimal,
}

impl CostMetric {
    /// Zero when there are no active contracts or the window is empty
    pub fn compute(window_purchases_rub: Decimal, window_days: i64, active_contracts: i64) -> Self {
        let cost = if active_contracts > 0 && window_days > 0 {
            window_purchases_rub / Decimal::from(window_days) / Decimal::from(active_contracts)
        } else {
            Decimal::ZERO
        };
        Self {
            window_days,
            window_purchases_rub,
            active_contracts,
            cost_per_contract_per_day_rub: cost,
        }
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
    fn test_gap_statuses() {
        let threshold = dec("50000");
        assert_eq!(
            BudgetSnapshot::from_totals(dec("1000"), dec("1100"), Decimal::ZERO, threshold).status,
            BudgetStatus::Overspent
        );
        assert_eq!(
            BudgetSnapshot::from_totals(dec("60000"), dec("1000"), Decimal::ZERO, threshold).status,
            BudgetStatus::Idle
        );
        assert_eq!(
            BudgetSnapshot::from_totals(dec("51000"), dec("1000"), Decimal::ZERO, threshold).status,
            BudgetStatus::Balanced
        );
    }

    #[test]
    fn test_cost_metric() {
        let m = CostMetric::compute(dec("24000"), 30, 2);
        assert_eq!(m.cost_per_contract_per_day_rub, dec("400"));
        assert_eq!(CostMetric::compute(dec("24000"), 30, 0).cost_per_contract_per_day_rub, Decimal::ZERO);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_gap_is_difference(r in 0i64..1_000_000, c in 0i64..1_000_000) {
            let snap = BudgetSnapshot::from_totals(
                Decimal::from(r),
                Decimal::from(c),
                Decimal::ZERO,
                Decimal::from(50_000),
            );
            prop_assert_eq!(snap.procurement_gap_rub, Decimal::from(r - c));
        }
    }
}

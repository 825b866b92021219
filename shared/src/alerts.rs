//! Alert derivation over the stock, budget and cost readings

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::{BudgetSnapshot, CostMetric};
use crate::models::InventoryItem;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Danger,
    Warning,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    LowStock,
    IdleGroceryCash,
    PurchasesExceedRemittances,
    HighCostPerContract,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: AlertSeverity,
    pub message: String,
    /// Item names for low-stock alerts
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub items: Vec<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AlertThresholds {
    pub procurement_gap_warning_rub: Decimal,
    pub cost_per_contract_day_warning_rub: Decimal,
    pub cost_window_days: i64,
}

impl Default for AlertThresholds {
    fn default() -> Self {
        Self {
            procurement_gap_warning_rub: Decimal::from(50_000),
            cost_per_contract_day_warning_rub: Decimal::from(400),
            cost_window_days: 30,
        }
    }
}

/// Evaluate every rule and rank the result, danger first.
pub fn derive_alerts(
    items: &[InventoryItem],
    budget: &BudgetSnapshot,
    cost: &CostMetric,
    thresholds: &AlertThresholds,
) -> Vec<Alert> {
    let mut alerts = Vec::new();

    let low: Vec<String> = items
        .iter()
        .filter(|i| i.is_below_threshold())
        .map(|i| i.name.clone())
        .collect();
    if !low.is_empty() {
        alerts.push(Alert {
            kind: AlertKind::LowStock,
            severity: AlertSeverity::Danger,
            message: format!("{} items are below minimum stock thresholds.", low.len()),
            items: low,
        });
    }

    let gap = budget.procurement_gap_rub;
    if gap > thresholds.procurement_gap_warning_rub {
        alerts.push(Alert {
            kind: AlertKind::IdleGroceryCash,
            severity: AlertSeverity::Warning,
            message: format!(
                "High unspent grocery cash: {} RUB remains un-invoiced.",
                gap.normalize()
            ),
            items: Vec::new(),
        });
    }
    if gap < Decimal::ZERO {
        alerts.push(Alert {
            kind: AlertKind::PurchasesExceedRemittances,
            severity: AlertSeverity::Danger,
            message: format!(
                "Fraud alert: Recorded purchases exceed sent remittances by {} RUB.",
                gap.abs().normalize()
            ),
            items: Vec::new(),
        });
    }

    if cost.cost_per_contract_per_day_rub > thresholds.cost_per_contract_day_warning_rub {
        alerts.push(Alert {
            kind: AlertKind::HighCostPerContract,
            severity: AlertSeverity::Warning,
            message: format!(
                "High cost anomaly: {} RUB per student per day over last {} days.",
                cost.cost_per_contract_per_day_rub.round(),
                cost.window_days
            ),
            items: Vec::new(),
        });
    }

    // stable: rule order is kept within a severity
    alerts.sort_by_key(|a| a.severity);
    alerts
}

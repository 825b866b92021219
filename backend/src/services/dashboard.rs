//! Dashboard read model

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::{
    derive_alerts, merge_recent, payroll_totals, ActivityEntry, Alert, AlertThresholds,
    BudgetSnapshot, CostMetric, InventoryItem, Operation, RemittancePurpose, Role,
};

use super::authorize;
use crate::config::DashboardConfig;
use crate::error::AppResult;
use crate::store::LedgerStore;

#[derive(Debug, Clone, Serialize)]
pub struct DashboardKpis {
    pub total_income_inr: Decimal,
    pub total_remittance_sent_inr: Decimal,
    pub total_remittance_received_rub: Decimal,
    pub remittances_awaiting_confirmation: i64,
    pub total_grocery_purchases_rub: Decimal,
    pub total_salary_paid_rub: Decimal,
    pub total_salary_pending_rub: Decimal,
    pub active_meal_contracts: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardMetrics {
    pub procurement_gap_rub: Decimal,
    pub budget: BudgetSnapshot,
    pub cost: CostMetric,
    pub low_stock_count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub kpis: DashboardKpis,
    pub metrics: DashboardMetrics,
    pub alerts: Vec<Alert>,
    pub recent_activity: Vec<ActivityEntry>,
    pub generated_at: DateTime<Utc>,
}

/// Dashboard aggregator
#[derive(Clone)]
pub struct DashboardService {
    store: Arc<dyn LedgerStore>,
    thresholds: AlertThresholds,
    feed: DashboardConfig,
}

impl DashboardService {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        thresholds: AlertThresholds,
        feed: DashboardConfig,
    ) -> Self {
        Self {
            store,
            thresholds,
            feed,
        }
    }

    /// Assemble every aggregate as of `now`.
    ///
    /// Aggregates are read concurrently and are not one atomic snapshot.
    pub async fn build(&self, role: Role, now: DateTime<Utc>) -> AppResult<Dashboard> {
        authorize(role, Operation::ViewDashboard)?;

        let since = now - Duration::days(self.thresholds.cost_window_days);
        let per_source = self.feed.recent_per_source;

        let (
            income,
            confirmed,
            grocery,
            unconfirmed,
            total_purchased,
            other_purposes,
            window_purchases,
            staff,
            active_contracts,
            items,
        ) = tokio::try_join!(
            self.store.sum_income(),
            self.store.sum_confirmed(None),
            self.store.sum_confirmed(Some(RemittancePurpose::Groceries)),
            self.store.count_unconfirmed_remittances(),
            self.store.sum_purchases(None),
            self.store.sum_purchases_linked_to_other_purposes(),
            self.store.sum_purchases(Some(since)),
            self.store.list_staff(),
            self.store.count_active_contracts(now.date_naive()),
            self.store.list_items(),
        )?;

        let (recent_remittances, recent_purchases, recent_consumptions) = tokio::try_join!(
            self.store.recent_remittances(per_source),
            self.store.recent_purchases(per_source),
            self.store.recent_consumptions(per_source),
        )?;

        let budget = BudgetSnapshot::from_totals(
            grocery.amount_rub,
            total_purchased,
            other_purposes,
            self.thresholds.procurement_gap_warning_rub,
        );
        let cost = CostMetric::compute(
            window_purchases,
            self.thresholds.cost_window_days,
            active_contracts,
        );
        let alerts = derive_alerts(&items, &budget, &cost, &self.thresholds);
        let payroll = payroll_totals(&staff);

        let names = item_names(&items);
        let name_of = |id: Uuid| names.get(&id).copied().unwrap_or("unknown item");
        let mut activity: Vec<ActivityEntry> = recent_remittances
            .iter()
            .map(ActivityEntry::from_remittance)
            .collect();
        activity.extend(
            recent_purchases
                .iter()
                .map(|p| ActivityEntry::from_purchase(p, name_of(p.item_id))),
        );
        activity.extend(
            recent_consumptions
                .iter()
                .map(|c| ActivityEntry::from_consumption(c, name_of(c.item_id))),
        );

        let low_stock_count = items.iter().filter(|i| i.is_below_threshold()).count();

        tracing::debug!(
            alerts = alerts.len(),
            procurement_gap = %budget.procurement_gap_rub,
            "Dashboard assembled"
        );

        Ok(Dashboard {
            kpis: DashboardKpis {
                total_income_inr: income,
                total_remittance_sent_inr: confirmed.amount_inr,
                total_remittance_received_rub: confirmed.amount_rub,
                remittances_awaiting_confirmation: unconfirmed,
                total_grocery_purchases_rub: total_purchased,
                total_salary_paid_rub: payroll.salary_paid_rub,
                total_salary_pending_rub: payroll.pending_rub,
                active_meal_contracts: active_contracts,
            },
            metrics: DashboardMetrics {
                procurement_gap_rub: budget.procurement_gap_rub,
                budget,
                cost,
                low_stock_count,
            },
            alerts,
            recent_activity: merge_recent(activity, self.feed.recent_activity_limit),
            generated_at: now,
        })
    }
}

fn item_names(items: &[InventoryItem]) -> HashMap<Uuid, &str> {
    items.iter().map(|i| (i.id, i.name.as_str())).collect()
}

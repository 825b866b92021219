//! Budget, alert and dashboard tests
//!
//! Tests for the derived read models:
//! - Procurement gap moves by exactly R − C
//! - Alert triggering for low stock, overspend and idle cash
//! - End-to-end reconciliation scenario

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    AlertKind, AlertSeverity, AlertThresholds, ActivityKind, BudgetStatus, ContractStatus,
    Income, MealContract, NewConsumption, NewInventoryItem, NewPurchase, NewRemittance,
    RemittancePurpose, Role,
};
use spice_ledger::config::DashboardConfig;
use spice_ledger::error::AppError;
use spice_ledger::services::{BudgetService, DashboardService, RemittanceService, StockService};
use spice_ledger::store::{LedgerStore, MemoryStore};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

struct Fixture {
    store: Arc<dyn LedgerStore>,
    stock: StockService,
    remittances: RemittanceService,
    budget: BudgetService,
    dashboard: DashboardService,
}

fn fixture() -> Fixture {
    let store: Arc<dyn LedgerStore> = Arc::new(MemoryStore::new());
    let thresholds = AlertThresholds::default();
    Fixture {
        stock: StockService::new(store.clone()),
        remittances: RemittanceService::new(store.clone()),
        budget: BudgetService::new(store.clone(), thresholds.procurement_gap_warning_rub),
        dashboard: DashboardService::new(store.clone(), thresholds, DashboardConfig::default()),
        store,
    }
}

async fn confirmed_remittance(f: &Fixture, amount_inr: &str, rate: &str, purpose: RemittancePurpose) -> Uuid {
    let r = f
        .remittances
        .create(
            Role::Admin,
            NewRemittance {
                amount_inr: dec(amount_inr),
                rubal_rate: dec(rate),
                sent_to: "Kitchen account".to_string(),
                purpose,
                proof_image_url: Some("proofs/transfer.png".to_string()),
                notes: None,
                date: None,
            },
        )
        .await
        .unwrap();
    f.remittances.confirm(Role::Admin, r.id).await.unwrap();
    r.id
}

async fn item(f: &Fixture, name: &str) -> Uuid {
    f.stock
        .create_item(
            Role::Admin,
            NewInventoryItem {
                name: name.to_string(),
                unit: "kg".to_string(),
                minimum_threshold: Some(dec("5")),
                average_daily_usage: None,
            },
        )
        .await
        .unwrap()
        .id
}

async fn purchase(f: &Fixture, item_id: Uuid, remittance_id: Uuid, quantity: &str, price: &str) -> Uuid {
    f.stock
        .record_purchase(
            Role::Manager,
            NewPurchase {
                item_id,
                quantity: dec(quantity),
                price_rub: dec(price),
                invoice_image: Some("invoices/receipt.jpg".to_string()),
                purchased_by: "Olga".to_string(),
                date: None,
                linked_remittance_id: Some(remittance_id),
            },
        )
        .await
        .unwrap()
        .record
        .id
}

async fn consume(f: &Fixture, item_id: Uuid, quantity: &str) {
    f.stock
        .record_consumption(
            Role::Cook,
            NewConsumption {
                item_id,
                quantity_used: dec(quantity),
                logged_by: "Cook".to_string(),
                date: None,
                notes: None,
            },
        )
        .await
        .unwrap();
}

// ============================================================================
// Budget
// ============================================================================

#[cfg(test)]
mod budget_tests {
    use super::*;

    #[tokio::test]
    async fn test_gap_moves_by_remitted_minus_spent() {
        let f = fixture();
        let rice = item(&f, "Rice").await;
        let first = confirmed_remittance(&f, "1000", "0.9", RemittancePurpose::Groceries).await;
        purchase(&f, rice, first, "1", "100").await;
        let before = f.budget.snapshot(Role::Admin).await.unwrap().procurement_gap_rub;

        let second = confirmed_remittance(&f, "500", "1", RemittancePurpose::Groceries).await;
        purchase(&f, rice, second, "2", "120").await;
        let after = f.budget.snapshot(Role::Admin).await.unwrap().procurement_gap_rub;

        assert_eq!(after - before, dec("500") - dec("120"));
    }

    #[tokio::test]
    async fn test_unconfirmed_and_other_purposes_excluded_from_remitted() {
        let f = fixture();
        confirmed_remittance(&f, "1000", "1", RemittancePurpose::Salary).await;
        f.remittances
            .create(
                Role::Admin,
                NewRemittance {
                    amount_inr: dec("1000"),
                    rubal_rate: dec("1"),
                    sent_to: "Kitchen account".to_string(),
                    purpose: RemittancePurpose::Groceries,
                    proof_image_url: Some("proofs/pending.png".to_string()),
                    notes: None,
                    date: None,
                },
            )
            .await
            .unwrap();

        let snapshot = f.budget.snapshot(Role::Manager).await.unwrap();
        assert_eq!(snapshot.grocery_remitted_rub, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_purchases_against_other_purposes_still_count() {
        let f = fixture();
        let rice = item(&f, "Rice").await;
        let emergency = confirmed_remittance(&f, "1000", "1", RemittancePurpose::Emergency).await;
        purchase(&f, rice, emergency, "1", "100").await;

        let snapshot = f.budget.snapshot(Role::Admin).await.unwrap();
        assert_eq!(snapshot.total_purchased_rub, dec("100"));
        assert_eq!(snapshot.purchases_linked_to_other_purposes_rub, dec("100"));
        assert_eq!(snapshot.procurement_gap_rub, dec("-100"));
        assert_eq!(snapshot.status, BudgetStatus::Overspent);
    }

    #[tokio::test]
    async fn test_cook_cannot_read_budget() {
        let f = fixture();
        let result = f.budget.snapshot(Role::Cook).await;
        assert!(matches!(result, Err(AppError::InsufficientPermissions { .. })));
    }
}

// ============================================================================
// Dashboard
// ============================================================================

#[cfg(test)]
mod dashboard_tests {
    use super::*;

    #[tokio::test]
    async fn test_end_to_end_reconciliation() {
        let f = fixture();
        let rice = item(&f, "Rice").await;
        let remittance = confirmed_remittance(&f, "1000", "0.9", RemittancePurpose::Groceries).await;
        let bought = purchase(&f, rice, remittance, "10", "850").await;

        let dashboard = f.dashboard.build(Role::Admin, Utc::now()).await.unwrap();
        assert_eq!(dashboard.metrics.procurement_gap_rub, dec("50"));
        assert_eq!(dashboard.metrics.low_stock_count, 0);
        assert!(dashboard.alerts.is_empty());
        assert_eq!(f.stock.get_item(Role::Admin, rice).await.unwrap().current_stock, dec("10"));

        consume(&f, rice, "8").await;
        let dashboard = f.dashboard.build(Role::Admin, Utc::now()).await.unwrap();
        assert_eq!(f.stock.get_item(Role::Admin, rice).await.unwrap().current_stock, dec("2"));
        assert_eq!(dashboard.alerts.len(), 1);
        assert_eq!(dashboard.alerts[0].kind, AlertKind::LowStock);
        assert_eq!(dashboard.alerts[0].severity, AlertSeverity::Danger);
        assert_eq!(dashboard.alerts[0].items, vec!["Rice".to_string()]);

        f.stock.delete_purchase(Role::Admin, bought).await.unwrap();
        let dashboard = f.dashboard.build(Role::Admin, Utc::now()).await.unwrap();
        assert_eq!(f.stock.get_item(Role::Admin, rice).await.unwrap().current_stock, dec("-8"));
        assert_eq!(dashboard.metrics.procurement_gap_rub, dec("900"));
    }

    #[tokio::test]
    async fn test_deleting_the_only_purchase_restores_zero_stock() {
        let f = fixture();
        let rice = item(&f, "Rice").await;
        let remittance = confirmed_remittance(&f, "1000", "0.9", RemittancePurpose::Groceries).await;
        let bought = purchase(&f, rice, remittance, "10", "850").await;

        f.stock.delete_purchase(Role::Admin, bought).await.unwrap();
        let snapshot = f.budget.snapshot(Role::Admin).await.unwrap();
        assert_eq!(f.stock.get_item(Role::Admin, rice).await.unwrap().current_stock, Decimal::ZERO);
        assert_eq!(snapshot.procurement_gap_rub, dec("900"));
    }

    #[tokio::test]
    async fn test_overspend_is_danger_not_idle_warning() {
        let f = fixture();
        let rice = item(&f, "Rice").await;
        let remittance = confirmed_remittance(&f, "100", "1", RemittancePurpose::Groceries).await;
        purchase(&f, rice, remittance, "10", "200").await;

        let dashboard = f.dashboard.build(Role::Admin, Utc::now()).await.unwrap();
        assert_eq!(dashboard.metrics.procurement_gap_rub, dec("-100"));
        let kinds: Vec<AlertKind> = dashboard.alerts.iter().map(|a| a.kind).collect();
        assert!(kinds.contains(&AlertKind::PurchasesExceedRemittances));
        assert!(!kinds.contains(&AlertKind::IdleGroceryCash));
        assert!(dashboard
            .alerts
            .iter()
            .find(|a| a.kind == AlertKind::PurchasesExceedRemittances)
            .map_or(false, |a| a.message.contains("100 RUB")));
    }

    #[tokio::test]
    async fn test_kpis_and_cost_metric() {
        let f = fixture();
        let now = Utc::now();
        let today = now.date_naive();
        f.store
            .insert_income(Income {
                id: Uuid::new_v4(),
                amount_inr: dec("40000"),
                source: "Student fees".to_string(),
                date: now,
            })
            .await
            .unwrap();
        for (status, end) in [
            (ContractStatus::Active, today + Duration::days(30)),
            (ContractStatus::Active, today),
            (ContractStatus::Active, today - Duration::days(1)),
            (ContractStatus::Paused, today + Duration::days(30)),
        ] {
            f.store
                .insert_meal_contract(MealContract {
                    id: Uuid::new_v4(),
                    student_name: "Student".to_string(),
                    monthly_fee_inr: dec("8000"),
                    status,
                    start_date: today - Duration::days(60),
                    end_date: end,
                })
                .await
                .unwrap();
        }
        let rice = item(&f, "Rice").await;
        let remittance = confirmed_remittance(&f, "30000", "1", RemittancePurpose::Groceries).await;
        purchase(&f, rice, remittance, "10", "6000").await;

        let dashboard = f.dashboard.build(Role::Manager, now).await.unwrap();
        assert_eq!(dashboard.kpis.total_income_inr, dec("40000"));
        assert_eq!(dashboard.kpis.total_remittance_sent_inr, dec("30000"));
        assert_eq!(dashboard.kpis.total_grocery_purchases_rub, dec("6000"));
        assert_eq!(dashboard.kpis.active_meal_contracts, 2);
        assert_eq!(dashboard.kpis.remittances_awaiting_confirmation, 0);
        // 6000 / 30 days / 2 contracts
        assert_eq!(dashboard.metrics.cost.cost_per_contract_per_day_rub, dec("100"));
    }

    #[tokio::test]
    async fn test_recent_activity_titles() {
        let f = fixture();
        let rice = item(&f, "Rice").await;
        let remittance = confirmed_remittance(&f, "1000", "0.9", RemittancePurpose::Groceries).await;
        purchase(&f, rice, remittance, "10", "850").await;
        consume(&f, rice, "8").await;

        let dashboard = f.dashboard.build(Role::Admin, Utc::now()).await.unwrap();
        let titles: Vec<&str> = dashboard
            .recent_activity
            .iter()
            .map(|a| a.title.as_str())
            .collect();
        assert_eq!(dashboard.recent_activity.len(), 3);
        assert!(titles.contains(&"Sent INR 1000 (Groceries)"));
        assert!(titles.contains(&"Bought Rice for 850 RUB"));
        assert!(titles.contains(&"Used 8 of Rice"));
        assert!(dashboard
            .recent_activity
            .windows(2)
            .all(|w| w[0].date >= w[1].date));
        assert!(dashboard
            .recent_activity
            .iter()
            .any(|a| a.kind == ActivityKind::Consumption));
    }

    #[tokio::test]
    async fn test_cook_has_no_dashboard() {
        let f = fixture();
        let result = f.dashboard.build(Role::Cook, Utc::now()).await;
        assert!(matches!(result, Err(AppError::InsufficientPermissions { .. })));
    }
}

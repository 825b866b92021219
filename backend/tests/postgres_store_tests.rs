//! PostgreSQL store tests
//!
//! Run against a live database named by `TEST_DATABASE_URL`:
//! `cargo test --test postgres_store_tests -- --ignored`

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use std::str::FromStr;
use uuid::Uuid;

use shared::{
    NewInventoryItem, NewPurchase, NewRemittance, NewStaffLedger, RemittancePurpose, Role,
    StaffMutation,
};
use spice_ledger::error::AppError;
use spice_ledger::services::{PayrollService, RemittanceService, StockService};
use spice_ledger::store::{LedgerStore, PgStore};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn store() -> Arc<dyn LedgerStore> {
    let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
    let pool = PgPoolOptions::new()
        .max_connections(8)
        .connect(&url)
        .await
        .expect("Failed to connect to test database");
    let store = PgStore::new(pool);
    store.migrate().await.expect("Failed to run migrations");
    Arc::new(store)
}

async fn remittance(remittances: &RemittanceService) -> Uuid {
    remittances
        .create(
            Role::Admin,
            NewRemittance {
                amount_inr: dec("1000"),
                rubal_rate: dec("0.9"),
                sent_to: "Kitchen account".to_string(),
                purpose: RemittancePurpose::Groceries,
                proof_image_url: Some("proofs/transfer.png".to_string()),
                notes: None,
                date: None,
            },
        )
        .await
        .unwrap()
        .id
}

fn purchase(item_id: Uuid, remittance_id: Uuid) -> NewPurchase {
    NewPurchase {
        item_id,
        quantity: dec("2"),
        price_rub: dec("100"),
        invoice_image: Some("invoices/rice.jpg".to_string()),
        purchased_by: "Olga".to_string(),
        date: None,
        linked_remittance_id: Some(remittance_id),
    }
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn purchase_racing_remittance_delete_never_surfaces_db_error() {
    let store = store().await;
    let stock = StockService::new(store.clone());
    let remittances = RemittanceService::new(store.clone());
    let item = stock
        .create_item(
            Role::Admin,
            NewInventoryItem {
                name: format!("Rice {}", Uuid::new_v4()),
                unit: "kg".to_string(),
                minimum_threshold: None,
                average_daily_usage: None,
            },
        )
        .await
        .unwrap();

    for _ in 0..10 {
        let remittance_id = remittance(&remittances).await;
        let (created, deleted) = tokio::join!(
            stock.record_purchase(Role::Admin, purchase(item.id, remittance_id)),
            remittances.delete(Role::Admin, remittance_id),
        );
        match (created, deleted) {
            (Ok(_), Err(AppError::InvalidState(_))) => {}
            (Err(AppError::NotFound(_)), Ok(())) => {}
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    let audit = stock.audit(Role::Admin).await.unwrap();
    assert!(audit.consistent);
}

#[tokio::test]
#[ignore] // Requires PostgreSQL
async fn hidden_ledger_is_not_written() {
    let store = store().await;
    let payroll = PayrollService::new(store.clone());
    let ledger = payroll
        .create_staff(
            Role::Admin,
            NewStaffLedger {
                staff_name: "Manager Ivan".to_string(),
                monthly_salary_rub: dec("9000"),
                setup_cost_owed_rub: None,
            },
        )
        .await
        .unwrap();

    let result = store
        .mutate_staff(
            ledger.id,
            Role::Manager,
            StaffMutation::InitializeSetupCost {
                amount: dec("20000"),
                at: Utc::now(),
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));

    let stored = payroll.get_staff(Role::Admin, ledger.id).await.unwrap();
    assert_eq!(stored.setup_cost_owed_rub, Decimal::ZERO);
    payroll.delete_staff(Role::Admin, ledger.id).await.unwrap();
}

//! Request workflow and maintenance tests

use std::sync::Arc;

use rust_decimal::Decimal;
use std::str::FromStr;

use shared::{
    NewFundRequest, NewInventoryItem, NewInventoryRequest, NewStaffLedger, RequestStatus, Role,
};
use spice_ledger::error::AppError;
use spice_ledger::services::{MaintenanceService, PayrollService, RequestService, StockService};
use spice_ledger::store::{LedgerStore, MemoryStore, RequestKind};

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn store() -> Arc<dyn LedgerStore> {
    Arc::new(MemoryStore::new())
}

fn fund_input(amount: &str) -> NewFundRequest {
    NewFundRequest {
        amount_rub: dec(amount),
        purpose: "Vegetables for the week".to_string(),
        notes: None,
    }
}

// ============================================================================
// Requests
// ============================================================================

#[cfg(test)]
mod request_tests {
    use super::*;

    #[tokio::test]
    async fn test_any_role_raises_requests() {
        let requests = RequestService::new(store());
        let request = requests
            .create_fund_request(Role::Cook, fund_input("3000"))
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.requested_by, "cook");

        let request = requests
            .create_inventory_request(
                Role::Manager,
                NewInventoryRequest {
                    item_name: "Basmati rice".to_string(),
                    quantity_needed: dec("25"),
                    unit: "kg".to_string(),
                    notes: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(requests.list_inventory_requests(Role::Cook).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_transitions() {
        let requests = RequestService::new(store());
        let id = requests
            .create_fund_request(Role::Cook, fund_input("3000"))
            .await
            .unwrap()
            .id;

        // Fulfilment needs approval first
        let early = requests
            .advance_fund_request(Role::Admin, id, RequestStatus::Fulfilled)
            .await;
        assert!(matches!(early, Err(AppError::InvalidState(_))));

        let approved = requests
            .advance_fund_request(Role::Admin, id, RequestStatus::Approved)
            .await
            .unwrap();
        assert_eq!(approved.status, RequestStatus::Approved);

        let fulfilled = requests
            .advance_fund_request(Role::Manager, id, RequestStatus::Fulfilled)
            .await
            .unwrap();
        assert_eq!(fulfilled.status, RequestStatus::Fulfilled);

        let reopened = requests
            .advance_fund_request(Role::Admin, id, RequestStatus::Pending)
            .await;
        assert!(matches!(reopened, Err(AppError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_only_admin_reviews() {
        let requests = RequestService::new(store());
        let id = requests
            .create_fund_request(Role::Manager, fund_input("3000"))
            .await
            .unwrap()
            .id;

        let result = requests
            .advance_fund_request(Role::Manager, id, RequestStatus::Approved)
            .await;
        assert!(matches!(result, Err(AppError::InsufficientPermissions { .. })));

        let result = requests.delete_request(Role::Manager, RequestKind::Fund, id).await;
        assert!(matches!(result, Err(AppError::InsufficientPermissions { .. })));

        requests
            .delete_request(Role::Admin, RequestKind::Fund, id)
            .await
            .unwrap();
        assert!(requests.list_fund_requests(Role::Admin).await.unwrap().is_empty());
    }
}

// ============================================================================
// Reset
// ============================================================================

#[cfg(test)]
mod reset_tests {
    use super::*;

    #[tokio::test]
    async fn test_reset_requires_admin_and_confirmation() {
        let store = store();
        let maintenance = MaintenanceService::new(store.clone());

        let result = maintenance.reset_all(Role::Manager, true).await;
        assert!(matches!(result, Err(AppError::InsufficientPermissions { .. })));

        let result = maintenance.reset_all(Role::Admin, false).await;
        assert!(matches!(result, Err(AppError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let store = store();
        let stock = StockService::new(store.clone());
        let payroll = PayrollService::new(store.clone());
        let requests = RequestService::new(store.clone());
        let maintenance = MaintenanceService::new(store.clone());

        stock
            .create_item(
                Role::Admin,
                NewInventoryItem {
                    name: "Rice".to_string(),
                    unit: "kg".to_string(),
                    minimum_threshold: None,
                    average_daily_usage: None,
                },
            )
            .await
            .unwrap();
        payroll
            .create_staff(
                Role::Admin,
                NewStaffLedger {
                    staff_name: "Cook Olga".to_string(),
                    monthly_salary_rub: dec("5000"),
                    setup_cost_owed_rub: None,
                },
            )
            .await
            .unwrap();
        requests
            .create_fund_request(Role::Cook, fund_input("100"))
            .await
            .unwrap();

        let counts = maintenance.reset_all(Role::Admin, true).await.unwrap();
        assert_eq!(counts.inventory_items, 1);
        assert_eq!(counts.staff_ledgers, 1);
        assert_eq!(counts.fund_requests, 1);

        assert!(stock.list_items(Role::Admin).await.unwrap().is_empty());
        assert!(payroll.list_staff(Role::Admin).await.unwrap().is_empty());
        assert!(requests.list_fund_requests(Role::Admin).await.unwrap().is_empty());
    }
}

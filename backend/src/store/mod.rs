//! Record store for the ledgers
//!
//! Each composite mutation (a log record plus the counters it moves) is one
//! atomic call on the store. Implementations decide how atomicity is
//! achieved; the reconciliation rules themselves live in `shared`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::{
    ConsumptionUpdate, FundRequest, Income, InventoryConsumption, InventoryItem,
    InventoryPurchase, InventoryRequest, ItemDetailsUpdate, MealContract, PayrollEntry,
    PurchaseUpdate, Remittance, RemittancePurpose, RemittanceTotals, RemittanceUpdate,
    RequestStatus, Role, StaffLedger, StaffMutation, StockAudit, StockDrift, StockMovement,
};

use crate::error::AppResult;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// A log record together with the stock it moved
#[derive(Debug, Clone, Serialize)]
pub struct StockChange<T> {
    pub record: T,
    pub movements: Vec<StockMovement>,
    /// Items touched by `movements`, after the change
    pub items: Vec<InventoryItem>,
}

/// Result of a staff ledger mutation
#[derive(Debug, Clone, Serialize)]
pub struct StaffChange {
    pub ledger: StaffLedger,
    pub entry: Option<PayrollEntry>,
}

/// Rows removed by a full reset, per entity
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct ResetCounts {
    pub inventory_items: u64,
    pub inventory_purchases: u64,
    pub inventory_consumptions: u64,
    pub remittances: u64,
    pub staff_ledgers: u64,
    pub fund_requests: u64,
    pub inventory_requests: u64,
    pub income: u64,
    pub meal_contracts: u64,
}

/// Which kind of request a workflow call targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    Fund,
    Inventory,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Check that the backing store is reachable
    async fn ping(&self) -> AppResult<()>;

    // Inventory items
    async fn list_items(&self) -> AppResult<Vec<InventoryItem>>;
    async fn get_item(&self, id: Uuid) -> AppResult<InventoryItem>;
    async fn insert_item(&self, item: InventoryItem) -> AppResult<InventoryItem>;
    async fn update_item_details(
        &self,
        id: Uuid,
        update: ItemDetailsUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<InventoryItem>;
    /// Only items with no purchase or consumption referencing them
    async fn delete_item(&self, id: Uuid) -> AppResult<()>;

    // Purchases
    async fn list_purchases(&self) -> AppResult<Vec<InventoryPurchase>>;
    async fn get_purchase(&self, id: Uuid) -> AppResult<InventoryPurchase>;
    async fn create_purchase(
        &self,
        purchase: InventoryPurchase,
    ) -> AppResult<StockChange<InventoryPurchase>>;
    async fn update_purchase(
        &self,
        id: Uuid,
        update: PurchaseUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<StockChange<InventoryPurchase>>;
    async fn delete_purchase(&self, id: Uuid) -> AppResult<StockChange<InventoryPurchase>>;

    // Consumptions
    async fn list_consumptions(&self) -> AppResult<Vec<InventoryConsumption>>;
    async fn get_consumption(&self, id: Uuid) -> AppResult<InventoryConsumption>;
    async fn create_consumption(
        &self,
        consumption: InventoryConsumption,
    ) -> AppResult<StockChange<InventoryConsumption>>;
    async fn update_consumption(
        &self,
        id: Uuid,
        update: ConsumptionUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<StockChange<InventoryConsumption>>;
    async fn delete_consumption(&self, id: Uuid)
        -> AppResult<StockChange<InventoryConsumption>>;

    /// Stored counters against the fold of the log, read as one snapshot
    async fn audit_stock(&self) -> AppResult<StockAudit>;

    /// Overwrite every item's stock with the fold of its log
    async fn rebuild_stock(&self, now: DateTime<Utc>) -> AppResult<Vec<StockDrift>>;

    // Remittances
    async fn list_remittances(&self) -> AppResult<Vec<Remittance>>;
    async fn get_remittance(&self, id: Uuid) -> AppResult<Remittance>;
    async fn insert_remittance(&self, remittance: Remittance) -> AppResult<Remittance>;
    async fn confirm_remittance(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Remittance>;
    async fn update_remittance(
        &self,
        id: Uuid,
        update: RemittanceUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Remittance>;
    /// Refused while purchases still link to the remittance
    async fn delete_remittance(&self, id: Uuid) -> AppResult<()>;
    async fn sum_confirmed(&self, purpose: Option<RemittancePurpose>)
        -> AppResult<RemittanceTotals>;
    async fn count_unconfirmed_remittances(&self) -> AppResult<i64>;

    // Purchase sums
    /// Σ price over purchases dated at or after `since` (all when `None`)
    async fn sum_purchases(&self, since: Option<DateTime<Utc>>) -> AppResult<Decimal>;
    /// Σ price over purchases linked to non-grocery remittances
    async fn sum_purchases_linked_to_other_purposes(&self) -> AppResult<Decimal>;

    // Staff
    async fn list_staff(&self) -> AppResult<Vec<StaffLedger>>;
    async fn get_staff(&self, id: Uuid) -> AppResult<StaffLedger>;
    async fn insert_staff(&self, ledger: StaffLedger) -> AppResult<StaffLedger>;
    /// Ledgers hidden from `visible_to` read as missing and are left untouched
    async fn mutate_staff(
        &self,
        id: Uuid,
        visible_to: Role,
        mutation: StaffMutation,
    ) -> AppResult<StaffChange>;
    async fn delete_staff(&self, id: Uuid) -> AppResult<()>;

    // Requests
    async fn insert_fund_request(&self, request: FundRequest) -> AppResult<FundRequest>;
    async fn list_fund_requests(&self) -> AppResult<Vec<FundRequest>>;
    async fn advance_fund_request(
        &self,
        id: Uuid,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> AppResult<FundRequest>;
    async fn insert_inventory_request(
        &self,
        request: InventoryRequest,
    ) -> AppResult<InventoryRequest>;
    async fn list_inventory_requests(&self) -> AppResult<Vec<InventoryRequest>>;
    async fn advance_inventory_request(
        &self,
        id: Uuid,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> AppResult<InventoryRequest>;
    async fn delete_request(&self, kind: RequestKind, id: Uuid) -> AppResult<()>;

    // Dashboard inputs
    async fn insert_income(&self, income: Income) -> AppResult<Income>;
    async fn insert_meal_contract(&self, contract: MealContract) -> AppResult<MealContract>;
    async fn sum_income(&self) -> AppResult<Decimal>;
    async fn count_active_contracts(&self, as_of: NaiveDate) -> AppResult<i64>;

    // Recent activity, newest first
    async fn recent_remittances(&self, limit: i64) -> AppResult<Vec<Remittance>>;
    async fn recent_purchases(&self, limit: i64) -> AppResult<Vec<InventoryPurchase>>;
    async fn recent_consumptions(&self, limit: i64) -> AppResult<Vec<InventoryConsumption>>;

    /// Remove every record of every entity
    async fn reset_all(&self) -> AppResult<ResetCounts>;
}

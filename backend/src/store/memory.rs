//! In-process record store
//!
//! All state sits behind a single `RwLock`; each mutation holds the write
//! guard for its whole duration and works on copies until every check has
//! passed, so a failed call leaves nothing behind.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use shared::{
    audit_stock, stock_movements, sum_confirmed, ConsumptionUpdate, FundRequest, Income,
    InventoryConsumption, InventoryItem, InventoryPurchase, InventoryRequest, ItemDetailsUpdate,
    MealContract, PurchaseUpdate, Remittance, RemittancePurpose, RemittanceTotals,
    RemittanceUpdate, RequestStatus, Role, StaffLedger, StaffMutation, StockAudit, StockDrift,
    StockMovement,
};

use super::{LedgerStore, RequestKind, ResetCounts, StaffChange, StockChange};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct LedgerState {
    items: HashMap<Uuid, InventoryItem>,
    purchases: HashMap<Uuid, InventoryPurchase>,
    consumptions: HashMap<Uuid, InventoryConsumption>,
    remittances: HashMap<Uuid, Remittance>,
    staff: HashMap<Uuid, StaffLedger>,
    fund_requests: HashMap<Uuid, FundRequest>,
    inventory_requests: HashMap<Uuid, InventoryRequest>,
    income: Vec<Income>,
    contracts: Vec<MealContract>,
}

fn not_found(kind: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {}", kind, id))
}

fn newest_first<T, F>(mut records: Vec<T>, date: F) -> Vec<T>
where
    F: Fn(&T) -> DateTime<Utc>,
{
    records.sort_by(|a, b| date(b).cmp(&date(a)));
    records
}

fn take(limit: i64) -> usize {
    usize::try_from(limit).unwrap_or(0)
}

impl LedgerState {
    fn require_item(&self, id: Uuid) -> AppResult<()> {
        if self.items.contains_key(&id) {
            Ok(())
        } else {
            Err(not_found("Inventory item", id))
        }
    }

    fn require_remittance(&self, id: Uuid) -> AppResult<()> {
        if self.remittances.contains_key(&id) {
            Ok(())
        } else {
            Err(not_found("Remittance", id))
        }
    }

    /// Move the counters; all target items must exist before any is touched
    fn apply_movements(
        &mut self,
        movements: &[StockMovement],
        now: DateTime<Utc>,
    ) -> AppResult<Vec<InventoryItem>> {
        if let Some(missing) = movements
            .iter()
            .find(|m| !self.items.contains_key(&m.item_id))
        {
            return Err(AppError::Reconciliation(format!(
                "stock counter for item {} is missing",
                missing.item_id
            )));
        }

        let mut touched = Vec::with_capacity(movements.len());
        for movement in movements {
            if let Some(item) = self.items.get_mut(&movement.item_id) {
                item.current_stock += movement.delta;
                item.updated_at = now;
                touched.push(item.clone());
            }
        }
        Ok(touched)
    }
}

/// Record store kept in process memory
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<LedgerState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    async fn list_items(&self) -> AppResult<Vec<InventoryItem>> {
        let state = self.state.read().await;
        let mut items: Vec<InventoryItem> = state.items.values().cloned().collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    async fn get_item(&self, id: Uuid) -> AppResult<InventoryItem> {
        let state = self.state.read().await;
        state
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Inventory item", id))
    }

    async fn insert_item(&self, item: InventoryItem) -> AppResult<InventoryItem> {
        let mut state = self.state.write().await;
        state.items.insert(item.id, item.clone());
        Ok(item)
    }

    async fn update_item_details(
        &self,
        id: Uuid,
        update: ItemDetailsUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<InventoryItem> {
        let mut state = self.state.write().await;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| not_found("Inventory item", id))?;
        item.apply_details(update, now)?;
        Ok(item.clone())
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_item(id)?;
        let referenced = state.purchases.values().any(|p| p.item_id == id)
            || state.consumptions.values().any(|c| c.item_id == id);
        if referenced {
            return Err(AppError::InvalidState(format!(
                "inventory item {} still has purchases or consumptions",
                id
            )));
        }
        state.items.remove(&id);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Purchases
    // ------------------------------------------------------------------

    async fn list_purchases(&self) -> AppResult<Vec<InventoryPurchase>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state.purchases.values().cloned().collect(),
            |p| p.date,
        ))
    }

    async fn get_purchase(&self, id: Uuid) -> AppResult<InventoryPurchase> {
        let state = self.state.read().await;
        state
            .purchases
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Purchase", id))
    }

    async fn create_purchase(
        &self,
        purchase: InventoryPurchase,
    ) -> AppResult<StockChange<InventoryPurchase>> {
        let mut state = self.state.write().await;
        state.require_item(purchase.item_id)?;
        state.require_remittance(purchase.linked_remittance_id)?;

        let movements = stock_movements(None, Some(&purchase));
        let items = state.apply_movements(&movements, purchase.created_at)?;
        state.purchases.insert(purchase.id, purchase.clone());

        Ok(StockChange {
            record: purchase,
            movements,
            items,
        })
    }

    async fn update_purchase(
        &self,
        id: Uuid,
        update: PurchaseUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<StockChange<InventoryPurchase>> {
        let mut state = self.state.write().await;
        let mut purchase = state
            .purchases
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Purchase", id))?;

        let movements = purchase.apply_update(update, now)?;
        state.require_item(purchase.item_id)?;
        state.require_remittance(purchase.linked_remittance_id)?;
        let items = state.apply_movements(&movements, now)?;
        state.purchases.insert(id, purchase.clone());

        Ok(StockChange {
            record: purchase,
            movements,
            items,
        })
    }

    async fn delete_purchase(&self, id: Uuid) -> AppResult<StockChange<InventoryPurchase>> {
        let mut state = self.state.write().await;
        let purchase = state
            .purchases
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Purchase", id))?;

        let movements = stock_movements(Some(&purchase), None);
        let items = state.apply_movements(&movements, Utc::now())?;
        state.purchases.remove(&id);

        Ok(StockChange {
            record: purchase,
            movements,
            items,
        })
    }

    // ------------------------------------------------------------------
    // Consumptions
    // ------------------------------------------------------------------

    async fn list_consumptions(&self) -> AppResult<Vec<InventoryConsumption>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state.consumptions.values().cloned().collect(),
            |c| c.date,
        ))
    }

    async fn get_consumption(&self, id: Uuid) -> AppResult<InventoryConsumption> {
        let state = self.state.read().await;
        state
            .consumptions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Consumption", id))
    }

    async fn create_consumption(
        &self,
        consumption: InventoryConsumption,
    ) -> AppResult<StockChange<InventoryConsumption>> {
        let mut state = self.state.write().await;
        state.require_item(consumption.item_id)?;

        let movements = stock_movements(None, Some(&consumption));
        let items = state.apply_movements(&movements, consumption.created_at)?;
        state.consumptions.insert(consumption.id, consumption.clone());

        Ok(StockChange {
            record: consumption,
            movements,
            items,
        })
    }

    async fn update_consumption(
        &self,
        id: Uuid,
        update: ConsumptionUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<StockChange<InventoryConsumption>> {
        let mut state = self.state.write().await;
        let mut consumption = state
            .consumptions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Consumption", id))?;

        let movements = consumption.apply_update(update, now)?;
        state.require_item(consumption.item_id)?;
        let items = state.apply_movements(&movements, now)?;
        state.consumptions.insert(id, consumption.clone());

        Ok(StockChange {
            record: consumption,
            movements,
            items,
        })
    }

    async fn delete_consumption(
        &self,
        id: Uuid,
    ) -> AppResult<StockChange<InventoryConsumption>> {
        let mut state = self.state.write().await;
        let consumption = state
            .consumptions
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Consumption", id))?;

        let movements = stock_movements(Some(&consumption), None);
        let items = state.apply_movements(&movements, Utc::now())?;
        state.consumptions.remove(&id);

        Ok(StockChange {
            record: consumption,
            movements,
            items,
        })
    }

    async fn audit_stock(&self) -> AppResult<StockAudit> {
        let state = self.state.read().await;
        let items: Vec<InventoryItem> = state.items.values().cloned().collect();
        let purchases: Vec<InventoryPurchase> = state.purchases.values().cloned().collect();
        let consumptions: Vec<InventoryConsumption> =
            state.consumptions.values().cloned().collect();
        Ok(audit_stock(&items, &purchases, &consumptions))
    }

    async fn rebuild_stock(&self, now: DateTime<Utc>) -> AppResult<Vec<StockDrift>> {
        let mut state = self.state.write().await;
        let items: Vec<InventoryItem> = state.items.values().cloned().collect();
        let purchases: Vec<InventoryPurchase> = state.purchases.values().cloned().collect();
        let consumptions: Vec<InventoryConsumption> =
            state.consumptions.values().cloned().collect();

        let audit = audit_stock(&items, &purchases, &consumptions);
        let corrections: Vec<StockDrift> = audit
            .items
            .into_iter()
            .filter(|d| !d.drift.is_zero())
            .collect();

        for drift in &corrections {
            if let Some(item) = state.items.get_mut(&drift.item_id) {
                item.current_stock = drift.recomputed;
                item.updated_at = now;
            }
        }
        Ok(corrections)
    }

    // ------------------------------------------------------------------
    // Remittances
    // ------------------------------------------------------------------

    async fn list_remittances(&self) -> AppResult<Vec<Remittance>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state.remittances.values().cloned().collect(),
            |r| r.date,
        ))
    }

    async fn get_remittance(&self, id: Uuid) -> AppResult<Remittance> {
        let state = self.state.read().await;
        state
            .remittances
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Remittance", id))
    }

    async fn insert_remittance(&self, remittance: Remittance) -> AppResult<Remittance> {
        let mut state = self.state.write().await;
        state.remittances.insert(remittance.id, remittance.clone());
        Ok(remittance)
    }

    async fn confirm_remittance(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Remittance> {
        let mut state = self.state.write().await;
        let remittance = state
            .remittances
            .get_mut(&id)
            .ok_or_else(|| not_found("Remittance", id))?;
        remittance.confirm(now)?;
        Ok(remittance.clone())
    }

    async fn update_remittance(
        &self,
        id: Uuid,
        update: RemittanceUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Remittance> {
        let mut state = self.state.write().await;
        let remittance = state
            .remittances
            .get_mut(&id)
            .ok_or_else(|| not_found("Remittance", id))?;
        remittance.apply_update(update, now)?;
        Ok(remittance.clone())
    }

    async fn delete_remittance(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.require_remittance(id)?;
        let linked = state
            .purchases
            .values()
            .filter(|p| p.linked_remittance_id == id)
            .count();
        if linked > 0 {
            return Err(AppError::InvalidState(format!(
                "remittance {} is linked to {} purchase(s)",
                id, linked
            )));
        }
        state.remittances.remove(&id);
        Ok(())
    }

    async fn sum_confirmed(
        &self,
        purpose: Option<RemittancePurpose>,
    ) -> AppResult<RemittanceTotals> {
        let state = self.state.read().await;
        Ok(sum_confirmed(state.remittances.values(), purpose))
    }

    async fn count_unconfirmed_remittances(&self) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .remittances
            .values()
            .filter(|r| !r.is_confirmed())
            .count() as i64)
    }

    async fn sum_purchases(&self, since: Option<DateTime<Utc>>) -> AppResult<Decimal> {
        let state = self.state.read().await;
        Ok(state
            .purchases
            .values()
            .filter(|p| since.map_or(true, |s| p.date >= s))
            .map(|p| p.price_rub)
            .sum())
    }

    async fn sum_purchases_linked_to_other_purposes(&self) -> AppResult<Decimal> {
        let state = self.state.read().await;
        Ok(state
            .purchases
            .values()
            .filter(|p| {
                state
                    .remittances
                    .get(&p.linked_remittance_id)
                    .map_or(false, |r| r.purpose != RemittancePurpose::Groceries)
            })
            .map(|p| p.price_rub)
            .sum())
    }

    // ------------------------------------------------------------------
    // Staff
    // ------------------------------------------------------------------

    async fn list_staff(&self) -> AppResult<Vec<StaffLedger>> {
        let state = self.state.read().await;
        let mut staff: Vec<StaffLedger> = state.staff.values().cloned().collect();
        staff.sort_by(|a, b| a.staff_name.cmp(&b.staff_name));
        Ok(staff)
    }

    async fn get_staff(&self, id: Uuid) -> AppResult<StaffLedger> {
        let state = self.state.read().await;
        state
            .staff
            .get(&id)
            .cloned()
            .ok_or_else(|| not_found("Staff ledger", id))
    }

    async fn insert_staff(&self, ledger: StaffLedger) -> AppResult<StaffLedger> {
        let mut state = self.state.write().await;
        state.staff.insert(ledger.id, ledger.clone());
        Ok(ledger)
    }

    async fn mutate_staff(
        &self,
        id: Uuid,
        visible_to: Role,
        mutation: StaffMutation,
    ) -> AppResult<StaffChange> {
        let mut state = self.state.write().await;
        let mut ledger = state
            .staff
            .get(&id)
            .filter(|l| visible_to.can_see_staff(&l.staff_name))
            .cloned()
            .ok_or_else(|| not_found("Staff ledger", id))?;

        let entry = ledger.apply(mutation)?;
        state.staff.insert(id, ledger.clone());
        Ok(StaffChange { ledger, entry })
    }

    async fn delete_staff(&self, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        state
            .staff
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found("Staff ledger", id))
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    async fn insert_fund_request(&self, request: FundRequest) -> AppResult<FundRequest> {
        let mut state = self.state.write().await;
        state.fund_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn list_fund_requests(&self) -> AppResult<Vec<FundRequest>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state.fund_requests.values().cloned().collect(),
            |r| r.date_requested,
        ))
    }

    async fn advance_fund_request(
        &self,
        id: Uuid,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> AppResult<FundRequest> {
        let mut state = self.state.write().await;
        let request = state
            .fund_requests
            .get_mut(&id)
            .ok_or_else(|| not_found("Fund request", id))?;
        request.advance(next, now)?;
        Ok(request.clone())
    }

    async fn insert_inventory_request(
        &self,
        request: InventoryRequest,
    ) -> AppResult<InventoryRequest> {
        let mut state = self.state.write().await;
        state.inventory_requests.insert(request.id, request.clone());
        Ok(request)
    }

    async fn list_inventory_requests(&self) -> AppResult<Vec<InventoryRequest>> {
        let state = self.state.read().await;
        Ok(newest_first(
            state.inventory_requests.values().cloned().collect(),
            |r| r.date_requested,
        ))
    }

    async fn advance_inventory_request(
        &self,
        id: Uuid,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> AppResult<InventoryRequest> {
        let mut state = self.state.write().await;
        let request = state
            .inventory_requests
            .get_mut(&id)
            .ok_or_else(|| not_found("Inventory request", id))?;
        request.advance(next, now)?;
        Ok(request.clone())
    }

    async fn delete_request(&self, kind: RequestKind, id: Uuid) -> AppResult<()> {
        let mut state = self.state.write().await;
        let removed = match kind {
            RequestKind::Fund => state.fund_requests.remove(&id).is_some(),
            RequestKind::Inventory => state.inventory_requests.remove(&id).is_some(),
        };
        if removed {
            Ok(())
        } else {
            Err(not_found("Request", id))
        }
    }

    // ------------------------------------------------------------------
    // Dashboard inputs
    // ------------------------------------------------------------------

    async fn insert_income(&self, income: Income) -> AppResult<Income> {
        let mut state = self.state.write().await;
        state.income.push(income.clone());
        Ok(income)
    }

    async fn insert_meal_contract(&self, contract: MealContract) -> AppResult<MealContract> {
        let mut state = self.state.write().await;
        state.contracts.push(contract.clone());
        Ok(contract)
    }

    async fn sum_income(&self) -> AppResult<Decimal> {
        let state = self.state.read().await;
        Ok(state.income.iter().map(|i| i.amount_inr).sum())
    }

    async fn count_active_contracts(&self, as_of: NaiveDate) -> AppResult<i64> {
        let state = self.state.read().await;
        Ok(state
            .contracts
            .iter()
            .filter(|c| c.is_active_on(as_of))
            .count() as i64)
    }

    async fn recent_remittances(&self, limit: i64) -> AppResult<Vec<Remittance>> {
        let mut records = self.list_remittances().await?;
        records.truncate(take(limit));
        Ok(records)
    }

    async fn recent_purchases(&self, limit: i64) -> AppResult<Vec<InventoryPurchase>> {
        let mut records = self.list_purchases().await?;
        records.truncate(take(limit));
        Ok(records)
    }

    async fn recent_consumptions(&self, limit: i64) -> AppResult<Vec<InventoryConsumption>> {
        let mut records = self.list_consumptions().await?;
        records.truncate(take(limit));
        Ok(records)
    }

    async fn reset_all(&self) -> AppResult<ResetCounts> {
        let mut state = self.state.write().await;
        let counts = ResetCounts {
            inventory_items: state.items.len() as u64,
            inventory_purchases: state.purchases.len() as u64,
            inventory_consumptions: state.consumptions.len() as u64,
            remittances: state.remittances.len() as u64,
            staff_ledgers: state.staff.len() as u64,
            fund_requests: state.fund_requests.len() as u64,
            inventory_requests: state.inventory_requests.len() as u64,
            income: state.income.len() as u64,
            meal_contracts: state.contracts.len() as u64,
        };
        *state = LedgerState::default();
        Ok(counts)
    }
}

//! Stock ledger service: items, purchases, consumptions and the full-scan audit

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use shared::{
    ConsumptionUpdate, InventoryConsumption, InventoryItem, InventoryPurchase,
    ItemDetailsUpdate, NewConsumption, NewInventoryItem, NewPurchase, Operation, PurchaseUpdate,
    Role, StockAudit, StockDrift,
};

use super::authorize;
use crate::error::AppResult;
use crate::store::{LedgerStore, StockChange};

/// Stock ledger service
#[derive(Clone)]
pub struct StockService {
    store: Arc<dyn LedgerStore>,
}

/// Log every applied delta and flag counters that went below zero
fn report<T>(action: &str, record_id: Uuid, change: &StockChange<T>) {
    for movement in &change.movements {
        tracing::info!(
            action,
            record_id = %record_id,
            item_id = %movement.item_id,
            delta = %movement.delta,
            "Stock adjusted"
        );
    }
    for item in change.items.iter().filter(|i| i.current_stock < Decimal::ZERO) {
        tracing::warn!(
            item_id = %item.id,
            item = %item.name,
            current_stock = %item.current_stock,
            "Stock is below zero; physical count and log disagree"
        );
    }
}

impl StockService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    // ========================================================================
    // Items
    // ========================================================================

    pub async fn list_items(&self, role: Role) -> AppResult<Vec<InventoryItem>> {
        authorize(role, Operation::ViewInventory)?;
        self.store.list_items().await
    }

    pub async fn get_item(&self, role: Role, id: Uuid) -> AppResult<InventoryItem> {
        authorize(role, Operation::ViewInventory)?;
        self.store.get_item(id).await
    }

    /// Items start at zero stock; only the logs move it
    pub async fn create_item(&self, role: Role, input: NewInventoryItem) -> AppResult<InventoryItem> {
        authorize(role, Operation::ManageItems)?;
        let item = InventoryItem::from_new(input, Utc::now())?;
        let item = self.store.insert_item(item).await?;
        tracing::info!(item_id = %item.id, name = %item.name, "Inventory item created");
        Ok(item)
    }

    pub async fn update_item(
        &self,
        role: Role,
        id: Uuid,
        update: ItemDetailsUpdate,
    ) -> AppResult<InventoryItem> {
        authorize(role, Operation::ManageItems)?;
        let item = self.store.update_item_details(id, update, Utc::now()).await?;
        tracing::info!(item_id = %id, "Inventory item updated");
        Ok(item)
    }

    pub async fn delete_item(&self, role: Role, id: Uuid) -> AppResult<()> {
        authorize(role, Operation::ManageItems)?;
        self.store.delete_item(id).await?;
        tracing::info!(item_id = %id, "Inventory item deleted");
        Ok(())
    }

    // ========================================================================
    // Purchases
    // ========================================================================

    pub async fn list_purchases(&self, role: Role) -> AppResult<Vec<InventoryPurchase>> {
        authorize(role, Operation::ViewInventory)?;
        self.store.list_purchases().await
    }

    pub async fn get_purchase(&self, role: Role, id: Uuid) -> AppResult<InventoryPurchase> {
        authorize(role, Operation::ViewInventory)?;
        self.store.get_purchase(id).await
    }

    pub async fn record_purchase(
        &self,
        role: Role,
        input: NewPurchase,
    ) -> AppResult<StockChange<InventoryPurchase>> {
        authorize(role, Operation::RecordPurchase)?;
        let purchase = InventoryPurchase::from_new(input, Utc::now())?;
        let change = self.store.create_purchase(purchase).await?;
        report("purchase_created", change.record.id, &change);
        Ok(change)
    }

    pub async fn update_purchase(
        &self,
        role: Role,
        id: Uuid,
        update: PurchaseUpdate,
    ) -> AppResult<StockChange<InventoryPurchase>> {
        authorize(role, Operation::RecordPurchase)?;
        let change = self.store.update_purchase(id, update, Utc::now()).await?;
        report("purchase_updated", id, &change);
        Ok(change)
    }

    pub async fn delete_purchase(
        &self,
        role: Role,
        id: Uuid,
    ) -> AppResult<StockChange<InventoryPurchase>> {
        authorize(role, Operation::RecordPurchase)?;
        let change = self.store.delete_purchase(id).await?;
        report("purchase_deleted", id, &change);
        Ok(change)
    }

    // ========================================================================
    // Consumptions
    // ========================================================================

    pub async fn list_consumptions(&self, role: Role) -> AppResult<Vec<InventoryConsumption>> {
        authorize(role, Operation::ViewInventory)?;
        self.store.list_consumptions().await
    }

    pub async fn get_consumption(&self, role: Role, id: Uuid) -> AppResult<InventoryConsumption> {
        authorize(role, Operation::ViewInventory)?;
        self.store.get_consumption(id).await
    }

    pub async fn record_consumption(
        &self,
        role: Role,
        input: NewConsumption,
    ) -> AppResult<StockChange<InventoryConsumption>> {
        authorize(role, Operation::RecordConsumption)?;
        let consumption = InventoryConsumption::from_new(input, Utc::now())?;
        let change = self.store.create_consumption(consumption).await?;
        report("consumption_created", change.record.id, &change);
        Ok(change)
    }

    pub async fn update_consumption(
        &self,
        role: Role,
        id: Uuid,
        update: ConsumptionUpdate,
    ) -> AppResult<StockChange<InventoryConsumption>> {
        authorize(role, Operation::RecordConsumption)?;
        let change = self.store.update_consumption(id, update, Utc::now()).await?;
        report("consumption_updated", id, &change);
        Ok(change)
    }

    pub async fn delete_consumption(
        &self,
        role: Role,
        id: Uuid,
    ) -> AppResult<StockChange<InventoryConsumption>> {
        authorize(role, Operation::RecordConsumption)?;
        let change = self.store.delete_consumption(id).await?;
        report("consumption_deleted", id, &change);
        Ok(change)
    }

    // ========================================================================
    // Audit
    // ========================================================================

    /// Compare every stored counter with the fold of its log
    pub async fn audit(&self, role: Role) -> AppResult<StockAudit> {
        authorize(role, Operation::AuditStock)?;
        let audit = self.store.audit_stock().await?;
        if !audit.consistent {
            tracing::warn!(
                drifted = audit.items.iter().filter(|d| !d.drift.is_zero()).count(),
                "Stock counters drifted from the purchase/consumption log"
            );
        }
        Ok(audit)
    }

    /// Overwrite drifted counters with the recomputed values
    pub async fn rebuild(&self, role: Role) -> AppResult<Vec<StockDrift>> {
        authorize(role, Operation::AuditStock)?;
        let corrections = self.store.rebuild_stock(Utc::now()).await?;
        for drift in &corrections {
            tracing::info!(
                item_id = %drift.item_id,
                stored = %drift.stored,
                recomputed = %drift.recomputed,
                "Stock counter rebuilt"
            );
        }
        Ok(corrections)
    }
}

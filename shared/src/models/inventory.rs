//! Kitchen inventory models and the stock reconciliation rules
//!
//! `current_stock` on an item is a cached fold over the purchase and
//! consumption logs. Stores keep it current by applying the
//! [`StockMovement`]s returned here inside the same atomic unit that writes
//! the log record; [`audit_stock`] recomputes the fold from scratch.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::LedgerResult;
use crate::types::ProofReference;
use crate::validation::{
    normalize_note, require, validate_non_negative, validate_positive, validate_required_text,
};

/// Threshold applied when an item is created without one
pub const DEFAULT_MINIMUM_THRESHOLD: i64 = 5;

/// Strictly below the configured minimum
pub fn is_below_threshold(current_stock: Decimal, minimum_threshold: Decimal) -> bool {
    current_stock < minimum_threshold
}

/// A stocked kitchen item (rice, oil, onions, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryItem {
    pub id: Uuid,
    pub name: String,
    /// e.g. "kg", "liters", "pieces"
    pub unit: String,
    /// May go negative; a negative count is a reconciliation signal
    pub current_stock: Decimal,
    pub minimum_threshold: Decimal,
    pub average_daily_usage: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an item
#[derive(Debug, Clone, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub unit: String,
    pub minimum_threshold: Option<Decimal>,
    pub average_daily_usage: Option<Decimal>,
}

/// Editable item details. Stock is deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ItemDetailsUpdate {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub minimum_threshold: Option<Decimal>,
    pub average_daily_usage: Option<Decimal>,
}

impl InventoryItem {
    pub fn from_new(input: NewInventoryItem, now: DateTime<Utc>) -> LedgerResult<Self> {
        let name = validate_required_text("name", &input.name)?;
        let unit = validate_required_text("unit", &input.unit)?;
        let minimum_threshold = input
            .minimum_threshold
            .unwrap_or_else(|| Decimal::from(DEFAULT_MINIMUM_THRESHOLD));
        validate_non_negative("minimum_threshold", minimum_threshold)?;
        let average_daily_usage = input.average_daily_usage.unwrap_or(Decimal::ZERO);
        validate_non_negative("average_daily_usage", average_daily_usage)?;

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            unit,
            current_stock: Decimal::ZERO,
            minimum_threshold,
            average_daily_usage,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a details edit; all fields are validated before any is written
    pub fn apply_details(&mut self, update: ItemDetailsUpdate, now: DateTime<Utc>) -> LedgerResult<()> {
        let name = update
            .name
            .map(|n| validate_required_text("name", &n))
            .transpose()?;
        let unit = update
            .unit
            .map(|u| validate_required_text("unit", &u))
            .transpose()?;
        if let Some(t) = update.minimum_threshold {
            validate_non_negative("minimum_threshold", t)?;
        }
        if let Some(u) = update.average_daily_usage {
            validate_non_negative("average_daily_usage", u)?;
        }

        if let Some(name) = name {
            self.name = name;
        }
        if let Some(unit) = unit {
            self.unit = unit;
        }
        if let Some(t) = update.minimum_threshold {
            self.minimum_threshold = t;
        }
        if let Some(u) = update.average_daily_usage {
            self.average_daily_usage = u;
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn is_below_threshold(&self) -> bool {
        is_below_threshold(self.current_stock, self.minimum_threshold)
    }

    /// Days of stock left at the recorded average usage, if usage is known
    pub fn days_remaining(&self) -> Option<Decimal> {
        if self.average_daily_usage <= Decimal::ZERO {
            return None;
        }
        Some((self.current_stock / self.average_daily_usage).max(Decimal::ZERO))
    }
}

// ============================================================================
// Stock movements
// ============================================================================

/// A signed change to one item's `current_stock`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StockMovement {
    pub item_id: Uuid,
    pub delta: Decimal,
}

/// A log record that contributes to an item's stock
pub trait StockEffect {
    /// The record's signed contribution to its item's stock
    fn stock_effect(&self) -> StockMovement;
}

/// Movements that turn the stock implied by `before` into the stock implied
/// by `after`.
///
/// `None` on one side models creation (`before = None`) or deletion
/// (`after = None`). Zero deltas are dropped.
pub fn stock_movements<T: StockEffect>(before: Option<&T>, after: Option<&T>) -> Vec<StockMovement> {
    let old = before.map(StockEffect::stock_effect);
    let new = after.map(StockEffect::stock_effect);

    let moves = match (old, new) {
        (None, None) => vec![],
        (None, Some(n)) => vec![n],
        (Some(o), None) => vec![StockMovement {
            item_id: o.item_id,
            delta: -o.delta,
        }],
        (Some(o), Some(n)) if o.item_id == n.item_id => vec![StockMovement {
            item_id: n.item_id,
            delta: n.delta - o.delta,
        }],
        (Some(o), Some(n)) => vec![
            StockMovement {
                item_id: o.item_id,
                delta: -o.delta,
            },
            n,
        ],
    };

    moves.into_iter().filter(|m| !m.delta.is_zero()).collect()
}

// ============================================================================
// Purchases
// ============================================================================

/// A grocery purchase; adds stock and spends remitted money
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryPurchase {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub price_rub: Decimal,
    /// Mandatory proof, stored as an opaque reference
    pub invoice_image: String,
    pub purchased_by: String,
    pub date: DateTime<Utc>,
    /// The remittance whose money paid for this purchase
    pub linked_remittance_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for logging a purchase
#[derive(Debug, Clone, Deserialize)]
pub struct NewPurchase {
    pub item_id: Uuid,
    pub quantity: Decimal,
    pub price_rub: Decimal,
    pub invoice_image: Option<String>,
    pub purchased_by: String,
    pub date: Option<DateTime<Utc>>,
    pub linked_remittance_id: Option<Uuid>,
}

/// Partial edit of a purchase
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PurchaseUpdate {
    pub item_id: Option<Uuid>,
    pub quantity: Option<Decimal>,
    pub price_rub: Option<Decimal>,
    pub invoice_image: Option<String>,
    pub purchased_by: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub linked_remittance_id: Option<Uuid>,
}

impl InventoryPurchase {
    pub fn from_new(input: NewPurchase, now: DateTime<Utc>) -> LedgerResult<Self> {
        validate_positive("quantity", input.quantity)?;
        validate_positive("price_rub", input.price_rub)?;
        let invoice = ProofReference::new(
            "invoice_image",
            require("invoice_image", input.invoice_image)?,
        )?;
        let purchased_by = validate_required_text("purchased_by", &input.purchased_by)?;
        let linked_remittance_id = require("linked_remittance_id", input.linked_remittance_id)?;

        Ok(Self {
            id: Uuid::new_v4(),
            item_id: input.item_id,
            quantity: input.quantity,
            price_rub: input.price_rub,
            invoice_image: invoice.into_inner(),
            purchased_by,
            date: input.date.unwrap_or(now),
            linked_remittance_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Validate and apply an edit, returning the stock movements it implies.
    ///
    /// Nothing is written to `self` when validation fails.
    pub fn apply_update(
        &mut self,
        update: PurchaseUpdate,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<StockMovement>> {
        let mut next = self.clone();
        if let Some(item_id) = update.item_id {
            next.item_id = item_id;
        }
        if let Some(q) = update.quantity {
            validate_positive("quantity", q)?;
            next.quantity = q;
        }
        if let Some(p) = update.price_rub {
            validate_positive("price_rub", p)?;
            next.price_rub = p;
        }
        if let Some(invoice) = update.invoice_image {
            next.invoice_image = ProofReference::new("invoice_image", invoice)?.into_inner();
        }
        if let Some(by) = update.purchased_by {
            next.purchased_by = validate_required_text("purchased_by", &by)?;
        }
        if let Some(date) = update.date {
            next.date = date;
        }
        if let Some(remittance_id) = update.linked_remittance_id {
            next.linked_remittance_id = remittance_id;
        }
        next.updated_at = now;

        let moves = stock_movements(Some(&*self), Some(&next));
        *self = next;
        Ok(moves)
    }
}

impl StockEffect for InventoryPurchase {
    fn stock_effect(&self) -> StockMovement {
        StockMovement {
            item_id: self.item_id,
            delta: self.quantity,
        }
    }
}

// ============================================================================
// Consumptions
// ============================================================================

/// Kitchen usage of an item; removes stock
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InventoryConsumption {
    pub id: Uuid,
    pub item_id: Uuid,
    pub quantity_used: Decimal,
    pub logged_by: String,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for logging a consumption
#[derive(Debug, Clone, Deserialize)]
pub struct NewConsumption {
    pub item_id: Uuid,
    pub quantity_used: Decimal,
    pub logged_by: String,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

/// Partial edit of a consumption
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumptionUpdate {
    pub item_id: Option<Uuid>,
    pub quantity_used: Option<Decimal>,
    pub logged_by: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl InventoryConsumption {
    pub fn from_new(input: NewConsumption, now: DateTime<Utc>) -> LedgerResult<Self> {
        validate_positive("quantity_used", input.quantity_used)?;
        let logged_by = validate_required_text("logged_by", &input.logged_by)?;

        Ok(Self {
            id: Uuid::new_v4(),
            item_id: input.item_id,
            quantity_used: input.quantity_used,
            logged_by,
            date: input.date.unwrap_or(now),
            notes: normalize_note(input.notes),
            created_at: now,
            updated_at: now,
        })
    }

    /// Validate and apply an edit, returning the stock movements it implies
    pub fn apply_update(
        &mut self,
        update: ConsumptionUpdate,
        now: DateTime<Utc>,
    ) -> LedgerResult<Vec<StockMovement>> {
        let mut next = self.clone();
        if let Some(item_id) = update.item_id {
            next.item_id = item_id;
        }
        if let Some(q) = update.quantity_used {
            validate_positive("quantity_used", q)?;
            next.quantity_used = q;
        }
        if let Some(by) = update.logged_by {
            next.logged_by = validate_required_text("logged_by", &by)?;
        }
        if let Some(date) = update.date {
            next.date = date;
        }
        if update.notes.is_some() {
            next.notes = normalize_note(update.notes);
        }
        next.updated_at = now;

        let moves = stock_movements(Some(&*self), Some(&next));
        *self = next;
        Ok(moves)
    }
}

impl StockEffect for InventoryConsumption {
    fn stock_effect(&self) -> StockMovement {
        StockMovement {
            item_id: self.item_id,
            delta: -self.quantity_used,
        }
    }
}

// ============================================================================
// Full-scan audit
// ============================================================================

/// Stored versus recomputed stock for one item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockDrift {
    pub item_id: Uuid,
    pub item_name: String,
    pub stored: Decimal,
    pub recomputed: Decimal,
    /// `stored - recomputed`
    pub drift: Decimal,
}

/// Result of comparing every item's counter with its log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockAudit {
    pub items: Vec<StockDrift>,
    pub consistent: bool,
}

/// Fold the purchase and consumption logs into per-item stock
pub fn recompute_stock(
    purchases: &[InventoryPurchase],
    consumptions: &[InventoryConsumption],
) -> HashMap<Uuid, Decimal> {
    let mut totals: HashMap<Uuid, Decimal> = HashMap::new();
    let effects = purchases
        .iter()
        .map(StockEffect::stock_effect)
        .chain(consumptions.iter().map(StockEffect::stock_effect));
    for effect in effects {
        *totals.entry(effect.item_id).or_insert(Decimal::ZERO) += effect.delta;
    }
    totals
}

/// Compare each item's stored counter with the recomputed fold
pub fn audit_stock(
    items: &[InventoryItem],
    purchases: &[InventoryPurchase],
    consumptions: &[InventoryConsumption],
) -> StockAudit {
    let totals = recompute_stock(purchases, consumptions);
    let drifts: Vec<StockDrift> = items
        .iter()
        .map(|item| {
            let recomputed = totals.get(&item.id).copied().unwrap_or(Decimal::ZERO);
            StockDrift {
                item_id: item.id,
                item_name: item.name.clone(),
                stored: item.current_stock,
                recomputed,
                drift: item.current_stock - recomputed,
            }
        })
        .collect();
    let consistent = drifts.iter().all(|d| d.drift.is_zero());

    StockAudit {
        items: drifts,
        consistent,
    }
}

//! PostgreSQL record store
//!
//! Every composite mutation runs in one transaction. The owning record is
//! locked with `SELECT ... FOR UPDATE` and stock counters are moved with a
//! relative `current_stock = current_stock + $delta`, so concurrent writers
//! never overwrite each other's deltas.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use shared::{
    audit_stock, stock_movements, ConsumptionUpdate, FundRequest, Income, InventoryConsumption,
    InventoryItem, InventoryPurchase, InventoryRequest, ItemDetailsUpdate, MealContract,
    PayrollEntry, PurchaseUpdate, Remittance, RemittancePurpose, RemittanceTotals,
    RemittanceUpdate, RequestStatus, Role, StaffLedger, StaffMutation, StockAudit, StockDrift,
    StockMovement,
};

use super::{LedgerStore, RequestKind, ResetCounts, StaffChange, StockChange};
use crate::error::{AppError, AppResult};

const ITEM_COLUMNS: &str = "id, name, unit, current_stock, minimum_threshold, \
     average_daily_usage, created_at, updated_at";
const PURCHASE_COLUMNS: &str = "id, item_id, quantity, price_rub, invoice_image, purchased_by, \
     date, linked_remittance_id, created_at, updated_at";
const CONSUMPTION_COLUMNS: &str =
    "id, item_id, quantity_used, logged_by, date, notes, created_at, updated_at";
const REMITTANCE_COLUMNS: &str = "id, amount_inr, rubal_rate, amount_rub, sent_to, purpose, \
     status, proof_image_url, notes, date, confirmed_at, created_at, updated_at";
const STAFF_COLUMNS: &str = "id, staff_name, monthly_salary_rub, salary_paid_rub, advances_rub, \
     setup_cost_owed_rub, setup_cost_paid_rub, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, date, amount, entry_type, note, compensates";
const FUND_REQUEST_COLUMNS: &str =
    "id, amount_rub, purpose, requested_by, status, notes, date_requested, updated_at";
const INVENTORY_REQUEST_COLUMNS: &str = "id, item_name, quantity_needed, unit, requested_by, \
     status, notes, date_requested, updated_at";

// ============================================================================
// Rows
// ============================================================================

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    name: String,
    unit: String,
    current_stock: Decimal,
    minimum_threshold: Decimal,
    average_daily_usage: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ItemRow> for InventoryItem {
    fn from(row: ItemRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            unit: row.unit,
            current_stock: row.current_stock,
            minimum_threshold: row.minimum_threshold,
            average_daily_usage: row.average_daily_usage,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    item_id: Uuid,
    quantity: Decimal,
    price_rub: Decimal,
    invoice_image: String,
    purchased_by: String,
    date: DateTime<Utc>,
    linked_remittance_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PurchaseRow> for InventoryPurchase {
    fn from(row: PurchaseRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            quantity: row.quantity,
            price_rub: row.price_rub,
            invoice_image: row.invoice_image,
            purchased_by: row.purchased_by,
            date: row.date,
            linked_remittance_id: row.linked_remittance_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ConsumptionRow {
    id: Uuid,
    item_id: Uuid,
    quantity_used: Decimal,
    logged_by: String,
    date: DateTime<Utc>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ConsumptionRow> for InventoryConsumption {
    fn from(row: ConsumptionRow) -> Self {
        Self {
            id: row.id,
            item_id: row.item_id,
            quantity_used: row.quantity_used,
            logged_by: row.logged_by,
            date: row.date,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct RemittanceRow {
    id: Uuid,
    amount_inr: Decimal,
    rubal_rate: Decimal,
    amount_rub: Decimal,
    sent_to: String,
    purpose: String,
    status: String,
    proof_image_url: String,
    notes: Option<String>,
    date: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RemittanceRow> for Remittance {
    type Error = AppError;

    fn try_from(row: RemittanceRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            amount_inr: row.amount_inr,
            rubal_rate: row.rubal_rate,
            amount_rub: row.amount_rub,
            sent_to: row.sent_to,
            purpose: row.purpose.parse().map_err(corrupt)?,
            status: row.status.parse().map_err(corrupt)?,
            proof_image_url: row.proof_image_url,
            notes: row.notes,
            date: row.date,
            confirmed_at: row.confirmed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct StaffRow {
    id: Uuid,
    staff_name: String,
    monthly_salary_rub: Decimal,
    salary_paid_rub: Decimal,
    advances_rub: Decimal,
    setup_cost_owed_rub: Decimal,
    setup_cost_paid_rub: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StaffRow {
    fn into_ledger(self, history: Vec<PayrollEntry>) -> StaffLedger {
        StaffLedger {
            id: self.id,
            staff_name: self.staff_name,
            monthly_salary_rub: self.monthly_salary_rub,
            salary_paid_rub: self.salary_paid_rub,
            advances_rub: self.advances_rub,
            setup_cost_owed_rub: self.setup_cost_owed_rub,
            setup_cost_paid_rub: self.setup_cost_paid_rub,
            history,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct EntryRow {
    id: Uuid,
    date: DateTime<Utc>,
    amount: Decimal,
    entry_type: String,
    note: Option<String>,
    compensates: Option<Uuid>,
}

impl TryFrom<EntryRow> for PayrollEntry {
    type Error = AppError;

    fn try_from(row: EntryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            date: row.date,
            amount: row.amount,
            entry_type: row.entry_type.parse().map_err(corrupt)?,
            note: row.note,
            compensates: row.compensates,
        })
    }
}

#[derive(Debug, FromRow)]
struct FundRequestRow {
    id: Uuid,
    amount_rub: Decimal,
    purpose: String,
    requested_by: String,
    status: String,
    notes: Option<String>,
    date_requested: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<FundRequestRow> for FundRequest {
    type Error = AppError;

    fn try_from(row: FundRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            amount_rub: row.amount_rub,
            purpose: row.purpose,
            requested_by: row.requested_by,
            status: row.status.parse().map_err(corrupt)?,
            notes: row.notes,
            date_requested: row.date_requested,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct InventoryRequestRow {
    id: Uuid,
    item_name: String,
    quantity_needed: Decimal,
    unit: String,
    requested_by: String,
    status: String,
    notes: Option<String>,
    date_requested: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InventoryRequestRow> for InventoryRequest {
    type Error = AppError;

    fn try_from(row: InventoryRequestRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            item_name: row.item_name,
            quantity_needed: row.quantity_needed,
            unit: row.unit,
            requested_by: row.requested_by,
            status: row.status.parse().map_err(corrupt)?,
            notes: row.notes,
            date_requested: row.date_requested,
            updated_at: row.updated_at,
        })
    }
}

/// A stored enum value that no longer parses
fn corrupt(err: shared::LedgerError) -> AppError {
    AppError::Internal(format!("stored value failed to decode: {}", err))
}

fn not_found(kind: &str, id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {}", kind, id))
}

fn collect<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

// ============================================================================
// Transaction helpers
// ============================================================================

type Tx<'a> = Transaction<'a, Postgres>;

/// Locks the item against a concurrent delete; same strength as the later
/// counter update so the lock never needs upgrading
async fn require_item(tx: &mut Tx<'_>, id: Uuid) -> AppResult<()> {
    sqlx::query_scalar::<_, Uuid>(
        "SELECT id FROM inventory_items WHERE id = $1 FOR NO KEY UPDATE",
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await?
    .map(|_| ())
    .ok_or_else(|| not_found("Inventory item", id))
}

/// Holds the remittance until commit so it cannot be deleted under a new link
async fn require_remittance(tx: &mut Tx<'_>, id: Uuid) -> AppResult<()> {
    sqlx::query_scalar::<_, Uuid>("SELECT id FROM remittances WHERE id = $1 FOR SHARE")
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .map(|_| ())
        .ok_or_else(|| not_found("Remittance", id))
}

/// Items with the full purchase and consumption log, read inside `tx`
async fn load_stock_log(
    tx: &mut Tx<'_>,
    lock_items: bool,
) -> AppResult<(Vec<InventoryItem>, Vec<InventoryPurchase>, Vec<InventoryConsumption>)> {
    let sql = format!(
        "SELECT {} FROM inventory_items{}",
        ITEM_COLUMNS,
        if lock_items { " FOR UPDATE" } else { "" }
    );
    let items = sqlx::query_as::<_, ItemRow>(&sql)
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let sql = format!("SELECT {} FROM inventory_purchases", PURCHASE_COLUMNS);
    let purchases = sqlx::query_as::<_, PurchaseRow>(&sql)
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    let sql = format!("SELECT {} FROM inventory_consumptions", CONSUMPTION_COLUMNS);
    let consumptions = sqlx::query_as::<_, ConsumptionRow>(&sql)
        .fetch_all(&mut **tx)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok((items, purchases, consumptions))
}

/// Relative counter update; a missing row aborts the whole transaction
async fn apply_movements(
    tx: &mut Tx<'_>,
    movements: &[StockMovement],
    now: DateTime<Utc>,
) -> AppResult<Vec<InventoryItem>> {
    let sql = format!(
        "UPDATE inventory_items SET current_stock = current_stock + $1, updated_at = $2 \
         WHERE id = $3 RETURNING {}",
        ITEM_COLUMNS
    );
    let mut touched = Vec::with_capacity(movements.len());
    for movement in movements {
        let row = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(movement.delta)
            .bind(now)
            .bind(movement.item_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| {
                AppError::Reconciliation(format!(
                    "stock counter for item {} is missing",
                    movement.item_id
                ))
            })?;
        touched.push(row.into());
    }
    Ok(touched)
}

async fn write_purchase(tx: &mut Tx<'_>, p: &InventoryPurchase) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_purchases (
            id, item_id, quantity, price_rub, invoice_image, purchased_by,
            date, linked_remittance_id, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (id) DO UPDATE SET
            item_id = EXCLUDED.item_id,
            quantity = EXCLUDED.quantity,
            price_rub = EXCLUDED.price_rub,
            invoice_image = EXCLUDED.invoice_image,
            purchased_by = EXCLUDED.purchased_by,
            date = EXCLUDED.date,
            linked_remittance_id = EXCLUDED.linked_remittance_id,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(p.id)
    .bind(p.item_id)
    .bind(p.quantity)
    .bind(p.price_rub)
    .bind(&p.invoice_image)
    .bind(&p.purchased_by)
    .bind(p.date)
    .bind(p.linked_remittance_id)
    .bind(p.created_at)
    .bind(p.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn write_consumption(tx: &mut Tx<'_>, c: &InventoryConsumption) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO inventory_consumptions (
            id, item_id, quantity_used, logged_by, date, notes, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE SET
            item_id = EXCLUDED.item_id,
            quantity_used = EXCLUDED.quantity_used,
            logged_by = EXCLUDED.logged_by,
            date = EXCLUDED.date,
            notes = EXCLUDED.notes,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(c.id)
    .bind(c.item_id)
    .bind(c.quantity_used)
    .bind(&c.logged_by)
    .bind(c.date)
    .bind(&c.notes)
    .bind(c.created_at)
    .bind(c.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn write_remittance(tx: &mut Tx<'_>, r: &Remittance) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO remittances (
            id, amount_inr, rubal_rate, amount_rub, sent_to, purpose, status,
            proof_image_url, notes, date, confirmed_at, created_at, updated_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        ON CONFLICT (id) DO UPDATE SET
            amount_inr = EXCLUDED.amount_inr,
            rubal_rate = EXCLUDED.rubal_rate,
            amount_rub = EXCLUDED.amount_rub,
            sent_to = EXCLUDED.sent_to,
            purpose = EXCLUDED.purpose,
            status = EXCLUDED.status,
            proof_image_url = EXCLUDED.proof_image_url,
            notes = EXCLUDED.notes,
            date = EXCLUDED.date,
            confirmed_at = EXCLUDED.confirmed_at,
            updated_at = EXCLUDED.updated_at
        "#,
    )
    .bind(r.id)
    .bind(r.amount_inr)
    .bind(r.rubal_rate)
    .bind(r.amount_rub)
    .bind(&r.sent_to)
    .bind(r.purpose.as_str())
    .bind(r.status.as_str())
    .bind(&r.proof_image_url)
    .bind(&r.notes)
    .bind(r.date)
    .bind(r.confirmed_at)
    .bind(r.created_at)
    .bind(r.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn lock_remittance(tx: &mut Tx<'_>, id: Uuid) -> AppResult<Remittance> {
    let sql = format!(
        "SELECT {} FROM remittances WHERE id = $1 FOR UPDATE",
        REMITTANCE_COLUMNS
    );
    sqlx::query_as::<_, RemittanceRow>(&sql)
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or_else(|| not_found("Remittance", id))?
        .try_into()
}

async fn load_history(tx: &mut Tx<'_>, staff_id: Uuid) -> AppResult<Vec<PayrollEntry>> {
    let sql = format!(
        "SELECT {} FROM payroll_entries WHERE staff_id = $1 ORDER BY seq",
        ENTRY_COLUMNS
    );
    let rows = sqlx::query_as::<_, EntryRow>(&sql)
        .bind(staff_id)
        .fetch_all(&mut **tx)
        .await?;
    collect(rows)
}

// ============================================================================
// Store
// ============================================================================

/// Record store backed by a PostgreSQL pool
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .map_err(|e| AppError::Internal(format!("Migration failed: {}", e)))
    }
}

#[async_trait]
impl LedgerStore for PgStore {
    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.db).await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Items
    // ------------------------------------------------------------------

    async fn list_items(&self) -> AppResult<Vec<InventoryItem>> {
        let sql = format!("SELECT {} FROM inventory_items ORDER BY name", ITEM_COLUMNS);
        let rows = sqlx::query_as::<_, ItemRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_item(&self, id: Uuid) -> AppResult<InventoryItem> {
        let sql = format!("SELECT {} FROM inventory_items WHERE id = $1", ITEM_COLUMNS);
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found("Inventory item", id))
    }

    async fn insert_item(&self, item: InventoryItem) -> AppResult<InventoryItem> {
        sqlx::query(
            r#"
            INSERT INTO inventory_items (
                id, name, unit, current_stock, minimum_threshold,
                average_daily_usage, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(item.id)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.current_stock)
        .bind(item.minimum_threshold)
        .bind(item.average_daily_usage)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.db)
        .await?;
        Ok(item)
    }

    async fn update_item_details(
        &self,
        id: Uuid,
        update: ItemDetailsUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<InventoryItem> {
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "SELECT {} FROM inventory_items WHERE id = $1 FOR UPDATE",
            ITEM_COLUMNS
        );
        let mut item: InventoryItem = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Inventory item", id))?
            .into();

        item.apply_details(update, now)?;

        sqlx::query(
            r#"
            UPDATE inventory_items
            SET name = $2, unit = $3, minimum_threshold = $4,
                average_daily_usage = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&item.name)
        .bind(&item.unit)
        .bind(item.minimum_threshold)
        .bind(item.average_daily_usage)
        .bind(item.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(item)
    }

    async fn delete_item(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        let locked = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM inventory_items WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        if locked.is_none() {
            return Err(not_found("Inventory item", id));
        }

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM inventory_purchases WHERE item_id = $1)
                OR EXISTS(SELECT 1 FROM inventory_consumptions WHERE item_id = $1)
            "#,
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if referenced {
            return Err(AppError::InvalidState(format!(
                "inventory item {} still has purchases or consumptions",
                id
            )));
        }

        sqlx::query("DELETE FROM inventory_items WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Purchases
    // ------------------------------------------------------------------

    async fn list_purchases(&self) -> AppResult<Vec<InventoryPurchase>> {
        let sql = format!(
            "SELECT {} FROM inventory_purchases ORDER BY date DESC",
            PURCHASE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PurchaseRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_purchase(&self, id: Uuid) -> AppResult<InventoryPurchase> {
        let sql = format!(
            "SELECT {} FROM inventory_purchases WHERE id = $1",
            PURCHASE_COLUMNS
        );
        sqlx::query_as::<_, PurchaseRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found("Purchase", id))
    }

    async fn create_purchase(
        &self,
        purchase: InventoryPurchase,
    ) -> AppResult<StockChange<InventoryPurchase>> {
        let mut tx = self.db.begin().await?;
        require_item(&mut tx, purchase.item_id).await?;
        require_remittance(&mut tx, purchase.linked_remittance_id).await?;

        write_purchase(&mut tx, &purchase).await?;
        let movements = stock_movements(None, Some(&purchase));
        let items = apply_movements(&mut tx, &movements, purchase.created_at).await?;

        tx.commit().await?;
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
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "SELECT {} FROM inventory_purchases WHERE id = $1 FOR UPDATE",
            PURCHASE_COLUMNS
        );
        let mut purchase: InventoryPurchase = sqlx::query_as::<_, PurchaseRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Purchase", id))?
            .into();

        let movements = purchase.apply_update(update, now)?;
        require_item(&mut tx, purchase.item_id).await?;
        require_remittance(&mut tx, purchase.linked_remittance_id).await?;

        write_purchase(&mut tx, &purchase).await?;
        let items = apply_movements(&mut tx, &movements, now).await?;

        tx.commit().await?;
        Ok(StockChange {
            record: purchase,
            movements,
            items,
        })
    }

    async fn delete_purchase(&self, id: Uuid) -> AppResult<StockChange<InventoryPurchase>> {
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "DELETE FROM inventory_purchases WHERE id = $1 RETURNING {}",
            PURCHASE_COLUMNS
        );
        let purchase: InventoryPurchase = sqlx::query_as::<_, PurchaseRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Purchase", id))?
            .into();

        let movements = stock_movements(Some(&purchase), None);
        let items = apply_movements(&mut tx, &movements, Utc::now()).await?;

        tx.commit().await?;
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
        let sql = format!(
            "SELECT {} FROM inventory_consumptions ORDER BY date DESC",
            CONSUMPTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ConsumptionRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn get_consumption(&self, id: Uuid) -> AppResult<InventoryConsumption> {
        let sql = format!(
            "SELECT {} FROM inventory_consumptions WHERE id = $1",
            CONSUMPTION_COLUMNS
        );
        sqlx::query_as::<_, ConsumptionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .map(Into::into)
            .ok_or_else(|| not_found("Consumption", id))
    }

    async fn create_consumption(
        &self,
        consumption: InventoryConsumption,
    ) -> AppResult<StockChange<InventoryConsumption>> {
        let mut tx = self.db.begin().await?;
        require_item(&mut tx, consumption.item_id).await?;

        write_consumption(&mut tx, &consumption).await?;
        let movements = stock_movements(None, Some(&consumption));
        let items = apply_movements(&mut tx, &movements, consumption.created_at).await?;

        tx.commit().await?;
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
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "SELECT {} FROM inventory_consumptions WHERE id = $1 FOR UPDATE",
            CONSUMPTION_COLUMNS
        );
        let mut consumption: InventoryConsumption = sqlx::query_as::<_, ConsumptionRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Consumption", id))?
            .into();

        let movements = consumption.apply_update(update, now)?;
        require_item(&mut tx, consumption.item_id).await?;

        write_consumption(&mut tx, &consumption).await?;
        let items = apply_movements(&mut tx, &movements, now).await?;

        tx.commit().await?;
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
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "DELETE FROM inventory_consumptions WHERE id = $1 RETURNING {}",
            CONSUMPTION_COLUMNS
        );
        let consumption: InventoryConsumption = sqlx::query_as::<_, ConsumptionRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Consumption", id))?
            .into();

        let movements = stock_movements(Some(&consumption), None);
        let items = apply_movements(&mut tx, &movements, Utc::now()).await?;

        tx.commit().await?;
        Ok(StockChange {
            record: consumption,
            movements,
            items,
        })
    }

    async fn audit_stock(&self) -> AppResult<StockAudit> {
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ, READ ONLY")
            .execute(&mut *tx)
            .await?;
        let (items, purchases, consumptions) = load_stock_log(&mut tx, false).await?;
        tx.commit().await?;
        Ok(audit_stock(&items, &purchases, &consumptions))
    }

    async fn rebuild_stock(&self, now: DateTime<Utc>) -> AppResult<Vec<StockDrift>> {
        let mut tx = self.db.begin().await?;
        let (items, purchases, consumptions) = load_stock_log(&mut tx, true).await?;

        let corrections: Vec<StockDrift> = audit_stock(&items, &purchases, &consumptions)
            .items
            .into_iter()
            .filter(|d| !d.drift.is_zero())
            .collect();

        for drift in &corrections {
            sqlx::query(
                "UPDATE inventory_items SET current_stock = $2, updated_at = $3 WHERE id = $1",
            )
            .bind(drift.item_id)
            .bind(drift.recomputed)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(corrections)
    }

    // ------------------------------------------------------------------
    // Remittances
    // ------------------------------------------------------------------

    async fn list_remittances(&self) -> AppResult<Vec<Remittance>> {
        let sql = format!(
            "SELECT {} FROM remittances ORDER BY date DESC",
            REMITTANCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, RemittanceRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        collect(rows)
    }

    async fn get_remittance(&self, id: Uuid) -> AppResult<Remittance> {
        let sql = format!("SELECT {} FROM remittances WHERE id = $1", REMITTANCE_COLUMNS);
        sqlx::query_as::<_, RemittanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| not_found("Remittance", id))?
            .try_into()
    }

    async fn insert_remittance(&self, remittance: Remittance) -> AppResult<Remittance> {
        let mut tx = self.db.begin().await?;
        write_remittance(&mut tx, &remittance).await?;
        tx.commit().await?;
        Ok(remittance)
    }

    async fn confirm_remittance(&self, id: Uuid, now: DateTime<Utc>) -> AppResult<Remittance> {
        let mut tx = self.db.begin().await?;
        let mut remittance = lock_remittance(&mut tx, id).await?;
        remittance.confirm(now)?;
        write_remittance(&mut tx, &remittance).await?;
        tx.commit().await?;
        Ok(remittance)
    }

    async fn update_remittance(
        &self,
        id: Uuid,
        update: RemittanceUpdate,
        now: DateTime<Utc>,
    ) -> AppResult<Remittance> {
        let mut tx = self.db.begin().await?;
        let mut remittance = lock_remittance(&mut tx, id).await?;
        remittance.apply_update(update, now)?;
        write_remittance(&mut tx, &remittance).await?;
        tx.commit().await?;
        Ok(remittance)
    }

    async fn delete_remittance(&self, id: Uuid) -> AppResult<()> {
        let mut tx = self.db.begin().await?;
        lock_remittance(&mut tx, id).await?;

        let linked = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM inventory_purchases WHERE linked_remittance_id = $1",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if linked > 0 {
            return Err(AppError::InvalidState(format!(
                "remittance {} is linked to {} purchase(s)",
                id, linked
            )));
        }

        sqlx::query("DELETE FROM remittances WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn sum_confirmed(
        &self,
        purpose: Option<RemittancePurpose>,
    ) -> AppResult<RemittanceTotals> {
        let (amount_inr, amount_rub, count) = sqlx::query_as::<_, (Decimal, Decimal, i64)>(
            r#"
            SELECT COALESCE(SUM(amount_inr), 0), COALESCE(SUM(amount_rub), 0), COUNT(*)
            FROM remittances
            WHERE status = 'confirmed' AND ($1::TEXT IS NULL OR purpose = $1)
            "#,
        )
        .bind(purpose.map(|p| p.as_str()))
        .fetch_one(&self.db)
        .await?;

        Ok(RemittanceTotals {
            amount_inr,
            amount_rub,
            count,
        })
    }

    async fn count_unconfirmed_remittances(&self) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM remittances WHERE status <> 'confirmed'",
        )
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn sum_purchases(&self, since: Option<DateTime<Utc>>) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(price_rub), 0)
            FROM inventory_purchases
            WHERE ($1::TIMESTAMPTZ IS NULL OR date >= $1)
            "#,
        )
        .bind(since)
        .fetch_one(&self.db)
        .await?;
        Ok(total)
    }

    async fn sum_purchases_linked_to_other_purposes(&self) -> AppResult<Decimal> {
        let total = sqlx::query_scalar::<_, Decimal>(
            r#"
            SELECT COALESCE(SUM(p.price_rub), 0)
            FROM inventory_purchases p
            JOIN remittances r ON r.id = p.linked_remittance_id
            WHERE r.purpose <> 'Groceries'
            "#,
        )
        .fetch_one(&self.db)
        .await?;
        Ok(total)
    }

    // ------------------------------------------------------------------
    // Staff
    // ------------------------------------------------------------------

    async fn list_staff(&self) -> AppResult<Vec<StaffLedger>> {
        let mut tx = self.db.begin().await?;
        let sql = format!("SELECT {} FROM staff_ledgers ORDER BY staff_name", STAFF_COLUMNS);
        let rows = sqlx::query_as::<_, StaffRow>(&sql)
            .fetch_all(&mut *tx)
            .await?;

        let mut ledgers = Vec::with_capacity(rows.len());
        for row in rows {
            let history = load_history(&mut tx, row.id).await?;
            ledgers.push(row.into_ledger(history));
        }
        tx.commit().await?;
        Ok(ledgers)
    }

    async fn get_staff(&self, id: Uuid) -> AppResult<StaffLedger> {
        let mut tx = self.db.begin().await?;
        let sql = format!("SELECT {} FROM staff_ledgers WHERE id = $1", STAFF_COLUMNS);
        let row = sqlx::query_as::<_, StaffRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Staff ledger", id))?;
        let history = load_history(&mut tx, id).await?;
        tx.commit().await?;
        Ok(row.into_ledger(history))
    }

    async fn insert_staff(&self, ledger: StaffLedger) -> AppResult<StaffLedger> {
        sqlx::query(
            r#"
            INSERT INTO staff_ledgers (
                id, staff_name, monthly_salary_rub, salary_paid_rub, advances_rub,
                setup_cost_owed_rub, setup_cost_paid_rub, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(ledger.id)
        .bind(&ledger.staff_name)
        .bind(ledger.monthly_salary_rub)
        .bind(ledger.salary_paid_rub)
        .bind(ledger.advances_rub)
        .bind(ledger.setup_cost_owed_rub)
        .bind(ledger.setup_cost_paid_rub)
        .bind(ledger.created_at)
        .bind(ledger.updated_at)
        .execute(&self.db)
        .await?;
        Ok(ledger)
    }

    async fn mutate_staff(
        &self,
        id: Uuid,
        visible_to: Role,
        mutation: StaffMutation,
    ) -> AppResult<StaffChange> {
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "SELECT {} FROM staff_ledgers WHERE id = $1 FOR UPDATE",
            STAFF_COLUMNS
        );
        let row = sqlx::query_as::<_, StaffRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .filter(|r| visible_to.can_see_staff(&r.staff_name))
            .ok_or_else(|| not_found("Staff ledger", id))?;
        let history = load_history(&mut tx, id).await?;
        let mut ledger = row.into_ledger(history);

        let entry = ledger.apply(mutation)?;

        sqlx::query(
            r#"
            UPDATE staff_ledgers
            SET staff_name = $2, monthly_salary_rub = $3, salary_paid_rub = $4,
                advances_rub = $5, setup_cost_owed_rub = $6, setup_cost_paid_rub = $7,
                updated_at = $8
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&ledger.staff_name)
        .bind(ledger.monthly_salary_rub)
        .bind(ledger.salary_paid_rub)
        .bind(ledger.advances_rub)
        .bind(ledger.setup_cost_owed_rub)
        .bind(ledger.setup_cost_paid_rub)
        .bind(ledger.updated_at)
        .execute(&mut *tx)
        .await?;

        if let Some(entry) = &entry {
            sqlx::query(
                r#"
                INSERT INTO payroll_entries (id, staff_id, date, amount, entry_type, note, compensates)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                "#,
            )
            .bind(entry.id)
            .bind(id)
            .bind(entry.date)
            .bind(entry.amount)
            .bind(entry.entry_type.as_str())
            .bind(&entry.note)
            .bind(entry.compensates)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(StaffChange { ledger, entry })
    }

    async fn delete_staff(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM staff_ledgers WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Staff ledger", id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------

    async fn insert_fund_request(&self, request: FundRequest) -> AppResult<FundRequest> {
        sqlx::query(
            r#"
            INSERT INTO fund_requests (
                id, amount_rub, purpose, requested_by, status, notes, date_requested, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(request.id)
        .bind(request.amount_rub)
        .bind(&request.purpose)
        .bind(&request.requested_by)
        .bind(request.status.as_str())
        .bind(&request.notes)
        .bind(request.date_requested)
        .bind(request.updated_at)
        .execute(&self.db)
        .await?;
        Ok(request)
    }

    async fn list_fund_requests(&self) -> AppResult<Vec<FundRequest>> {
        let sql = format!(
            "SELECT {} FROM fund_requests ORDER BY date_requested DESC",
            FUND_REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, FundRequestRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        collect(rows)
    }

    async fn advance_fund_request(
        &self,
        id: Uuid,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> AppResult<FundRequest> {
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "SELECT {} FROM fund_requests WHERE id = $1 FOR UPDATE",
            FUND_REQUEST_COLUMNS
        );
        let mut request: FundRequest = sqlx::query_as::<_, FundRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Fund request", id))?
            .try_into()?;

        request.advance(next, now)?;

        sqlx::query("UPDATE fund_requests SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(request.status.as_str())
            .bind(request.updated_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn insert_inventory_request(
        &self,
        request: InventoryRequest,
    ) -> AppResult<InventoryRequest> {
        sqlx::query(
            r#"
            INSERT INTO inventory_requests (
                id, item_name, quantity_needed, unit, requested_by, status, notes,
                date_requested, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(request.id)
        .bind(&request.item_name)
        .bind(request.quantity_needed)
        .bind(&request.unit)
        .bind(&request.requested_by)
        .bind(request.status.as_str())
        .bind(&request.notes)
        .bind(request.date_requested)
        .bind(request.updated_at)
        .execute(&self.db)
        .await?;
        Ok(request)
    }

    async fn list_inventory_requests(&self) -> AppResult<Vec<InventoryRequest>> {
        let sql = format!(
            "SELECT {} FROM inventory_requests ORDER BY date_requested DESC",
            INVENTORY_REQUEST_COLUMNS
        );
        let rows = sqlx::query_as::<_, InventoryRequestRow>(&sql)
            .fetch_all(&self.db)
            .await?;
        collect(rows)
    }

    async fn advance_inventory_request(
        &self,
        id: Uuid,
        next: RequestStatus,
        now: DateTime<Utc>,
    ) -> AppResult<InventoryRequest> {
        let mut tx = self.db.begin().await?;
        let sql = format!(
            "SELECT {} FROM inventory_requests WHERE id = $1 FOR UPDATE",
            INVENTORY_REQUEST_COLUMNS
        );
        let mut request: InventoryRequest = sqlx::query_as::<_, InventoryRequestRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| not_found("Inventory request", id))?
            .try_into()?;

        request.advance(next, now)?;

        sqlx::query("UPDATE inventory_requests SET status = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(request.status.as_str())
            .bind(request.updated_at)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn delete_request(&self, kind: RequestKind, id: Uuid) -> AppResult<()> {
        let sql = match kind {
            RequestKind::Fund => "DELETE FROM fund_requests WHERE id = $1",
            RequestKind::Inventory => "DELETE FROM inventory_requests WHERE id = $1",
        };
        let result = sqlx::query(sql).bind(id).execute(&self.db).await?;
        if result.rows_affected() == 0 {
            return Err(not_found("Request", id));
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Dashboard inputs
    // ------------------------------------------------------------------

    async fn insert_income(&self, income: Income) -> AppResult<Income> {
        sqlx::query("INSERT INTO income (id, amount_inr, source, date) VALUES ($1, $2, $3, $4)")
            .bind(income.id)
            .bind(income.amount_inr)
            .bind(&income.source)
            .bind(income.date)
            .execute(&self.db)
            .await?;
        Ok(income)
    }

    async fn insert_meal_contract(&self, contract: MealContract) -> AppResult<MealContract> {
        sqlx::query(
            r#"
            INSERT INTO meal_contracts (id, student_name, monthly_fee_inr, status, start_date, end_date)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(contract.id)
        .bind(&contract.student_name)
        .bind(contract.monthly_fee_inr)
        .bind(contract.status.as_str())
        .bind(contract.start_date)
        .bind(contract.end_date)
        .execute(&self.db)
        .await?;
        Ok(contract)
    }

    async fn sum_income(&self) -> AppResult<Decimal> {
        let total =
            sqlx::query_scalar::<_, Decimal>("SELECT COALESCE(SUM(amount_inr), 0) FROM income")
                .fetch_one(&self.db)
                .await?;
        Ok(total)
    }

    async fn count_active_contracts(&self, as_of: NaiveDate) -> AppResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM meal_contracts WHERE status = 'active' AND end_date >= $1",
        )
        .bind(as_of)
        .fetch_one(&self.db)
        .await?;
        Ok(count)
    }

    async fn recent_remittances(&self, limit: i64) -> AppResult<Vec<Remittance>> {
        let sql = format!(
            "SELECT {} FROM remittances ORDER BY date DESC LIMIT $1",
            REMITTANCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, RemittanceRow>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        collect(rows)
    }

    async fn recent_purchases(&self, limit: i64) -> AppResult<Vec<InventoryPurchase>> {
        let sql = format!(
            "SELECT {} FROM inventory_purchases ORDER BY date DESC LIMIT $1",
            PURCHASE_COLUMNS
        );
        let rows = sqlx::query_as::<_, PurchaseRow>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn recent_consumptions(&self, limit: i64) -> AppResult<Vec<InventoryConsumption>> {
        let sql = format!(
            "SELECT {} FROM inventory_consumptions ORDER BY date DESC LIMIT $1",
            CONSUMPTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, ConsumptionRow>(&sql)
            .bind(limit)
            .fetch_all(&self.db)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn reset_all(&self) -> AppResult<ResetCounts> {
        let mut tx = self.db.begin().await?;
        let mut counts = ResetCounts::default();

        // children before parents
        counts.inventory_purchases = sqlx::query("DELETE FROM inventory_purchases")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.inventory_consumptions = sqlx::query("DELETE FROM inventory_consumptions")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.inventory_items = sqlx::query("DELETE FROM inventory_items")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.remittances = sqlx::query("DELETE FROM remittances")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.staff_ledgers = sqlx::query("DELETE FROM staff_ledgers")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.fund_requests = sqlx::query("DELETE FROM fund_requests")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.inventory_requests = sqlx::query("DELETE FROM inventory_requests")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.income = sqlx::query("DELETE FROM income")
            .execute(&mut *tx)
            .await?
            .rows_affected();
        counts.meal_contracts = sqlx::query("DELETE FROM meal_contracts")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(counts)
    }
}

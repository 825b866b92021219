//! CSV exports of the ledgers

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use shared::{Operation, Role};

use super::authorize;
use crate::error::{AppError, AppResult};
use crate::store::LedgerStore;

#[derive(Debug, Serialize)]
pub struct RemittanceRow {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub purpose: String,
    pub status: String,
    pub sent_to: String,
    pub amount_inr: Decimal,
    pub rubal_rate: Decimal,
    pub amount_rub: Decimal,
}

#[derive(Debug, Serialize)]
pub struct PurchaseRow {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub item: String,
    pub quantity: Decimal,
    pub price_rub: Decimal,
    pub purchased_by: String,
    pub linked_remittance_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct PayrollRow {
    pub staff_name: String,
    pub entry_id: Uuid,
    pub date: DateTime<Utc>,
    pub entry_type: String,
    pub amount: Decimal,
    pub compensates: Option<Uuid>,
    pub note: Option<String>,
}

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    store: Arc<dyn LedgerStore>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    pub async fn remittance_rows(&self, role: Role) -> AppResult<Vec<RemittanceRow>> {
        authorize(role, Operation::ViewRemittances)?;
        let remittances = self.store.list_remittances().await?;
        Ok(remittances
            .into_iter()
            .map(|r| RemittanceRow {
                id: r.id,
                date: r.date,
                purpose: r.purpose.as_str().to_string(),
                status: r.status.as_str().to_string(),
                sent_to: r.sent_to,
                amount_inr: r.amount_inr,
                rubal_rate: r.rubal_rate,
                amount_rub: r.amount_rub,
            })
            .collect())
    }

    pub async fn purchase_rows(&self, role: Role) -> AppResult<Vec<PurchaseRow>> {
        authorize(role, Operation::ViewInventory)?;
        let (items, purchases) =
            tokio::try_join!(self.store.list_items(), self.store.list_purchases())?;
        let names: HashMap<Uuid, String> = items.into_iter().map(|i| (i.id, i.name)).collect();

        Ok(purchases
            .into_iter()
            .map(|p| PurchaseRow {
                id: p.id,
                date: p.date,
                item: names.get(&p.item_id).cloned().unwrap_or_default(),
                quantity: p.quantity,
                price_rub: p.price_rub,
                purchased_by: p.purchased_by,
                linked_remittance_id: p.linked_remittance_id,
            })
            .collect())
    }

    /// Flattened history of every ledger visible to `role`
    pub async fn payroll_rows(&self, role: Role) -> AppResult<Vec<PayrollRow>> {
        authorize(role, Operation::ViewPayroll)?;
        let ledgers = self.store.list_staff().await?;

        Ok(ledgers
            .into_iter()
            .filter(|l| role.can_see_staff(&l.staff_name))
            .flat_map(|l| {
                let staff_name = l.staff_name;
                l.history.into_iter().map(move |e| PayrollRow {
                    staff_name: staff_name.clone(),
                    entry_id: e.id,
                    date: e.date,
                    entry_type: e.entry_type.as_str().to_string(),
                    amount: e.amount,
                    compensates: e.compensates,
                    note: e.note,
                })
            })
            .collect())
    }

    /// Export data to CSV format
    pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        for record in data {
            wtr.serialize(record)
                .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_export_writes_header_and_rows() {
        let rows = vec![PayrollRow {
            staff_name: "Cook Olga".to_string(),
            entry_id: Uuid::nil(),
            date: DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
            entry_type: "salary_paid".to_string(),
            amount: Decimal::from_str("1500").unwrap(),
            compensates: None,
            note: Some("March".to_string()),
        }];

        let csv = ReportingService::export_to_csv(&rows).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("staff_name,entry_id,date,entry_type,amount,compensates,note")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("Cook Olga,"));
        assert!(row.contains(",salary_paid,1500,,March"));
    }

    #[test]
    fn test_empty_export_is_empty() {
        let rows: Vec<RemittanceRow> = Vec::new();
        assert_eq!(ReportingService::export_to_csv(&rows).unwrap(), "");
    }
}

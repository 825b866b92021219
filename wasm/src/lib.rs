//! WebAssembly module for Spice Ledger
//!
//! Client-side previews of ledger arithmetic, so forms can show the derived
//! value before the server records it:
//! - INR to RUB conversion at a given rate
//! - Staff pending balance
//! - Budget status and low-stock classification
//! - Role capability checks for hiding controls
//!
//! Amounts cross the boundary as decimal strings.

use std::str::FromStr;

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::{
    is_below_threshold, pending_balance, BudgetSnapshot, ConversionSnapshot, Operation, Role,
};

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    web_sys::console::debug_1(&JsValue::from_str("spice-ledger wasm loaded"));
}

fn parse_amount(field: &str, value: &str) -> Result<Decimal, JsValue> {
    Decimal::from_str(value.trim())
        .map_err(|_| JsValue::from_str(&format!("{}: '{}' is not a number", field, value)))
}

/// RUB received for `amount_inr` at `rubal_rate`
#[wasm_bindgen]
pub fn preview_remittance_rub(amount_inr: &str, rubal_rate: &str) -> Result<String, JsValue> {
    let snapshot = ConversionSnapshot::take(
        parse_amount("amount_inr", amount_inr)?,
        parse_amount("rubal_rate", rubal_rate)?,
    )
    .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(snapshot.amount_rub.normalize().to_string())
}

/// Pending balance from a ledger's cumulative fields
#[wasm_bindgen]
pub fn preview_pending_balance(
    monthly_salary_rub: &str,
    salary_paid_rub: &str,
    advances_rub: &str,
    setup_cost_paid_rub: &str,
) -> Result<String, JsValue> {
    let pending = pending_balance(
        parse_amount("monthly_salary_rub", monthly_salary_rub)?,
        parse_amount("salary_paid_rub", salary_paid_rub)?,
        parse_amount("advances_rub", advances_rub)?,
        parse_amount("setup_cost_paid_rub", setup_cost_paid_rub)?,
    );
    Ok(pending.normalize().to_string())
}

/// "overspent", "idle" or "balanced"
#[wasm_bindgen]
pub fn classify_budget(
    grocery_remitted_rub: &str,
    total_purchased_rub: &str,
    gap_warning_rub: &str,
) -> Result<String, JsValue> {
    let snapshot = BudgetSnapshot::from_totals(
        parse_amount("grocery_remitted_rub", grocery_remitted_rub)?,
        parse_amount("total_purchased_rub", total_purchased_rub)?,
        Decimal::ZERO,
        parse_amount("gap_warning_rub", gap_warning_rub)?,
    );
    serde_json::to_value(snapshot.status)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .ok_or_else(|| JsValue::from_str("unrepresentable budget status"))
}

/// Strictly below the minimum threshold
#[wasm_bindgen]
pub fn is_low_stock(current_stock: &str, minimum_threshold: &str) -> Result<bool, JsValue> {
    Ok(is_below_threshold(
        parse_amount("current_stock", current_stock)?,
        parse_amount("minimum_threshold", minimum_threshold)?,
    ))
}

/// Whether `role` may perform `operation` (snake_case names)
#[wasm_bindgen]
pub fn role_can(role: &str, operation: &str) -> bool {
    let Ok(role) = Role::from_str(role) else {
        return false;
    };
    serde_json::from_value::<Operation>(serde_json::Value::String(operation.to_string()))
        .map(|op| role.can(op))
        .unwrap_or(false)
}

/// Snake_case names of every operation `role` may perform
#[wasm_bindgen]
pub fn role_capabilities(role: &str) -> Result<js_sys::Array, JsValue> {
    let role = Role::from_str(role).map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(role
        .capabilities()
        .iter()
        .map(|op| JsValue::from_str(op.as_str()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_remittance() {
        assert_eq!(preview_remittance_rub("1000", "1.1").unwrap(), "1100");
        assert_eq!(preview_remittance_rub("250", "0.92").unwrap(), "230");
    }

    #[test]
    fn test_pending_balance_preview() {
        assert_eq!(
            preview_pending_balance("5000", "1000", "500", "0").unwrap(),
            "3500"
        );
        assert_eq!(
            preview_pending_balance("5000", "4000", "1500", "0").unwrap(),
            "-500"
        );
        assert_eq!(
            preview_pending_balance("5000", "1000", "500", "300").unwrap(),
            pending_balance(
                Decimal::from(5000),
                Decimal::from(1000),
                Decimal::from(500),
                Decimal::from(300)
            )
            .to_string()
        );
    }

    #[test]
    fn test_budget_classification() {
        assert_eq!(classify_budget("1000", "1100", "50000").unwrap(), "overspent");
        assert_eq!(classify_budget("60000", "5000", "50000").unwrap(), "idle");
        assert_eq!(classify_budget("1000", "950", "50000").unwrap(), "balanced");
    }

    #[test]
    fn test_low_stock_is_strict() {
        assert!(is_low_stock("2", "5").unwrap());
        assert!(!is_low_stock("5", "5").unwrap());
        assert!(is_low_stock("-8", "0").unwrap());
    }

    #[test]
    fn test_role_can() {
        assert!(role_can("admin", "reset_data"));
        assert!(role_can("cook", "record_consumption"));
        assert!(!role_can("cook", "record_purchase"));
        assert!(!role_can("manager", "confirm_remittance"));
        assert!(!role_can("owner", "view_dashboard"));
        assert!(!role_can("admin", "fly"));
    }
}

//! Validation utilities for Spice Ledger
//!
//! Every ledger mutation runs these checks before touching any state, so a
//! rejected request never leaves a partial write behind.

use rust_decimal::Decimal;

use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// Amount Validations
// ============================================================================

/// Validate that a money amount or quantity is strictly positive
pub fn validate_positive(field: &str, value: Decimal) -> LedgerResult<()> {
    if value <= Decimal::ZERO {
        return Err(LedgerError::validation(field, "must be greater than zero"));
    }
    Ok(())
}

/// Validate that a value is zero or positive
pub fn validate_non_negative(field: &str, value: Decimal) -> LedgerResult<()> {
    if value < Decimal::ZERO {
        return Err(LedgerError::validation(field, "cannot be negative"));
    }
    Ok(())
}

/// Validate an optional positive value (absent is fine)
pub fn validate_optional_positive(field: &str, value: Option<Decimal>) -> LedgerResult<()> {
    match value {
        Some(v) => validate_positive(field, v),
        None => Ok(()),
    }
}

// ============================================================================
// Text Validations
// ============================================================================

/// Validate a required free-text field and return it trimmed
pub fn validate_required_text(field: &str, value: &str) -> LedgerResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::validation(field, "is required"));
    }
    if trimmed.chars().count() > 200 {
        return Err(LedgerError::validation(field, "must be at most 200 characters"));
    }
    Ok(trimmed.to_string())
}

/// Normalise an optional note: blank notes are dropped
pub fn normalize_note(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Validate that a required reference was supplied
pub fn require<T>(field: &str, value: Option<T>) -> LedgerResult<T> {
    value.ok_or_else(|| LedgerError::validation(field, "is required"))
}

// ============================================================================
// Tests
// ============================================================================

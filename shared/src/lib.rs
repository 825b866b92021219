//! Shared types and models for the Spice Ledger platform
//!
//! This crate holds the domain models and the pure reconciliation rules that
//! both the backend stores and the browser (via WASM) rely on.

pub mod alerts;
pub mod budget;
pub mod currency;
pub mod error;
pub mod models;
pub mod types;
pub mod validation;

pub use alerts::*;
pub use budget::*;
pub use currency::*;
pub use error::*;
pub use models::*;
pub use types::*;
pub use validation::*;

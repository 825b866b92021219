//! Domain models for the Spice Ledger platform

mod activity;
mod contract;
mod inventory;
mod payroll;
mod remittance;
mod request;

pub use activity::*;
pub use contract::*;
pub use inventory::*;
pub use payroll::*;
pub use remittance::*;
pub use request::*;

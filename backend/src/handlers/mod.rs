//! HTTP handlers

pub mod auth;
pub mod budget;
pub mod dashboard;
pub mod health;
pub mod inventory;
pub mod maintenance;
pub mod remittance;
pub mod reporting;
pub mod requests;
pub mod staff;

pub use auth::*;
pub use budget::*;
pub use dashboard::*;
pub use health::*;
pub use inventory::*;
pub use maintenance::*;
pub use remittance::*;
pub use reporting::*;
pub use requests::*;
pub use staff::*;

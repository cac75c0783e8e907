//! HTTP handlers for the Retail Management Platform

pub mod auth;
pub mod batches;
pub mod inventory;
pub mod purchases;
pub mod sales;

pub use auth::*;
pub use batches::*;
pub use inventory::*;
pub use purchases::*;
pub use sales::*;

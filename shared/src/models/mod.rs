//! Domain models for the Retail Management Platform

mod batch;
mod inventory;
mod party;
mod purchase;
mod sale;
mod stock_log;
mod user;

pub use batch::*;
pub use inventory::*;
pub use party::*;
pub use purchase::*;
pub use sale::*;
pub use stock_log::*;
pub use user::*;

//! Business logic services
//!
//! All services own a `PgPool` clone. Multi-step ledger operations take an
//! open transaction so the orchestrating service controls the atomicity
//! boundary; reads that back HTTP endpoints go straight to the pool.

pub mod allocation;
pub mod auth;
pub mod batch;
pub mod inventory;
pub mod invoice_number;
pub mod purchase;
pub mod sale;
pub mod stock_log;

pub use auth::AuthService;
pub use batch::BatchService;
pub use inventory::InventoryService;
pub use purchase::PurchaseService;
pub use sale::SaleService;
pub use stock_log::StockLogService;

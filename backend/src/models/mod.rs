//! Database models for the Retail Management Platform
//!
//! Re-exports models from the shared crate.

pub use shared::models::*;

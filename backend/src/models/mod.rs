//! Database models for the Bakehouse Inventory Platform
//!
//! Re-exports models from the shared crate

pub use shared::models::*;

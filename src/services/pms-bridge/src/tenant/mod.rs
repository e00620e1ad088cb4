//! Tenant configuration storage and per-tenant processing statistics

pub mod stats;
pub mod store;

pub use stats::StatsTracker;
pub use store::{FsTenantStore, TenantStore};

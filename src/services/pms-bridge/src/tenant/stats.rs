//! Per-tenant processing statistics
//!
//! Counters live in the tenant store and are updated with a load, increment, save
//! sequence. Each tenant has an async mutex held across that sequence so concurrent
//! requests inside one process never lose an increment. Reads take the same lock.
//! A tenant's lock exists only while some request holds or waits for it, so the lock
//! table is bounded by in-flight requests. Writers in other processes sharing the same
//! directory are not coordinated.

use super::store::TenantStore;
use crate::error::{BridgeError, BridgeResult};
use crate::models::{Stats, TenantCode};
use chrono::Utc;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Records feed outcomes per tenant
pub struct StatsTracker {
    store: Arc<dyn TenantStore>,
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl StatsTracker {
    pub fn new(store: Arc<dyn TenantStore>) -> Self {
        Self {
            store,
            locks: DashMap::new(),
        }
    }

    /// Count one successfully translated feed and stamp `last_sync`
    pub async fn record_success(&self, code: &TenantCode) -> BridgeResult<Stats> {
        self.update(code, |stats| {
            stats.records_processed += 1;
            stats.last_sync = Some(Utc::now());
        })
        .await
    }

    /// Count one failed feed
    pub async fn record_error(&self, code: &TenantCode) -> BridgeResult<Stats> {
        self.update(code, |stats| stats.errors += 1).await
    }

    /// Current persisted counters
    pub async fn snapshot(&self, code: &TenantCode) -> BridgeResult<Stats> {
        self.with_lock(code, self.store.load_stats(code)).await
    }

    async fn update<F>(&self, code: &TenantCode, apply: F) -> BridgeResult<Stats>
    where
        F: FnOnce(&mut Stats),
    {
        let store = &self.store;
        let stats = self
            .with_lock(code, async move {
                let mut stats = store.load_stats(code).await?;
                apply(&mut stats);
                store.save_stats(code, &stats).await?;
                Ok::<_, BridgeError>(stats)
            })
            .await?;

        debug!(
            tenant_code = %code,
            records_processed = stats.records_processed,
            errors = stats.errors,
            "Stats persisted"
        );
        Ok(stats)
    }

    async fn with_lock<T, Fut>(&self, code: &TenantCode, work: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        let lock = self
            .locks
            .entry(code.as_str().to_string())
            .or_default()
            .clone();

        let result = {
            let _guard = lock.lock().await;
            work.await
        };

        // Entries are only cloned under the shard lock, so a count of one means no
        // other request can be holding or waiting on this mutex
        drop(lock);
        self.locks
            .remove_if(code.as_str(), |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.len()
    }
}

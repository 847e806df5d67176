//! In-memory backend with fault injection.
//!
//! Behaves like the PostgreSQL backend as far as callers can observe:
//! writes and reads fail until the schema exists, and every operation fails
//! with [`StoreError::Unavailable`] while the store is marked down. A stalled
//! store accepts calls and never answers them.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use tracing::debug;

use valuegrid_core::{BoxFuture, Index, RequestRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::RequestStore;

#[derive(Debug, Default)]
struct Inner {
    records: Mutex<Vec<RequestRecord>>,
    schema_ready: AtomicBool,
    schema_creations: AtomicU32,
    fail_schema: AtomicBool,
    down: AtomicBool,
    stalled: AtomicBool,
    /// Remaining pings to refuse before answering.
    refuse_pings: AtomicU32,
    ping_attempts: AtomicU32,
}

/// Thread-safe in-memory request history. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    /// Empty store without the `values` table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store with the table already created.
    pub fn ready() -> Self {
        let store = Self::new();
        store.inner.schema_ready.store(true, Ordering::SeqCst);
        store
    }

    /// Refuse the next `n` liveness queries.
    pub fn refuse_pings(self, n: u32) -> Self {
        self.inner.refuse_pings.store(n, Ordering::SeqCst);
        self
    }

    /// Make schema creation fail (e.g. missing privileges).
    pub fn fail_schema(self) -> Self {
        self.inner.fail_schema.store(true, Ordering::SeqCst);
        self
    }

    /// Simulate an outage (`true`) or recovery (`false`).
    pub fn set_down(&self, down: bool) {
        self.inner.down.store(down, Ordering::SeqCst);
    }

    /// Make every call hang (`true`) like a peer that stopped responding.
    /// Only affects calls made after the switch.
    pub fn set_stalled(&self, stalled: bool) {
        self.inner.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Number of liveness queries received so far.
    pub fn ping_attempts(&self) -> u32 {
        self.inner.ping_attempts.load(Ordering::SeqCst)
    }

    /// Number of successful `ensure_schema` calls.
    pub fn schema_creations(&self) -> u32 {
        self.inner.schema_creations.load(Ordering::SeqCst)
    }

    pub fn schema_ready(&self) -> bool {
        self.inner.schema_ready.load(Ordering::SeqCst)
    }

    /// Snapshot of stored rows.
    pub fn records(&self) -> Vec<RequestRecord> {
        self.inner
            .records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }

    async fn stall_if_set(&self) {
        if self.inner.stalled.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
    }

    fn check_up(&self) -> StoreResult<()> {
        if self.inner.down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store is down".to_string()));
        }
        Ok(())
    }

    fn check_schema(&self) -> StoreResult<()> {
        if !self.schema_ready() {
            return Err(StoreError::Schema(
                "relation \"values\" does not exist".to_string(),
            ));
        }
        Ok(())
    }
}

impl RequestStore for MemoryStore {
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let attempt = self.inner.ping_attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.stall_if_set().await;
            self.check_up()?;
            let refused = self
                .inner
                .refuse_pings
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if refused {
                debug!(attempt, "memory store refused ping");
                return Err(StoreError::Unavailable(format!(
                    "connection refused (attempt {attempt})"
                )));
            }
            Ok(())
        })
    }

    fn ensure_schema(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.stall_if_set().await;
            self.check_up()?;
            if self.inner.fail_schema.load(Ordering::SeqCst) {
                return Err(StoreError::Schema(
                    "permission denied for schema public".to_string(),
                ));
            }
            self.inner.schema_ready.store(true, Ordering::SeqCst);
            self.inner.schema_creations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn record_request(&self, index: Index) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            self.stall_if_set().await;
            self.check_up()?;
            self.check_schema()?;
            let mut records = self
                .inner
                .records
                .lock()
                .map_err(|e| StoreError::Write(e.to_string()))?;
            records.push(RequestRecord::from(index));
            Ok(())
        })
    }

    fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<RequestRecord>>> {
        Box::pin(async move {
            self.stall_if_set().await;
            self.check_up()?;
            self.check_schema()?;
            let records = self
                .inner
                .records
                .lock()
                .map_err(|e| StoreError::Read(e.to_string()))?;
            Ok(records.clone())
        })
    }
}

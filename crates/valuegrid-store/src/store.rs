//! The durable store seam.

use valuegrid_core::{BoxFuture, Index, RequestRecord};

use crate::error::StoreResult;

/// Append-only request history — injected for testability.
///
/// Implementations hold a handle that is safe to share across concurrent
/// requests; callers never serialize access.
pub trait RequestStore: Send + Sync {
    /// Trivial liveness query. Used only by the startup gate.
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>>;

    /// Create the `values` table if it does not exist. Idempotent.
    fn ensure_schema(&self) -> BoxFuture<'_, StoreResult<()>>;

    /// Append one record for `index`.
    fn record_request(&self, index: Index) -> BoxFuture<'_, StoreResult<()>>;

    /// Every record, in store-native order.
    fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<RequestRecord>>>;
}

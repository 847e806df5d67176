//! Deadline on every store call.
//!
//! A connection that was handed out healthy can still stall mid-query. The
//! wrapper turns that into [`StoreError::Timeout`] so detached writes finish
//! and read paths answer within the configured bound.

use std::future::Future;
use std::time::Duration;

use valuegrid_core::{BoxFuture, Index, RequestRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::RequestStore;

/// Applies one timeout to every [`RequestStore`] call of the inner store.
#[derive(Clone, Debug)]
pub struct BoundedStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S: RequestStore> BoundedStore<S> {
    pub fn new(inner: S, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(&self, fut: impl Future<Output = StoreResult<T>>) -> StoreResult<T> {
        tokio::time::timeout(self.timeout, fut)
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))?
    }
}

impl<S: RequestStore> RequestStore for BoundedStore<S> {
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(self.bounded(self.inner.ping()))
    }

    fn ensure_schema(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(self.bounded(self.inner.ensure_schema()))
    }

    fn record_request(&self, index: Index) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(self.bounded(self.inner.record_request(index)))
    }

    fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<RequestRecord>>> {
        Box::pin(self.bounded(self.inner.list_all()))
    }
}

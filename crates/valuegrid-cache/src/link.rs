//! Lazily-established, shared Redis connection.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use redis::RedisResult;
use redis::aio::ConnectionManager;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::error::{CacheError, CacheResult};

/// One multiplexed connection shared by every clone.
///
/// The first caller connects; if that fails the cell stays empty and the
/// next caller tries again. Every call is bounded by `timeout`.
#[derive(Clone)]
pub struct RedisLink {
    client: redis::Client,
    conn: Arc<OnceCell<ConnectionManager>>,
    timeout: Duration,
    name: &'static str,
}

impl RedisLink {
    pub fn open(url: &str, timeout: Duration, name: &'static str) -> CacheResult<Self> {
        let client = redis::Client::open(url).map_err(|e| CacheError::Command(e.to_string()))?;
        Ok(Self {
            client,
            conn: Arc::new(OnceCell::new()),
            timeout,
            name,
        })
    }

    /// Handle to the shared connection, connecting on first use.
    pub async fn connection(&self) -> CacheResult<ConnectionManager> {
        let conn = self
            .conn
            .get_or_try_init(|| async {
                let conn = self.bounded(self.client.get_connection_manager()).await?;
                debug!(link = self.name, "redis connection established");
                Ok::<_, CacheError>(conn)
            })
            .await?;
        Ok(conn.clone())
    }

    /// Apply the per-call timeout and map the error.
    pub async fn bounded<T>(&self, fut: impl Future<Output = RedisResult<T>>) -> CacheResult<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(CacheError::from),
            Err(_) => Err(CacheError::Timeout(self.timeout)),
        }
    }
}

impl std::fmt::Debug for RedisLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisLink")
            .field("name", &self.name)
            .field("connected", &self.conn.initialized())
            .field("timeout", &self.timeout)
            .finish()
    }
}

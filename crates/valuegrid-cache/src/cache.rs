//! Latest-known-value cache.

use redis::AsyncCommands;
use tracing::debug;

use valuegrid_core::config::CacheConfig;
use valuegrid_core::{BoxFuture, CurrentValues, Index, SENTINEL, VALUES_HASH};

use crate::error::CacheResult;
use crate::link::RedisLink;

/// Index → value mapping written at intake and completed by the worker.
pub trait ValueCache: Send + Sync {
    /// Upsert the sentinel for `index`, overwriting any previous value.
    fn set_placeholder(&self, index: Index) -> BoxFuture<'_, CacheResult<()>>;

    /// The whole mapping: sentinels and computed results alike.
    fn read_all(&self) -> BoxFuture<'_, CacheResult<CurrentValues>>;
}

/// Cache stored in the Redis hash `values`.
#[derive(Clone, Debug)]
pub struct RedisCache {
    link: RedisLink,
}

impl RedisCache {
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        let link = RedisLink::open(&config.url(), config.timeout(), "cache")?;
        debug!(url = %config.url(), "redis cache configured");
        Ok(Self { link })
    }
}

impl ValueCache for RedisCache {
    fn set_placeholder(&self, index: Index) -> BoxFuture<'_, CacheResult<()>> {
        Box::pin(async move {
            let mut conn = self.link.connection().await?;
            self.link
                .bounded(conn.hset::<_, _, _, ()>(VALUES_HASH, index.key(), SENTINEL))
                .await
        })
    }

    fn read_all(&self) -> BoxFuture<'_, CacheResult<CurrentValues>> {
        Box::pin(async move {
            let mut conn = self.link.connection().await?;
            self.link
                .bounded(conn.hgetall::<_, CurrentValues>(VALUES_HASH))
                .await
        })
    }
}

//! Work notification channel.
//!
//! Publishing is broadcast-and-forget: the message reaches whoever is
//! subscribed at that instant and is not stored anywhere. Nobody listening
//! is a normal outcome, reported as zero receivers.

use redis::AsyncCommands;
use tracing::debug;

use valuegrid_core::config::CacheConfig;
use valuegrid_core::{BoxFuture, Index};

use crate::error::CacheResult;
use crate::link::RedisLink;

/// A message as seen by a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub topic: String,
    /// Decimal index.
    pub payload: String,
}

pub trait NotificationChannel: Send + Sync {
    /// Broadcast `index` on `topic`. Returns how many subscribers received it.
    fn publish<'a>(&'a self, topic: &'a str, index: Index) -> BoxFuture<'a, CacheResult<usize>>;
}

/// Redis pub/sub publisher on a dedicated connection.
///
/// A connection that has issued SUBSCRIBE cannot run other commands, so the
/// publisher never shares one with the cache or with a subscriber.
#[derive(Clone, Debug)]
pub struct RedisChannel {
    link: RedisLink,
}

impl RedisChannel {
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        let link = RedisLink::open(&config.url(), config.timeout(), "publisher")?;
        debug!(url = %config.url(), "redis publisher configured");
        Ok(Self { link })
    }
}

impl NotificationChannel for RedisChannel {
    fn publish<'a>(&'a self, topic: &'a str, index: Index) -> BoxFuture<'a, CacheResult<usize>> {
        Box::pin(async move {
            let mut conn = self.link.connection().await?;
            let receivers = self
                .link
                .bounded(conn.publish::<_, _, usize>(topic, index.key()))
                .await?;
            debug!(%topic, %index, receivers, "notification published");
            Ok(receivers)
        })
    }
}

#[cfg(all(test, feature = "integration"))]
mod integration {
    use super::*;

    #[tokio::test]
    async fn publish_to_unwatched_topic_reaches_nobody() {
        let url = std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379/".into());
        let url = url.trim_start_matches("redis://").trim_end_matches('/');
        let (host, port) = url.split_once(':').unwrap_or((url, "6379"));
        let channel = RedisChannel::new(&CacheConfig {
            host: host.to_string(),
            port: port.parse().unwrap(),
            ..CacheConfig::default()
        })
        .unwrap();
        let receivers = channel
            .publish("valuegrid-test-unwatched", Index::new(1).unwrap())
            .await
            .unwrap();
        assert_eq!(receivers, 0);
    }
}

//! In-memory cache and channel, for tests and local runs.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use valuegrid_core::{BoxFuture, CurrentValues, Index, SENTINEL};

use crate::cache::ValueCache;
use crate::channel::{Notification, NotificationChannel};
use crate::error::{CacheError, CacheResult};

// ── Cache ──────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct CacheInner {
    values: Mutex<CurrentValues>,
    down: AtomicBool,
}

/// Shared in-memory hash. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct MemoryCache {
    inner: Arc<CacheInner>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage (`true`) or recovery (`false`).
    pub fn set_down(&self, down: bool) {
        self.inner.down.store(down, Ordering::SeqCst);
    }

    /// Write a computed result, as the external worker would.
    pub fn complete(&self, index: Index, value: impl Into<String>) {
        if let Ok(mut values) = self.inner.values.lock() {
            values.insert(index.key(), value.into());
        }
    }

    pub fn get(&self, index: Index) -> Option<String> {
        self.inner
            .values
            .lock()
            .ok()
            .and_then(|values| values.get(&index.key()).cloned())
    }

    pub fn len(&self) -> usize {
        self.inner.values.lock().map(|v| v.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_up(&self) -> CacheResult<()> {
        if self.inner.down.load(Ordering::SeqCst) {
            return Err(CacheError::Unavailable("memory cache is down".to_string()));
        }
        Ok(())
    }
}

impl ValueCache for MemoryCache {
    fn set_placeholder(&self, index: Index) -> BoxFuture<'_, CacheResult<()>> {
        Box::pin(async move {
            self.check_up()?;
            let mut values = self
                .inner
                .values
                .lock()
                .map_err(|e| CacheError::Command(e.to_string()))?;
            values.insert(index.key(), SENTINEL.to_string());
            Ok(())
        })
    }

    fn read_all(&self) -> BoxFuture<'_, CacheResult<CurrentValues>> {
        Box::pin(async move {
            self.check_up()?;
            let values = self
                .inner
                .values
                .lock()
                .map_err(|e| CacheError::Command(e.to_string()))?;
            Ok(values.clone())
        })
    }
}

// ── Channel ────────────────────────────────────────────────────────

/// In-process broadcast channel.
///
/// Subscribers see every topic and filter for themselves; messages sent
/// while nobody is subscribed are dropped.
#[derive(Clone, Debug)]
pub struct MemoryChannel {
    sender: broadcast::Sender<Notification>,
    published: Arc<AtomicU64>,
    down: Arc<AtomicBool>,
}

impl Default for MemoryChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryChannel {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self {
            sender,
            published: Arc::new(AtomicU64::new(0)),
            down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }

    /// Number of successful publish calls, with or without receivers.
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

impl NotificationChannel for MemoryChannel {
    fn publish<'a>(&'a self, topic: &'a str, index: Index) -> BoxFuture<'a, CacheResult<usize>> {
        Box::pin(async move {
            if self.down.load(Ordering::SeqCst) {
                return Err(CacheError::Unavailable("memory channel is down".to_string()));
            }
            let message = Notification {
                topic: topic.to_string(),
                payload: index.key(),
            };
            self.published.fetch_add(1, Ordering::SeqCst);
            // `send` only fails when there are no receivers.
            Ok(self.sender.send(message).unwrap_or(0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuegrid_core::INSERT_TOPIC;

    fn index(v: i32) -> Index {
        Index::new(v).unwrap()
    }

    #[tokio::test]
    async fn placeholder_then_worker_result() {
        let cache = MemoryCache::new();
        cache.set_placeholder(index(5)).await.unwrap();
        assert_eq!(cache.get(index(5)).as_deref(), Some(SENTINEL));

        cache.complete(index(5), "5");
        let all = cache.read_all().await.unwrap();
        assert_eq!(all.get("5").map(String::as_str), Some("5"));
    }

    #[tokio::test]
    async fn resubmission_resets_to_sentinel() {
        let cache = MemoryCache::new();
        cache.complete(index(7), "13");
        cache.set_placeholder(index(7)).await.unwrap();
        assert_eq!(cache.get(index(7)).as_deref(), Some(SENTINEL));
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn down_cache_errors() {
        let cache = MemoryCache::new();
        cache.set_down(true);
        assert!(matches!(
            cache.set_placeholder(index(1)).await,
            Err(CacheError::Unavailable(_))
        ));
        assert!(cache.read_all().await.is_err());
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn publish_without_subscribers_is_ok() {
        let channel = MemoryChannel::new();
        let receivers = channel.publish(INSERT_TOPIC, index(3)).await.unwrap();
        assert_eq!(receivers, 0);
        assert_eq!(channel.published(), 1);
    }

    #[tokio::test]
    async fn subscribers_receive_topic_and_payload() {
        let channel = MemoryChannel::new();
        let mut first = channel.subscribe();
        let mut second = channel.subscribe();

        let receivers = channel.publish(INSERT_TOPIC, index(12)).await.unwrap();
        assert_eq!(receivers, 2);

        for rx in [&mut first, &mut second] {
            let message = rx.recv().await.unwrap();
            assert_eq!(message.topic, "insert");
            assert_eq!(message.payload, "12");
        }
    }

    #[tokio::test]
    async fn late_subscriber_misses_earlier_messages() {
        let channel = MemoryChannel::new();
        channel.publish(INSERT_TOPIC, index(1)).await.unwrap();

        let mut rx = channel.subscribe();
        assert!(rx.try_recv().is_err());
    }
}

//! Request intake service.
//!
//! A submission is validated synchronously; everything after that is
//! optimistic. The cache placeholder, the notification, and the durable
//! insert each run as a detached task whose outcome is only logged, and
//! the caller is acknowledged as soon as the three are spawned. A store
//! outage therefore loses the insert while the client still sees success.
//!
//! Detached tasks are tracked, not abandoned: [`IntakeService::drain`]
//! waits for everything in flight, which the daemon does on shutdown.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::task::TaskTracker;
use tracing::{debug, warn};

use valuegrid_cache::{CacheResult, NotificationChannel, ValueCache};
use valuegrid_core::{CurrentValues, INSERT_TOPIC, Index, IndexError, RequestRecord};
use valuegrid_store::{RequestStore, StoreResult};

/// Composes the store, cache, and channel for the intake and read paths.
///
/// Cheap to clone; all clones share the backing handles and task tracker.
#[derive(Clone)]
pub struct IntakeService {
    store: Arc<dyn RequestStore>,
    cache: Arc<dyn ValueCache>,
    channel: Arc<dyn NotificationChannel>,
    tasks: TaskTracker,
    /// Serializes `drain`; a second drainer must not observe the first one's
    /// `reopen` while it still waits on the closed tracker.
    draining: Arc<Mutex<()>>,
}

impl IntakeService {
    pub fn new(
        store: Arc<dyn RequestStore>,
        cache: Arc<dyn ValueCache>,
        channel: Arc<dyn NotificationChannel>,
    ) -> Self {
        Self {
            store,
            cache,
            channel,
            tasks: TaskTracker::new(),
            draining: Arc::new(Mutex::new(())),
        }
    }

    /// Validate `raw` and start the side effects for it.
    ///
    /// Returns once the side effects are spawned; a rejected index spawns
    /// nothing.
    pub fn submit(&self, raw: &serde_json::Value) -> Result<Index, IndexError> {
        let index = Index::from_json(raw)?;

        let cache = Arc::clone(&self.cache);
        self.detach("cache_placeholder", index, async move {
            cache.set_placeholder(index).await
        });

        let channel = Arc::clone(&self.channel);
        self.detach("publish", index, async move {
            let receivers = channel.publish(INSERT_TOPIC, index).await?;
            if receivers == 0 {
                debug!(%index, "no worker subscribed to insert");
            }
            Ok::<_, valuegrid_cache::CacheError>(())
        });

        let store = Arc::clone(&self.store);
        self.detach("persist", index, async move {
            store.record_request(index).await
        });

        debug!(%index, "submission accepted");
        Ok(index)
    }

    /// Every durable record.
    pub async fn all_values(&self) -> StoreResult<Vec<RequestRecord>> {
        self.store.list_all().await
    }

    /// The cache mapping as-is; no merge with the store.
    pub async fn current_values(&self) -> CacheResult<CurrentValues> {
        self.cache.read_all().await
    }

    /// Side effects spawned but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.tasks.len()
    }

    /// Wait until every detached side effect has finished.
    ///
    /// New submissions may still be accepted while draining; they are
    /// waited for too. Concurrent callers drain one after another.
    pub async fn drain(&self) {
        let _guard = self.draining.lock().await;
        self.tasks.close();
        self.tasks.wait().await;
        self.tasks.reopen();
    }

    fn detach<F, E>(&self, step: &'static str, index: Index, fut: F)
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        self.tasks.spawn(async move {
            match fut.await {
                Ok(()) => debug!(step, %index, "side effect completed"),
                Err(e) => warn!(step, %index, error = %e, "side effect failed"),
            }
        });
    }
}

//! Bounded-retry startup gate.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info, warn};

use valuegrid_core::config::StartupConfig;
use valuegrid_store::{RequestStore, StoreError};

use crate::error::{StartupError, StartupResult};

/// How many liveness attempts to make, how long to wait between them, and
/// how long a single attempt may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 10,
            delay: Duration::from_secs(2),
            attempt_timeout: Duration::from_secs(10),
        }
    }
}

impl From<&StartupConfig> for RetryPolicy {
    fn from(config: &StartupConfig) -> Self {
        Self {
            attempts: config.retry_attempts,
            delay: config.retry_delay(),
            ..Self::default()
        }
    }
}

/// Outcome of a successful gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StartupReport {
    /// Liveness attempts made, including the successful one.
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Blocks readiness until the store answers and the table exists.
pub struct StartupCoordinator {
    store: Arc<dyn RequestStore>,
    policy: RetryPolicy,
}

impl StartupCoordinator {
    pub fn new(store: Arc<dyn RequestStore>, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Run the gate. An `Err` is fatal: the caller must not start serving.
    pub async fn run(&self) -> StartupResult<StartupReport> {
        let RetryPolicy {
            attempts,
            delay,
            attempt_timeout,
        } = self.policy;
        if attempts == 0 {
            return Err(StartupError::InvalidPolicy(
                "at least one attempt is required".to_string(),
            ));
        }

        let started = Instant::now();
        let mut attempt = 1;
        loop {
            let outcome = tokio::time::timeout(attempt_timeout, self.store.ping())
                .await
                .unwrap_or_else(|_| Err(StoreError::Timeout(attempt_timeout)));
            match outcome {
                Ok(()) => {
                    info!(attempt, attempts, "durable store reachable");
                    break;
                }
                Err(e) if attempt >= attempts => {
                    error!(attempts, error = %e, "durable store unreachable, giving up");
                    return Err(StartupError::Unreachable {
                        attempts,
                        last_error: e,
                    });
                }
                Err(e) => {
                    warn!(
                        attempt,
                        attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "durable store not reachable yet"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }

        // A failure here is a permissions or migration problem, not a
        // transient outage, so it is not retried.
        if let Err(e) = self.store.ensure_schema().await {
            error!(error = %e, "schema creation failed");
            return Err(StartupError::Schema(e));
        }

        let report = StartupReport {
            attempts: attempt,
            elapsed: started.elapsed(),
        };
        info!(
            attempts = report.attempts,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "startup gate passed"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use valuegrid_core::{BoxFuture, Index, RequestRecord};
    use valuegrid_store::{MemoryStore, StoreResult};

    /// Records when each ping arrived, on the (paused) tokio clock.
    struct TimedStore {
        inner: MemoryStore,
        pings: Mutex<Vec<Instant>>,
    }

    impl TimedStore {
        fn new(inner: MemoryStore) -> Arc<Self> {
            Arc::new(Self {
                inner,
                pings: Mutex::new(Vec::new()),
            })
        }

        fn gaps(&self) -> Vec<Duration> {
            let pings = self.pings.lock().unwrap();
            pings.windows(2).map(|w| w[1] - w[0]).collect()
        }
    }

    impl RequestStore for TimedStore {
        fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
            self.pings.lock().unwrap().push(Instant::now());
            self.inner.ping()
        }

        fn ensure_schema(&self) -> BoxFuture<'_, StoreResult<()>> {
            self.inner.ensure_schema()
        }

        fn record_request(&self, index: Index) -> BoxFuture<'_, StoreResult<()>> {
            self.inner.record_request(index)
        }

        fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<RequestRecord>>> {
            self.inner.list_all()
        }
    }

    fn policy(attempts: u32, delay_ms: u64) -> RetryPolicy {
        RetryPolicy {
            attempts,
            delay: Duration::from_millis(delay_ms),
            ..RetryPolicy::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_store_passes_first_try() {
        let store = MemoryStore::new();
        let gate = StartupCoordinator::new(Arc::new(store.clone()), policy(10, 2000));

        let report = gate.run().await.unwrap();
        assert_eq!(report.attempts, 1);
        assert_eq!(report.elapsed, Duration::ZERO);
        assert!(store.schema_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_allowed_attempt() {
        let memory = MemoryStore::new().refuse_pings(4);
        let store = TimedStore::new(memory.clone());
        let gate = StartupCoordinator::new(store.clone(), policy(5, 2000));

        let report = gate.run().await.unwrap();
        assert_eq!(report.attempts, 5);
        assert_eq!(memory.ping_attempts(), 5);
        assert_eq!(report.elapsed, Duration::from_secs(8));
        assert_eq!(store.gaps(), vec![Duration::from_secs(2); 4]);
        assert!(memory.schema_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_exactly_n_attempts() {
        let memory = MemoryStore::new().refuse_pings(u32::MAX);
        let store = TimedStore::new(memory.clone());
        let gate = StartupCoordinator::new(store.clone(), policy(10, 2000));

        let err = gate.run().await.unwrap_err();
        assert!(matches!(err, StartupError::Unreachable { attempts: 10, .. }));
        assert_eq!(memory.ping_attempts(), 10);
        assert_eq!(store.gaps(), vec![Duration::from_secs(2); 9]);
        assert!(!memory.schema_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn hung_attempt_counts_as_one_failure() {
        let memory = MemoryStore::ready();
        memory.set_stalled(true);
        let store = TimedStore::new(memory.clone());
        let gate = StartupCoordinator::new(
            store.clone(),
            policy(3, 2000).with_attempt_timeout(Duration::from_secs(1)),
        );

        let started = Instant::now();
        let err = gate.run().await.unwrap_err();

        let StartupError::Unreachable {
            attempts,
            last_error,
        } = err
        else {
            panic!("expected Unreachable");
        };
        assert_eq!(attempts, 3);
        assert!(matches!(last_error, StoreError::Timeout(d) if d == Duration::from_secs(1)));
        assert_eq!(memory.ping_attempts(), 3);
        assert_eq!(store.gaps(), vec![Duration::from_secs(3); 2]);
        assert_eq!(started.elapsed(), Duration::from_secs(7));
    }

    #[tokio::test(start_paused = true)]
    async fn store_recovering_from_stall_passes() {
        let memory = MemoryStore::new();
        memory.set_stalled(true);
        let gate = StartupCoordinator::new(
            Arc::new(memory.clone()),
            policy(5, 2000).with_attempt_timeout(Duration::from_secs(1)),
        );

        let unstall = {
            let memory = memory.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(4500)).await;
                memory.set_stalled(false);
            })
        };

        let report = gate.run().await.unwrap();
        unstall.await.unwrap();
        // Attempts start at 0s, 3s, 6s; the stall lifts at 4.5s.
        assert_eq!(report.attempts, 3);
        assert!(memory.schema_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn schema_failure_is_fatal_and_not_retried() {
        let memory = MemoryStore::new().fail_schema();
        let gate = StartupCoordinator::new(Arc::new(memory.clone()), policy(10, 2000));

        let err = gate.run().await.unwrap_err();
        assert!(matches!(err, StartupError::Schema(_)));
        assert_eq!(memory.ping_attempts(), 1);
        assert_eq!(memory.schema_creations(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_startups_reuse_existing_table() {
        let memory = MemoryStore::new();
        memory.ensure_schema().await.unwrap();
        memory.record_request(Index::new(5).unwrap()).await.unwrap();

        for _ in 0..3 {
            let gate = StartupCoordinator::new(Arc::new(memory.clone()), policy(2, 10));
            gate.run().await.unwrap();
        }

        assert_eq!(memory.schema_creations(), 4);
        assert_eq!(memory.records(), vec![RequestRecord { number: 5 }]);
    }

    #[tokio::test]
    async fn zero_attempts_is_rejected() {
        let gate = StartupCoordinator::new(Arc::new(MemoryStore::new()), policy(0, 10));
        assert!(matches!(
            gate.run().await,
            Err(StartupError::InvalidPolicy(_))
        ));
    }

    #[test]
    fn policy_from_config_defaults() {
        let policy = RetryPolicy::from(&StartupConfig::default());
        assert_eq!(policy, RetryPolicy::default());
        assert_eq!(
            policy.with_attempt_timeout(Duration::from_millis(250)).attempt_timeout,
            Duration::from_millis(250)
        );
    }
}

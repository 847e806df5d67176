//! valuegrid-startup — readiness gate for the durable store.
//!
//! Every write path assumes the store is reachable, so the daemon does not
//! bind its listener until [`StartupCoordinator::run`] succeeds.
//!
//! # Protocol
//!
//! ```text
//! attempt 1..=N:  SELECT 1
//!   ok   → CREATE TABLE IF NOT EXISTS (once, not retried) → ready
//!   err  → sleep(delay) unless this was attempt N
//! all N failed → StartupError::Unreachable (fatal)
//! ```
//!
//! The delay is fixed, not exponential: worst case is `(N - 1) × delay`
//! plus N liveness timeouts.

pub mod coordinator;
pub mod error;

pub use coordinator::{RetryPolicy, StartupCoordinator, StartupReport};
pub use error::{StartupError, StartupResult};

//! Fatal startup errors.

use thiserror::Error;
use valuegrid_store::StoreError;

pub type StartupResult<T> = Result<T, StartupError>;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("durable store unreachable after {attempts} attempts: {last_error}")]
    Unreachable { attempts: u32, last_error: StoreError },

    #[error("durable store reachable but schema creation failed: {0}")]
    Schema(StoreError),

    #[error("invalid retry policy: {0}")]
    InvalidPolicy(String),
}

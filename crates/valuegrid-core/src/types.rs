//! Domain types for the intake pipeline.
//!
//! An [`Index`] is validated once at the HTTP boundary and then flows,
//! unchanged, into the cache field name, the notification payload, and the
//! durable row.

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;

/// Highest index the service will accept.
pub const MAX_INDEX: i32 = 40;

/// Placeholder stored in the cache until the worker writes a result.
pub const SENTINEL: &str = "Nothing yet!";

/// Cache hash holding the latest known value per index.
pub const VALUES_HASH: &str = "values";

/// Channel topic announcing a pending computation.
pub const INSERT_TOPIC: &str = "insert";

/// Boxed future returned by the backing-service adapter traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

// ── Index ──────────────────────────────────────────────────────────

/// A client-submitted index that passed validation.
///
/// Only the upper bound is enforced; zero and negative values are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Index(i32);

impl Index {
    /// Validate a raw integer against [`MAX_INDEX`].
    pub fn new(value: i32) -> Result<Self, IndexError> {
        if value > MAX_INDEX {
            return Err(IndexError::TooHigh {
                value,
                max: MAX_INDEX,
            });
        }
        Ok(Self(value))
    }

    /// Validate the `index` field of a submission body.
    ///
    /// Accepts a JSON integer or a string holding one.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, IndexError> {
        match value {
            serde_json::Value::Number(n) => {
                let raw = n
                    .as_i64()
                    .and_then(|v| i32::try_from(v).ok())
                    .ok_or_else(|| IndexError::NotAnInteger(n.to_string()))?;
                Self::new(raw)
            }
            serde_json::Value::String(s) => s.parse(),
            other => Err(IndexError::NotAnInteger(other.to_string())),
        }
    }

    pub fn value(self) -> i32 {
        self.0
    }

    /// Cache field name and channel payload for this index.
    pub fn key(self) -> String {
        self.0.to_string()
    }
}

impl FromStr for Index {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: i32 = s
            .trim()
            .parse()
            .map_err(|_| IndexError::NotAnInteger(s.to_string()))?;
        Self::new(raw)
    }
}

impl fmt::Display for Index {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ── Records ────────────────────────────────────────────────────────

/// One durable row; append-only, duplicates allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub number: i32,
}

impl From<Index> for RequestRecord {
    fn from(index: Index) -> Self {
        Self {
            number: index.value(),
        }
    }
}

/// Snapshot of the cache hash: decimal index → sentinel or computed value.
pub type CurrentValues = BTreeMap<String, String>;

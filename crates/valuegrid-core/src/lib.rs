//! valuegrid-core — shared types for the valuegrid intake pipeline.
//!
//! Holds the domain vocabulary every other crate speaks: the validated
//! [`Index`], the durable [`RequestRecord`], the cache mapping
//! [`CurrentValues`], the backing-service names, and [`ServiceConfig`].

pub mod config;
pub mod error;
pub mod types;

pub use config::ServiceConfig;
pub use error::{ConfigError, IndexError};
pub use types::*;

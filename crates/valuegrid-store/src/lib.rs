//! valuegrid-store — durable request history.
//!
//! Every accepted submission appends one row to the `values` table. The
//! table has no key and no uniqueness constraint; it is the authoritative
//! record of what clients asked for, independent of what the cache holds.
//!
//! # Backends
//!
//! - [`PgStore`] — PostgreSQL through a shared `sqlx::PgPool`.
//! - [`MemoryStore`] — in-process rows with fault-injection switches, for
//!   tests and for exercising the startup gate.
//!
//! Both implement [`RequestStore`], which is what the intake service and the
//! startup coordinator hold (as `Arc<dyn RequestStore>`). The daemon wraps
//! the PostgreSQL backend in [`BoundedStore`] so no call outlives the
//! connection timeout.

pub mod bounded;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use bounded::BoundedStore;
pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use store::RequestStore;

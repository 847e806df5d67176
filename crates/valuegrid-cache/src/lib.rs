//! valuegrid-cache — latest-known values and work notifications.
//!
//! Two adapters share one Redis server but never a connection:
//!
//! ```text
//! ValueCache           hash "values": field = index, value = sentinel | result
//!   ├── RedisCache     (own ConnectionManager)
//!   └── MemoryCache
//! NotificationChannel  topic "insert": payload = index
//!   ├── RedisChannel   (own ConnectionManager, publish only)
//!   └── MemoryChannel
//! ```
//!
//! Redis connections are established on first use and re-established by
//! the connection manager afterwards, so a cache outage at boot does not
//! keep the store-backed paths from serving.

pub mod cache;
pub mod channel;
pub mod error;
pub mod link;
pub mod memory;

pub use cache::{RedisCache, ValueCache};
pub use channel::{Notification, NotificationChannel, RedisChannel};
pub use error::{CacheError, CacheResult};
pub use memory::{MemoryCache, MemoryChannel};

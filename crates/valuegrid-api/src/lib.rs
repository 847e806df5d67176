//! valuegrid-api — request intake and the HTTP boundary.
//!
//! # Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/values/all` | Every recorded request, from the durable store |
//! | GET | `/values/current` | Latest known value per index, from the cache |
//! | POST | `/values` | Submit `{"index": n}`; acknowledged before side effects finish |
//! | GET | `/health` | Process liveness |

pub mod error;
pub mod handlers;
pub mod service;

use axum::Router;
use axum::routing::{get, post};

pub use error::ApiError;
pub use service::IntakeService;

/// Build the complete API router around a shared intake service.
pub fn build_router(service: IntakeService) -> Router {
    Router::new()
        .route("/values/all", get(handlers::all_values))
        .route("/values/current", get(handlers::current_values))
        .route("/values", post(handlers::submit))
        .route("/health", get(handlers::health))
        .with_state(service)
}

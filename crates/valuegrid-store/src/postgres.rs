//! PostgreSQL backend.
//!
//! The pool is built lazily: constructing a [`PgStore`] never touches the
//! network, so the startup gate owns the first connection attempt and its
//! retry policy. Liveness bypasses the pool and makes exactly one connection
//! attempt, bounded by `connect_timeout`. Steady-state calls wait at most
//! `connect_timeout` for a pooled connection; bounding the query itself is
//! [`BoundedStore`](crate::BoundedStore)'s job.

use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Connection, PgConnection, PgPool};
use tracing::debug;

use valuegrid_core::config::StoreConfig;
use valuegrid_core::{BoxFuture, Index, RequestRecord};

use crate::error::{StoreError, StoreResult};
use crate::store::RequestStore;

/// Convert any `Display` error into a `StoreError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StoreError::$variant(e.to_string())
    };
}

// `values` is only non-reserved in PostgreSQL; quote it everywhere.
const PING: &str = "SELECT 1";
const CREATE_TABLE: &str = r#"CREATE TABLE IF NOT EXISTS "values" (number INTEGER)"#;
const INSERT: &str = r#"INSERT INTO "values" (number) VALUES ($1)"#;
const SELECT_ALL: &str = r#"SELECT number FROM "values""#;

/// Durable store backed by a shared PostgreSQL pool.
#[derive(Clone, Debug)]
pub struct PgStore {
    pool: PgPool,
    options: PgConnectOptions,
    connect_timeout: Duration,
}

impl PgStore {
    /// Build a lazily-connecting pool from config.
    pub fn connect_lazy(config: &StoreConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .database(&config.database);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout())
            .connect_lazy_with(options.clone());

        debug!(
            host = %config.host,
            port = config.port,
            database = %config.database,
            "postgres pool configured"
        );
        Self {
            pool,
            options,
            connect_timeout: config.connect_timeout(),
        }
    }

    /// Wrap an existing pool. Liveness connects with the pool's own options.
    pub fn from_pool(pool: PgPool) -> Self {
        let options = pool.connect_options().as_ref().clone();
        let connect_timeout = pool.options().get_acquire_timeout();
        Self {
            pool,
            options,
            connect_timeout,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RequestStore for PgStore {
    fn ping(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            let attempt = async {
                let mut conn = PgConnection::connect_with(&self.options)
                    .await
                    .map_err(map_err!(Unavailable))?;
                sqlx::query(PING)
                    .execute(&mut conn)
                    .await
                    .map_err(map_err!(Unavailable))?;
                if let Err(e) = conn.close().await {
                    debug!(error = %e, "liveness connection did not close cleanly");
                }
                Ok::<_, StoreError>(())
            };
            tokio::time::timeout(self.connect_timeout, attempt)
                .await
                .map_err(|_| StoreError::Timeout(self.connect_timeout))?
        })
    }

    fn ensure_schema(&self) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            sqlx::query(CREATE_TABLE)
                .execute(&self.pool)
                .await
                .map_err(map_err!(Schema))?;
            debug!("values table ensured");
            Ok(())
        })
    }

    fn record_request(&self, index: Index) -> BoxFuture<'_, StoreResult<()>> {
        Box::pin(async move {
            sqlx::query(INSERT)
                .bind(index.value())
                .execute(&self.pool)
                .await
                .map_err(map_err!(Write))?;
            Ok(())
        })
    }

    fn list_all(&self) -> BoxFuture<'_, StoreResult<Vec<RequestRecord>>> {
        Box::pin(async move {
            let numbers: Vec<Option<i32>> = sqlx::query_scalar(SELECT_ALL)
                .fetch_all(&self.pool)
                .await
                .map_err(map_err!(Read))?;
            // The column is nullable; rows written by anything other than
            // this service may carry NULL and have no index to report.
            Ok(numbers
                .into_iter()
                .flatten()
                .map(|number| RequestRecord { number })
                .collect())
        })
    }
}

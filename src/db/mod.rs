mod error;
pub mod postgres;
pub mod repos;

use std::{str::FromStr, sync::Arc, time::Duration};

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};

pub use error::{DbError, DbResult};
pub use repos::PrincipalRepo;

use crate::config::PostgresConfig;

/// Database handle: the connection pool plus the cached repo object,
/// created once at startup.
pub struct DbPool {
    pool: sqlx::PgPool,
    principals: Arc<dyn PrincipalRepo>,
}

impl DbPool {
    /// Connect to PostgreSQL and build the repo.
    ///
    /// The statement timeout is applied server-side to every session in the
    /// pool; teardown statements block under lock contention and this
    /// bounds the wait.
    pub async fn connect(
        config: &PostgresConfig,
        exclude_schemas: Vec<String>,
    ) -> DbResult<Self> {
        let mut opts = PgConnectOptions::from_str(&config.url)?;
        if config.statement_timeout_ms > 0 {
            opts = opts.options([(
                "statement_timeout",
                config.statement_timeout_ms.to_string(),
            )]);
        }

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
            .connect_with(opts)
            .await?;

        let principals: Arc<dyn PrincipalRepo> = Arc::new(
            postgres::PostgresPrincipalRepo::new(pool.clone(), exclude_schemas),
        );

        Ok(Self { pool, principals })
    }

    pub fn principals(&self) -> Arc<dyn PrincipalRepo> {
        self.principals.clone()
    }

    /// Close the pool, waiting for in-flight statements to finish.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

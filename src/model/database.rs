use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::model::error::DatabaseResult;

const MAX_CONNECTIONS: u32 = 10;
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Postgres pool shared by the server, the CLI and the tests.
#[derive(Debug, Clone)]
pub struct DbConnection {
    pool: PgPool,
}

impl DbConnection {
    /// Lazily connecting pool; the first query opens the first connection.
    pub fn connect(database_uri: &str) -> DatabaseResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_lazy(database_uri)?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

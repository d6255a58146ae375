//! Postgres `COPY` sink.

use std::time::Duration;

use epl_model::TableRef;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use tracing::{debug, info, warn};

use crate::error::LoadError;
use crate::loader::CopySink;

/// Database connection settings.
#[derive(Debug, Clone)]
pub struct PgSettings {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Option<String>,
    pub database: String,
    pub connect_timeout: Duration,
}

impl Default for PgSettings {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: None,
            database: "postgres".to_string(),
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl PgSettings {
    fn connect_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .database(&self.database);
        match &self.password {
            Some(password) => options.password(password),
            None => options,
        }
    }
}

/// `COPY` statement for `destination`.
pub(crate) fn copy_statement(destination: &TableRef) -> String {
    format!("COPY {} FROM STDIN WITH (FORMAT csv)", destination.quoted())
}

/// [`CopySink`] over a single-connection Postgres pool.
#[derive(Debug, Clone)]
pub struct PgCopySink {
    pool: PgPool,
}

impl PgCopySink {
    pub async fn connect(settings: &PgSettings) -> Result<Self, LoadError> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(settings.connect_timeout)
            .connect_with(settings.connect_options())
            .await?;
        info!(host = %settings.host, port = settings.port, database = %settings.database, "connected to database");
        Ok(Self { pool })
    }

    /// Close the pool and wait for connections to shut down.
    pub async fn close(&self) {
        self.pool.close().await;
        debug!("database pool closed");
    }
}

impl CopySink for PgCopySink {
    async fn copy_csv(&self, destination: &TableRef, csv: Vec<u8>) -> Result<u64, LoadError> {
        let statement = copy_statement(destination);
        let bytes = csv.len();
        debug!(%statement, bytes, "starting COPY");

        let mut tx = self.pool.begin().await?;
        let mut copy = tx.copy_in_raw(&statement).await?;
        if let Err(error) = copy.send(csv).await {
            warn!(%destination, %error, "COPY stream failed, rolling back");
            copy.abort(error.to_string()).await?;
            return Err(error.into());
        }
        let rows = copy.finish().await?;
        tx.commit().await?;
        Ok(rows)
    }
}

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from the device store and its connection management
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Unsupported database type: {0}")]
    UnsupportedType(String),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Owns the connection pool for the device table.
pub struct DatabaseManager;

impl DatabaseManager {
    /// Open the pool described by `config`, creating the schema first when
    /// `synchronize` is set.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let connection_string = Self::build_connection_string(config)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(&connection_string)
            .await?;

        info!(
            "Created database pool for: {} (max {} connections)",
            config.database, config.max_connections
        );

        if config.synchronize {
            Self::synchronize(&pool).await?;
        }

        Ok(pool)
    }

    /// Apply the embedded migrations.
    pub async fn synchronize(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::migrate!("./migrations").run(pool).await?;
        info!("Database schema synchronized");
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(pool: &PgPool) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(pool).await?;
        Ok(())
    }

    pub async fn close(pool: &PgPool) {
        pool.close().await;
        info!("Closed database pool");
    }

    /// `DATABASE_URL` as given, or a URL assembled from the individual
    /// `DB_*` settings.
    fn build_connection_string(config: &DatabaseConfig) -> Result<String, DatabaseError> {
        if config.kind != "postgres" && config.kind != "postgresql" {
            return Err(DatabaseError::UnsupportedType(config.kind.clone()));
        }

        if let Some(base) = &config.url {
            let url = url::Url::parse(base).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
            if !matches!(url.scheme(), "postgres" | "postgresql") {
                return Err(DatabaseError::UnsupportedType(url.scheme().to_string()));
            }
            return Ok(url.into());
        }

        let mut url = url::Url::parse("postgres://localhost").map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_host(Some(&config.host))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_port(Some(config.port))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_username(&config.username)
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        url.set_password(Some(&config.password))
            .map_err(|_| DatabaseError::InvalidDatabaseUrl)?;
        // Replace the path to the database name (ensure leading slash)
        url.set_path(&format!("/{}", config.database));
        Ok(url.into())
    }
}

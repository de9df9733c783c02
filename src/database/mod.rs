use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::DatabaseConfig;

/// PostgreSQL connection pool holder
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn new(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        info!("Initializing database connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.acquire_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .test_before_acquire(true)
            .connect(&config.url)
            .await
            .map_err(|e| DatabaseError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database connection pool initialized"
        );

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a trivial query and report pool occupancy
    pub async fn health_check(&self) -> Result<DatabaseHealth, DatabaseError> {
        let start = Instant::now();

        if let Err(e) = sqlx::query("SELECT 1").execute(&self.pool).await {
            warn!("Database health check failed: {}", e);
            return Err(DatabaseError::HealthCheckFailed(e.to_string()));
        }

        Ok(DatabaseHealth {
            connected: true,
            response_time_ms: start.elapsed().as_millis() as u64,
            pool_size: self.pool.size(),
            idle_connections: self.pool.num_idle() as u32,
        })
    }

    /// Apply pending migrations from `./migrations`
    pub async fn migrate(&self) -> Result<(), DatabaseError> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Close the pool, waiting for checked-out connections to return
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
        info!("Database connection pool closed");
    }
}

/// Database health information
#[derive(Debug, Clone, serde::Serialize)]
pub struct DatabaseHealth {
    pub connected: bool,
    pub response_time_ms: u64,
    pub pool_size: u32,
    pub idle_connections: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    #[error("Database health check failed: {0}")]
    HealthCheckFailed(String),

    #[error("Database migration failed: {0}")]
    MigrationFailed(String),
}

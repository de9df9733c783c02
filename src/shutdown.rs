use async_trait::async_trait;
use std::time::Duration;
use tokio::signal;
use tracing::{error, info, warn};

use crate::database::Database;

/// Resolves on SIGINT or SIGTERM; a handler that fails to install never fires
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C), initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}

/// Errors that can occur during shutdown
#[derive(Debug, thiserror::Error)]
pub enum ShutdownError {
    #[error("Shutdown timed out")]
    Timeout,

    #[error("Database shutdown error: {0}")]
    Database(String),
}

/// A resource released once the server has stopped accepting requests
#[async_trait]
pub trait ShutdownComponent: Send + Sync {
    fn name(&self) -> &str;

    async fn shutdown(&mut self) -> Result<(), ShutdownError>;
}

/// Releases registered components in reverse order within a shared deadline
pub struct ShutdownCoordinator {
    timeout: Duration,
    components: Vec<Box<dyn ShutdownComponent>>,
}

impl ShutdownCoordinator {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            components: Vec::new(),
        }
    }

    pub fn register<T: ShutdownComponent + 'static>(&mut self, component: T) {
        self.components.push(Box::new(component));
    }

    /// A failing component is logged and does not stop the others
    pub async fn shutdown_all(&mut self) -> Result<(), ShutdownError> {
        info!(
            "Shutting down {} components with timeout of {:?}",
            self.components.len(),
            self.timeout
        );

        let components = &mut self.components;
        let sequence = async move {
            for component in components.iter_mut().rev() {
                match component.shutdown().await {
                    Ok(()) => info!("Component '{}' shut down", component.name()),
                    Err(e) => error!("Failed to shut down component '{}': {}", component.name(), e),
                }
            }
        };

        match tokio::time::timeout(self.timeout, sequence).await {
            Ok(()) => {
                info!("Graceful shutdown completed");
                Ok(())
            }
            Err(_) => {
                warn!("Graceful shutdown timed out after {:?}", self.timeout);
                Err(ShutdownError::Timeout)
            }
        }
    }
}

/// Closes the connection pool
pub struct DatabaseShutdown {
    database: Option<Database>,
}

impl DatabaseShutdown {
    pub fn new(database: Database) -> Self {
        Self {
            database: Some(database),
        }
    }
}

#[async_trait]
impl ShutdownComponent for DatabaseShutdown {
    fn name(&self) -> &str {
        "Database Connection Pool"
    }

    async fn shutdown(&mut self) -> Result<(), ShutdownError> {
        match self.database.take() {
            Some(database) => {
                database.close().await;
                Ok(())
            }
            None => Err(ShutdownError::Database("Pool already closed".to_string())),
        }
    }
}

pub mod auth_handlers;
pub mod health_handlers;
pub mod metrics_handlers;
pub mod user_handlers;

pub mod auth;
pub mod metrics;
pub mod request_id;

pub use auth::*;
pub use metrics::*;
pub use request_id::*;

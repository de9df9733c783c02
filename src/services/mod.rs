pub mod user_service;
pub mod auth_service;
pub mod token_service;
pub mod container;

pub use user_service::*;
pub use auth_service::*;
pub use token_service::*;
pub use container::*;

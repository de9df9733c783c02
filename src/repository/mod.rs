pub mod user_repository;

#[cfg(test)]
pub(crate) mod memory;

pub use user_repository::*;

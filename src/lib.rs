//! User management API: login plus CRUD and search over users, every
//! response wrapped in a `{message, success, data, errors}` envelope.

pub mod config;
pub mod database;
pub mod metrics;
pub mod models;
pub mod repository;
pub mod services;
pub mod shutdown;
pub mod tracing;
pub mod utils;
pub mod web;

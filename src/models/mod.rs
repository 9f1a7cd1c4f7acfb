//! Database and configuration models shared across the pilot service.

#[cfg(feature = "server")]
pub mod config;
pub mod transaction;

//! Domain values exposed by the pilot service layer.

pub mod export;
pub mod filter;
pub mod query;
pub mod transaction;
pub mod types;

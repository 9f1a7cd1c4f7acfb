//! DTO modules that bridge the search controller with templates.

pub mod transactions;

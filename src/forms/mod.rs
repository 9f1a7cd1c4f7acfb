//! Form definitions backing the transaction routes.

use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::types::TypeConstraintError;

pub mod import;
pub mod transactions;

#[derive(Debug, Error)]
/// Errors that can occur when processing form data.
pub enum FormError {
    #[error("validation errors: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("malformed form body: {0}")]
    Body(String),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid sort order: {0}")]
    InvalidSortOrder(String),

    #[error("unreadable csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing column: {0}")]
    MissingColumn(&'static str),

    #[error("line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },

    #[error(transparent)]
    TypeConstraint(#[from] TypeConstraintError),
}

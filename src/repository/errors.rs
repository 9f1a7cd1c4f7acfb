use diesel::r2d2::{Error as R2D2Error, PoolError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::domain::types::TypeConstraintError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("transaction not found")]
    NotFound,

    #[error("database unavailable: {0}")]
    ConnectionError(String),

    /// An insert broke a `NOT NULL` or uniqueness constraint.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored row no longer satisfies the domain value objects.
    #[error("invalid stored row: {0}")]
    InvalidRow(String),

    #[error("query failed: {0}")]
    DatabaseError(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

impl From<DieselError> for RepositoryError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(
                kind @ (DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation
                | DatabaseErrorKind::UniqueViolation),
                info,
            ) => Self::ConstraintViolation(format!("{kind:?}: {}", info.message())),
            DieselError::DeserializationError(err) => Self::InvalidRow(err.to_string()),
            other => Self::DatabaseError(other.to_string()),
        }
    }
}

impl From<R2D2Error> for RepositoryError {
    fn from(err: R2D2Error) -> Self {
        Self::ConnectionError(err.to_string())
    }
}

impl From<PoolError> for RepositoryError {
    fn from(err: PoolError) -> Self {
        Self::ConnectionError(err.to_string())
    }
}

impl From<TypeConstraintError> for RepositoryError {
    fn from(err: TypeConstraintError) -> Self {
        Self::InvalidRow(err.to_string())
    }
}

//! # Store Error Types
//!
//! Error types for persisted store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)        Business rejection (CoreError)      │
//! │       │                                   │                             │
//! │       ▼                                   ▼                             │
//! │  DbError::QueryFailed / ...        DbError::Rejected                   │
//! │       │                                   │                             │
//! │       └──────────────┬────────────────────┘                             │
//! │                      ▼                                                  │
//! │  ApiError (in register app) ← Serialized for the front end             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Rejected` means nothing changed and the caller may retry. Every other
//! variant is an infrastructure fault.

use thiserror::Error;
use tillquest_core::{CoreError, ValidationError};

/// Store operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// The operation was refused by a business rule. Nothing was mutated.
    #[error(transparent)]
    Rejected(#[from] CoreError),

    /// Database connection failed.
    ///
    /// ## When This Occurs
    /// - Database file doesn't exist and can't be created
    /// - File permissions issue
    /// - Disk full
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    ///
    /// ## When This Occurs
    /// - Invalid SQL in migration
    /// - Migration version conflict
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    /// A value could not be encoded for storage.
    #[error("Serialization failed: {0}")]
    Serialization(String),

    /// Internal store error.
    #[error("Internal store error: {0}")]
    Internal(String),
}

impl DbError {
    /// True when a business rule refused the operation (nothing happened).
    pub fn is_rejection(&self) -> bool {
        matches!(self, DbError::Rejected(_))
    }

    /// The business rejection, if this is one.
    pub fn as_rejection(&self) -> Option<&CoreError> {
        match self {
            DbError::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ValidationError> for DbError {
    fn from(err: ValidationError) -> Self {
        DbError::Rejected(CoreError::Validation(err))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::Database       → DbError::QueryFailed
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// sqlx::Error::PoolClosed     → DbError::ConnectionFailed
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => DbError::QueryFailed(db_err.message().to_string()),

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type DbResult<T> = Result<T, DbError>;

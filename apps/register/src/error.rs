//! # API Error Type
//!
//! Unified error type for register commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in TillQuest                              │
//! │                                                                         │
//! │  Command Function  ──►  Result<T, ApiError>                            │
//! │         │                                                               │
//! │         ├── DbError::Rejected(CoreError) ──► specific code, nothing    │
//! │         │                                    changed, retry is fine    │
//! │         │                                                               │
//! │         └── DbError::QueryFailed / ... ────► DATABASE_ERROR, logged    │
//! │                                                                         │
//! │  Front end prints:  [INSUFFICIENT_FUNDS] Insufficient funds: ...       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tillquest_core::CoreError;
use tillquest_db::DbError;

/// API error returned from register commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "INSUFFICIENT_STOCK",
///   "message": "Insufficient stock for 123: available 1, requested 2"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Item, sale, theme or achievement not found
    NotFound,

    /// Input validation failed
    ValidationError,

    /// Persisted store failed
    DatabaseError,

    /// Internal error
    Internal,

    /// Cart operation failed
    CartError,

    /// Insufficient stock
    InsufficientStock,

    /// Wallet balance too low
    InsufficientFunds,

    /// No persona, or the wrong one, for this operation
    PersonaError,

    /// Payment request missing, stale or unreadable
    PaymentError,

    /// Coins or themes
    GameError,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

/// Converts store errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Rejected(core) => ApiError::from(core),
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Serialization(e) => {
                tracing::error!("Serialization failed: {}", e);
                ApiError::internal("Could not save data")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts business rejections to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::ItemNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::UnknownAchievement(_)
            | CoreError::UnknownTheme(_) => ErrorCode::NotFound,

            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,

            CoreError::NotInCart(_) | CoreError::EmptyCart | CoreError::CartTooLarge { .. } => {
                ErrorCode::CartError
            }

            CoreError::InsufficientFunds { .. } => ErrorCode::InsufficientFunds,

            CoreError::NoActivePersona
            | CoreError::PersonaAlreadyActive(_)
            | CoreError::WrongPersona { .. } => ErrorCode::PersonaError,

            CoreError::StaleRequest(_) | CoreError::InvalidPayload(_) => ErrorCode::PaymentError,

            CoreError::ThemeAlreadyUnlocked(_)
            | CoreError::ThemeLocked(_)
            | CoreError::InsufficientCoins { .. } => ErrorCode::GameError,

            CoreError::Validation(_) => ErrorCode::ValidationError,
        };

        ApiError::new(code, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use tillquest_core::{Money, ValidationError};

    #[test]
    fn test_rejections_keep_their_message() {
        let err = ApiError::from(DbError::Rejected(CoreError::InsufficientFunds {
            balance: Money::from_cents(500),
            requested: Money::from_cents(900),
        }));
        assert_eq!(err.code, ErrorCode::InsufficientFunds);
        assert_eq!(err.message, "Insufficient funds: balance 5.00, requested 9.00");
    }

    #[test]
    fn test_infrastructure_errors_are_generic() {
        let err = ApiError::from(DbError::QueryFailed("disk I/O error".to_string()));
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("disk"));
    }

    #[test]
    fn test_serialized_shape() {
        let err: ApiError = CoreError::Validation(ValidationError::Required {
            field: "name".to_string(),
        })
        .into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "Validation error: name is required");
    }
}

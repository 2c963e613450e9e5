//! # Error Types
//!
//! Domain-specific error types for tillquest-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tillquest-core errors (this file)                                     │
//! │  ├── CoreError        - Rejected business operations                   │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tillquest-db errors (separate crate)                                  │
//! │  └── DbError          - Persistence failures, wraps CoreError          │
//! │                                                                         │
//! │  register app errors                                                   │
//! │  └── ApiError         - What the front end sees (serialized)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Front end    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The No-Mutation Guarantee
//! Every `CoreError` is a *rejection*: the operation that returned it changed
//! nothing, in memory or in the persisted store. Callers can always retry.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Rejected business operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// No stock item carries this barcode.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// Not enough stock on hand to cover the request.
    ///
    /// ## User Workflow
    /// ```text
    /// Cart already holds 2 × "123", stock on hand = 3
    ///      │
    ///      ▼
    /// add("123", 2) → requested 4
    ///      │
    ///      ▼
    /// InsufficientStock { barcode: "123", available: 3, requested: 4 }
    /// ```
    #[error("Insufficient stock for {barcode}: available {available}, requested {requested}")]
    InsufficientStock {
        barcode: String,
        available: i64,
        requested: i64,
    },

    /// The barcode has no line in the cart.
    #[error("Item {0} is not in the cart")]
    NotInCart(String),

    /// Finalize was called on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Sale not found in the ledger.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// A wallet debit would take the balance below zero.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds { balance: Money, requested: Money },

    /// A wallet operation needs an active persona and none is selected.
    #[error("No active persona")]
    NoActivePersona,

    /// A persona is already active; switch first.
    #[error("Persona {0} is already active")]
    PersonaAlreadyActive(String),

    /// The active persona has the wrong role for this operation.
    #[error("Operation requires a {expected} persona")]
    WrongPersona { expected: String },

    /// The payment request is no longer the live one on the channel.
    ///
    /// ## When This Occurs
    /// - The seller cancelled or superseded the request
    /// - The request was already paid
    #[error("Payment request {0} is no longer pending")]
    StaleRequest(String),

    /// Payment payload text could not be decoded.
    #[error("Invalid payment payload: {0}")]
    InvalidPayload(String),

    /// No achievement with this id exists in the catalog.
    #[error("Unknown achievement: {0}")]
    UnknownAchievement(String),

    /// No theme with this id exists in the catalog.
    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    /// Theme is already unlocked.
    #[error("Theme {0} is already unlocked")]
    ThemeAlreadyUnlocked(String),

    /// Theme must be unlocked before it can be selected.
    #[error("Theme {0} is locked")]
    ThemeLocked(String),

    /// Not enough game coins.
    #[error("Insufficient coins: have {available}, need {requested}")]
    InsufficientCoins { available: i64, requested: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value exceeds its ceiling, or adding it would.
    #[error("{field} must be at most {max}")]
    TooLarge { field: String, max: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., unparsable amount).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

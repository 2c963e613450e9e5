//! # Validation Module
//!
//! Input validation for everything that crosses into the core from the
//! register: barcodes (already decoded by the scanner collaborator), item
//! names, display names, quantities and amounts.
//!
//! ## Usage
//! ```rust
//! use tillquest_core::validation::{validate_barcode, validate_quantity};
//!
//! assert!(validate_barcode("4006381333931").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::{MAX_AMOUNT, MAX_CART_LINES, MAX_ITEM_QUANTITY, MAX_POINTS, MAX_STOCK};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a decoded barcode or QR text used as a stock key.
///
/// ## Rules
/// - Must not be empty after trimming
/// - At most 128 characters (QR codes can carry long text)
/// - No control characters
pub fn validate_barcode(barcode: &str) -> ValidationResult<()> {
    let barcode = barcode.trim();

    if barcode.is_empty() {
        return Err(ValidationError::Required {
            field: "barcode".to_string(),
        });
    }

    if barcode.chars().count() > 128 {
        return Err(ValidationError::TooLong {
            field: "barcode".to_string(),
            max: 128,
        });
    }

    if barcode.chars().any(char::is_control) {
        return Err(ValidationError::InvalidFormat {
            field: "barcode".to_string(),
            reason: "must not contain control characters".to_string(),
        });
    }

    Ok(())
}

/// Validates an item name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    validate_text("name", name, 200)
}

/// Validates a persona display name.
pub fn validate_display_name(name: &str) -> ValidationResult<()> {
    validate_text("display name", name, 60)
}

pub fn validate_theme_name(name: &str) -> ValidationResult<()> {
    validate_text("theme name", name, 40)
}

/// Validates a free-text transaction description.
pub fn validate_description(description: &str) -> ValidationResult<()> {
    validate_text("description", description, 200)
}

fn validate_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a cart or decrement quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a stock level. Zero is allowed (sold out).
///
/// ## Rules
/// - Must not be negative
/// - Must not exceed MAX_STOCK
pub fn validate_stock_level(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity on hand".to_string(),
        });
    }

    if qty > MAX_STOCK {
        return Err(ValidationError::OutOfRange {
            field: "quantity on hand".to_string(),
            min: 0,
            max: MAX_STOCK,
        });
    }

    Ok(())
}

/// Validates a unit price. Zero is allowed (free items).
pub fn validate_unit_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unit price".to_string(),
        });
    }

    check_ceiling("unit price", price)
}

/// Validates a wallet or payment amount.
///
/// ## Rules
/// - Must be strictly positive; zero-value transactions are never recorded
/// - Must not exceed MAX_AMOUNT
pub fn validate_amount(amount: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    check_ceiling("amount", amount)
}

fn check_ceiling(field: &str, value: Money) -> ValidationResult<()> {
    if value > MAX_AMOUNT {
        return Err(ValidationError::TooLarge {
            field: field.to_string(),
            max: MAX_AMOUNT.to_string(),
        });
    }

    Ok(())
}

/// Validates a non-negative game quantity (experience, score, coins).
pub fn validate_points(field: &str, points: i64) -> ValidationResult<()> {
    if points < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    if points > MAX_POINTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_POINTS,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more cart line fits.
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

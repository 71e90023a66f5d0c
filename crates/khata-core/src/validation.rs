//! # Validation Rules
//!
//! Business rule validation for user input.
//!
//! ## Design
//! Each function validates ONE field and returns a typed
//! [`ValidationError`]. Handlers run these before any business logic, so a
//! bad request never reaches the database.

use crate::error::ValidationError;

/// Result type for validation functions.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Limits
// =============================================================================

/// Maximum length for names (shop, product, customer, category).
pub const MAX_NAME_LEN: usize = 120;

/// Maximum length for SKUs.
pub const MAX_SKU_LEN: usize = 48;

/// Maximum quantity for a single line item.
/// Nobody sells a million units of one product over one counter.
pub const MAX_QUANTITY: i64 = 100_000;

/// Maximum price/amount in cents (1 billion in major units).
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000;

// =============================================================================
// Field Validators
// =============================================================================

/// Validates a display name (shop, product, customer).
///
/// ## Rules
/// - Required, non-blank
/// - At most [`MAX_NAME_LEN`] characters
pub fn validate_name(field: &str, name: &str) -> ValidationResult<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }
    if trimmed.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NAME_LEN,
        });
    }
    Ok(())
}

/// Validates a product SKU.
///
/// ## Rules
/// - Required, non-blank
/// - At most [`MAX_SKU_LEN`] characters
/// - Alphanumeric plus `-` and `_` only
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let trimmed = sku.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }
    if trimmed.chars().count() > MAX_SKU_LEN {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: MAX_SKU_LEN,
        });
    }
    if !trimmed
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "only letters, digits, '-' and '_' are allowed".to_string(),
        });
    }
    Ok(())
}

/// Validates a line-item quantity.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if qty > MAX_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_QUANTITY,
        });
    }
    Ok(())
}

/// Validates a price in cents. Prices may be zero (giveaways) but never
/// negative.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustBePositive {
            field: "price_cents".to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: "price_cents".to_string(),
            min: 0,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Validates an expense/budget/payment amount in cents. Must be strictly
/// positive.
pub fn validate_amount_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_AMOUNT_CENTS,
        });
    }
    Ok(())
}

/// Validates a budget/report period in `YYYY-MM` form.
pub fn validate_period(period: &str) -> ValidationResult<()> {
    let bad = || ValidationError::InvalidFormat {
        field: "period".to_string(),
        reason: "expected YYYY-MM".to_string(),
    };

    let (year, month) = period.split_once('-').ok_or_else(bad)?;
    if year.len() != 4 || month.len() != 2 {
        return Err(bad());
    }
    year.parse::<u32>().map_err(|_| bad())?;
    let m: u32 = month.parse().map_err(|_| bad())?;
    if !(1..=12).contains(&m) {
        return Err(bad());
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Validation Module
//!
//! Input validation utilities for Tally.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: HTTP handler (apps/tally-api)                                │
//! │  ├── Type validation (JSON deserialization)                            │
//! │  └── Boundary mapping (payment method aliases)                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE + ticket aggregate                               │
//! │  ├── Ranges: quantity, values, percentages                             │
//! │  └── Cross-field rules: discount ≤ total, cashback ≤ net               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints (stock_current >= 0, balance >= 0)              │
//! │  └── UNIQUE constraints (ticket number, cashback balance per client)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tally_core::validation::{validate_quantity, validate_value_cents};
//!
//! validate_quantity(3).unwrap();
//! validate_value_cents("unit value", 5000).unwrap();
//! ```

use crate::error::ValidationError;
use crate::money::Percentage;
use crate::{MAX_ITEM_QUANTITY, MAX_NOTES_LENGTH, MAX_TICKET_ITEMS, MAX_VALUE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates optional ticket notes.
///
/// Returns the trimmed notes, or `None` when blank.
pub fn validate_notes(notes: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(notes) = notes.map(str::trim) else {
        return Ok(None);
    };

    if notes.is_empty() {
        return Ok(None);
    }

    if notes.chars().count() > MAX_NOTES_LENGTH {
        return Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LENGTH,
        });
    }

    Ok(Some(notes.to_string()))
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
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

/// Validates a non-negative monetary value in cents.
///
/// ## Rules
/// - Zero is allowed (courtesy items, zero discount)
/// - Must not exceed MAX_VALUE_CENTS
///
/// ## Example
/// ```rust
/// use tally_core::validation::validate_value_cents;
///
/// assert!(validate_value_cents("discount", 0).is_ok());
/// assert!(validate_value_cents("discount", -100).is_err());
/// assert!(validate_value_cents("discount", i64::MAX).is_err());
/// ```
pub fn validate_value_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_VALUE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_VALUE_CENTS,
        });
    }

    Ok(())
}

/// Validates a strictly positive amount in cents (payments, cashback).
pub fn validate_positive_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    if cents > MAX_VALUE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 1,
            max: MAX_VALUE_CENTS,
        });
    }

    Ok(())
}

/// Validates a commission rate in basis points.
///
/// ## Rules
/// - Must be between 0 and 10000 (0% to 100%)
pub fn validate_percentage(field: &str, bps: u32) -> ValidationResult<Percentage> {
    if bps > Percentage::FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: Percentage::FULL_BPS as i64,
        });
    }

    Ok(Percentage::from_bps(bps))
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more item fits on the ticket.
pub fn validate_item_count(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_TICKET_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "ticket items".to_string(),
            min: 0,
            max: MAX_TICKET_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_notes() {
        assert_eq!(validate_notes(None).unwrap(), None);
        assert_eq!(validate_notes(Some("   ")).unwrap(), None);
        assert_eq!(
            validate_notes(Some("  walk-in  ")).unwrap(),
            Some("walk-in".to_string())
        );
        assert!(validate_notes(Some(&"x".repeat(MAX_NOTES_LENGTH + 1))).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_value_cents() {
        assert!(validate_value_cents("unit value", 0).is_ok());
        assert!(validate_value_cents("unit value", 1099).is_ok());
        assert!(validate_value_cents("unit value", MAX_VALUE_CENTS).is_ok());
        assert!(validate_value_cents("unit value", -1).is_err());
        assert!(matches!(
            validate_value_cents("unit value", MAX_VALUE_CENTS + 1),
            Err(ValidationError::OutOfRange { max: MAX_VALUE_CENTS, .. })
        ));
    }

    #[test]
    fn test_validate_positive_cents() {
        assert!(validate_positive_cents("amount", 1).is_ok());
        assert!(validate_positive_cents("amount", 0).is_err());
        assert!(validate_positive_cents("amount", -50).is_err());
        assert!(validate_positive_cents("amount", i64::MAX).is_err());
    }

    #[test]
    fn test_validate_percentage() {
        assert_eq!(validate_percentage("commission", 0).unwrap().bps(), 0);
        assert_eq!(validate_percentage("commission", 10_000).unwrap().bps(), 10_000);
        assert!(validate_percentage("commission", 10_001).is_err());
    }

    #[test]
    fn test_validate_item_count() {
        assert!(validate_item_count(0).is_ok());
        assert!(validate_item_count(MAX_TICKET_ITEMS - 1).is_ok());
        assert!(validate_item_count(MAX_TICKET_ITEMS).is_err());
    }
}

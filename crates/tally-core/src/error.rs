//! # Error Types
//!
//! Domain-specific error types for tally-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tally-core errors (this file)                                         │
//! │  ├── CoreError        - Business outcomes the caller branches on       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tally-db errors (separate crate)                                      │
//! │  └── DbError          - Database failures (+ DbError::Domain)          │
//! │                                                                         │
//! │  API errors (apps/tally-api)                                           │
//! │  └── ApiError         - What the front-end sees (code + message)       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Front-end    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (ticket id, product name, amounts)
//! 3. Errors are enum variants, never String
//! 4. Each variant maps to a distinct API error code

use thiserror::Error;

use crate::money::Money;
use crate::types::TicketStatus;

// =============================================================================
// Core Error
// =============================================================================

/// Business errors surfaced directly to the caller.
///
/// None of these are retried: each one needs the operator to change
/// something (pick another client, reduce a quantity, lower the cashback).
#[derive(Debug, Error)]
pub enum CoreError {
    /// Referenced entity is missing or belongs to another company.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Mutation attempted on a ticket that is no longer open.
    ///
    /// ## When This Occurs
    /// - Adding items to a finished ticket
    /// - Cancelling a finished ticket
    /// - The second of two Finalize calls
    #[error("Ticket {ticket_id} is {status}, cannot perform operation")]
    InvalidState {
        ticket_id: String,
        status: TicketStatus,
    },

    /// Input rejected by a business rule.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// Not enough units of a product to settle the ticket.
    ///
    /// ## User Workflow
    /// ```text
    /// Finalize ticket (3 × Shampoo)
    ///      │
    ///      ▼
    /// Stock check: available=2
    ///      │
    ///      ▼
    /// InsufficientStock { product_name: "Shampoo", available: 2, required: 3 }
    ///      │
    ///      ▼
    /// UI shows: "Only 2 Shampoo in stock"
    /// ```
    #[error("Insufficient stock for {product_name}: available {available}, required {required}")]
    InsufficientStock {
        product_name: String,
        available: i64,
        required: i64,
    },

    /// Client cashback balance cannot cover the request.
    #[error("Insufficient cashback balance: available {available}, requested {requested}")]
    InsufficientFunds { available: Money, requested: Money },
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates an InvalidState error for a ticket.
    pub fn invalid_state(ticket_id: impl Into<String>, status: TicketStatus) -> Self {
        CoreError::InvalidState {
            ticket_id: ticket_id.into(),
            status,
        }
    }

    /// Creates an InvalidArgument error from a free-form rule violation.
    pub fn rule(field: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InvalidArgument(ValidationError::Rule {
            field: field.into(),
            reason: reason.into(),
        })
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
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

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// A cross-field business rule was violated.
    #[error("{field}: {reason}")]
    Rule { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_message() {
        let err = CoreError::InsufficientStock {
            product_name: "Shampoo".to_string(),
            available: 2,
            required: 3,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Shampoo: available 2, required 3"
        );
    }

    #[test]
    fn test_insufficient_funds_message() {
        let err = CoreError::InsufficientFunds {
            available: Money::from_cents(0),
            requested: Money::from_cents(1500),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient cashback balance: available 0.00, requested 15.00"
        );
    }

    #[test]
    fn test_invalid_state_message() {
        let err = CoreError::invalid_state("t-1", TicketStatus::Finished);
        assert_eq!(err.to_string(), "Ticket t-1 is finished, cannot perform operation");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::InvalidArgument(_)));
    }
}

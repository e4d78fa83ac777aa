//! # tally-core: Pure Business Logic for Tally
//!
//! This crate is the **heart** of the settlement engine. It contains the
//! ticket aggregate, money arithmetic and commission math as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/tally-api (axum)                        │   │
//! │  │    POST /tickets, /items, /discount, /cashback, /finalize       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              tally-db (SettlementEngine + ledgers)              │   │
//! │  │     one sqlx transaction per operation, SQLite storage          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tally-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌────────────┐  ┌───────────┐ │   │
//! │  │   │   types   │  │   money   │  │   ticket   │  │ validation│ │   │
//! │  │   │  Ticket   │  │   Money   │  │  totals    │  │   rules   │ │   │
//! │  │   │  Ledgers  │  │ Percentage│  │ commission │  │  checks   │ │   │
//! │  │   └───────────┘  └───────────┘  └────────────┘  └───────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Ticket, TicketItem, ledger entries, etc.)
//! - [`money`] - Money and Percentage with integer arithmetic
//! - [`ticket`] - Ticket aggregate: totals, discounts, cashback, transitions
//! - [`commission`] - Commission calculator
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tally_core::money::{Money, Percentage};
//!
//! let service = Money::from_cents(10000); // 100.00
//! let commission = service.percentage(Percentage::from_bps(2000)); // 20%
//! assert_eq!(commission.cents(), 2000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod commission;
pub mod error;
pub mod money;
pub mod ticket;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use commission::{calculate_commission, CommissionDraft};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Percentage};
pub use ticket::{
    format_payment_summary, format_ticket_number, CashbackApplication, TicketAggregate,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed on a single ticket.
pub const MAX_TICKET_ITEMS: usize = 200;

/// Maximum quantity of a single line item.
///
/// Guards against typing 1000 instead of 10 at the counter.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Largest monetary input accepted, in cents (1 billion currency units).
///
/// MAX_VALUE_CENTS × MAX_ITEM_QUANTITY × MAX_TICKET_ITEMS stays within i64.
pub const MAX_VALUE_CENTS: i64 = 100_000_000_000;

/// Maximum length of free-text ticket notes.
pub const MAX_NOTES_LENGTH: usize = 500;

/// Prefix of every human-readable ticket number.
pub const TICKET_NUMBER_PREFIX: &str = "TICKET";

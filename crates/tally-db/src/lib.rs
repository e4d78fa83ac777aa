//! # tally-db: Database Layer for Tally
//!
//! SQLite persistence, the four ledgers and the settlement engine that
//! drives them. Built on sqlx with one transaction per ticket operation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally Data Flow                                │
//! │                                                                         │
//! │  HTTP handler (POST /tickets/{id}/finalize)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tally-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌────────────────┐   ┌───────────────┐   ┌──────────────┐   │   │
//! │  │   │SettlementEngine│──►│  Repositories │   │  Migrations  │   │   │
//! │  │   │ (settlement.rs)│   │ ticket, stock │   │  (embedded)  │   │   │
//! │  │   │ one tx per op  │   │ cashback, fin.│   │ 001_init.sql │   │   │
//! │  │   └───────┬────────┘   │ commission    │   └──────────────┘   │   │
//! │  │           │            └───────┬───────┘                       │   │
//! │  │           ▼                    │                               │   │
//! │  │   tally-core::TicketAggregate  │  (pure rules, no I/O)         │   │
//! │  │                                ▼                               │   │
//! │  │                 Database (pool.rs, SqlitePool)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Ledgers and lookups
//! - [`settlement`] - Ticket operations as atomic units
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tally_db::{Database, DbConfig, NewTicket};
//!
//! let db = Database::new(DbConfig::new("tally.db")).await?;
//! let ticket = db
//!     .engine()
//!     .open_ticket(company_id, NewTicket { client_id, ..Default::default() })
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod settlement;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use settlement::{CashbackOutcome, NewTicket, Settlement, SettlementEngine};

// Repository re-exports for convenience
pub use repository::cashback::CashbackRepository;
pub use repository::catalog::CatalogRepository;
pub use repository::commission::CommissionRepository;
pub use repository::financial::FinancialRepository;
pub use repository::stock::StockRepository;
pub use repository::ticket::{TicketFilter, TicketRepository};

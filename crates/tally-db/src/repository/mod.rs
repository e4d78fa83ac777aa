//! # Repository Module
//!
//! Database repository implementations for Tally.
//!
//! ## Two Entry Points Per Ledger
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  Free functions  fn(conn: &mut SqliteConnection, …)                     │
//! │  ├── compose inside one transaction (SettlementEngine)                  │
//! │  └── stock::check_and_decrement, cashback::debit, ticket::claim, …      │
//! │                                                                         │
//! │  Repository structs  (hold a SqlitePool)                                │
//! │  ├── standalone reads for the API: db.tickets().list(…)                 │
//! │  └── single-ledger writes in their own transaction                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`TicketRepository`](ticket::TicketRepository) - Tickets, items, numbering
//! - [`CatalogRepository`](catalog::CatalogRepository) - Clients and sellable entries
//! - [`StockRepository`](stock::StockRepository) - Product stock
//! - [`CashbackRepository`](cashback::CashbackRepository) - Client cashback
//! - [`FinancialRepository`](financial::FinancialRepository) - Accounting entries
//! - [`CommissionRepository`](commission::CommissionRepository) - Professional commissions

pub mod cashback;
pub mod catalog;
pub mod commission;
pub mod financial;
pub mod stock;
pub mod ticket;

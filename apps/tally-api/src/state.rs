//! # Application State
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Router::with_state(AppState)                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppState ── Database (SqlitePool, reference counted)                   │
//! │                 ├── engine()   → SettlementEngine (ticket operations)   │
//! │                 └── cashback() → CashbackRepository (statements)        │
//! │                                                                         │
//! │  THREAD SAFETY: the pool is shared; every request borrows its own       │
//! │  connection and runs its own transaction.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tally_db::{Database, SettlementEngine};

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }

    pub fn engine(&self) -> SettlementEngine {
        self.db.engine()
    }
}

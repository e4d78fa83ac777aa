//! # Tally API
//!
//! HTTP surface of the settlement engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Tally API Server                               │
//! │                                                                         │
//! │  Front-end ───► HTTP (axum) ───► handlers ───► SettlementEngine         │
//! │                   │                               │                     │
//! │                   ├── TraceLayer (request spans)  ▼                     │
//! │                   └── TimeoutLayer              SQLite (WAL)            │
//! │                       (dropped future = rollback)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Routes
//! | Method | Path                              | Operation      |
//! |--------|-----------------------------------|----------------|
//! | POST   | /tickets                          | open           |
//! | GET    | /tickets                          | list           |
//! | GET    | /tickets/{id}                     | get            |
//! | DELETE | /tickets/{id}                     | cancel         |
//! | POST   | /tickets/{id}/items               | add item       |
//! | DELETE | /tickets/{id}/items/{item_id}     | remove item    |
//! | POST   | /tickets/{id}/discount            | manual discount|
//! | POST   | /tickets/{id}/cashback            | spend cashback |
//! | POST   | /tickets/{id}/finalize            | settle         |
//! | GET    | /clients/{id}/cashback            | statement      |
//! | GET    | /health                           | liveness       |
//!
//! Every route except `/health` requires the `x-company-id` header.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod state;

use std::time::Duration;

use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use config::{ApiConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use extract::{CompanyId, COMPANY_HEADER};
pub use state::AppState;

use handlers::{clients, health, tickets};

/// Builds the application router.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route(
            "/tickets",
            post(tickets::open_ticket).get(tickets::list_tickets),
        )
        .route(
            "/tickets/{id}",
            get(tickets::get_ticket).delete(tickets::cancel),
        )
        .route("/tickets/{id}/items", post(tickets::add_item))
        .route(
            "/tickets/{id}/items/{item_id}",
            delete(tickets::remove_item),
        )
        .route("/tickets/{id}/discount", post(tickets::apply_discount))
        .route("/tickets/{id}/cashback", post(tickets::apply_cashback))
        .route("/tickets/{id}/finalize", post(tickets::finalize))
        .route("/clients/{id}/cashback", get(clients::cashback_statement))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

//! # HTTP Handlers
//!
//! All endpoints exposed to the front-end.
//!
//! ## Handler Organization
//! ```text
//! handlers/
//! ├── mod.rs      ◄─── You are here (exports)
//! ├── tickets.rs  ◄─── Ticket lifecycle: open, items, discount,
//! │                    cashback, finalize, cancel, reads
//! ├── clients.rs  ◄─── Client cashback statement
//! └── health.rs   ◄─── Liveness, database + migration check
//! ```
//!
//! ## How Handlers Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Request Flow                                         │
//! │                                                                         │
//! │  POST /tickets/{id}/items        x-company-id: acme                     │
//! │  {"item_type": "SERVICE", "reference_id": "...", "quantity": 1}         │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn add_item(                                                     │
//! │      State(state): State<AppState>,  ◄── Shared pool                   │
//! │      CompanyId(company): CompanyId,  ◄── From the header               │
//! │      Path(ticket_id): Path<String>,  ◄── From the URL                  │
//! │      payload: Json<ItemInput>,       ◄── From the body                 │
//! │  ) -> ApiResult<Json<TicketAggregate>>                                  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  SettlementEngine::add_item (one transaction)                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  200 {"ticket": {...}, "items": [...]}  or  {"code", "message"}        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod clients;
pub mod health;
pub mod tickets;

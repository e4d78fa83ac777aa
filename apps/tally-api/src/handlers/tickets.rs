//! # Ticket Handlers

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::error::ApiResult;
use crate::extract::CompanyId;
use crate::state::AppState;
use tally_core::{ItemInput, Money, PaymentLine, PaymentMethod, Ticket, TicketAggregate};
use tally_db::{CashbackOutcome, NewTicket, Settlement, TicketFilter};

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRequest {
    pub discount_cents: i64,
}

#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export)]
pub struct CashbackRequest {
    pub amount_cents: i64,
}

/// One tender line as typed by the operator. `method` accepts the
/// aliases of [`PaymentMethod::parse`] ("credit card", "transfer", ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub method: String,
    pub value_cents: i64,
}

#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export)]
pub struct FinalizeRequest {
    #[serde(default)]
    pub payments: Vec<PaymentRequest>,
}

impl FinalizeRequest {
    /// Resolves every method name; an unknown one rejects the whole request.
    pub fn payment_lines(&self) -> ApiResult<Vec<PaymentLine>> {
        self.payments
            .iter()
            .map(|payment| {
                let method = PaymentMethod::parse(&payment.method)?;
                Ok(PaymentLine::new(method, Money::from_cents(payment.value_cents)))
            })
            .collect()
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

pub async fn open_ticket(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    payload: Result<Json<NewTicket>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<TicketAggregate>)> {
    let Json(request) = payload?;
    debug!(%company, client_id = %request.client_id, "open_ticket");

    let aggregate = state.engine().open_ticket(&company, request).await?;
    Ok((StatusCode::CREATED, Json(aggregate)))
}

pub async fn add_item(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path(ticket_id): Path<String>,
    payload: Result<Json<ItemInput>, JsonRejection>,
) -> ApiResult<Json<TicketAggregate>> {
    let Json(input) = payload?;
    debug!(%company, %ticket_id, reference_id = %input.reference_id, "add_item");

    let aggregate = state.engine().add_item(&company, &ticket_id, input).await?;
    Ok(Json(aggregate))
}

pub async fn remove_item(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path((ticket_id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<TicketAggregate>> {
    debug!(%company, %ticket_id, %item_id, "remove_item");

    let aggregate = state
        .engine()
        .remove_item(&company, &ticket_id, &item_id)
        .await?;
    Ok(Json(aggregate))
}

pub async fn apply_discount(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path(ticket_id): Path<String>,
    payload: Result<Json<DiscountRequest>, JsonRejection>,
) -> ApiResult<Json<TicketAggregate>> {
    let Json(request) = payload?;
    debug!(%company, %ticket_id, discount_cents = request.discount_cents, "apply_discount");

    let aggregate = state
        .engine()
        .apply_discount(&company, &ticket_id, Money::from_cents(request.discount_cents))
        .await?;
    Ok(Json(aggregate))
}

pub async fn apply_cashback(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path(ticket_id): Path<String>,
    payload: Result<Json<CashbackRequest>, JsonRejection>,
) -> ApiResult<Json<CashbackOutcome>> {
    let Json(request) = payload?;
    debug!(%company, %ticket_id, amount_cents = request.amount_cents, "apply_cashback");

    let outcome = state
        .engine()
        .apply_cashback(&company, &ticket_id, Money::from_cents(request.amount_cents))
        .await?;
    Ok(Json(outcome))
}

pub async fn finalize(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path(ticket_id): Path<String>,
    payload: Result<Json<FinalizeRequest>, JsonRejection>,
) -> ApiResult<Json<Settlement>> {
    let Json(request) = payload?;
    let payments = request.payment_lines()?;
    debug!(%company, %ticket_id, payments = payments.len(), "finalize");

    let settlement = state
        .engine()
        .finalize(&company, &ticket_id, &payments)
        .await?;
    Ok(Json(settlement))
}

pub async fn cancel(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path(ticket_id): Path<String>,
) -> ApiResult<Json<TicketAggregate>> {
    debug!(%company, %ticket_id, "cancel");

    let aggregate = state.engine().cancel(&company, &ticket_id).await?;
    Ok(Json(aggregate))
}

// =============================================================================
// Reads
// =============================================================================

pub async fn get_ticket(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    Path(ticket_id): Path<String>,
) -> ApiResult<Json<TicketAggregate>> {
    let aggregate = state.engine().get_ticket(&company, &ticket_id).await?;
    Ok(Json(aggregate))
}

pub async fn list_tickets(
    State(state): State<AppState>,
    CompanyId(company): CompanyId,
    query: Result<Query<TicketFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Ticket>>> {
    let Query(filter) = query?;
    let tickets = state.engine().list_tickets(&company, &filter).await?;
    Ok(Json(tickets))
}

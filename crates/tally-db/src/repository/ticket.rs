//! # Ticket Repository
//!
//! Persistence of tickets, their items and the per-day number sequence.
//!
//! ## The Claim
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every mutating operation starts with:                                  │
//! │                                                                         │
//! │    UPDATE tickets SET version = version + 1                             │
//! │    WHERE id = ? AND company_id = ?                                      │
//! │      AND status IN ('open', 'in_progress')                              │
//! │    RETURNING …                                                          │
//! │                                                                         │
//! │  • takes SQLite's write lock before anything is read                    │
//! │  • a concurrent Finalize waits (busy_timeout), then sees FINISHED       │
//! │    and gets zero rows → InvalidState                                    │
//! │  • zero rows + no ticket at all → NotFound                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::{format_ticket_number, CoreError, Ticket, TicketAggregate, TicketItem, TicketStatus};

const TICKET_COLUMNS: &str = r#"
    id, company_id, client_id, professional_id, number, status, notes,
    total_cents, discount_cents, cashback_cents, net_cents,
    payment_summary, payment_received, version,
    opened_at, updated_at, finished_at, cancelled_at
"#;

const ITEM_COLUMNS: &str = r#"
    id, ticket_id, company_id, item_type, reference_id, name_snapshot,
    professional_id, quantity, unit_value_cents, total_cents, commission_bps,
    created_at
"#;

/// Default page size of ticket listings.
pub const DEFAULT_LIST_LIMIT: u32 = 50;

/// Largest page a caller may request.
pub const MAX_LIST_LIMIT: u32 = 200;

// =============================================================================
// Numbering
// =============================================================================

/// Allocates the next ticket number of the company for `business_date`.
///
/// The counter row is upserted and incremented in one statement, so two
/// concurrent opens can never read the same value.
pub async fn next_number(
    conn: &mut SqliteConnection,
    company_id: &str,
    business_date: NaiveDate,
) -> DbResult<String> {
    let sequence: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO ticket_sequences (company_id, business_date, last_value)
        VALUES (?1, ?2, 1)
        ON CONFLICT (company_id, business_date)
        DO UPDATE SET last_value = last_value + 1
        RETURNING last_value
        "#,
    )
    .bind(company_id)
    .bind(business_date)
    .fetch_one(&mut *conn)
    .await?;

    Ok(format_ticket_number(business_date, sequence))
}

// =============================================================================
// Tickets
// =============================================================================

pub async fn insert(conn: &mut SqliteConnection, ticket: &Ticket) -> DbResult<()> {
    debug!(id = %ticket.id, number = %ticket.number, "Inserting ticket");

    sqlx::query(&format!(
        "INSERT INTO tickets ({TICKET_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)"
    ))
    .bind(&ticket.id)
    .bind(&ticket.company_id)
    .bind(&ticket.client_id)
    .bind(&ticket.professional_id)
    .bind(&ticket.number)
    .bind(ticket.status)
    .bind(&ticket.notes)
    .bind(ticket.total_cents)
    .bind(ticket.discount_cents)
    .bind(ticket.cashback_cents)
    .bind(ticket.net_cents)
    .bind(&ticket.payment_summary)
    .bind(ticket.payment_received)
    .bind(ticket.version)
    .bind(ticket.opened_at)
    .bind(ticket.updated_at)
    .bind(ticket.finished_at)
    .bind(ticket.cancelled_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn find(
    conn: &mut SqliteConnection,
    company_id: &str,
    ticket_id: &str,
) -> DbResult<Option<Ticket>> {
    let ticket = sqlx::query_as::<_, Ticket>(&format!(
        "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ?1 AND company_id = ?2"
    ))
    .bind(ticket_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(ticket)
}

/// Locks a mutable ticket for the rest of the transaction.
///
/// ## Returns
/// * `Ok(Ticket)` - OPEN or IN_PROGRESS, version already bumped
/// * `Err(InvalidState)` - FINISHED or CANCELLED
/// * `Err(NotFound)` - missing or owned by another company
pub async fn claim(
    conn: &mut SqliteConnection,
    company_id: &str,
    ticket_id: &str,
    now: DateTime<Utc>,
) -> DbResult<Ticket> {
    let claimed = sqlx::query_as::<_, Ticket>(&format!(
        r#"
        UPDATE tickets
        SET version = version + 1, updated_at = ?1
        WHERE id = ?2 AND company_id = ?3 AND status IN ('open', 'in_progress')
        RETURNING {TICKET_COLUMNS}
        "#
    ))
    .bind(now)
    .bind(ticket_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(ticket) = claimed {
        debug!(%ticket_id, version = ticket.version, "Ticket claimed");
        return Ok(ticket);
    }

    match find(conn, company_id, ticket_id).await? {
        Some(ticket) => Err(CoreError::invalid_state(ticket.id, ticket.status).into()),
        None => Err(CoreError::not_found("Ticket", ticket_id).into()),
    }
}

/// Writes status, totals and payment fields back.
///
/// Only valid after [`claim`] in the same transaction; the version check
/// catches any writer that skipped it.
pub async fn update(conn: &mut SqliteConnection, ticket: &Ticket) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE tickets
        SET status = ?1,
            notes = ?2,
            total_cents = ?3,
            discount_cents = ?4,
            cashback_cents = ?5,
            net_cents = ?6,
            payment_summary = ?7,
            payment_received = ?8,
            updated_at = ?9,
            finished_at = ?10,
            cancelled_at = ?11
        WHERE id = ?12 AND company_id = ?13 AND version = ?14
        "#,
    )
    .bind(ticket.status)
    .bind(&ticket.notes)
    .bind(ticket.total_cents)
    .bind(ticket.discount_cents)
    .bind(ticket.cashback_cents)
    .bind(ticket.net_cents)
    .bind(&ticket.payment_summary)
    .bind(ticket.payment_received)
    .bind(ticket.updated_at)
    .bind(ticket.finished_at)
    .bind(ticket.cancelled_at)
    .bind(&ticket.id)
    .bind(&ticket.company_id)
    .bind(ticket.version)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(CoreError::invalid_state(&ticket.id, ticket.status).into());
    }

    debug!(id = %ticket.id, status = %ticket.status, net = %ticket.net_value(), "Ticket updated");
    Ok(())
}

// =============================================================================
// Items
// =============================================================================

pub async fn items(conn: &mut SqliteConnection, ticket_id: &str) -> DbResult<Vec<TicketItem>> {
    let rows = sqlx::query_as::<_, TicketItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM ticket_items WHERE ticket_id = ?1 ORDER BY created_at, rowid"
    ))
    .bind(ticket_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

pub async fn insert_item(conn: &mut SqliteConnection, item: &TicketItem) -> DbResult<()> {
    debug!(ticket_id = %item.ticket_id, reference_id = %item.reference_id, "Adding ticket item");

    sqlx::query(&format!(
        "INSERT INTO ticket_items ({ITEM_COLUMNS}) VALUES \
         (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)"
    ))
    .bind(&item.id)
    .bind(&item.ticket_id)
    .bind(&item.company_id)
    .bind(item.item_type)
    .bind(&item.reference_id)
    .bind(&item.name_snapshot)
    .bind(&item.professional_id)
    .bind(item.quantity)
    .bind(item.unit_value_cents)
    .bind(item.total_cents)
    .bind(item.commission_bps)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn delete_item(conn: &mut SqliteConnection, ticket_id: &str, item_id: &str) -> DbResult<()> {
    sqlx::query("DELETE FROM ticket_items WHERE id = ?1 AND ticket_id = ?2")
        .bind(item_id)
        .bind(ticket_id)
        .execute(&mut *conn)
        .await?;

    debug!(%ticket_id, %item_id, "Ticket item deleted");
    Ok(())
}

/// Claims a ticket and loads its items.
pub async fn claim_aggregate(
    conn: &mut SqliteConnection,
    company_id: &str,
    ticket_id: &str,
    now: DateTime<Utc>,
) -> DbResult<TicketAggregate> {
    let ticket = claim(conn, company_id, ticket_id, now).await?;
    let items = items(conn, &ticket.id).await?;
    Ok(TicketAggregate::new(ticket, items))
}

// =============================================================================
// Listing
// =============================================================================

/// Filters of ListTickets. All optional; results are newest first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketFilter {
    pub client_id: Option<String>,
    pub professional_id: Option<String>,
    pub status: Option<TicketStatus>,
    pub limit: Option<u32>,
}

impl TicketFilter {
    /// Requested limit, defaulted and clamped to 1..=MAX_LIST_LIMIT.
    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT)
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for ticket reads.
#[derive(Debug, Clone)]
pub struct TicketRepository {
    pool: SqlitePool,
}

impl TicketRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TicketRepository { pool }
    }

    /// Loads a ticket with its items, or `CoreError::NotFound`.
    pub async fn get(&self, company_id: &str, ticket_id: &str) -> DbResult<TicketAggregate> {
        let mut conn = self.pool.acquire().await?;
        let ticket = find(&mut conn, company_id, ticket_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Ticket", ticket_id))?;
        let items = items(&mut conn, &ticket.id).await?;
        Ok(TicketAggregate::new(ticket, items))
    }

    /// Lists tickets of the company, newest first.
    pub async fn list(&self, company_id: &str, filter: &TicketFilter) -> DbResult<Vec<Ticket>> {
        let mut query: QueryBuilder<'_, Sqlite> =
            QueryBuilder::new(format!("SELECT {TICKET_COLUMNS} FROM tickets WHERE company_id = "));
        query.push_bind(company_id);

        if let Some(client_id) = &filter.client_id {
            query.push(" AND client_id = ").push_bind(client_id);
        }
        if let Some(professional_id) = &filter.professional_id {
            query.push(" AND professional_id = ").push_bind(professional_id);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }

        query
            .push(" ORDER BY opened_at DESC, rowid DESC LIMIT ")
            .push_bind(filter.effective_limit());

        let tickets = query.build_query_as::<Ticket>().fetch_all(&self.pool).await?;

        debug!(%company_id, count = tickets.len(), "Tickets listed");
        Ok(tickets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_limit_clamped() {
        assert_eq!(TicketFilter::default().effective_limit(), DEFAULT_LIST_LIMIT);

        let filter = TicketFilter {
            limit: Some(0),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), 1);

        let filter = TicketFilter {
            limit: Some(10_000),
            ..Default::default()
        };
        assert_eq!(filter.effective_limit(), MAX_LIST_LIMIT);
    }
}

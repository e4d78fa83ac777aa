//! # Financial Transaction Recorder
//!
//! Append-only accounting entries. Finalize writes exactly one income
//! entry per ticket; purchases and manual entries come from other
//! workflows and share the table.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::FinancialTransaction;

const SELECT_FINANCIAL: &str = r#"
    SELECT id, company_id, transaction_type, origin, ticket_id, client_id,
           description, value_cents, date, status, payment_method, created_at
    FROM financial_transactions
"#;

/// Appends an entry.
pub async fn record(conn: &mut SqliteConnection, entry: &FinancialTransaction) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO financial_transactions (
            id, company_id, transaction_type, origin, ticket_id, client_id,
            description, value_cents, date, status, payment_method, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.company_id)
    .bind(entry.transaction_type)
    .bind(entry.origin)
    .bind(&entry.ticket_id)
    .bind(&entry.client_id)
    .bind(&entry.description)
    .bind(entry.value_cents)
    .bind(entry.date)
    .bind(entry.status)
    .bind(entry.payment_method)
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await?;

    debug!(
        id = %entry.id,
        ticket_id = ?entry.ticket_id,
        value = %entry.value(),
        "Financial transaction recorded"
    );
    Ok(())
}

/// Entries linked to a ticket.
pub async fn for_ticket(
    conn: &mut SqliteConnection,
    company_id: &str,
    ticket_id: &str,
) -> DbResult<Vec<FinancialTransaction>> {
    let rows = sqlx::query_as::<_, FinancialTransaction>(&format!(
        "{SELECT_FINANCIAL} WHERE company_id = ?1 AND ticket_id = ?2 ORDER BY created_at"
    ))
    .bind(company_id)
    .bind(ticket_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Repository for financial ledger reads.
#[derive(Debug, Clone)]
pub struct FinancialRepository {
    pool: SqlitePool,
}

impl FinancialRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FinancialRepository { pool }
    }

    pub async fn for_ticket(
        &self,
        company_id: &str,
        ticket_id: &str,
    ) -> DbResult<Vec<FinancialTransaction>> {
        let mut conn = self.pool.acquire().await?;
        for_ticket(&mut conn, company_id, ticket_id).await
    }

    /// Number of entries of the company (diagnostics and tests).
    pub async fn count(&self, company_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM financial_transactions WHERE company_id = ?1")
                .bind(company_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

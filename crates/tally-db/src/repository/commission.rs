//! # Commission Repository
//!
//! Persists commission drafts produced at Finalize and lists them per
//! ticket or per professional.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{Commission, CommissionDraft, CommissionStatus};

const SELECT_COMMISSION: &str = r#"
    SELECT id, company_id, ticket_id, ticket_item_id, professional_id,
           base_cents, commission_bps, commission_cents, status, created_at
    FROM commissions
"#;

/// Inserts one PENDING commission per draft.
pub async fn insert_drafts(
    conn: &mut SqliteConnection,
    company_id: &str,
    ticket_id: &str,
    drafts: &[CommissionDraft],
    now: DateTime<Utc>,
) -> DbResult<Vec<Commission>> {
    let mut created = Vec::with_capacity(drafts.len());

    for draft in drafts {
        let commission = Commission {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            ticket_id: ticket_id.to_string(),
            ticket_item_id: draft.ticket_item_id.clone(),
            professional_id: draft.professional_id.clone(),
            base_cents: draft.base.cents(),
            commission_bps: draft.rate.bps(),
            commission_cents: draft.value.cents(),
            status: CommissionStatus::Pending,
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO commissions (
                id, company_id, ticket_id, ticket_item_id, professional_id,
                base_cents, commission_bps, commission_cents, status, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&commission.id)
        .bind(&commission.company_id)
        .bind(&commission.ticket_id)
        .bind(&commission.ticket_item_id)
        .bind(&commission.professional_id)
        .bind(commission.base_cents)
        .bind(commission.commission_bps)
        .bind(commission.commission_cents)
        .bind(commission.status)
        .bind(commission.created_at)
        .execute(&mut *conn)
        .await?;

        debug!(
            %ticket_id,
            professional_id = %commission.professional_id,
            value = %commission.commission_value(),
            "Commission created"
        );
        created.push(commission);
    }

    Ok(created)
}

pub async fn for_ticket(
    conn: &mut SqliteConnection,
    company_id: &str,
    ticket_id: &str,
) -> DbResult<Vec<Commission>> {
    let rows = sqlx::query_as::<_, Commission>(&format!(
        "{SELECT_COMMISSION} WHERE company_id = ?1 AND ticket_id = ?2 ORDER BY rowid"
    ))
    .bind(company_id)
    .bind(ticket_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

/// Repository for commission reads.
#[derive(Debug, Clone)]
pub struct CommissionRepository {
    pool: SqlitePool,
}

impl CommissionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CommissionRepository { pool }
    }

    pub async fn for_ticket(&self, company_id: &str, ticket_id: &str) -> DbResult<Vec<Commission>> {
        let mut conn = self.pool.acquire().await?;
        for_ticket(&mut conn, company_id, ticket_id).await
    }

    /// Commissions of a professional, optionally filtered by status.
    pub async fn for_professional(
        &self,
        company_id: &str,
        professional_id: &str,
        status: Option<CommissionStatus>,
    ) -> DbResult<Vec<Commission>> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new(SELECT_COMMISSION);
        query
            .push(" WHERE company_id = ")
            .push_bind(company_id)
            .push(" AND professional_id = ")
            .push_bind(professional_id);
        if let Some(status) = status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY created_at DESC, rowid DESC");

        let rows = query.build_query_as::<Commission>().fetch_all(&self.pool).await?;
        Ok(rows)
    }
}

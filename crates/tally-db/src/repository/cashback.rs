//! # Cashback Ledger
//!
//! One balance per (company, client) plus an append-only transaction log.
//!
//! ```text
//!   cashback_balances                 cashback_transactions
//!   ┌──────────────────────┐          ┌──────────────────────────────┐
//!   │ id                   │◄─────────│ balance_id                   │
//!   │ company_id, client_id│ (unique) │ direction  used | earned     │
//!   │ balance_cents  >= 0  │          │ amount, balance_after        │
//!   └──────────────────────┘          │ ticket_id (optional)         │
//!                                     └──────────────────────────────┘
//! ```
//!
//! Balances are created lazily with zero on first access. Every debit or
//! credit writes the balance and its log row in the caller's transaction.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::validation::validate_positive_cents;
use tally_core::{CashbackBalance, CashbackDirection, CashbackTransaction, CoreError, Money};

const BALANCE_COLUMNS: &str = "id, company_id, client_id, balance_cents, created_at, updated_at";

/// Returns the client's balance, creating a zero balance on first use.
///
/// The insert only happens when the client exists in the company, so a
/// missing or foreign client is reported as NotFound.
pub async fn get_or_create_balance(
    conn: &mut SqliteConnection,
    company_id: &str,
    client_id: &str,
) -> DbResult<CashbackBalance> {
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO cashback_balances
            (id, company_id, client_id, balance_cents, created_at, updated_at)
        SELECT ?1, company_id, id, 0, ?2, ?2
        FROM clients
        WHERE id = ?3 AND company_id = ?4
        ON CONFLICT (company_id, client_id) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(now)
    .bind(client_id)
    .bind(company_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, CashbackBalance>(&format!(
        "SELECT {BALANCE_COLUMNS} FROM cashback_balances WHERE company_id = ?1 AND client_id = ?2"
    ))
    .bind(company_id)
    .bind(client_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::not_found("Client", client_id).into())
}

async fn append(
    conn: &mut SqliteConnection,
    balance: &CashbackBalance,
    direction: CashbackDirection,
    amount: Money,
    ticket_id: Option<&str>,
) -> DbResult<CashbackTransaction> {
    let tx = CashbackTransaction {
        id: Uuid::new_v4().to_string(),
        balance_id: balance.id.clone(),
        company_id: balance.company_id.clone(),
        ticket_id: ticket_id.map(str::to_string),
        direction,
        amount_cents: amount.cents(),
        balance_after_cents: balance.balance_cents,
        created_at: balance.updated_at,
    };

    sqlx::query(
        r#"
        INSERT INTO cashback_transactions
            (id, balance_id, company_id, ticket_id, direction,
             amount_cents, balance_after_cents, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&tx.id)
    .bind(&tx.balance_id)
    .bind(&tx.company_id)
    .bind(&tx.ticket_id)
    .bind(tx.direction)
    .bind(tx.amount_cents)
    .bind(tx.balance_after_cents)
    .bind(tx.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(tx)
}

/// Spends `amount` from a balance.
///
/// Conditional update (`WHERE balance_cents >= amount`): the balance can
/// never go negative, even with concurrent debits.
pub async fn debit(
    conn: &mut SqliteConnection,
    company_id: &str,
    balance_id: &str,
    amount: Money,
    ticket_id: Option<&str>,
) -> DbResult<CashbackTransaction> {
    validate_positive_cents("cashback amount", amount.cents())?;

    let updated = sqlx::query_as::<_, CashbackBalance>(&format!(
        r#"
        UPDATE cashback_balances
        SET balance_cents = balance_cents - ?1, updated_at = ?2
        WHERE id = ?3 AND company_id = ?4 AND balance_cents >= ?1
        RETURNING {BALANCE_COLUMNS}
        "#
    ))
    .bind(amount.cents())
    .bind(Utc::now())
    .bind(balance_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(balance) = updated else {
        let available: Option<i64> = sqlx::query_scalar(
            "SELECT balance_cents FROM cashback_balances WHERE id = ?1 AND company_id = ?2",
        )
        .bind(balance_id)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await?;

        return Err(match available {
            Some(cents) => CoreError::InsufficientFunds {
                available: Money::from_cents(cents),
                requested: amount,
            },
            None => CoreError::not_found("CashbackBalance", balance_id),
        }
        .into());
    };

    debug!(%balance_id, amount = %amount, balance = %balance.balance(), "Cashback debited");
    append(conn, &balance, CashbackDirection::Used, amount, ticket_id).await
}

/// Adds `amount` to a balance.
pub async fn credit(
    conn: &mut SqliteConnection,
    company_id: &str,
    balance_id: &str,
    amount: Money,
    ticket_id: Option<&str>,
) -> DbResult<CashbackTransaction> {
    validate_positive_cents("cashback amount", amount.cents())?;

    let balance = sqlx::query_as::<_, CashbackBalance>(&format!(
        r#"
        UPDATE cashback_balances
        SET balance_cents = balance_cents + ?1, updated_at = ?2
        WHERE id = ?3 AND company_id = ?4
        RETURNING {BALANCE_COLUMNS}
        "#
    ))
    .bind(amount.cents())
    .bind(Utc::now())
    .bind(balance_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::not_found("CashbackBalance", balance_id))?;

    debug!(%balance_id, amount = %amount, balance = %balance.balance(), "Cashback credited");
    append(conn, &balance, CashbackDirection::Earned, amount, ticket_id).await
}

/// Most recent log entries of a balance, newest first.
pub async fn transactions(
    conn: &mut SqliteConnection,
    company_id: &str,
    balance_id: &str,
    limit: u32,
) -> DbResult<Vec<CashbackTransaction>> {
    let rows = sqlx::query_as::<_, CashbackTransaction>(
        r#"
        SELECT id, balance_id, company_id, ticket_id, direction,
               amount_cents, balance_after_cents, created_at
        FROM cashback_transactions
        WHERE balance_id = ?1 AND company_id = ?2
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?3
        "#,
    )
    .bind(balance_id)
    .bind(company_id)
    .bind(limit)
    .fetch_all(&mut *conn)
    .await?;

    Ok(rows)
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for standalone cashback operations.
#[derive(Debug, Clone)]
pub struct CashbackRepository {
    pool: SqlitePool,
}

impl CashbackRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CashbackRepository { pool }
    }

    /// Returns the balance, creating it on first access.
    pub async fn balance(&self, company_id: &str, client_id: &str) -> DbResult<CashbackBalance> {
        let mut tx = self.pool.begin().await?;
        let balance = get_or_create_balance(&mut tx, company_id, client_id).await?;
        tx.commit().await?;
        Ok(balance)
    }

    pub async fn debit(
        &self,
        company_id: &str,
        balance_id: &str,
        amount: Money,
        ticket_id: Option<&str>,
    ) -> DbResult<CashbackTransaction> {
        let mut tx = self.pool.begin().await?;
        let entry = debit(&mut tx, company_id, balance_id, amount, ticket_id).await?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn credit(
        &self,
        company_id: &str,
        balance_id: &str,
        amount: Money,
        ticket_id: Option<&str>,
    ) -> DbResult<CashbackTransaction> {
        let mut tx = self.pool.begin().await?;
        let entry = credit(&mut tx, company_id, balance_id, amount, ticket_id).await?;
        tx.commit().await?;
        Ok(entry)
    }

    pub async fn transactions(
        &self,
        company_id: &str,
        balance_id: &str,
        limit: u32,
    ) -> DbResult<Vec<CashbackTransaction>> {
        let mut conn = self.pool.acquire().await?;
        transactions(&mut conn, company_id, balance_id, limit).await
    }

    /// Balance plus its latest transactions, for the client statement.
    pub async fn statement(
        &self,
        company_id: &str,
        client_id: &str,
        limit: u32,
    ) -> DbResult<(CashbackBalance, Vec<CashbackTransaction>)> {
        let mut tx = self.pool.begin().await?;
        let balance = get_or_create_balance(&mut tx, company_id, client_id).await?;
        let entries = transactions(&mut tx, company_id, &balance.id, limit).await?;
        tx.commit().await?;
        Ok((balance, entries))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::{Database, DbConfig};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let client = db.catalog().insert_client("co-1", "Ana").await.unwrap();
        (db, client.id)
    }

    #[tokio::test]
    async fn test_balance_created_lazily_once() {
        let (db, client_id) = setup().await;

        let first = db.cashback().balance("co-1", &client_id).await.unwrap();
        let second = db.cashback().balance("co-1", &client_id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(first.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_balance_for_unknown_client() {
        let (db, client_id) = setup().await;
        let err = db.cashback().balance("co-2", &client_id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_credit_then_debit_logs_both() {
        let (db, client_id) = setup().await;
        let cashback = db.cashback();
        let balance = cashback.balance("co-1", &client_id).await.unwrap();

        let earned = cashback
            .credit("co-1", &balance.id, Money::from_cents(5000), None)
            .await
            .unwrap();
        assert_eq!(earned.direction, CashbackDirection::Earned);
        assert_eq!(earned.balance_after_cents, 5000);

        let used = cashback
            .debit("co-1", &balance.id, Money::from_cents(1500), None)
            .await
            .unwrap();
        assert_eq!(used.direction, CashbackDirection::Used);
        assert_eq!(used.balance_after_cents, 3500);

        let log = cashback.transactions("co-1", &balance.id, 10).await.unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].direction, CashbackDirection::Used);
    }

    #[tokio::test]
    async fn test_debit_beyond_balance_rejected() {
        let (db, client_id) = setup().await;
        let cashback = db.cashback();
        let balance = cashback.balance("co-1", &client_id).await.unwrap();
        cashback
            .credit("co-1", &balance.id, Money::from_cents(1000), None)
            .await
            .unwrap();

        let err = cashback
            .debit("co-1", &balance.id, Money::from_cents(1001), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientFunds { .. })));

        let after = cashback.balance("co-1", &client_id).await.unwrap();
        assert_eq!(after.balance_cents, 1000);
        assert_eq!(cashback.transactions("co-1", &balance.id, 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_non_positive_amounts_rejected() {
        let (db, client_id) = setup().await;
        let cashback = db.cashback();
        let balance = cashback.balance("co-1", &client_id).await.unwrap();

        for amount in [0, -100] {
            let err = cashback
                .credit("co-1", &balance.id, Money::from_cents(amount), None)
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Domain(CoreError::InvalidArgument(_))));
        }
    }
}

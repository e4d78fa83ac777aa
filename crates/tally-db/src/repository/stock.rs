//! # Stock Ledger
//!
//! Product stock with an atomic check-and-decrement.
//!
//! ## Why One Statement?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  READ-THEN-WRITE (race)              CONDITIONAL UPDATE (this module)  │
//! │                                                                         │
//! │  A: SELECT stock → 1                 A: UPDATE … WHERE stock >= 1  ✓   │
//! │  B: SELECT stock → 1                 B: UPDATE … WHERE stock >= 1      │
//! │  A: UPDATE stock = 0                    → 0 rows → InsufficientStock   │
//! │  B: UPDATE stock = -1  ❌                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No separate "check" call is exposed: checking and decrementing are one
//! statement.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tally_core::validation::validate_quantity;
use tally_core::{CoreError, StockEntry};

const SELECT_STOCK: &str = r#"
    SELECT id AS product_id, company_id, name, stock_current, stock_minimum
    FROM products
    WHERE id = ?1 AND company_id = ?2
"#;

/// Reads the stock entry of a product.
pub async fn get(
    conn: &mut SqliteConnection,
    company_id: &str,
    product_id: &str,
) -> DbResult<Option<StockEntry>> {
    let entry = sqlx::query_as::<_, StockEntry>(SELECT_STOCK)
        .bind(product_id)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(entry)
}

/// Removes `quantity` units if, and only if, that many are available.
///
/// ## Returns
/// * `Ok(StockEntry)` - the entry after the decrement
/// * `Err(InsufficientStock)` - nothing changed
/// * `Err(NotFound)` - no such product in this company
pub async fn check_and_decrement(
    conn: &mut SqliteConnection,
    company_id: &str,
    product_id: &str,
    quantity: i64,
) -> DbResult<StockEntry> {
    validate_quantity(quantity)?;

    let updated = sqlx::query_as::<_, StockEntry>(
        r#"
        UPDATE products
        SET stock_current = stock_current - ?1,
            updated_at = ?2
        WHERE id = ?3 AND company_id = ?4 AND stock_current >= ?1
        RETURNING id AS product_id, company_id, name, stock_current, stock_minimum
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(entry) = updated {
        debug!(
            %product_id,
            quantity,
            stock_current = entry.stock_current,
            "Stock decremented"
        );
        return Ok(entry);
    }

    match get(conn, company_id, product_id).await? {
        Some(entry) => Err(CoreError::InsufficientStock {
            product_name: entry.name,
            available: entry.stock_current,
            required: quantity,
        }
        .into()),
        None => Err(CoreError::not_found("Product", product_id).into()),
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for stock reads and standalone decrements.
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    pub async fn get(&self, company_id: &str, product_id: &str) -> DbResult<Option<StockEntry>> {
        let mut conn = self.pool.acquire().await?;
        get(&mut conn, company_id, product_id).await
    }

    /// Decrements in its own transaction.
    pub async fn check_and_decrement(
        &self,
        company_id: &str,
        product_id: &str,
        quantity: i64,
    ) -> DbResult<StockEntry> {
        let mut tx = self.pool.begin().await?;
        let entry = check_and_decrement(&mut tx, company_id, product_id, quantity).await?;
        tx.commit().await?;
        Ok(entry)
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
    use tally_core::Money;

    async fn setup(stock: i64) -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let product = db
            .catalog()
            .insert_product("co-1", "Shampoo", Money::from_cents(2000), stock, 1)
            .await
            .unwrap();
        (db, product.id)
    }

    #[tokio::test]
    async fn test_decrement_within_stock() {
        let (db, id) = setup(5).await;

        let entry = db.stock().check_and_decrement("co-1", &id, 3).await.unwrap();
        assert_eq!(entry.stock_current, 2);
        assert!(!entry.is_low());

        let entry = db.stock().check_and_decrement("co-1", &id, 2).await.unwrap();
        assert_eq!(entry.stock_current, 0);
        assert!(entry.is_low());
    }

    #[tokio::test]
    async fn test_insufficient_stock_leaves_row_untouched() {
        let (db, id) = setup(2).await;

        let err = db.stock().check_and_decrement("co-1", &id, 3).await.unwrap_err();
        match err {
            DbError::Domain(CoreError::InsufficientStock {
                product_name,
                available,
                required,
            }) => {
                assert_eq!(product_name, "Shampoo");
                assert_eq!(available, 2);
                assert_eq!(required, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let entry = db.stock().get("co-1", &id).await.unwrap().unwrap();
        assert_eq!(entry.stock_current, 2);
    }

    #[tokio::test]
    async fn test_unknown_or_foreign_product() {
        let (db, id) = setup(2).await;

        let err = db.stock().check_and_decrement("co-2", &id, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
        assert!(db.stock().get("co-2", &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let (db, id) = setup(2).await;
        let err = db.stock().check_and_decrement("co-1", &id, 0).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InvalidArgument(_))));
    }
}

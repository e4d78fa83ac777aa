//! # Catalog Repository
//!
//! Lookups of clients, services, products and packages. The wider CRM
//! owns these tables; the settlement engine only reads them (plus inserts
//! for seeding and tests).
//!
//! Every lookup filters on `company_id`: an entity of another company is
//! reported as NotFound, never leaked.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tally_core::{CatalogEntry, Client, CoreError, ItemType, Money, Percentage};

// =============================================================================
// Transaction-scoped lookups
// =============================================================================

/// Loads a client of the company, or `CoreError::NotFound`.
pub async fn get_client(
    conn: &mut SqliteConnection,
    company_id: &str,
    client_id: &str,
) -> DbResult<Client> {
    sqlx::query_as::<_, Client>(
        "SELECT id, company_id, name FROM clients WHERE id = ?1 AND company_id = ?2",
    )
    .bind(client_id)
    .bind(company_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| CoreError::not_found("Client", client_id).into())
}

/// Loads the sellable entry behind a line item, or `CoreError::NotFound`.
///
/// ```text
/// SERVICE  → services  (price, default commission)
/// PRODUCT  → products  (price, commission 0)
/// PACKAGE  → packages  (price, commission 0)
/// ```
pub async fn get_entry(
    conn: &mut SqliteConnection,
    company_id: &str,
    item_type: ItemType,
    reference_id: &str,
) -> DbResult<CatalogEntry> {
    let sql = match item_type {
        ItemType::Service => {
            r#"
            SELECT id, company_id, 'service' AS item_type, name, price_cents,
                   default_commission_bps
            FROM services
            WHERE id = ?1 AND company_id = ?2 AND is_active = 1
            "#
        }
        ItemType::Product => {
            r#"
            SELECT id, company_id, 'product' AS item_type, name, price_cents,
                   0 AS default_commission_bps
            FROM products
            WHERE id = ?1 AND company_id = ?2 AND is_active = 1
            "#
        }
        ItemType::Package => {
            r#"
            SELECT id, company_id, 'package' AS item_type, name, price_cents,
                   0 AS default_commission_bps
            FROM packages
            WHERE id = ?1 AND company_id = ?2 AND is_active = 1
            "#
        }
    };

    debug!(%company_id, item_type = item_type.as_str(), %reference_id, "Catalog lookup");

    sqlx::query_as::<_, CatalogEntry>(sql)
        .bind(reference_id)
        .bind(company_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| CoreError::not_found(item_type.entity_name(), reference_id).into())
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog reads and inserts.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    pub async fn get_client(&self, company_id: &str, client_id: &str) -> DbResult<Client> {
        let mut conn = self.pool.acquire().await?;
        get_client(&mut conn, company_id, client_id).await
    }

    pub async fn get_entry(
        &self,
        company_id: &str,
        item_type: ItemType,
        reference_id: &str,
    ) -> DbResult<CatalogEntry> {
        let mut conn = self.pool.acquire().await?;
        get_entry(&mut conn, company_id, item_type, reference_id).await
    }

    /// Inserts a client and returns it.
    pub async fn insert_client(&self, company_id: &str, name: &str) -> DbResult<Client> {
        let client = Client {
            id: Uuid::new_v4().to_string(),
            company_id: company_id.to_string(),
            name: name.to_string(),
        };

        sqlx::query("INSERT INTO clients (id, company_id, name) VALUES (?1, ?2, ?3)")
            .bind(&client.id)
            .bind(&client.company_id)
            .bind(&client.name)
            .execute(&self.pool)
            .await?;

        debug!(id = %client.id, %company_id, "Client inserted");
        Ok(client)
    }

    /// Inserts a service with its default commission.
    pub async fn insert_service(
        &self,
        company_id: &str,
        name: &str,
        price: Money,
        default_commission: Percentage,
    ) -> DbResult<CatalogEntry> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO services (id, company_id, name, price_cents, default_commission_bps)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&id)
        .bind(company_id)
        .bind(name)
        .bind(price.cents())
        .bind(default_commission.bps())
        .execute(&self.pool)
        .await?;

        debug!(%id, %company_id, "Service inserted");
        Ok(CatalogEntry {
            id,
            company_id: company_id.to_string(),
            item_type: ItemType::Service,
            name: name.to_string(),
            price_cents: price.cents(),
            default_commission_bps: default_commission.bps(),
        })
    }

    /// Inserts a product with its opening stock.
    pub async fn insert_product(
        &self,
        company_id: &str,
        name: &str,
        price: Money,
        stock_current: i64,
        stock_minimum: i64,
    ) -> DbResult<CatalogEntry> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            r#"
            INSERT INTO products (id, company_id, name, price_cents, stock_current, stock_minimum)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&id)
        .bind(company_id)
        .bind(name)
        .bind(price.cents())
        .bind(stock_current)
        .bind(stock_minimum)
        .execute(&self.pool)
        .await?;

        debug!(%id, %company_id, stock_current, "Product inserted");
        Ok(CatalogEntry {
            id,
            company_id: company_id.to_string(),
            item_type: ItemType::Product,
            name: name.to_string(),
            price_cents: price.cents(),
            default_commission_bps: 0,
        })
    }

    pub async fn insert_package(
        &self,
        company_id: &str,
        name: &str,
        price: Money,
    ) -> DbResult<CatalogEntry> {
        let id = Uuid::new_v4().to_string();

        sqlx::query(
            "INSERT INTO packages (id, company_id, name, price_cents) VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&id)
        .bind(company_id)
        .bind(name)
        .bind(price.cents())
        .execute(&self.pool)
        .await?;

        debug!(%id, %company_id, "Package inserted");
        Ok(CatalogEntry {
            id,
            company_id: company_id.to_string(),
            item_type: ItemType::Package,
            name: name.to_string(),
            price_cents: price.cents(),
            default_commission_bps: 0,
        })
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

    #[tokio::test]
    async fn test_entry_lookup_per_type() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let svc = catalog
            .insert_service("co-1", "Haircut", Money::from_cents(5000), Percentage::from_bps(2000))
            .await
            .unwrap();
        let prd = catalog
            .insert_product("co-1", "Shampoo", Money::from_cents(2000), 10, 2)
            .await
            .unwrap();

        let found = catalog.get_entry("co-1", ItemType::Service, &svc.id).await.unwrap();
        assert_eq!(found.name, "Haircut");
        assert_eq!(found.default_commission_bps, 2000);
        assert_eq!(found.item_type, ItemType::Service);

        let found = catalog.get_entry("co-1", ItemType::Product, &prd.id).await.unwrap();
        assert_eq!(found.price_cents, 2000);
        assert_eq!(found.default_commission_bps, 0);

        // Right id, wrong table
        let err = catalog.get_entry("co-1", ItemType::Package, &prd.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_lookups_are_company_scoped() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let client = catalog.insert_client("co-1", "Ana").await.unwrap();
        assert_eq!(catalog.get_client("co-1", &client.id).await.unwrap().name, "Ana");

        let err = catalog.get_client("co-2", &client.id).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }
}

//! # Shop Repository
//!
//! Database operations for shops (tenants). Everything else in the system is
//! scoped by a shop ID, so this is the entry point of the whole data model.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::Shop;

/// Fields that can be changed on an existing shop.
#[derive(Debug, Clone, Default)]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub owner_name: Option<String>,
}

/// Repository for shop database operations.
#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    /// Creates a new ShopRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Creates a shop.
    pub async fn create(&self, name: &str, owner_name: Option<&str>) -> DbResult<Shop> {
        let now = Utc::now();
        let shop = Shop {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            owner_name: owner_name.map(|o| o.trim().to_string()),
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %shop.id, name = %shop.name, "Creating shop");

        sqlx::query(
            r#"
            INSERT INTO shops (id, name, owner_name, deleted, created_at, updated_at)
            VALUES (?1, ?2, ?3, 0, ?4, ?5)
            "#,
        )
        .bind(&shop.id)
        .bind(&shop.name)
        .bind(&shop.owner_name)
        .bind(shop.created_at)
        .bind(shop.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(shop)
    }

    /// Gets a live shop by ID. Soft-deleted shops are invisible.
    pub async fn get(&self, id: &str) -> DbResult<Option<Shop>> {
        let shop = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, name, owner_name, deleted, created_at, updated_at
            FROM shops
            WHERE id = ?1 AND deleted = 0
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shop)
    }

    /// Gets a live shop or fails with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Shop> {
        self.get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Shop", id))
    }

    /// Lists all live shops, newest first.
    pub async fn list(&self) -> DbResult<Vec<Shop>> {
        let shops = sqlx::query_as::<_, Shop>(
            r#"
            SELECT id, name, owner_name, deleted, created_at, updated_at
            FROM shops
            WHERE deleted = 0
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(shops)
    }

    /// Applies a partial update to a live shop.
    pub async fn update(&self, id: &str, update: ShopUpdate) -> DbResult<Shop> {
        let mut shop = self.require(id).await?;

        if let Some(name) = update.name {
            shop.name = name.trim().to_string();
        }
        if let Some(owner_name) = update.owner_name {
            shop.owner_name = Some(owner_name.trim().to_string());
        }
        shop.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE shops SET name = ?2, owner_name = ?3, updated_at = ?4
            WHERE id = ?1 AND deleted = 0
            "#,
        )
        .bind(&shop.id)
        .bind(&shop.name)
        .bind(&shop.owner_name)
        .bind(shop.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", id));
        }

        Ok(shop)
    }

    /// Soft-deletes a shop. Child rows are kept for history; they simply
    /// become unreachable through the API.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE shops SET deleted = 1, updated_at = ?2
            WHERE id = ?1 AND deleted = 0
            "#,
        )
        .bind(id)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shop", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = test_db().await;
        let shop = db
            .shops()
            .create("Karachi General Store", Some("Ahmed"))
            .await
            .unwrap();

        let fetched = db.shops().get(&shop.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Karachi General Store");
        assert_eq!(fetched.owner_name.as_deref(), Some("Ahmed"));
    }

    #[tokio::test]
    async fn test_soft_deleted_shop_disappears() {
        let db = test_db().await;
        let shop = db.shops().create("Corner Shop", None).await.unwrap();

        db.shops().soft_delete(&shop.id).await.unwrap();

        assert!(db.shops().get(&shop.id).await.unwrap().is_none());
        assert!(db.shops().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_missing_shop_is_not_found() {
        let db = test_db().await;
        let err = db
            .shops()
            .update("does-not-exist", Default::default())
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::DbError::NotFound { .. }));
    }
}

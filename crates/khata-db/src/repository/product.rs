//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - Shop-scoped CRUD with soft delete
//! - SKU uniqueness within a shop
//! - Creating a product seeds its zero-stock inventory row in the same
//!   transaction, so the inventory table always has one row per live product

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::Product;

/// Input for creating a product.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub sku: String,
    pub category: Option<String>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
}

/// Fields that can be changed on an existing product.
/// `shop_id` is deliberately absent: products never move between shops.
#[derive(Debug, Clone, Default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price_cents: Option<i64>,
    pub cost_cents: Option<i64>,
}

const PRODUCT_COLUMNS: &str = r#"
    id, shop_id, name, sku, category, price_cents, cost_cents,
    deleted, created_at, updated_at
"#;

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Creates a product and its zero-stock inventory row atomically.
    ///
    /// ## Errors
    /// - `UniqueViolation` when the SKU is already used within the shop
    pub async fn create(&self, shop_id: &str, new: NewProduct) -> DbResult<Product> {
        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            name: new.name.trim().to_string(),
            sku: new.sku.trim().to_string(),
            category: new.category,
            price_cents: new.price_cents,
            cost_cents: new.cost_cents,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, sku = %product.sku, "Creating product");

        let mut tx = self.pool.begin().await?;

        let insert = sqlx::query(
            r#"
            INSERT INTO products (
                id, shop_id, name, sku, category,
                price_cents, cost_cents, deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.shop_id)
        .bind(&product.name)
        .bind(&product.sku)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await;

        if let Err(e) = insert {
            let err: DbError = e.into();
            // Give the duplicate-SKU case a useful value
            if matches!(err, DbError::UniqueViolation { .. }) {
                return Err(DbError::duplicate("sku", &product.sku));
            }
            return Err(err);
        }

        sqlx::query(
            r#"
            INSERT INTO inventory (id, shop_id, product_id, stock, reserved, updated_at)
            VALUES (?1, ?2, ?3, 0, 0, ?4)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&product.shop_id)
        .bind(&product.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(product)
    }

    /// Gets a live product by ID, shop-scoped.
    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists live products for a shop, sorted by name.
    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE shop_id = ?1 AND deleted = 0
            ORDER BY name
            "#
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a partial update to a live product.
    pub async fn update(&self, shop_id: &str, id: &str, update: ProductUpdate) -> DbResult<Product> {
        let mut product = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if let Some(name) = update.name {
            product.name = name.trim().to_string();
        }
        if let Some(category) = update.category {
            product.category = Some(category);
        }
        if let Some(price_cents) = update.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(cost_cents) = update.cost_cents {
            product.cost_cents = Some(cost_cents);
        }
        product.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?3, category = ?4, price_cents = ?5, cost_cents = ?6, updated_at = ?7
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(&product.id)
        .bind(shop_id)
        .bind(&product.name)
        .bind(&product.category)
        .bind(product.price_cents)
        .bind(product.cost_cents)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(product)
    }

    /// Soft-deletes a product. Sale history keeps its snapshots; the product
    /// just stops being sellable and listable.
    pub async fn soft_delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE products SET deleted = 1, updated_at = ?3
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Inventory Repository
//!
//! Stock levels and manual adjustments.
//!
//! Sale creation/update/deletion mutate stock through their own transaction
//! in [`crate::repository::sale`]; this repository covers everything else:
//! listing levels, lookups, and manual restocks/corrections.

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use khata_core::{CoreError, InventoryLevel};

/// A stock level joined with the product it belongs to, for listings.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockRow {
    pub product_id: String,
    pub product_name: String,
    pub sku: String,
    pub stock: i64,
    pub reserved: i64,
}

/// Repository for inventory operations.
#[derive(Debug, Clone)]
pub struct InventoryRepository {
    pool: SqlitePool,
}

impl InventoryRepository {
    /// Creates a new InventoryRepository.
    pub fn new(pool: SqlitePool) -> Self {
        InventoryRepository { pool }
    }

    /// Gets the stock level for one product, shop-scoped.
    pub async fn get(&self, shop_id: &str, product_id: &str) -> DbResult<Option<InventoryLevel>> {
        let level = sqlx::query_as::<_, InventoryLevel>(
            r#"
            SELECT id, shop_id, product_id, stock, reserved, updated_at
            FROM inventory
            WHERE shop_id = ?1 AND product_id = ?2
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(level)
    }

    /// Lists stock levels for all live products of a shop, sorted by product
    /// name. Soft-deleted products are excluded even though their inventory
    /// rows remain.
    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<StockRow>> {
        let rows = sqlx::query_as::<_, StockRow>(
            r#"
            SELECT
                i.product_id,
                p.name AS product_name,
                p.sku,
                i.stock,
                i.reserved
            FROM inventory i
            INNER JOIN products p ON p.id = i.product_id
            WHERE i.shop_id = ?1 AND p.deleted = 0
            ORDER BY p.name
            "#,
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Applies a manual stock adjustment (restock or correction).
    ///
    /// `delta` may be negative; the update is guarded so stock can never go
    /// below zero. A rejected adjustment changes nothing.
    pub async fn adjust(
        &self,
        shop_id: &str,
        product_id: &str,
        delta: i64,
    ) -> DbResult<InventoryLevel> {
        debug!(shop_id = %shop_id, product_id = %product_id, delta = %delta, "Adjusting stock");

        let result = sqlx::query(
            r#"
            UPDATE inventory
            SET stock = stock + ?3, updated_at = ?4
            WHERE shop_id = ?1 AND product_id = ?2 AND stock + ?3 >= 0
            "#,
        )
        .bind(shop_id)
        .bind(product_id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            // Distinguish "no such product" from "would go negative"
            let current = self.get(shop_id, product_id).await?;
            return match current {
                None => Err(DbError::not_found("Inventory", product_id)),
                Some(level) => Err(DbError::Domain(CoreError::InsufficientStock {
                    product: product_id.to_string(),
                    available: level.stock,
                    requested: -delta,
                })),
            };
        }

        self.get(shop_id, product_id)
            .await?
            .ok_or_else(|| DbError::not_found("Inventory", product_id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Budget Repository
//!
//! Per-category monthly spending budgets. One live budget per
//! (shop, category, period); soft-deleting a budget frees the slot for a new
//! one thanks to the partial unique index.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::Budget;

/// Input for setting a budget.
#[derive(Debug, Clone)]
pub struct NewBudget {
    pub category: String,
    pub amount_cents: i64,
    /// Budget month, "YYYY-MM".
    pub period: String,
}

const BUDGET_COLUMNS: &str = r#"
    id, shop_id, category, amount_cents, period,
    deleted, created_at, updated_at
"#;

/// Repository for budget database operations.
#[derive(Debug, Clone)]
pub struct BudgetRepository {
    pool: SqlitePool,
}

impl BudgetRepository {
    /// Creates a new BudgetRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BudgetRepository { pool }
    }

    /// Sets a budget for a category and month.
    ///
    /// ## Errors
    /// - `UniqueViolation` when a live budget already exists for the same
    ///   (category, period)
    pub async fn create(&self, shop_id: &str, new: NewBudget) -> DbResult<Budget> {
        let now = Utc::now();
        let budget = Budget {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            category: new.category.trim().to_lowercase(),
            amount_cents: new.amount_cents,
            period: new.period,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %budget.id, category = %budget.category, period = %budget.period, "Setting budget");

        let insert = sqlx::query(
            r#"
            INSERT INTO budgets (
                id, shop_id, category, amount_cents, period,
                deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)
            "#,
        )
        .bind(&budget.id)
        .bind(&budget.shop_id)
        .bind(&budget.category)
        .bind(budget.amount_cents)
        .bind(&budget.period)
        .bind(budget.created_at)
        .bind(budget.updated_at)
        .execute(&self.pool)
        .await;

        if let Err(e) = insert {
            let err: DbError = e.into();
            if matches!(err, DbError::UniqueViolation { .. }) {
                return Err(DbError::duplicate(
                    "budget",
                    &format!("{}/{}", budget.category, budget.period),
                ));
            }
            return Err(err);
        }

        Ok(budget)
    }

    /// Gets a live budget by ID, shop-scoped.
    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Budget>> {
        let budget = sqlx::query_as::<_, Budget>(&format!(
            r#"
            SELECT {BUDGET_COLUMNS}
            FROM budgets
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(budget)
    }

    /// Lists live budgets for a shop. Passing a `period` restricts to that
    /// month.
    pub async fn list(&self, shop_id: &str, period: Option<&str>) -> DbResult<Vec<Budget>> {
        let budgets = match period {
            Some(period) => {
                sqlx::query_as::<_, Budget>(&format!(
                    r#"
                    SELECT {BUDGET_COLUMNS}
                    FROM budgets
                    WHERE shop_id = ?1 AND deleted = 0 AND period = ?2
                    ORDER BY category
                    "#
                ))
                .bind(shop_id)
                .bind(period)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Budget>(&format!(
                    r#"
                    SELECT {BUDGET_COLUMNS}
                    FROM budgets
                    WHERE shop_id = ?1 AND deleted = 0
                    ORDER BY period DESC, category
                    "#
                ))
                .bind(shop_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(budgets)
    }

    /// Changes the amount of a live budget.
    pub async fn update_amount(
        &self,
        shop_id: &str,
        id: &str,
        amount_cents: i64,
    ) -> DbResult<Budget> {
        let result = sqlx::query(
            r#"
            UPDATE budgets SET amount_cents = ?3, updated_at = ?4
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(amount_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Budget", id));
        }

        self.get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Budget", id))
    }

    /// Soft-deletes a budget, allowing a replacement for the same
    /// (category, period).
    pub async fn soft_delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE budgets SET deleted = 1, updated_at = ?3
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Budget", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = db.shops().create("Test Shop", None).await.unwrap();
        (db, shop.id)
    }

    fn utilities() -> NewBudget {
        NewBudget {
            category: "Utilities".to_string(),
            amount_cents: 200_000,
            period: "2026-08".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_live_budget_rejected() {
        let (db, shop_id) = setup().await;
        db.budgets().create(&shop_id, utilities()).await.unwrap();

        let err = db.budgets().create(&shop_id, utilities()).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_deleted_budget_slot_reusable() {
        let (db, shop_id) = setup().await;
        let budget = db.budgets().create(&shop_id, utilities()).await.unwrap();

        db.budgets().soft_delete(&shop_id, &budget.id).await.unwrap();

        // Same category/period is acceptable again
        db.budgets().create(&shop_id, utilities()).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_filters_by_period() {
        let (db, shop_id) = setup().await;
        db.budgets().create(&shop_id, utilities()).await.unwrap();
        db.budgets()
            .create(
                &shop_id,
                NewBudget {
                    category: "rent".to_string(),
                    amount_cents: 500_000,
                    period: "2026-09".to_string(),
                },
            )
            .await
            .unwrap();

        let august = db.budgets().list(&shop_id, Some("2026-08")).await.unwrap();
        assert_eq!(august.len(), 1);
        assert_eq!(august[0].category, "utilities");
    }
}

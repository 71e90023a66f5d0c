//! # Expense Repository
//!
//! Category-tagged expense ledger with soft delete. Expenses are filed under
//! the day they were incurred, which may differ from the day they were
//! recorded; monthly reporting groups on `incurred_on`.

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::Expense;

/// Input for recording an expense.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,
    pub incurred_on: NaiveDate,
}

/// Fields that can be changed on an existing expense.
#[derive(Debug, Clone, Default)]
pub struct ExpenseUpdate {
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount_cents: Option<i64>,
    pub incurred_on: Option<NaiveDate>,
}

const EXPENSE_COLUMNS: &str = r#"
    id, shop_id, category, description, amount_cents, incurred_on,
    deleted, created_at, updated_at
"#;

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Records an expense.
    pub async fn create(&self, shop_id: &str, new: NewExpense) -> DbResult<Expense> {
        let now = Utc::now();
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            category: new.category.trim().to_lowercase(),
            description: new.description,
            amount_cents: new.amount_cents,
            incurred_on: new.incurred_on,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %expense.id, category = %expense.category, "Recording expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (
                id, shop_id, category, description, amount_cents, incurred_on,
                deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.shop_id)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.incurred_on)
        .bind(expense.created_at)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Gets a live expense by ID, shop-scoped.
    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(&format!(
            r#"
            SELECT {EXPENSE_COLUMNS}
            FROM expenses
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(expense)
    }

    /// Lists live expenses for a shop, most recently incurred first.
    /// Passing a `period` ("YYYY-MM") restricts to that month.
    pub async fn list(&self, shop_id: &str, period: Option<&str>) -> DbResult<Vec<Expense>> {
        let expenses = match period {
            Some(period) => {
                sqlx::query_as::<_, Expense>(&format!(
                    r#"
                    SELECT {EXPENSE_COLUMNS}
                    FROM expenses
                    WHERE shop_id = ?1 AND deleted = 0
                      AND substr(incurred_on, 1, 7) = ?2
                    ORDER BY incurred_on DESC, created_at DESC
                    "#
                ))
                .bind(shop_id)
                .bind(period)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Expense>(&format!(
                    r#"
                    SELECT {EXPENSE_COLUMNS}
                    FROM expenses
                    WHERE shop_id = ?1 AND deleted = 0
                    ORDER BY incurred_on DESC, created_at DESC
                    "#
                ))
                .bind(shop_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(expenses)
    }

    /// Applies a partial update to a live expense.
    pub async fn update(&self, shop_id: &str, id: &str, update: ExpenseUpdate) -> DbResult<Expense> {
        let mut expense = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Expense", id))?;

        if let Some(category) = update.category {
            expense.category = category.trim().to_lowercase();
        }
        if let Some(description) = update.description {
            expense.description = Some(description);
        }
        if let Some(amount_cents) = update.amount_cents {
            expense.amount_cents = amount_cents;
        }
        if let Some(incurred_on) = update.incurred_on {
            expense.incurred_on = incurred_on;
        }
        expense.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE expenses SET
                category = ?3, description = ?4, amount_cents = ?5,
                incurred_on = ?6, updated_at = ?7
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(&expense.id)
        .bind(shop_id)
        .bind(&expense.category)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.incurred_on)
        .bind(expense.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        Ok(expense)
    }

    /// Soft-deletes an expense.
    pub async fn soft_delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE expenses SET deleted = 1, updated_at = ?3
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
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

    fn rent(day: &str) -> NewExpense {
        NewExpense {
            category: "Rent".to_string(),
            description: Some("Shop rent".to_string()),
            amount_cents: 500_000,
            incurred_on: day.parse().unwrap(),
        }
    }

    #[tokio::test]
    async fn test_category_normalized_to_lowercase() {
        let (db, shop_id) = setup().await;
        let expense = db.expenses().create(&shop_id, rent("2026-08-01")).await.unwrap();
        assert_eq!(expense.category, "rent");
    }

    #[tokio::test]
    async fn test_list_filters_by_period() {
        let (db, shop_id) = setup().await;
        db.expenses().create(&shop_id, rent("2026-07-01")).await.unwrap();
        db.expenses().create(&shop_id, rent("2026-08-01")).await.unwrap();
        db.expenses().create(&shop_id, rent("2026-08-15")).await.unwrap();

        let august = db.expenses().list(&shop_id, Some("2026-08")).await.unwrap();
        assert_eq!(august.len(), 2);

        let all = db.expenses().list(&shop_id, None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_soft_deleted_expense_hidden() {
        let (db, shop_id) = setup().await;
        let expense = db.expenses().create(&shop_id, rent("2026-08-01")).await.unwrap();

        db.expenses().soft_delete(&shop_id, &expense.id).await.unwrap();

        assert!(db.expenses().get(&shop_id, &expense.id).await.unwrap().is_none());
        assert!(db.expenses().list(&shop_id, None).await.unwrap().is_empty());
    }
}

//! # Report Repository
//!
//! Read-only monthly aggregates: sales totals, per-category spend against
//! budgets, and best-selling products. Everything is computed in SQL; this
//! repository never mutates state.

use serde::Serialize;
use sqlx::SqlitePool;

use crate::error::DbResult;

/// Sales totals for one month.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    /// Sum of sale totals (includes unpaid portions).
    pub revenue_cents: i64,
    /// Sum of amounts actually received.
    pub paid_cents: i64,
    /// Revenue still sitting on customer khatas.
    pub outstanding_cents: i64,
    pub sales_count: i64,
}

/// Spend in one expense category, with the matching budget if one is set.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub category: String,
    pub spent_cents: i64,
    pub budget_cents: Option<i64>,
}

/// A best-selling product line for the month.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct TopProduct {
    pub product_id: String,
    pub name: String,
    pub units_sold: i64,
    pub revenue_cents: i64,
}

/// The full monthly report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyReport {
    /// Month covered, "YYYY-MM".
    pub period: String,
    pub sales: SalesSummary,
    pub expenses: Vec<CategorySpend>,
    pub total_expenses_cents: i64,
    pub top_products: Vec<TopProduct>,
}

/// How many best-sellers the report includes.
const TOP_PRODUCT_LIMIT: i64 = 5;

/// Repository for monthly report queries.
#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    /// Creates a new ReportRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Builds the monthly report for a shop and period ("YYYY-MM").
    ///
    /// Timestamps are stored as RFC 3339 text, so month filtering is a
    /// string-prefix comparison on the first seven characters.
    pub async fn monthly(&self, shop_id: &str, period: &str) -> DbResult<MonthlyReport> {
        let sales = self.sales_summary(shop_id, period).await?;
        let expenses = self.category_spend(shop_id, period).await?;
        let total_expenses_cents = expenses.iter().map(|c| c.spent_cents).sum();
        let top_products = self.top_products(shop_id, period).await?;

        Ok(MonthlyReport {
            period: period.to_string(),
            sales,
            expenses,
            total_expenses_cents,
            top_products,
        })
    }

    async fn sales_summary(&self, shop_id: &str, period: &str) -> DbResult<SalesSummary> {
        let summary = sqlx::query_as::<_, SalesSummary>(
            r#"
            SELECT
                COALESCE(SUM(total_cents), 0) AS revenue_cents,
                COALESCE(SUM(MIN(paid_cents, total_cents)), 0) AS paid_cents,
                COALESCE(SUM(MAX(total_cents - paid_cents, 0)), 0) AS outstanding_cents,
                COUNT(*) AS sales_count
            FROM sales
            WHERE shop_id = ?1 AND substr(created_at, 1, 7) = ?2
            "#,
        )
        .bind(shop_id)
        .bind(period)
        .fetch_one(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Per-category spend for the month, joined against that month's budgets.
    /// Categories with a budget but no spend still appear, at zero.
    async fn category_spend(&self, shop_id: &str, period: &str) -> DbResult<Vec<CategorySpend>> {
        let rows = sqlx::query_as::<_, CategorySpend>(
            r#"
            SELECT
                COALESCE(e.category, b.category) AS category,
                COALESCE(e.spent_cents, 0) AS spent_cents,
                b.amount_cents AS budget_cents
            FROM (
                SELECT category, SUM(amount_cents) AS spent_cents
                FROM expenses
                WHERE shop_id = ?1 AND deleted = 0
                  AND substr(incurred_on, 1, 7) = ?2
                GROUP BY category
            ) e
            LEFT JOIN budgets b
              ON b.shop_id = ?1 AND b.period = ?2 AND b.deleted = 0
             AND b.category = e.category
            UNION
            SELECT b.category, 0, b.amount_cents
            FROM budgets b
            WHERE b.shop_id = ?1 AND b.period = ?2 AND b.deleted = 0
              AND b.category NOT IN (
                SELECT category FROM expenses
                WHERE shop_id = ?1 AND deleted = 0
                  AND substr(incurred_on, 1, 7) = ?2
              )
            ORDER BY category
            "#,
        )
        .bind(shop_id)
        .bind(period)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn top_products(&self, shop_id: &str, period: &str) -> DbResult<Vec<TopProduct>> {
        let rows = sqlx::query_as::<_, TopProduct>(
            r#"
            SELECT
                si.product_id,
                si.name_snapshot AS name,
                SUM(si.quantity) AS units_sold,
                SUM(si.line_total_cents) AS revenue_cents
            FROM sale_items si
            INNER JOIN sales s ON s.id = si.sale_id
            WHERE s.shop_id = ?1 AND substr(s.created_at, 1, 7) = ?2
            GROUP BY si.product_id
            ORDER BY units_sold DESC, revenue_cents DESC
            LIMIT ?3
            "#,
        )
        .bind(shop_id)
        .bind(period)
        .bind(TOP_PRODUCT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Customer Repository
//!
//! Per-shop customer profiles and the khata (outstanding balance) ledger.
//!
//! `balance_cents` is mutated in exactly three places: the sale transaction
//! (create/update/delete), sale payments, and [`CustomerRepository::settle_balance`].
//! Nothing else touches it, which is what keeps invariant 5 checkable.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::{CoreError, Customer};

/// Fields that can be changed on an existing customer.
#[derive(Debug, Clone, Default)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
}

const CUSTOMER_COLUMNS: &str = r#"
    id, shop_id, name, phone, balance_cents, is_walk_in,
    deleted, created_at, updated_at
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Creates a customer with a zero balance.
    pub async fn create(
        &self,
        shop_id: &str,
        name: &str,
        phone: Option<&str>,
    ) -> DbResult<Customer> {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            shop_id: shop_id.to_string(),
            name: name.trim().to_string(),
            phone: phone.map(|p| p.trim().to_string()),
            balance_cents: 0,
            is_walk_in: false,
            deleted: false,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %customer.id, name = %customer.name, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, shop_id, name, phone, balance_cents, is_walk_in,
                deleted, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, 0, 0, 0, ?5, ?6)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.shop_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a live customer by ID, shop-scoped.
    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#
        ))
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Lists live customers for a shop, sorted by name.
    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(&format!(
            r#"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE shop_id = ?1 AND deleted = 0
            ORDER BY name
            "#
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(customers)
    }

    /// Applies a partial update to a live customer.
    pub async fn update(
        &self,
        shop_id: &str,
        id: &str,
        update: CustomerUpdate,
    ) -> DbResult<Customer> {
        let mut customer = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        if let Some(name) = update.name {
            customer.name = name.trim().to_string();
        }
        if let Some(phone) = update.phone {
            customer.phone = Some(phone.trim().to_string());
        }
        customer.updated_at = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE customers SET name = ?3, phone = ?4, updated_at = ?5
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(&customer.id)
        .bind(shop_id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", id));
        }

        Ok(customer)
    }

    /// Soft-deletes a customer. The walk-in placeholder is protected: sales
    /// without a buyer must always have somewhere to resolve to.
    pub async fn soft_delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let customer = self
            .get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        if customer.is_walk_in {
            return Err(DbError::Domain(CoreError::WalkInProtected(id.to_string())));
        }

        sqlx::query(
            r#"
            UPDATE customers SET deleted = 1, updated_at = ?3
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Records a khata repayment: reduces the customer's outstanding balance.
    ///
    /// ## Errors
    /// - `InvalidPaymentAmount` when the amount is not positive or exceeds
    ///   the current balance
    pub async fn settle_balance(
        &self,
        shop_id: &str,
        id: &str,
        amount_cents: i64,
    ) -> DbResult<Customer> {
        if amount_cents <= 0 {
            return Err(DbError::Domain(CoreError::InvalidPaymentAmount {
                reason: "settlement must be positive".to_string(),
            }));
        }

        debug!(customer_id = %id, amount = %amount_cents, "Settling balance");

        let result = sqlx::query(
            r#"
            UPDATE customers
            SET balance_cents = balance_cents - ?3, updated_at = ?4
            WHERE id = ?1 AND shop_id = ?2 AND deleted = 0 AND balance_cents >= ?3
            "#,
        )
        .bind(id)
        .bind(shop_id)
        .bind(amount_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            let customer = self
                .get(shop_id, id)
                .await?
                .ok_or_else(|| DbError::not_found("Customer", id))?;
            return Err(DbError::Domain(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "settlement {} exceeds outstanding balance {}",
                    amount_cents, customer.balance_cents
                ),
            }));
        }

        self.get(shop_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};

    async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = db.shops().create("Test Shop", None).await.unwrap();
        (db, shop.id)
    }

    #[tokio::test]
    async fn test_create_starts_with_zero_balance() {
        let (db, shop_id) = setup().await;
        let customer = db
            .customers()
            .create(&shop_id, "Bilal", Some("0300-1234567"))
            .await
            .unwrap();
        assert_eq!(customer.balance_cents, 0);
        assert!(!customer.is_walk_in);
    }

    #[tokio::test]
    async fn test_settle_rejects_overpayment() {
        let (db, shop_id) = setup().await;
        let customer = db.customers().create(&shop_id, "Bilal", None).await.unwrap();

        let err = db
            .customers()
            .settle_balance(&shop_id, &customer.id, 500)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }

    #[tokio::test]
    async fn test_soft_deleted_customer_hidden() {
        let (db, shop_id) = setup().await;
        let customer = db.customers().create(&shop_id, "Bilal", None).await.unwrap();

        db.customers().soft_delete(&shop_id, &customer.id).await.unwrap();

        assert!(db.customers().get(&shop_id, &customer.id).await.unwrap().is_none());
        assert!(db.customers().list(&shop_id).await.unwrap().is_empty());
    }
}

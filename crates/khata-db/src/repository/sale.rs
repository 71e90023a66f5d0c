//! # Sale Repository
//!
//! The transactional core of Digital Khata: creating, updating, and deleting
//! a sale must atomically adjust product stock, allocate invoice numbers,
//! resolve walk-in customers, and keep customer balances consistent.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. CREATE (one transaction)                                            │
//! │     ├── resolve customer (or find/create the walk-in placeholder)       │
//! │     ├── allocate invoice number from the shop counter                   │
//! │     ├── guarded stock decrement per line item                           │
//! │     ├── insert sale + items                                             │
//! │     └── paid < total → status pending, shortfall on customer khata      │
//! │                                                                         │
//! │  2. UPDATE (one transaction)                                            │
//! │     ├── diff old vs. new quantities (khata_core::stock_deltas)          │
//! │     ├── apply only the net stock change per product                     │
//! │     └── adjust customer balance by (new − old) outstanding              │
//! │                                                                         │
//! │  3. PAYMENT                                                             │
//! │     └── paid += amount; fully paid → completed; balance shrinks         │
//! │                                                                         │
//! │  4. DELETE (one transaction)                                            │
//! │     ├── restore stock for every line item                               │
//! │     └── remove outstanding amount from the customer balance             │
//! │                                                                         │
//! │  Any failure aborts the transaction: stock, balances, and the invoice   │
//! │  counter all roll back together.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invoice Numbers
//! Allocated with an atomic upsert-increment on `shop_counters`, inside the
//! sale transaction. Two concurrent creations can never observe the same
//! counter value, so invoice numbers are unique and strictly increasing per
//! shop. An aborted transaction rolls the counter back with everything else,
//! so failed attempts leave no gaps either.

use chrono::Utc;
use serde::Serialize;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use khata_core::validation::validate_quantity;
use khata_core::{
    format_invoice_number, stock_deltas, CoreError, Money, PaymentMethod, Sale, SaleItem,
    SaleStatus, ValidationError, WALK_IN_CUSTOMER_NAME,
};

// =============================================================================
// Input / Output Types
// =============================================================================

/// One requested line item. Unit price comes from the product record at sale
/// time (snapshot pattern), never from the client.
#[derive(Debug, Clone)]
pub struct NewSaleItem {
    pub product_id: String,
    pub quantity: i64,
}

/// Input for creating a sale.
#[derive(Debug, Clone)]
pub struct NewSale {
    /// Explicit buyer. `None` resolves to the shop's walk-in placeholder.
    pub customer_id: Option<String>,
    pub items: Vec<NewSaleItem>,
    pub paid_cents: i64,
    pub payment_method: PaymentMethod,
}

/// Input for updating a sale. The full new line-item list replaces the old
/// one; the repository applies only the net stock difference.
#[derive(Debug, Clone)]
pub struct UpdateSale {
    pub items: Vec<NewSaleItem>,
    pub paid_cents: Option<i64>,
    pub payment_method: Option<PaymentMethod>,
}

/// A sale together with its line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleWithItems {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

const SALE_COLUMNS: &str = r#"
    id, shop_id, invoice_number, customer_id, total_cents, paid_cents,
    payment_method, status, created_at, updated_at
"#;

const SALE_ITEM_COLUMNS: &str = r#"
    id, sale_id, product_id, name_snapshot, unit_price_cents,
    quantity, line_total_cents, created_at
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Create
    // =========================================================================

    /// Creates a sale inside a single transaction.
    ///
    /// ## Failure Modes
    /// - Empty line items → validation error
    /// - Unknown shop / customer / product → NotFound-style domain error
    /// - Insufficient stock for any line → `InsufficientStock`, nothing
    ///   applied
    pub async fn create_sale(&self, shop_id: &str, new: NewSale) -> DbResult<SaleWithItems> {
        if new.items.is_empty() {
            return Err(DbError::Domain(ValidationError::EmptySale.into()));
        }
        if new.paid_cents < 0 {
            return Err(DbError::Domain(CoreError::InvalidPaymentAmount {
                reason: "paid amount cannot be negative".to_string(),
            }));
        }

        let mut tx = self.pool.begin().await?;

        require_shop(&mut tx, shop_id).await?;
        let customer_id = resolve_customer(&mut tx, shop_id, new.customer_id.as_deref()).await?;

        let seq = allocate_invoice_seq(&mut tx, shop_id).await?;
        let invoice_number = format_invoice_number(seq);

        let sale_id = Uuid::new_v4().to_string();
        let now = Utc::now();

        // Snapshot products and take stock, line by line. Any failure here
        // aborts the whole transaction.
        let mut items = Vec::with_capacity(new.items.len());
        let mut total = Money::zero();

        for line in &new.items {
            validate_quantity(line.quantity).map_err(|e| DbError::Domain(e.into()))?;

            let (name, unit_price_cents) =
                snapshot_product(&mut tx, shop_id, &line.product_id).await?;

            let line_total = Money::from_cents(unit_price_cents)
                .checked_mul_qty(line.quantity)
                .ok_or_else(|| {
                    DbError::Domain(CoreError::InvalidPaymentAmount {
                        reason: "line total overflows".to_string(),
                    })
                })?;
            total += line_total;

            take_stock(&mut tx, shop_id, &line.product_id, line.quantity).await?;

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: name,
                unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line_total.cents(),
                created_at: now,
            });
        }

        let paid = Money::from_cents(new.paid_cents);
        let status = SaleStatus::from_amounts(total, paid);
        let outstanding = total.saturating_sub_floor_zero(paid);

        let sale = Sale {
            id: sale_id.clone(),
            shop_id: shop_id.to_string(),
            invoice_number: invoice_number.clone(),
            customer_id: customer_id.clone(),
            total_cents: total.cents(),
            paid_cents: new.paid_cents,
            payment_method: new.payment_method,
            status,
            created_at: now,
            updated_at: now,
        };

        insert_sale_row(&mut tx, &sale).await?;
        for item in &items {
            insert_item_row(&mut tx, item).await?;
        }

        if !outstanding.is_zero() {
            adjust_customer_balance(&mut tx, shop_id, &customer_id, outstanding.cents()).await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale_id,
            invoice = %invoice_number,
            total = %total,
            items = items.len(),
            "Sale created"
        );

        Ok(SaleWithItems { sale, items })
    }

    // =========================================================================
    // Read
    // =========================================================================

    /// Gets a sale with its items, shop-scoped.
    pub async fn get(&self, shop_id: &str, sale_id: &str) -> DbResult<Option<SaleWithItems>> {
        let sale = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE id = ?1 AND shop_id = ?2
            "#
        ))
        .bind(sale_id)
        .bind(shop_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(sale) = sale else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, SaleItem>(&format!(
            r#"
            SELECT {SALE_ITEM_COLUMNS}
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY created_at, id
            "#
        ))
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(SaleWithItems { sale, items }))
    }

    /// Lists a shop's sales with items, newest first.
    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<SaleWithItems>> {
        let sales = sqlx::query_as::<_, Sale>(&format!(
            r#"
            SELECT {SALE_COLUMNS}
            FROM sales
            WHERE shop_id = ?1
            ORDER BY created_at DESC, invoice_number DESC
            "#
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        // One items query for the whole page, grouped in memory
        let all_items = sqlx::query_as::<_, SaleItem>(&format!(
            r#"
            SELECT {SALE_ITEM_COLUMNS}
            FROM sale_items
            WHERE sale_id IN (SELECT id FROM sales WHERE shop_id = ?1)
            ORDER BY created_at, id
            "#
        ))
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        let mut result: Vec<SaleWithItems> = sales
            .into_iter()
            .map(|sale| SaleWithItems { sale, items: Vec::new() })
            .collect();
        for item in all_items {
            if let Some(entry) = result.iter_mut().find(|s| s.sale.id == item.sale_id) {
                entry.items.push(item);
            }
        }

        Ok(result)
    }

    // =========================================================================
    // Update
    // =========================================================================

    /// Replaces a sale's line items and recomputes totals, applying only the
    /// net stock change per product. Commits or aborts atomically.
    ///
    /// Prices for products already on the sale keep their original snapshot;
    /// newly added products are snapshotted at their current price.
    pub async fn update_sale(
        &self,
        shop_id: &str,
        sale_id: &str,
        update: UpdateSale,
    ) -> DbResult<SaleWithItems> {
        if update.items.is_empty() {
            return Err(DbError::Domain(ValidationError::EmptySale.into()));
        }
        for line in &update.items {
            validate_quantity(line.quantity).map_err(|e| DbError::Domain(e.into()))?;
        }

        let mut tx = self.pool.begin().await?;

        let old_sale = fetch_sale_row(&mut tx, shop_id, sale_id).await?;
        let old_items = fetch_item_rows(&mut tx, sale_id).await?;

        // Net stock movement per product
        let old_pairs: Vec<(String, i64)> = old_items
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity))
            .collect();
        let new_pairs: Vec<(String, i64)> = update
            .items
            .iter()
            .map(|i| (i.product_id.clone(), i.quantity))
            .collect();

        for delta in stock_deltas(&old_pairs, &new_pairs) {
            take_stock(&mut tx, shop_id, &delta.product_id, delta.take).await?;
        }

        // Rebuild line items, preserving snapshots for products kept on the
        // sale
        let now = Utc::now();
        let mut items = Vec::with_capacity(update.items.len());
        let mut total = Money::zero();

        for line in &update.items {
            let (name, unit_price_cents) = match old_items
                .iter()
                .find(|i| i.product_id == line.product_id)
            {
                Some(old) => (old.name_snapshot.clone(), old.unit_price_cents),
                None => snapshot_product(&mut tx, shop_id, &line.product_id).await?,
            };

            let line_total = Money::from_cents(unit_price_cents)
                .checked_mul_qty(line.quantity)
                .ok_or_else(|| {
                    DbError::Domain(CoreError::InvalidPaymentAmount {
                        reason: "line total overflows".to_string(),
                    })
                })?;
            total += line_total;

            items.push(SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.to_string(),
                product_id: line.product_id.clone(),
                name_snapshot: name,
                unit_price_cents,
                quantity: line.quantity,
                line_total_cents: line_total.cents(),
                created_at: now,
            });
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        for item in &items {
            insert_item_row(&mut tx, item).await?;
        }

        let paid_cents = update.paid_cents.unwrap_or(old_sale.paid_cents);
        if paid_cents < 0 {
            return Err(DbError::Domain(CoreError::InvalidPaymentAmount {
                reason: "paid amount cannot be negative".to_string(),
            }));
        }
        let payment_method = update.payment_method.unwrap_or(old_sale.payment_method);

        let paid = Money::from_cents(paid_cents);
        let status = SaleStatus::from_amounts(total, paid);

        let old_outstanding = old_sale.outstanding();
        let new_outstanding = total.saturating_sub_floor_zero(paid);
        let balance_shift = new_outstanding.cents() - old_outstanding.cents();
        if balance_shift != 0 {
            adjust_customer_balance(&mut tx, shop_id, &old_sale.customer_id, balance_shift)
                .await?;
        }

        let sale = Sale {
            total_cents: total.cents(),
            paid_cents,
            payment_method,
            status,
            updated_at: now,
            ..old_sale
        };

        sqlx::query(
            r#"
            UPDATE sales SET
                total_cents = ?3, paid_cents = ?4, payment_method = ?5,
                status = ?6, updated_at = ?7
            WHERE id = ?1 AND shop_id = ?2
            "#,
        )
        .bind(&sale.id)
        .bind(shop_id)
        .bind(sale.total_cents)
        .bind(sale.paid_cents)
        .bind(sale.payment_method)
        .bind(sale.status)
        .bind(sale.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, total = %total, "Sale updated");

        Ok(SaleWithItems { sale, items })
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Deletes a sale, restoring inventory for every line item and removing
    /// the sale's outstanding amount from the customer balance. Commits or
    /// aborts atomically.
    pub async fn delete_sale(&self, shop_id: &str, sale_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale_row(&mut tx, shop_id, sale_id).await?;
        let items = fetch_item_rows(&mut tx, sale_id).await?;

        for item in &items {
            // Negative take = restore
            take_stock(&mut tx, shop_id, &item.product_id, -item.quantity).await?;
        }

        let outstanding = sale.outstanding();
        if !outstanding.is_zero() {
            adjust_customer_balance(&mut tx, shop_id, &sale.customer_id, -outstanding.cents())
                .await?;
        }

        sqlx::query("DELETE FROM sale_items WHERE sale_id = ?1")
            .bind(sale_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM sales WHERE id = ?1 AND shop_id = ?2")
            .bind(sale_id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(sale_id = %sale_id, invoice = %sale.invoice_number, "Sale deleted, stock restored");

        Ok(())
    }

    // =========================================================================
    // Payments
    // =========================================================================

    /// Records a payment against a pending (credit) sale.
    ///
    /// The customer's balance shrinks by the same amount; when the sale is
    /// fully paid its status flips to completed.
    pub async fn record_payment(
        &self,
        shop_id: &str,
        sale_id: &str,
        amount_cents: i64,
    ) -> DbResult<Sale> {
        if amount_cents <= 0 {
            return Err(DbError::Domain(CoreError::InvalidPaymentAmount {
                reason: "payment must be positive".to_string(),
            }));
        }

        let mut tx = self.pool.begin().await?;

        let sale = fetch_sale_row(&mut tx, shop_id, sale_id).await?;

        if sale.status != SaleStatus::Pending {
            return Err(DbError::Domain(CoreError::InvalidSaleStatus {
                sale_id: sale_id.to_string(),
                current_status: "completed".to_string(),
            }));
        }

        let outstanding = sale.outstanding();
        if amount_cents > outstanding.cents() {
            return Err(DbError::Domain(CoreError::InvalidPaymentAmount {
                reason: format!(
                    "payment {} exceeds outstanding {}",
                    amount_cents,
                    outstanding.cents()
                ),
            }));
        }

        let paid_cents = sale.paid_cents + amount_cents;
        let status =
            SaleStatus::from_amounts(Money::from_cents(sale.total_cents), Money::from_cents(paid_cents));
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE sales SET paid_cents = ?3, status = ?4, updated_at = ?5
            WHERE id = ?1 AND shop_id = ?2
            "#,
        )
        .bind(sale_id)
        .bind(shop_id)
        .bind(paid_cents)
        .bind(status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        adjust_customer_balance(&mut tx, shop_id, &sale.customer_id, -amount_cents).await?;

        tx.commit().await?;

        debug!(sale_id = %sale_id, amount = %amount_cents, "Payment recorded");

        Ok(Sale {
            paid_cents,
            status,
            updated_at: now,
            ..sale
        })
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Fails with ShopNotFound unless the shop exists and is live.
async fn require_shop(tx: &mut Transaction<'_, Sqlite>, shop_id: &str) -> DbResult<()> {
    let exists: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM shops WHERE id = ?1 AND deleted = 0")
            .bind(shop_id)
            .fetch_optional(&mut **tx)
            .await?;

    if exists.is_none() {
        return Err(DbError::Domain(CoreError::ShopNotFound(shop_id.to_string())));
    }
    Ok(())
}

/// Resolves the buyer for a sale.
///
/// An explicit customer must exist (and be live) in this shop. Without one,
/// the shop's walk-in placeholder is found or created.
async fn resolve_customer(
    tx: &mut Transaction<'_, Sqlite>,
    shop_id: &str,
    customer_id: Option<&str>,
) -> DbResult<String> {
    if let Some(id) = customer_id {
        let exists: Option<String> = sqlx::query_scalar(
            "SELECT id FROM customers WHERE id = ?1 AND shop_id = ?2 AND deleted = 0",
        )
        .bind(id)
        .bind(shop_id)
        .fetch_optional(&mut **tx)
        .await?;

        return exists
            .ok_or_else(|| DbError::Domain(CoreError::CustomerNotFound(id.to_string())));
    }

    let walk_in: Option<String> = sqlx::query_scalar(
        "SELECT id FROM customers WHERE shop_id = ?1 AND is_walk_in = 1 AND deleted = 0",
    )
    .bind(shop_id)
    .fetch_optional(&mut **tx)
    .await?;

    if let Some(id) = walk_in {
        return Ok(id);
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();

    debug!(shop_id = %shop_id, customer_id = %id, "Creating walk-in customer");

    sqlx::query(
        r#"
        INSERT INTO customers (
            id, shop_id, name, phone, balance_cents, is_walk_in,
            deleted, created_at, updated_at
        ) VALUES (?1, ?2, ?3, NULL, 0, 1, 0, ?4, ?4)
        "#,
    )
    .bind(&id)
    .bind(shop_id)
    .bind(WALK_IN_CUSTOMER_NAME)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    Ok(id)
}

/// Atomically allocates the next invoice sequence number for a shop.
///
/// The upsert both creates the counter row on first use and increments it on
/// every later use; `RETURNING` hands back the allocated value in the same
/// statement, so no two transactions can ever read the same number.
async fn allocate_invoice_seq(tx: &mut Transaction<'_, Sqlite>, shop_id: &str) -> DbResult<i64> {
    let seq: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO shop_counters (shop_id, next_invoice)
        VALUES (?1, 2)
        ON CONFLICT (shop_id) DO UPDATE SET next_invoice = next_invoice + 1
        RETURNING next_invoice - 1
        "#,
    )
    .bind(shop_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(seq)
}

/// Returns `(name, price_cents)` for a live, shop-scoped product.
async fn snapshot_product(
    tx: &mut Transaction<'_, Sqlite>,
    shop_id: &str,
    product_id: &str,
) -> DbResult<(String, i64)> {
    let row: Option<(String, i64)> = sqlx::query_as(
        "SELECT name, price_cents FROM products WHERE id = ?1 AND shop_id = ?2 AND deleted = 0",
    )
    .bind(product_id)
    .bind(shop_id)
    .fetch_optional(&mut **tx)
    .await?;

    row.ok_or_else(|| DbError::Domain(CoreError::ProductNotFound(product_id.to_string())))
}

/// Moves stock for one product: positive `take` decrements (selling),
/// negative restores (editing down / deleting).
///
/// The decrement is guarded: `WHERE stock >= take` means an oversell matches
/// zero rows instead of violating the CHECK constraint, and we can report
/// the available quantity.
async fn take_stock(
    tx: &mut Transaction<'_, Sqlite>,
    shop_id: &str,
    product_id: &str,
    take: i64,
) -> DbResult<()> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE inventory
        SET stock = stock - ?3, updated_at = ?4
        WHERE shop_id = ?1 AND product_id = ?2 AND stock >= ?3
        "#,
    )
    .bind(shop_id)
    .bind(product_id)
    .bind(take)
    .bind(now)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        let available: Option<i64> = sqlx::query_scalar(
            "SELECT stock FROM inventory WHERE shop_id = ?1 AND product_id = ?2",
        )
        .bind(shop_id)
        .bind(product_id)
        .fetch_optional(&mut **tx)
        .await?;

        return match available {
            None => Err(DbError::Domain(CoreError::ProductNotFound(
                product_id.to_string(),
            ))),
            Some(available) => Err(DbError::Domain(CoreError::InsufficientStock {
                product: product_id.to_string(),
                available,
                requested: take,
            })),
        };
    }

    Ok(())
}

/// Shifts a customer's outstanding balance by `delta_cents` (may be
/// negative).
async fn adjust_customer_balance(
    tx: &mut Transaction<'_, Sqlite>,
    shop_id: &str,
    customer_id: &str,
    delta_cents: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE customers
        SET balance_cents = balance_cents + ?3, updated_at = ?4
        WHERE id = ?1 AND shop_id = ?2
        "#,
    )
    .bind(customer_id)
    .bind(shop_id)
    .bind(delta_cents)
    .bind(Utc::now())
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::Domain(CoreError::CustomerNotFound(
            customer_id.to_string(),
        )));
    }

    Ok(())
}

async fn fetch_sale_row(
    tx: &mut Transaction<'_, Sqlite>,
    shop_id: &str,
    sale_id: &str,
) -> DbResult<Sale> {
    let sale = sqlx::query_as::<_, Sale>(&format!(
        "SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND shop_id = ?2"
    ))
    .bind(sale_id)
    .bind(shop_id)
    .fetch_optional(&mut **tx)
    .await?;

    sale.ok_or_else(|| DbError::Domain(CoreError::SaleNotFound(sale_id.to_string())))
}

async fn fetch_item_rows(
    tx: &mut Transaction<'_, Sqlite>,
    sale_id: &str,
) -> DbResult<Vec<SaleItem>> {
    let items = sqlx::query_as::<_, SaleItem>(&format!(
        "SELECT {SALE_ITEM_COLUMNS} FROM sale_items WHERE sale_id = ?1 ORDER BY created_at, id"
    ))
    .bind(sale_id)
    .fetch_all(&mut **tx)
    .await?;

    Ok(items)
}

async fn insert_sale_row(tx: &mut Transaction<'_, Sqlite>, sale: &Sale) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, shop_id, invoice_number, customer_id, total_cents, paid_cents,
            payment_method, status, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.shop_id)
    .bind(&sale.invoice_number)
    .bind(&sale.customer_id)
    .bind(sale.total_cents)
    .bind(sale.paid_cents)
    .bind(sale.payment_method)
    .bind(sale.status)
    .bind(sale.created_at)
    .bind(sale.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn insert_item_row(tx: &mut Transaction<'_, Sqlite>, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot, unit_price_cents,
            quantity, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.line_total_cents)
    .bind(item.created_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::product::NewProduct;

    struct Fixture {
        db: Database,
        shop_id: String,
        rice_id: String,
        sugar_id: String,
    }

    /// Shop with rice (stock 10 @ 100.00) and sugar (stock 5 @ 50.00).
    async fn fixture() -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = db.shops().create("Test Shop", None).await.unwrap();

        let rice = db
            .products()
            .create(
                &shop.id,
                NewProduct {
                    name: "Rice".to_string(),
                    sku: "RICE".to_string(),
                    category: None,
                    price_cents: 10_000,
                    cost_cents: None,
                },
            )
            .await
            .unwrap();
        let sugar = db
            .products()
            .create(
                &shop.id,
                NewProduct {
                    name: "Sugar".to_string(),
                    sku: "SUGAR".to_string(),
                    category: None,
                    price_cents: 5_000,
                    cost_cents: None,
                },
            )
            .await
            .unwrap();

        db.inventory().adjust(&shop.id, &rice.id, 10).await.unwrap();
        db.inventory().adjust(&shop.id, &sugar.id, 5).await.unwrap();

        Fixture {
            db,
            shop_id: shop.id,
            rice_id: rice.id,
            sugar_id: sugar.id,
        }
    }

    fn cash_sale(items: Vec<NewSaleItem>, paid_cents: i64) -> NewSale {
        NewSale {
            customer_id: None,
            items,
            paid_cents,
            payment_method: PaymentMethod::Cash,
        }
    }

    async fn stock_of(f: &Fixture, product_id: &str) -> i64 {
        f.db.inventory()
            .get(&f.shop_id, product_id)
            .await
            .unwrap()
            .unwrap()
            .stock
    }

    #[tokio::test]
    async fn test_create_decrements_stock_exactly() {
        let f = fixture().await;

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(
                    vec![
                        NewSaleItem { product_id: f.rice_id.clone(), quantity: 3 },
                        NewSaleItem { product_id: f.sugar_id.clone(), quantity: 2 },
                    ],
                    40_000,
                ),
            )
            .await
            .unwrap();

        assert_eq!(sale.sale.total_cents, 40_000);
        assert_eq!(sale.sale.status, SaleStatus::Completed);
        assert_eq!(stock_of(&f, &f.rice_id).await, 7);
        assert_eq!(stock_of(&f, &f.sugar_id).await, 3);
    }

    #[tokio::test]
    async fn test_insufficient_stock_applies_nothing() {
        let f = fixture().await;

        // Rice line succeeds first, sugar line oversells: both must roll back
        let err = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(
                    vec![
                        NewSaleItem { product_id: f.rice_id.clone(), quantity: 3 },
                        NewSaleItem { product_id: f.sugar_id.clone(), quantity: 6 },
                    ],
                    0,
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(stock_of(&f, &f.rice_id).await, 10);
        assert_eq!(stock_of(&f, &f.sugar_id).await, 5);
        assert!(f.db.sales().list(&f.shop_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_sale_does_not_burn_an_invoice_number() {
        let f = fixture().await;

        let first = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 1 }], 10_000),
            )
            .await
            .unwrap();
        assert_eq!(first.sale.invoice_number, "INV-000001");

        // This attempt fails and rolls the counter back
        let _ = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.sugar_id.clone(), quantity: 100 }], 0),
            )
            .await
            .unwrap_err();

        let second = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 1 }], 10_000),
            )
            .await
            .unwrap();
        assert_eq!(second.sale.invoice_number, "INV-000002");
    }

    #[tokio::test]
    async fn test_invoice_numbers_unique_under_concurrency() {
        let f = fixture().await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let db = f.db.clone();
            let shop_id = f.shop_id.clone();
            let rice_id = f.rice_id.clone();
            handles.push(tokio::spawn(async move {
                db.sales()
                    .create_sale(
                        &shop_id,
                        NewSale {
                            customer_id: None,
                            items: vec![NewSaleItem { product_id: rice_id, quantity: 1 }],
                            paid_cents: 10_000,
                            payment_method: PaymentMethod::Cash,
                        },
                    )
                    .await
            }));
        }

        let mut invoices = Vec::new();
        for handle in handles {
            invoices.push(handle.await.unwrap().unwrap().sale.invoice_number);
        }

        invoices.sort();
        invoices.dedup();
        assert_eq!(invoices.len(), 8, "invoice numbers must be unique");
        assert_eq!(invoices.first().unwrap(), "INV-000001");
        assert_eq!(invoices.last().unwrap(), "INV-000008");
    }

    #[tokio::test]
    async fn test_delete_restores_stock_exactly() {
        let f = fixture().await;

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(
                    vec![
                        NewSaleItem { product_id: f.rice_id.clone(), quantity: 4 },
                        NewSaleItem { product_id: f.sugar_id.clone(), quantity: 1 },
                    ],
                    45_000,
                ),
            )
            .await
            .unwrap();

        f.db.sales().delete_sale(&f.shop_id, &sale.sale.id).await.unwrap();

        assert_eq!(stock_of(&f, &f.rice_id).await, 10);
        assert_eq!(stock_of(&f, &f.sugar_id).await, 5);
        assert!(f.db.sales().get(&f.shop_id, &sale.sale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_applies_net_delta_only() {
        let f = fixture().await;

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(
                    vec![
                        NewSaleItem { product_id: f.rice_id.clone(), quantity: 3 },
                        NewSaleItem { product_id: f.sugar_id.clone(), quantity: 2 },
                    ],
                    40_000,
                ),
            )
            .await
            .unwrap();

        // rice 3 → 5 (take 2 more), sugar removed (restore 2)
        let updated = f
            .db
            .sales()
            .update_sale(
                &f.shop_id,
                &sale.sale.id,
                UpdateSale {
                    items: vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 5 }],
                    paid_cents: Some(50_000),
                    payment_method: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(stock_of(&f, &f.rice_id).await, 5);
        assert_eq!(stock_of(&f, &f.sugar_id).await, 5);
        assert_eq!(updated.sale.total_cents, 50_000);
        assert_eq!(updated.sale.status, SaleStatus::Completed);
        assert_eq!(updated.items.len(), 1);
    }

    #[tokio::test]
    async fn test_update_with_unchanged_quantities_moves_no_stock() {
        let f = fixture().await;

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 3 }], 30_000),
            )
            .await
            .unwrap();

        f.db.sales()
            .update_sale(
                &f.shop_id,
                &sale.sale.id,
                UpdateSale {
                    items: vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 3 }],
                    paid_cents: None,
                    payment_method: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(stock_of(&f, &f.rice_id).await, 7);
    }

    #[tokio::test]
    async fn test_update_rollback_on_oversell() {
        let f = fixture().await;

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 3 }], 30_000),
            )
            .await
            .unwrap();

        // 7 left; asking for 3 → 11 needs 8 more
        let err = f
            .db
            .sales()
            .update_sale(
                &f.shop_id,
                &sale.sale.id,
                UpdateSale {
                    items: vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 11 }],
                    paid_cents: None,
                    payment_method: None,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Domain(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(stock_of(&f, &f.rice_id).await, 7);

        // Sale itself is untouched
        let fetched = f.db.sales().get(&f.shop_id, &sale.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.sale.total_cents, 30_000);
        assert_eq!(fetched.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_credit_sale_lands_on_customer_khata() {
        let f = fixture().await;
        let customer = f.db.customers().create(&f.shop_id, "Bilal", None).await.unwrap();

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                NewSale {
                    customer_id: Some(customer.id.clone()),
                    items: vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 2 }],
                    paid_cents: 5_000,
                    payment_method: PaymentMethod::Credit,
                },
            )
            .await
            .unwrap();

        assert_eq!(sale.sale.status, SaleStatus::Pending);

        let customer = f.db.customers().get(&f.shop_id, &customer.id).await.unwrap().unwrap();
        assert_eq!(customer.balance_cents, 15_000);

        // Partial payment
        let paid = f
            .db
            .sales()
            .record_payment(&f.shop_id, &sale.sale.id, 10_000)
            .await
            .unwrap();
        assert_eq!(paid.status, SaleStatus::Pending);

        // Full settlement flips to completed and clears the khata
        let done = f
            .db
            .sales()
            .record_payment(&f.shop_id, &sale.sale.id, 5_000)
            .await
            .unwrap();
        assert_eq!(done.status, SaleStatus::Completed);

        let customer = f.db.customers().get(&f.shop_id, &customer.id).await.unwrap().unwrap();
        assert_eq!(customer.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_delete_pending_sale_clears_khata() {
        let f = fixture().await;
        let customer = f.db.customers().create(&f.shop_id, "Bilal", None).await.unwrap();

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                NewSale {
                    customer_id: Some(customer.id.clone()),
                    items: vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 1 }],
                    paid_cents: 0,
                    payment_method: PaymentMethod::Credit,
                },
            )
            .await
            .unwrap();

        f.db.sales().delete_sale(&f.shop_id, &sale.sale.id).await.unwrap();

        let customer = f.db.customers().get(&f.shop_id, &customer.id).await.unwrap().unwrap();
        assert_eq!(customer.balance_cents, 0);
    }

    #[tokio::test]
    async fn test_walk_in_customer_created_once_and_reused() {
        let f = fixture().await;

        let first = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 1 }], 10_000),
            )
            .await
            .unwrap();
        let second = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 1 }], 10_000),
            )
            .await
            .unwrap();

        assert_eq!(first.sale.customer_id, second.sale.customer_id);

        let customers = f.db.customers().list(&f.shop_id).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert!(customers[0].is_walk_in);
        assert_eq!(customers[0].name, WALK_IN_CUSTOMER_NAME);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_rejected() {
        let f = fixture().await;

        let err = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                NewSale {
                    customer_id: Some("missing".to_string()),
                    items: vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 1 }],
                    paid_cents: 0,
                    payment_method: PaymentMethod::Cash,
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, DbError::Domain(CoreError::CustomerNotFound(_))));
    }

    #[tokio::test]
    async fn test_empty_sale_rejected() {
        let f = fixture().await;
        let err = f
            .db
            .sales()
            .create_sale(&f.shop_id, cash_sale(vec![], 0))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[tokio::test]
    async fn test_soft_deleted_product_not_sellable() {
        let f = fixture().await;
        f.db.products().soft_delete(&f.shop_id, &f.rice_id).await.unwrap();

        let err = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 1 }], 10_000),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::ProductNotFound(_))));
    }

    #[tokio::test]
    async fn test_snapshot_survives_price_change() {
        let f = fixture().await;

        let sale = f
            .db
            .sales()
            .create_sale(
                &f.shop_id,
                cash_sale(vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 2 }], 20_000),
            )
            .await
            .unwrap();

        // Reprice rice; the sale keeps its snapshot
        f.db.products()
            .update(
                &f.shop_id,
                &f.rice_id,
                crate::repository::product::ProductUpdate {
                    price_cents: Some(99_999),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let fetched = f.db.sales().get(&f.shop_id, &sale.sale.id).await.unwrap().unwrap();
        assert_eq!(fetched.items[0].unit_price_cents, 10_000);

        // Quantity bump on update keeps the snapshot price too
        let updated = f
            .db
            .sales()
            .update_sale(
                &f.shop_id,
                &sale.sale.id,
                UpdateSale {
                    items: vec![NewSaleItem { product_id: f.rice_id.clone(), quantity: 3 }],
                    paid_cents: Some(30_000),
                    payment_method: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.items[0].unit_price_cents, 10_000);
        assert_eq!(updated.sale.total_cents, 30_000);
    }
}

//! # Domain Types
//!
//! Core domain types used throughout Digital Khata.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Shop       │   │    Product      │   │    Customer     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  sku (business) │   │  balance_cents  │       │
//! │  │  deleted        │   │  price_cents    │   │  is_walk_in     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Sale       │   │   SaleStatus    │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  invoice_number │   │  Pending        │   │  Cash / Card    │       │
//! │  │  total_cents    │   │  Completed      │   │  MobileWallet   │       │
//! │  │  paid_cents     │   └─────────────────┘   │  Credit         │       │
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (sku, invoice_number) - human-readable
//!
//! ## Multi-Tenancy
//! Every entity except Shop carries a `shop_id`. All queries are scoped by it;
//! nothing ever crosses shops.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Shop
// =============================================================================

/// A tenant/business unit. All other data is scoped by `shop_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Shop {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name of the business.
    pub name: String,

    /// Name of the shop owner.
    pub owner_name: Option<String>,

    /// Soft-delete flag. Deleted shops never appear in listings.
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Shop this product belongs to.
    pub shop_id: String,

    /// Display name shown on invoices.
    pub name: String,

    /// Stock Keeping Unit - business identifier, unique within a shop.
    pub sku: String,

    /// Optional category tag ("grocery", "electronics", ...).
    pub category: Option<String>,

    /// Selling price in cents (smallest currency unit).
    pub price_cents: i64,

    /// Cost in cents (for profit margin calculations).
    pub cost_cents: Option<i64>,

    /// Soft-delete flag.
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Inventory
// =============================================================================

/// Per-shop, per-product stock level.
///
/// Mutated only by sale creation/update/deletion and manual adjustments.
/// `stock` can never go negative; the database enforces this with a CHECK
/// constraint and the sale path enforces it with guarded updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct InventoryLevel {
    pub id: String,
    pub shop_id: String,
    pub product_id: String,

    /// Units currently on hand.
    pub stock: i64,

    /// Units reserved (held for unconfirmed orders). Informational.
    pub reserved: i64,

    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Customer
// =============================================================================

/// A per-shop customer profile with an outstanding credit balance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub phone: Option<String>,

    /// Outstanding amount the customer owes, in cents.
    /// Mutated only via sale create/update/delete and settlements.
    pub balance_cents: i64,

    /// Whether this is the shop's auto-created walk-in placeholder.
    pub is_walk_in: bool,

    /// Soft-delete flag.
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn balance(&self) -> Money {
        Money::from_cents(self.balance_cents)
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    /// Partially paid credit sale; the shortfall sits on the customer's
    /// khata (outstanding balance).
    Pending,
    /// Fully paid.
    Completed,
}

impl SaleStatus {
    /// Derives the status from totals: `paid < total` means a credit sale.
    pub fn from_amounts(total: Money, paid: Money) -> SaleStatus {
        if paid < total {
            SaleStatus::Pending
        } else {
            SaleStatus::Completed
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on external terminal.
    Card,
    /// Mobile wallet transfer (JazzCash, Easypaisa, ...).
    MobileWallet,
    /// Sale recorded on the customer's khata, to be settled later.
    Credit,
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction.
///
/// Sales are hard-deleted (with full inventory restoration), never
/// soft-deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: String,
    pub shop_id: String,

    /// Shop-scoped sequential business identifier, e.g. `INV-000042`.
    /// Unique and strictly increasing within a shop.
    pub invoice_number: String,

    /// Buyer. Always set; walk-in sales resolve to the shop's placeholder
    /// customer.
    pub customer_id: String,

    pub total_cents: i64,
    pub paid_cents: i64,
    pub payment_method: PaymentMethod,
    pub status: SaleStatus,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Sale {
    /// Amount still owed on this sale, never negative.
    #[inline]
    pub fn outstanding(&self) -> Money {
        Money::from_cents(self.total_cents).saturating_sub_floor_zero(Money::from_cents(self.paid_cents))
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,

    /// Product name at time of sale (frozen).
    pub name_snapshot: String,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    /// Quantity sold. Always positive.
    pub quantity: i64,

    /// Line total (unit_price × quantity).
    pub line_total_cents: i64,

    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

// =============================================================================
// Expense & Budget
// =============================================================================

/// A category-tagged expense ledger row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub shop_id: String,
    pub category: String,
    pub description: Option<String>,
    pub amount_cents: i64,

    /// Day the expense was incurred (not necessarily the day it was
    /// recorded).
    pub incurred_on: chrono::NaiveDate,

    /// Soft-delete flag.
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A per-category monthly spending budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Budget {
    pub id: String,
    pub shop_id: String,
    pub category: String,
    pub amount_cents: i64,

    /// Budget month in `YYYY-MM` form.
    pub period: String,

    /// Soft-delete flag.
    pub deleted: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Chat
// =============================================================================

/// Who authored a stored chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A stored AI-conversation message, scoped by shop and user.
///
/// This crate only stores history; talking to a model is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct ChatMessage {
    pub id: String,
    pub shop_id: String,
    pub user_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sale_status_from_amounts() {
        let total = Money::from_cents(1000);

        assert_eq!(
            SaleStatus::from_amounts(total, Money::from_cents(400)),
            SaleStatus::Pending
        );
        assert_eq!(
            SaleStatus::from_amounts(total, Money::from_cents(1000)),
            SaleStatus::Completed
        );
        // Overpayment still completes
        assert_eq!(
            SaleStatus::from_amounts(total, Money::from_cents(1500)),
            SaleStatus::Completed
        );
    }

    #[test]
    fn test_sale_outstanding_never_negative() {
        let sale = Sale {
            id: "s1".to_string(),
            shop_id: "shop1".to_string(),
            invoice_number: "INV-000001".to_string(),
            customer_id: "c1".to_string(),
            total_cents: 500,
            paid_cents: 800,
            payment_method: PaymentMethod::Cash,
            status: SaleStatus::Completed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(sale.outstanding().cents(), 0);
    }
}

//! # khata-db: Database Layer for Digital Khata
//!
//! This crate provides database access for the Digital Khata backend.
//! It uses SQLite for storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Digital Khata Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /api/v1/shops/{id}/sales)                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     khata-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (sale.rs,    │    │  (embedded)  │  │   │
//! │  │   │               │    │   product.rs, │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│   ...)        │    │ 001_init.sql │  │   │
//! │  │   │ Transactions  │    │               │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (WAL mode, foreign keys ON)                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (sale, product, ...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use khata_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("khata.db")).await?;
//! let shops = db.shops().list().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::budget::{BudgetRepository, NewBudget};
pub use repository::chat::ChatRepository;
pub use repository::customer::{CustomerRepository, CustomerUpdate};
pub use repository::expense::{ExpenseRepository, ExpenseUpdate, NewExpense};
pub use repository::inventory::{InventoryRepository, StockRow};
pub use repository::product::{NewProduct, ProductRepository, ProductUpdate};
pub use repository::report::{MonthlyReport, ReportRepository};
pub use repository::sale::{NewSale, NewSaleItem, SaleRepository, SaleWithItems, UpdateSale};
pub use repository::shop::{ShopRepository, ShopUpdate};

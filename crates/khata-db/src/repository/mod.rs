//! # Repository Module
//!
//! Database repository implementations for Digital Khata.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  HTTP Handler                                                           │
//! │       │                                                                 │
//! │       │  db.sales().create_sale(&shop_id, new_sale)                     │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  SaleRepository                                                         │
//! │  ├── create_sale(&self, shop_id, new_sale)                              │
//! │  ├── update_sale(&self, shop_id, sale_id, update)                       │
//! │  ├── delete_sale(&self, shop_id, sale_id)                               │
//! │  └── record_payment(&self, shop_id, sale_id, amount)                    │
//! │       │                                                                 │
//! │       │  SQL (inside one transaction where it matters)                  │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`shop::ShopRepository`] - Shop CRUD
//! - [`product::ProductRepository`] - Product CRUD
//! - [`inventory::InventoryRepository`] - Stock levels and adjustments
//! - [`customer::CustomerRepository`] - Customers and balance settlements
//! - [`sale::SaleRepository`] - The transactional sale subsystem
//! - [`expense::ExpenseRepository`] / [`budget::BudgetRepository`] - Ledgers
//! - [`chat::ChatRepository`] - Stored conversation history
//! - [`report::ReportRepository`] - Monthly aggregates

pub mod budget;
pub mod chat;
pub mod customer;
pub mod expense;
pub mod inventory;
pub mod product;
pub mod report;
pub mod sale;
pub mod shop;

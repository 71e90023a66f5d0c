//! Shared application state handed to every handler.

use khata_db::Database;

/// Shared state. Cloning is cheap: `Database` wraps an `Arc`'d pool.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        AppState { db }
    }
}

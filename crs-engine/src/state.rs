//! Shared service state
//!
//! Owns the database pool and the update hub for the lifetime of the
//! service; handlers and engine calls borrow it instead of reaching for
//! globals.

use std::sync::Arc;
use std::time::Duration;

use sqlx::SqlitePool;

use crate::hub::UpdateHub;

/// State shared across handlers and engine operations
#[derive(Clone)]
pub struct AppState {
    /// Database pool
    pub db: SqlitePool,
    /// Live-update fan-out hub
    pub hub: Arc<UpdateHub>,
    /// Bounded wait before a subscriber stream emits a keepalive
    pub keepalive: Duration,
}

impl AppState {
    pub fn new(db: SqlitePool, keepalive: Duration) -> Self {
        AppState {
            db,
            hub: UpdateHub::new(),
            keepalive,
        }
    }
}

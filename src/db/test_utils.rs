//! Shared test utilities for catalog storage
//!
//! Builds in-memory databases through Database::new(None) so unit tests
//! run against the same migrations as the binaries.

use sqlx::SqlitePool;

use super::Database;
use crate::catalog::MonsterCatalog;

/// Create an in-memory test database pool with full schema
pub async fn test_pool() -> SqlitePool {
    let db = Database::new(None)
        .await
        .expect("Failed to create test database");
    db.pool().clone()
}

/// Empty catalog over a fresh in-memory database
pub async fn test_catalog() -> MonsterCatalog {
    MonsterCatalog::new(test_pool().await)
}

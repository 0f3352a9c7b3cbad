//! Database module - SQLite catalog store

use anyhow::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;

#[cfg(test)]
pub mod test_utils;

/// Database handle wrapping SQLite connection pool
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    /// If path is None, uses in-memory database (for testing)
    pub async fn new(path: Option<&str>) -> Result<Self> {
        let (conn_str, max_connections) = match path {
            Some(p) => (format!("sqlite:{}?mode=rwc", p), 5),
            // Every pooled connection to :memory: would be its own database
            None => ("sqlite::memory:".to_string(), 1),
        };

        let mut options = SqliteConnectOptions::from_str(&conn_str)?.create_if_missing(true);
        if path.is_some() {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if path.is_none() {
            // Closing the only connection would drop the in-memory database
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS monsters (
                normalized_key TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                challenge_rating REAL NOT NULL,
                creature_type TEXT NOT NULL DEFAULT '',
                size TEXT NOT NULL DEFAULT 'M',
                experience INTEGER NOT NULL DEFAULT 0,
                origin TEXT NOT NULL DEFAULT 'scraped',
                armor TEXT,
                hit_points TEXT,
                speed TEXT,
                strength INTEGER,
                dexterity INTEGER,
                constitution INTEGER,
                intelligence INTEGER,
                wisdom INTEGER,
                charisma INTEGER,
                skills TEXT,
                resistances TEXT,
                senses TEXT,
                languages TEXT,
                traits TEXT,
                actions TEXT,
                legendary_actions TEXT,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_monsters_name ON monsters(name)")
            .execute(&self.pool)
            .await?;

        info!("Database migrations complete");
        Ok(())
    }

    /// Get the connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Check if database is healthy
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

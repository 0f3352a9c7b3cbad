//! Catalog initialization
//!
//! One-time creation of a catalog file for the bestiary_init tool, seeded
//! with hand-authored creatures.

use std::path::Path;

use anyhow::{anyhow, bail, Result};
use tracing::info;

use crate::catalog::{MonsterCatalog, MonsterDraft};
use crate::db::Database;

/// Create a new catalog file and save `drafts` into it
///
/// Returns the number of creatures saved.
///
/// # Errors
/// * Catalog file already exists
/// * A draft fails validation (nothing after it is saved)
/// * Database creation fails
pub async fn init_catalog(path: &Path, drafts: Vec<MonsterDraft>) -> Result<usize> {
    if path.exists() {
        bail!(
            "Catalog file already exists: {}. Remove it first or use a different path.",
            path.display()
        );
    }

    let path_str = path
        .to_str()
        .ok_or_else(|| anyhow!("Catalog path is not valid UTF-8: {}", path.display()))?;

    info!("Creating new catalog at {}", path.display());
    let db = Database::new(Some(path_str)).await?;
    let catalog = MonsterCatalog::new(db.pool().clone());

    if !drafts.is_empty() {
        info!("Storing {} authored creatures...", drafts.len());
    }
    let mut saved = 0;
    for draft in drafts {
        let record = catalog.save_draft(draft).await?;
        info!("  {} (CR {})", record.name, record.challenge_rating);
        saved += 1;
    }

    info!("Catalog initialization complete");
    Ok(saved)
}

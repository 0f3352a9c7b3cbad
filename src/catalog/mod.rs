//! Creature catalog
//!
//! The persistent store of creature records. Records come from two places:
//! - sync from the reference source's listing (insert-if-absent)
//! - manual authoring (upsert, never overwritten by a later sync)
//!
//! Both are keyed by the normalized name so spelling noise cannot create
//! a second record for the same creature.

mod cache;
mod record;
mod store;

pub use cache::StatBlockCache;
pub use record::{
    AbilityScores, ChallengeRating, MonsterDraft, MonsterRecord, Origin, SizeCategory,
};
pub use store::{MonsterCatalog, SyncReport};

use std::collections::HashSet;
use thiserror::Error;

use crate::source::SourceError;

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("creature name cannot be empty")]
    EmptyName,

    #[error("creature name {0:?} has no usable lookup key")]
    EmptyKey(String),

    #[error("invalid challenge rating: {0}")]
    InvalidChallengeRating(f64),

    #[error("ability score {0} is outside 1..=30")]
    AbilityOutOfRange(i64),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("fetch failed: {0}")]
    Fetch(#[from] SourceError),
}

/// Listing entries whose name contains `term`, case-insensitively
///
/// Sorted by lower-cased name then challenge rating, one entry per key.
/// An empty term matches everything.
pub fn filter_listing<'a>(records: &'a [MonsterRecord], term: &str) -> Vec<&'a MonsterRecord> {
    let term = term.trim().to_lowercase();
    let mut seen = HashSet::new();

    let mut matches: Vec<&MonsterRecord> = records
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&term))
        .filter(|r| seen.insert(r.normalized_key.as_str()))
        .collect();

    matches.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.challenge_rating.value().total_cmp(&b.challenge_rating.value()))
    });
    matches
}

//! Reference source access
//!
//! The catalog is filled from an external creature listing and stat blocks
//! for scraped creatures are read from per-creature detail pages. This
//! module defines that boundary:
//! - `MonsterSource`, the trait the catalog and encounter code depend on
//! - `HttpSource`, the reqwest-backed implementation
//! - `markup`, text extraction from the fetched pages

mod http;
pub mod markup;

pub use http::HttpSource;

use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

use crate::statblock::ScrapedDetail;

/// Fetch or extraction failure
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("source returned status {0}")]
    Status(u16),

    #[error("unexpected markup: {0}")]
    Markup(String),

    #[error("creature not found: {0}")]
    NotFound(String),
}

/// One row of the source's creature listing, as found
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRow {
    pub name: String,
    /// Raw rating text, possibly a fraction ("1/4")
    pub challenge_rating: String,
    pub creature_type: String,
    /// Size sort value ("1".."6") or size token
    pub size_token: String,
}

impl SourceRow {
    pub fn new(name: &str, challenge_rating: &str, creature_type: &str, size_token: &str) -> Self {
        Self {
            name: name.to_string(),
            challenge_rating: challenge_rating.to_string(),
            creature_type: creature_type.to_string(),
            size_token: size_token.to_string(),
        }
    }
}

/// Where listing rows and creature details come from
pub trait MonsterSource: Send + Sync {
    /// Every creature row the source lists
    fn fetch_listing(&self) -> impl Future<Output = Result<Vec<SourceRow>, SourceError>> + Send;

    /// Labeled fragments of one creature's detail page
    fn fetch_detail(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<ScrapedDetail, SourceError>> + Send;
}

/// Reference source endpoints and client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub listing_url: String,
    /// Detail page template, `{slug}` is replaced by the creature's slug
    pub detail_url: String,
    /// Prefix for site-relative image paths
    pub asset_base: String,
    pub user_agent: String,
    /// Upper bound on any single fetch; a slower fetch counts as failed
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            listing_url: "https://www.aidedd.org/dnd-filters/monstres.php".to_string(),
            detail_url: "https://www.aidedd.org/dnd/monstres.php?vf={slug}".to_string(),
            asset_base: "https://www.aidedd.org".to_string(),
            user_agent: "Mozilla/5.0".to_string(),
            timeout_secs: 10,
        }
    }
}

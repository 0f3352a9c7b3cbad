//! bestiary - creature catalog and encounter tracker
//!
//! Keeps a local catalog of creatures mirrored from a reference source plus
//! hand-authored ones, turns stat blocks into combat-ready numbers, and runs
//! initiative, hit points and conditions at the table.

pub mod catalog;
pub mod combat;
pub mod db;
pub mod encounter;
pub mod images;
pub mod init;
pub mod names;
pub mod source;
pub mod statblock;

use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use combat::PartyConfig;
use source::SourceConfig;

/// Default configuration file, read from the working directory
pub const CONFIG_FILE: &str = "bestiary.toml";

/// Runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite file; None keeps the catalog in memory
    pub db_path: Option<String>,
    pub image_cache_dir: PathBuf,
    pub source: SourceConfig,
    pub party: PartyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            image_cache_dir: PathBuf::from("image_cache"),
            source: SourceConfig::default(),
            party: PartyConfig::default(),
        }
    }
}

impl Config {
    /// Defaults, then `file` if present, then `BESTIARY_*` variables
    ///
    /// Nested keys use a double underscore, e.g. `BESTIARY_SOURCE__TIMEOUT_SECS`.
    pub fn figment(file: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(file))
            .merge(Env::prefixed("BESTIARY_").split("__"))
    }

    pub fn load(file: &Path) -> Result<Self, figment::Error> {
        Self::figment(file).extract()
    }
}

//! Parser input shapes

use serde::{Deserialize, Serialize};

use crate::catalog::MonsterRecord;

/// A piece of the action/trait region of a scraped page, in page order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    /// A section heading ("Actions", "Actions légendaires", ...)
    Heading(String),
    /// A titled paragraph under the current heading
    Entry { title: String, body: String },
}

/// Labeled text fragments pulled from the reference source's detail page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrapedDetail {
    pub name: String,
    pub url: Option<String>,
    pub creature_type: String,
    /// Labeled stat lines, e.g. ("Points de vie", "7 (2d6)")
    pub stats: Vec<(String, String)>,
    /// Raw ability label and value text, e.g. ("FOR", "8 (-1)")
    pub abilities: Vec<(String, String)>,
    /// Skill/sense/language lines
    pub details: Vec<String>,
    pub fragments: Vec<Fragment>,
    pub image_uris: Vec<String>,
}

/// The two accepted inputs of the stat block parser
#[derive(Debug, Clone, Copy)]
pub enum RawFields<'a> {
    /// Already-structured columns of an authored record
    Manual(&'a MonsterRecord),
    /// Fragments extracted from the reference source
    Scraped(&'a ScrapedDetail),
}

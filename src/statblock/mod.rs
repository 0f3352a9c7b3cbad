//! Stat block extraction
//!
//! Turns either an authored catalog record or the fragments scraped from
//! the reference source into a [`ParsedStatBlock`]:
//! - average hit points from the hit point formula
//! - "score (modifier)" strings for the six abilities
//! - traits / actions / legendary actions as ordered titled entries
//! - image references
//!
//! Nothing in here fails. Unusable input degrades to documented defaults
//! and is reported as [`ParseIssue`]s for diagnostics.

mod ability;
mod hp;
mod parser;
mod raw;
mod section;

pub use ability::{format_score, modifier, table_modifier, Ability};
pub use hp::average_hit_points;
pub use parser::parse;
pub use raw::{Fragment, RawFields, ScrapedDetail};
pub use section::{Section, SectionKind};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Something in the input that could not be used as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParseIssue {
    MissingHitPoints,
    UnparsedHitPoints(String),
    NonPositiveHitPoints(String),
    InvalidDiceExpression(String),
    HitPointsMismatch { stated: u32, dice_average: i32 },
    AbilityOffTable { ability: Ability, score: i64 },
    UnparsedAbility { ability: Ability, value: String },
    UnrecognizedAbilityLabel(String),
    UnrecognizedHeading(String),
    UnusualSpeed(String),
}

impl std::fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseIssue::MissingHitPoints => write!(f, "no hit point formula, defaulting to 1"),
            ParseIssue::UnparsedHitPoints(s) => {
                write!(f, "could not parse hit points from {:?}, defaulting to 1", s)
            }
            ParseIssue::NonPositiveHitPoints(s) => {
                write!(f, "non-positive hit points in {:?}, setting to 1", s)
            }
            ParseIssue::InvalidDiceExpression(s) => write!(f, "invalid dice expression {:?}", s),
            ParseIssue::HitPointsMismatch {
                stated,
                dice_average,
            } => write!(
                f,
                "stated hit points {} differ from dice average {}",
                stated, dice_average
            ),
            ParseIssue::AbilityOffTable { ability, score } => {
                write!(f, "{} score {} is off the modifier table, using +0", ability, score)
            }
            ParseIssue::UnparsedAbility { ability, value } => {
                write!(f, "could not read a {} score from {:?}", ability, value)
            }
            ParseIssue::UnrecognizedAbilityLabel(s) => write!(f, "unrecognized ability label {:?}", s),
            ParseIssue::UnrecognizedHeading(s) => write!(f, "unrecognized section heading {:?}", s),
            ParseIssue::UnusualSpeed(s) => write!(f, "unusual speed format {:?}", s),
        }
    }
}

/// Combat-usable view of one creature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedStatBlock {
    pub name: String,
    pub creature_type: String,
    /// Page the block was read from, for scraped creatures
    pub source_url: Option<String>,
    /// Always at least 1
    pub average_hp: u32,
    /// Formula as written, possibly empty
    pub hp_formula: String,
    /// Labeled stat lines (armor, hit points, speed, ...)
    pub stats: Vec<(String, String)>,
    pub abilities: BTreeMap<Ability, String>,
    pub details: Vec<String>,
    pub sections: Vec<Section>,
    pub image_references: Vec<String>,
    /// Set when the creature's data could not be located at all
    pub error: Option<String>,
    pub issues: Vec<ParseIssue>,
}

impl ParsedStatBlock {
    /// Empty block for `name`
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            creature_type: String::new(),
            source_url: None,
            average_hp: 1,
            hp_formula: String::new(),
            stats: Vec::new(),
            abilities: BTreeMap::new(),
            details: Vec::new(),
            sections: Vec::new(),
            image_references: Vec::new(),
            error: None,
            issues: Vec::new(),
        }
    }

    /// Placeholder returned when the creature's data cannot be found
    pub fn not_found(name: &str, url: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            source_url: url,
            error: Some(reason.into()),
            ..Self::new(name)
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// Minimal display used in place of a missing stat block
    pub fn fallback_text(&self) -> String {
        format!("{}\nStat block unavailable.", self.name)
    }

    /// Entries of one section, in page order
    pub fn section(&self, kind: SectionKind) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(move |s| s.kind == kind)
    }
}

impl std::fmt::Display for ParsedStatBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(error) = &self.error {
            writeln!(f, "{}", self.fallback_text())?;
            return write!(f, "Error: {}", error);
        }

        writeln!(f, "{}", self.name)?;
        if !self.creature_type.is_empty() {
            writeln!(f, "{}", self.creature_type)?;
        }

        writeln!(f, "\nStatistics")?;
        for (label, value) in self.stats.iter().filter(|(_, v)| !v.is_empty()) {
            writeln!(f, "{}: {}", label, value)?;
        }

        if !self.abilities.is_empty() {
            writeln!(f, "\nAbilities")?;
            for (ability, value) in &self.abilities {
                writeln!(f, "{}: {}", ability, value)?;
            }
        }

        if !self.details.is_empty() {
            writeln!(f, "\nDetails")?;
            for detail in &self.details {
                writeln!(f, "{}", detail)?;
            }
        }

        for kind in [
            SectionKind::Traits,
            SectionKind::Actions,
            SectionKind::LegendaryActions,
        ] {
            let mut entries = self.section(kind).filter(|s| !s.title.is_empty()).peekable();
            if entries.peek().is_none() {
                continue;
            }
            writeln!(f, "\n{}", kind.title())?;
            for entry in entries {
                if entry.body.is_empty() {
                    writeln!(f, "{}", entry.title)?;
                } else {
                    writeln!(f, "{}\n{}", entry.title, entry.body)?;
                }
            }
        }
        Ok(())
    }
}

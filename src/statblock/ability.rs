//! Ability scores and modifiers

use serde::{Deserialize, Serialize};

use crate::names::normalize;

/// The six abilities of a stat block
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    /// All abilities in stat block order
    pub fn all() -> &'static [Ability] {
        &[
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }

    /// Map a raw label from the reference source or a form to an ability
    ///
    /// Accepts the source's French abbreviations and names as well as the
    /// English ones, ignoring case and accents. Returns None for anything
    /// else so callers can report the label.
    pub fn from_label(label: &str) -> Option<Ability> {
        match normalize(label).trim_end_matches(['.', ':']).trim() {
            "for" | "force" | "str" | "strength" => Some(Ability::Strength),
            "dex" | "dexterite" | "dexterity" => Some(Ability::Dexterity),
            "con" | "constitution" => Some(Ability::Constitution),
            "int" | "intelligence" => Some(Ability::Intelligence),
            "sag" | "sagesse" | "wis" | "wisdom" => Some(Ability::Wisdom),
            "cha" | "charisme" | "charisma" => Some(Ability::Charisma),
            _ => None,
        }
    }
}

impl std::fmt::Display for Ability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        };
        write!(f, "{}", s)
    }
}

/// Modifier for a raw score, or None when the score is outside 1..=21
///
/// The table steps every two points: 1 -> -5, 2-3 -> -4, ... 20-21 -> +5.
pub fn table_modifier(score: i64) -> Option<i64> {
    match score {
        1 => Some(-5),
        2..=21 => Some((score - 10).div_euclid(2)),
        _ => None,
    }
}

/// Modifier with the documented fallback of 0 for scores off the table
pub fn modifier(score: i64) -> i64 {
    table_modifier(score).unwrap_or(0)
}

/// "15 (+2)" style display string
pub fn format_score(score: i64) -> String {
    format!("{} ({:+})", score, modifier(score))
}

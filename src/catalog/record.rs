//! Creature record types

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::CatalogError;
use crate::names::normalize;

/// Challenge rating to experience value, for every rating the rules define
const XP_TABLE: &[(f64, u32)] = &[
    (0.0, 10),
    (0.125, 25),
    (0.25, 50),
    (0.5, 100),
    (1.0, 200),
    (2.0, 450),
    (3.0, 700),
    (4.0, 1100),
    (5.0, 1800),
    (6.0, 2300),
    (7.0, 2900),
    (8.0, 3900),
    (9.0, 5000),
    (10.0, 5900),
    (11.0, 7200),
    (12.0, 8400),
    (13.0, 10000),
    (14.0, 11500),
    (15.0, 13000),
    (16.0, 15000),
    (17.0, 18000),
    (18.0, 20000),
    (19.0, 22000),
    (20.0, 25000),
    (21.0, 33000),
    (22.0, 41000),
    (23.0, 50000),
    (24.0, 62000),
    (25.0, 75000),
    (30.0, 155000),
];

/// Creature difficulty rating (non-negative, e.g. 0.125 for "1/8")
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChallengeRating(f64);

impl ChallengeRating {
    /// Create a rating, rejecting negative and non-finite values
    pub fn new(value: f64) -> Option<Self> {
        (value.is_finite() && value >= 0.0).then_some(Self(value))
    }

    /// Raw numeric value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Experience value from the fixed table; ratings outside it are worth 0
    pub fn experience(&self) -> u32 {
        XP_TABLE
            .iter()
            .find(|(cr, _)| (cr - self.0).abs() < 1e-9)
            .map(|(_, xp)| *xp)
            .unwrap_or(0)
    }
}

impl FromStr for ChallengeRating {
    type Err = String;

    /// Parse "3", "0.5" or a fraction like "1/8"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = match s.split_once('/') {
            Some((num, den)) => {
                let num: f64 = num
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid challenge rating: {}", s))?;
                let den: f64 = den
                    .trim()
                    .parse()
                    .map_err(|_| format!("Invalid challenge rating: {}", s))?;
                if den == 0.0 {
                    return Err(format!("Invalid challenge rating: {}", s));
                }
                num / den
            }
            None => s
                .replace(',', ".")
                .parse()
                .map_err(|_| format!("Invalid challenge rating: {}", s))?,
        };
        Self::new(value).ok_or_else(|| format!("Challenge rating must be non-negative: {}", s))
    }
}

impl std::fmt::Display for ChallengeRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            v if (v - 0.125).abs() < 1e-9 => write!(f, "1/8"),
            v if (v - 0.25).abs() < 1e-9 => write!(f, "1/4"),
            v if (v - 0.5).abs() < 1e-9 => write!(f, "1/2"),
            v if v.fract() == 0.0 => write!(f, "{}", v as u64),
            v => write!(f, "{}", v),
        }
    }
}

/// Creature size, with the reference source's tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SizeCategory {
    Tiny,
    Small,
    #[default]
    Medium,
    Large,
    Huge,
    Gargantuan,
}

impl SizeCategory {
    /// The source sorts sizes 1 (tiny) to 6 (gargantuan)
    pub fn from_sort_value(value: i64) -> SizeCategory {
        match value {
            1 => SizeCategory::Tiny,
            2 => SizeCategory::Small,
            3 => SizeCategory::Medium,
            4 => SizeCategory::Large,
            5 => SizeCategory::Huge,
            6 => SizeCategory::Gargantuan,
            _ => SizeCategory::Medium,
        }
    }

    /// Parse a stored token or a sort value, falling back to medium
    pub fn from_token(token: &str) -> SizeCategory {
        let token = token.trim();
        if let Ok(v) = token.parse::<i64>() {
            return Self::from_sort_value(v);
        }
        match token.to_lowercase().as_str() {
            "tp" | "tiny" => SizeCategory::Tiny,
            "p" | "small" => SizeCategory::Small,
            "m" | "medium" => SizeCategory::Medium,
            "g" | "large" => SizeCategory::Large,
            "tg" | "huge" => SizeCategory::Huge,
            "gig" | "gargantuan" => SizeCategory::Gargantuan,
            _ => SizeCategory::Medium,
        }
    }

    /// Token as stored in the catalog
    pub fn token(&self) -> &'static str {
        match self {
            SizeCategory::Tiny => "TP",
            SizeCategory::Small => "P",
            SizeCategory::Medium => "M",
            SizeCategory::Large => "G",
            SizeCategory::Huge => "TG",
            SizeCategory::Gargantuan => "Gig",
        }
    }
}

/// How a record entered the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Origin {
    /// Inserted by a sync from the reference source
    Scraped,
    /// Authored (or edited) by hand
    Manual,
}

impl Origin {
    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Scraped => "scraped",
            Origin::Manual => "manual",
        }
    }

    /// Stored column value; anything unrecognized reads as scraped
    pub fn from_stored(s: &str) -> Origin {
        match s {
            "manual" => Origin::Manual,
            _ => Origin::Scraped,
        }
    }
}

/// The six ability scores, in stat block order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityScores {
    pub strength: i64,
    pub dexterity: i64,
    pub constitution: i64,
    pub intelligence: i64,
    pub wisdom: i64,
    pub charisma: i64,
}

impl AbilityScores {
    pub fn as_array(&self) -> [i64; 6] {
        [
            self.strength,
            self.dexterity,
            self.constitution,
            self.intelligence,
            self.wisdom,
            self.charisma,
        ]
    }
}

impl Default for AbilityScores {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            constitution: 10,
            intelligence: 10,
            wisdom: 10,
            charisma: 10,
        }
    }
}

/// A creature in the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterRecord {
    /// Canonical key derived from the name
    pub normalized_key: String,
    pub name: String,
    pub challenge_rating: ChallengeRating,
    pub creature_type: String,
    pub size: SizeCategory,
    /// Derived from the challenge rating
    pub experience: u32,
    pub origin: Origin,
    pub armor: Option<String>,
    /// Hit point formula, e.g. "15 (2d8 + 6)"
    pub hit_points: Option<String>,
    pub speed: Option<String>,
    pub abilities: Option<AbilityScores>,
    pub skills: Option<String>,
    pub resistances: Option<String>,
    pub senses: Option<String>,
    pub languages: Option<String>,
    pub traits: Option<String>,
    pub actions: Option<String>,
    pub legendary_actions: Option<String>,
}

impl MonsterRecord {
    /// Listing-only record as produced by a sync
    pub fn scraped(
        name: &str,
        challenge_rating: ChallengeRating,
        creature_type: &str,
        size: SizeCategory,
    ) -> Self {
        Self {
            normalized_key: normalize(name),
            name: name.to_string(),
            challenge_rating,
            creature_type: creature_type.to_string(),
            size,
            experience: challenge_rating.experience(),
            origin: Origin::Scraped,
            armor: None,
            hit_points: None,
            speed: None,
            abilities: None,
            skills: None,
            resistances: None,
            senses: None,
            languages: None,
            traits: None,
            actions: None,
            legendary_actions: None,
        }
    }

    /// Whether the record carries its own combat fields
    ///
    /// Records without a hit point formula need a detail fetch to show a
    /// stat block.
    pub fn has_authored_stats(&self) -> bool {
        self.hit_points.is_some()
    }
}

/// Hand-authored creature, with the authoring form's defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MonsterDraft {
    pub name: String,
    pub size: String,
    pub creature_type: String,
    pub challenge_rating: f64,
    pub armor: String,
    pub hit_points: String,
    pub speed: String,
    pub abilities: AbilityScores,
    pub skills: String,
    pub resistances: String,
    pub senses: String,
    pub languages: String,
    pub traits: String,
    pub actions: String,
    pub legendary_actions: String,
}

impl Default for MonsterDraft {
    fn default() -> Self {
        Self {
            name: String::new(),
            size: "M".to_string(),
            creature_type: String::new(),
            challenge_rating: 1.0,
            armor: "10".to_string(),
            hit_points: "10 (2d8 + 2)".to_string(),
            speed: "9 m".to_string(),
            abilities: AbilityScores::default(),
            skills: String::new(),
            resistances: String::new(),
            senses: String::new(),
            languages: String::new(),
            traits: String::new(),
            actions: String::new(),
            legendary_actions: String::new(),
        }
    }
}

impl MonsterDraft {
    /// Validate and turn the draft into a manual record
    pub fn into_record(self) -> Result<MonsterRecord, CatalogError> {
        let name = self.name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogError::EmptyName);
        }
        if normalize(&name).is_empty() {
            return Err(CatalogError::EmptyKey(name));
        }

        let challenge_rating = ChallengeRating::new(self.challenge_rating)
            .ok_or(CatalogError::InvalidChallengeRating(self.challenge_rating))?;

        for score in self.abilities.as_array() {
            if !(1..=30).contains(&score) {
                return Err(CatalogError::AbilityOutOfRange(score));
            }
        }

        let creature_type = match self.creature_type.trim() {
            "" => "Creature".to_string(),
            t => t.to_string(),
        };
        let languages = match self.languages.trim() {
            "" => "—".to_string(),
            l => l.to_string(),
        };

        let mut record = MonsterRecord::scraped(
            &name,
            challenge_rating,
            &creature_type,
            SizeCategory::from_token(&self.size),
        );
        record.origin = Origin::Manual;
        record.armor = Some(self.armor.trim().to_string());
        record.hit_points = Some(self.hit_points.trim().to_string());
        record.speed = Some(self.speed.trim().to_string());
        record.abilities = Some(self.abilities);
        record.skills = Some(self.skills.trim().to_string());
        record.resistances = Some(self.resistances.trim().to_string());
        record.senses = Some(self.senses.trim().to_string());
        record.languages = Some(languages);
        record.traits = Some(self.traits.trim().to_string());
        record.actions = Some(self.actions.trim().to_string());
        record.legendary_actions = Some(self.legendary_actions.trim().to_string());
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cr(s: &str) -> ChallengeRating {
        s.parse().unwrap()
    }

    #[test]
    fn test_experience_table() {
        assert_eq!(cr("0").experience(), 10);
        assert_eq!(cr("1/8").experience(), 25);
        assert_eq!(cr("0.25").experience(), 50);
        assert_eq!(cr("1/2").experience(), 100);
        assert_eq!(cr("5").experience(), 1800);
        assert_eq!(cr("20").experience(), 25000);
        assert_eq!(cr("25").experience(), 75000);
        assert_eq!(cr("30").experience(), 155000);
    }

    #[test]
    fn test_experience_undocumented_rating() {
        assert_eq!(cr("26").experience(), 0);
        assert_eq!(cr("29").experience(), 0);
        assert_eq!(cr("0.75").experience(), 0);
    }

    #[test]
    fn test_challenge_rating_parsing() {
        assert_eq!(cr("1/8").value(), 0.125);
        assert_eq!(cr(" 1/4 ").value(), 0.25);
        assert_eq!(cr("2,5").value(), 2.5);
        assert!("-1".parse::<ChallengeRating>().is_err());
        assert!("1/0".parse::<ChallengeRating>().is_err());
        assert!("abc".parse::<ChallengeRating>().is_err());
    }

    #[test]
    fn test_challenge_rating_display() {
        assert_eq!(cr("1/8").to_string(), "1/8");
        assert_eq!(cr("0.5").to_string(), "1/2");
        assert_eq!(cr("17").to_string(), "17");
        assert_eq!(cr("0").to_string(), "0");
    }

    #[test]
    fn test_size_tokens() {
        assert_eq!(SizeCategory::from_sort_value(1), SizeCategory::Tiny);
        assert_eq!(SizeCategory::from_sort_value(6), SizeCategory::Gargantuan);
        assert_eq!(SizeCategory::from_sort_value(9), SizeCategory::Medium);
        assert_eq!(SizeCategory::from_token("TG"), SizeCategory::Huge);
        assert_eq!(SizeCategory::from_token("4"), SizeCategory::Large);
        assert_eq!(SizeCategory::from_token("??"), SizeCategory::Medium);
        assert_eq!(SizeCategory::Gargantuan.token(), "Gig");
    }

    #[test]
    fn test_draft_defaults() {
        let record = MonsterDraft {
            name: "  Gardien d'os ".to_string(),
            ..Default::default()
        }
        .into_record()
        .unwrap();

        assert_eq!(record.name, "Gardien d'os");
        assert_eq!(record.normalized_key, "gardien d'os");
        assert_eq!(record.origin, Origin::Manual);
        assert_eq!(record.creature_type, "Creature");
        assert_eq!(record.languages.as_deref(), Some("—"));
        assert_eq!(record.hit_points.as_deref(), Some("10 (2d8 + 2)"));
        assert_eq!(record.experience, 200);
        assert!(record.has_authored_stats());
    }

    #[test]
    fn test_draft_validation() {
        let empty = MonsterDraft::default().into_record();
        assert!(matches!(empty, Err(CatalogError::EmptyName)));

        let mut draft = MonsterDraft {
            name: "Golem".to_string(),
            ..Default::default()
        };
        draft.abilities.strength = 31;
        assert!(matches!(
            draft.into_record(),
            Err(CatalogError::AbilityOutOfRange(31))
        ));
    }

    #[test]
    fn test_draft_needs_lookup_key() {
        for name in ["竜", "鬼", " ドラゴン "] {
            let draft = MonsterDraft {
                name: name.to_string(),
                ..Default::default()
            };
            assert!(
                matches!(draft.into_record(), Err(CatalogError::EmptyKey(_))),
                "{name:?} was accepted"
            );
        }
    }

    #[test]
    fn test_origin_from_stored() {
        assert_eq!(Origin::from_stored("manual"), Origin::Manual);
        assert_eq!(Origin::from_stored(Origin::Scraped.as_str()), Origin::Scraped);
        assert_eq!(Origin::from_stored("unknown"), Origin::Scraped);
    }
}

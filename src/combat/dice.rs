//! Dice notation
//!
//! Parses expressions like "2d8+6", "1d20", "4d6 - 2" as they appear in
//! hit point formulas, and rolls the d20 used for initiative.

use rand::Rng;
use std::str::FromStr;

/// A parsed dice expression
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceRoll {
    /// Number of dice to roll
    pub count: u32,
    /// Number of sides per die
    pub sides: u32,
    /// Flat modifier added after the dice
    pub modifier: i32,
}

impl DiceRoll {
    /// Create a new dice roll
    pub fn new(count: u32, sides: u32, modifier: i32) -> Self {
        Self {
            count,
            sides,
            modifier,
        }
    }

    /// Expected average, rounded down (the convention printed in stat blocks)
    pub fn average(&self) -> i32 {
        let doubled = self.count as i64 * (self.sides as i64 + 1) + 2 * self.modifier as i64;
        doubled.div_euclid(2) as i32
    }
}

impl FromStr for DiceRoll {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_dice(s)
    }
}

impl std::fmt::Display for DiceRoll {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.modifier > 0 {
            write!(f, "{}d{}+{}", self.count, self.sides, self.modifier)
        } else if self.modifier < 0 {
            write!(f, "{}d{}{}", self.count, self.sides, self.modifier)
        } else {
            write!(f, "{}d{}", self.count, self.sides)
        }
    }
}

/// Parse a dice expression like "2d8 + 6"
///
/// Whitespace anywhere in the expression is ignored.
pub fn parse_dice(notation: &str) -> Result<DiceRoll, String> {
    let notation: String = notation
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase();

    let d_pos = notation.find('d').ok_or("Missing 'd' in dice notation")?;

    let count_str = &notation[..d_pos];
    let count: u32 = if count_str.is_empty() {
        1 // "d6" means "1d6"
    } else {
        count_str
            .parse()
            .map_err(|_| format!("Invalid dice count: {}", count_str))?
    };

    if count == 0 {
        return Err("Dice count must be at least 1".to_string());
    }

    let rest = &notation[d_pos + 1..];

    let (sides_str, modifier) = if let Some(plus_pos) = rest.find('+') {
        let mod_str = &rest[plus_pos + 1..];
        let modifier: i32 = mod_str
            .parse()
            .map_err(|_| format!("Invalid modifier: {}", mod_str))?;
        (&rest[..plus_pos], modifier)
    } else if let Some(minus_pos) = rest.rfind('-') {
        if minus_pos == 0 {
            (rest, 0)
        } else {
            let mod_str = &rest[minus_pos..]; // keeps the sign
            let modifier: i32 = mod_str
                .parse()
                .map_err(|_| format!("Invalid modifier: {}", mod_str))?;
            (&rest[..minus_pos], modifier)
        }
    } else {
        (rest, 0)
    };

    let sides: u32 = sides_str
        .parse()
        .map_err(|_| format!("Invalid die sides: {}", sides_str))?;

    if sides == 0 {
        return Err("Die sides must be at least 1".to_string());
    }

    Ok(DiceRoll {
        count,
        sides,
        modifier,
    })
}

/// Roll a single d20
pub fn roll_d20() -> i32 {
    rand::rng().random_range(1..=20)
}

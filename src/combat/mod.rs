//! Combat module
//!
//! Implements the table-side encounter tracker:
//! - Dice notation (e.g., "2d8+6") and the initiative d20
//! - Named conditions with their rules text
//! - Initiative order, turns and rounds
//! - Hit point, damage and healing bookkeeping
//! - The end-of-session battle report

mod conditions;
mod dice;
mod report;
mod tracker;

pub use conditions::Condition;
pub use dice::{parse_dice, roll_d20, DiceRoll};
pub use report::{BattleReport, CombatantReport};
pub use tracker::{
    default_party_name, CombatStats, CombatTracker, CombatantEntry, CombatantKind, CombatantSeed,
    HealthBand, PartyConfig, TrackerError, TrackerPhase, PARTY_NAME_PREFIX,
};

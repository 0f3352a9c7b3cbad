//! Turning creature selections into combatants

use serde::Serialize;
use thiserror::Error;

use crate::catalog::MonsterRecord;
use crate::combat::CombatantSeed;
use crate::statblock::{parse, RawFields};

#[derive(Debug, Error, PartialEq)]
pub enum RosterError {
    #[error("quantity for {0} must be at least 1")]
    ZeroQuantity(String),

    #[error("no creature selected")]
    NoSelections,

    #[error("no selection at position {0}")]
    NoSuchSelection(usize),
}

/// A creature and how many of it join the encounter
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    pub record: MonsterRecord,
    pub quantity: u32,
}

impl Selection {
    pub fn new(record: MonsterRecord, quantity: u32) -> Result<Self, RosterError> {
        if quantity == 0 {
            return Err(RosterError::ZeroQuantity(record.name));
        }
        Ok(Self { record, quantity })
    }

    pub fn experience(&self) -> u64 {
        self.record.experience as u64 * self.quantity as u64
    }

    /// e.g. "2x Gobelin (CR 1/4, 100 XP)"
    pub fn summary_line(&self) -> String {
        format!(
            "{}x {} (CR {}, {} XP)",
            self.quantity,
            self.record.name,
            self.record.challenge_rating,
            self.experience()
        )
    }
}

/// Combatant seeds for every creature instance, plus the encounter's worth
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Roster {
    pub seeds: Vec<CombatantSeed>,
    pub total_xp: u64,
}

pub fn total_experience(selections: &[Selection]) -> u64 {
    selections.iter().map(Selection::experience).sum()
}

/// Expand selections into one seed per creature instance
///
/// `hit_points` is asked once per instance. A zero answer becomes 1 so no
/// creature enters combat already down. Instances are named "{name} {n}"
/// with `n` counting from 1 within each selection.
pub fn build<F>(selections: &[Selection], mut hit_points: F) -> Roster
where
    F: FnMut(&MonsterRecord) -> u32,
{
    let mut seeds = Vec::new();
    for selection in selections {
        let record = &selection.record;
        for i in 0..selection.quantity {
            let max_hp = hit_points(record).max(1);
            seeds.push(CombatantSeed {
                display_name: format!("{} {}", record.name, i + 1),
                monster_name: record.name.clone(),
                max_hp,
            });
        }
    }

    Roster {
        seeds,
        total_xp: total_experience(selections),
    }
}

/// Build using only the records' own fields
///
/// Listing-only records have no formula and start at 1 hit point.
pub fn build_from_records(selections: &[Selection]) -> Roster {
    build(selections, |record| parse(RawFields::Manual(record)).average_hp)
}

//! Combat tracker
//!
//! Owns the live state of one encounter:
//! - the combatants, their hit points, conditions and concentration
//! - the initiative order and the turn/round cursor
//! - running damage and healing totals for the battle report
//!
//! Phases run Setup -> InitiativeEntry -> InCombat. `reset` returns to
//! Setup from anywhere.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::conditions::Condition;
use super::dice::roll_d20;
use super::report::BattleReport;

/// Default party member names are this prefix plus the slot number
pub const PARTY_NAME_PREFIX: &str = "Party-member";

/// Default name of a party slot (1-based)
pub fn default_party_name(slot: usize) -> String {
    format!("{} {}", PARTY_NAME_PREFIX, slot)
}

/// Tracker errors
///
/// Every error leaves the tracker exactly as it was.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrackerError {
    #[error("party size must be at least 1")]
    EmptyParty,

    #[error("no creatures selected")]
    NoCreatures,

    #[error("not allowed during {0:?}")]
    WrongPhase(TrackerPhase),

    #[error("no combatant at index {0}")]
    NoSuchCombatant(usize),

    #[error("name cannot be empty")]
    EmptyName,

    #[error("'{0}' is the default name of another party member")]
    ReservedName(String),

    #[error("maximum hit points cannot be negative: {0}")]
    NegativeMaxHitPoints(i32),
}

/// Tracker lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerPhase {
    /// Roster being assembled, no combatants yet
    Setup,
    /// Combatants exist, initiative scores editable
    InitiativeEntry,
    /// Order fixed, turn cursor active
    InCombat,
}

/// Party settings used when an encounter starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartyConfig {
    pub size: usize,
    /// Starting and maximum hit points of each party member
    pub hit_points: i32,
}

impl Default for PartyConfig {
    fn default() -> Self {
        Self {
            size: 4,
            hit_points: 100,
        }
    }
}

/// One creature instance ready to enter the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantSeed {
    pub display_name: String,
    pub monster_name: String,
    /// Always at least 1
    pub max_hp: u32,
}

/// What a combatant stands for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CombatantKind {
    /// A party slot, 1-based
    PartyMember { slot: usize },
    /// An instance of a catalog creature
    Creature { monster_name: String },
}

/// Running totals for the battle report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatStats {
    pub damage_dealt: u32,
    pub damage_taken: u32,
    pub healing_done: u32,
}

/// Coarse hit point state for display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthBand {
    /// Above half
    Healthy,
    /// Above a quarter
    Wounded,
    Critical,
}

/// One live participant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatantEntry {
    pub id: Uuid,
    pub display_name: String,
    pub kind: CombatantKind,
    pub initiative: i32,
    /// Always within 0..=max_hp
    pub current_hp: i32,
    pub max_hp: i32,
    pub conditions: BTreeSet<Condition>,
    pub concentrating: bool,
    pub stats: CombatStats,
}

impl CombatantEntry {
    fn new(display_name: String, kind: CombatantKind, hp: i32) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name,
            kind,
            initiative: 0,
            current_hp: hp,
            max_hp: hp,
            conditions: BTreeSet::new(),
            concentrating: false,
            stats: CombatStats::default(),
        }
    }

    /// Party member in `slot` (1-based) at full health
    pub fn party_member(slot: usize, hit_points: i32) -> Self {
        Self::new(
            default_party_name(slot),
            CombatantKind::PartyMember { slot },
            hit_points.max(0),
        )
    }

    /// Creature instance at full health
    pub fn creature(seed: &CombatantSeed) -> Self {
        let hp = i32::try_from(seed.max_hp.max(1)).unwrap_or(i32::MAX);
        Self::new(
            seed.display_name.clone(),
            CombatantKind::Creature {
                monster_name: seed.monster_name.clone(),
            },
            hp,
        )
    }

    pub fn is_party_member(&self) -> bool {
        matches!(self.kind, CombatantKind::PartyMember { .. })
    }

    /// Catalog creature this entry is an instance of
    pub fn monster_name(&self) -> Option<&str> {
        match &self.kind {
            CombatantKind::Creature { monster_name } => Some(monster_name),
            CombatantKind::PartyMember { .. } => None,
        }
    }

    pub fn is_down(&self) -> bool {
        self.current_hp <= 0
    }

    /// Lose hit points, floored at 0 (returns hit points actually lost)
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let actual = amount.max(0).min(self.current_hp);
        self.current_hp -= actual;
        actual
    }

    /// Heal (cannot exceed max_hp)
    pub fn heal(&mut self, amount: i32) -> i32 {
        let actual = amount.max(0).min(self.max_hp - self.current_hp);
        self.current_hp += actual;
        actual
    }

    pub fn health_band(&self) -> HealthBand {
        if self.max_hp <= 0 {
            return HealthBand::Critical;
        }
        let percent = self.current_hp as f64 * 100.0 / self.max_hp as f64;
        if percent > 50.0 {
            HealthBand::Healthy
        } else if percent > 25.0 {
            HealthBand::Wounded
        } else {
            HealthBand::Critical
        }
    }
}

/// Live encounter state machine
#[derive(Debug, Clone)]
pub struct CombatTracker {
    phase: TrackerPhase,
    party_size: usize,
    entries: Vec<CombatantEntry>,
    current_turn: usize,
    round_count: u32,
}

impl Default for CombatTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl CombatTracker {
    pub fn new() -> Self {
        Self {
            phase: TrackerPhase::Setup,
            party_size: 0,
            entries: Vec::new(),
            current_turn: 0,
            round_count: 0,
        }
    }

    pub fn phase(&self) -> TrackerPhase {
        self.phase
    }

    pub fn entries(&self) -> &[CombatantEntry] {
        &self.entries
    }

    pub fn entry(&self, index: usize) -> Option<&CombatantEntry> {
        self.entries.get(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn party_size(&self) -> usize {
        self.party_size
    }

    pub fn current_turn(&self) -> usize {
        self.current_turn
    }

    pub fn round_count(&self) -> u32 {
        self.round_count
    }

    /// Whose turn it is, once in combat
    pub fn current(&self) -> Option<&CombatantEntry> {
        match self.phase {
            TrackerPhase::InCombat => self.entries.get(self.current_turn),
            _ => None,
        }
    }

    /// Index of the first combatant with this display name
    pub fn find(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.display_name == name)
    }

    fn require_phase(&self, allowed: &[TrackerPhase]) -> Result<(), TrackerError> {
        if allowed.contains(&self.phase) {
            Ok(())
        } else {
            Err(TrackerError::WrongPhase(self.phase))
        }
    }

    fn require_started(&self) -> Result<(), TrackerError> {
        self.require_phase(&[TrackerPhase::InitiativeEntry, TrackerPhase::InCombat])
    }

    fn entry_mut(&mut self, index: usize) -> Result<&mut CombatantEntry, TrackerError> {
        self.entries
            .get_mut(index)
            .ok_or(TrackerError::NoSuchCombatant(index))
    }

    /// Start an encounter: party slots first, then one entry per seed
    pub fn start(&mut self, party: PartyConfig, seeds: &[CombatantSeed]) -> Result<(), TrackerError> {
        self.require_phase(&[TrackerPhase::Setup])?;
        if seeds.is_empty() {
            return Err(TrackerError::NoCreatures);
        }
        if party.size < 1 {
            return Err(TrackerError::EmptyParty);
        }

        self.entries = (1..=party.size)
            .map(|slot| CombatantEntry::party_member(slot, party.hit_points))
            .chain(seeds.iter().map(CombatantEntry::creature))
            .collect();
        self.party_size = party.size;
        self.current_turn = 0;
        self.round_count = 0;
        self.phase = TrackerPhase::InitiativeEntry;

        info!(
            "Encounter started with {} party members and {} creatures",
            party.size,
            seeds.len()
        );
        Ok(())
    }

    pub fn set_initiative(&mut self, index: usize, score: i32) -> Result<(), TrackerError> {
        self.require_started()?;
        self.entry_mut(index)?.initiative = score;
        Ok(())
    }

    /// Roll a d20 for one combatant's initiative
    pub fn roll_initiative(&mut self, index: usize) -> Result<i32, TrackerError> {
        self.require_started()?;
        let roll = roll_d20();
        let entry = self.entry_mut(index)?;
        entry.initiative = roll;
        debug!("{} rolled {} for initiative", entry.display_name, roll);
        Ok(roll)
    }

    /// Fix the turn order: initiative descending, ties in insertion order
    pub fn confirm(&mut self) -> Result<(), TrackerError> {
        self.require_started()?;
        self.entries.sort_by(|a, b| b.initiative.cmp(&a.initiative));
        self.current_turn = 0;
        self.round_count = 0;
        self.phase = TrackerPhase::InCombat;
        debug!(
            "Initiative order: {}",
            self.entries
                .iter()
                .map(|e| format!("{} ({})", e.display_name, e.initiative))
                .collect::<Vec<_>>()
                .join(", ")
        );
        Ok(())
    }

    /// Move to the next combatant; wrapping to the top starts a new round
    pub fn advance_turn(&mut self) -> Result<usize, TrackerError> {
        self.require_phase(&[TrackerPhase::InCombat])?;
        self.current_turn = (self.current_turn + 1) % self.entries.len();
        if self.current_turn == 0 {
            self.round_count += 1;
            debug!("Round {} begins", self.round_count);
        }
        Ok(self.current_turn)
    }

    /// Undo `advance_turn`, including the round increment on a wrap
    pub fn retreat_turn(&mut self) -> Result<usize, TrackerError> {
        self.require_phase(&[TrackerPhase::InCombat])?;
        let n = self.entries.len();
        self.current_turn = (self.current_turn + n - 1) % n;
        if self.current_turn == n - 1 && self.round_count > 0 {
            self.round_count -= 1;
        }
        Ok(self.current_turn)
    }

    /// Resolve the combatant a damage or healing action lands on
    fn resolve_target(&self, actor: usize, target: Option<&str>) -> Option<usize> {
        let name = target.map(str::trim).filter(|t| !t.is_empty())?;
        let found = self.find(name);
        if found.is_none() {
            debug!("No combatant named {}, applying to {}", name, self.entries[actor].display_name);
        }
        found
    }

    /// Apply damage from `actor`
    ///
    /// Negative amounts count as 0. With a target, the target takes the
    /// damage and the actor is credited with dealing it. Without one the
    /// actor takes it and no damage is credited as dealt. Returns the index
    /// of the combatant that took the damage.
    pub fn apply_damage(
        &mut self,
        actor: usize,
        amount: i32,
        target: Option<&str>,
    ) -> Result<usize, TrackerError> {
        self.require_started()?;
        if actor >= self.entries.len() {
            return Err(TrackerError::NoSuchCombatant(actor));
        }
        let amount = amount.max(0);

        let recipient = match self.resolve_target(actor, target) {
            Some(index) => {
                let stats = &mut self.entries[actor].stats;
                stats.damage_dealt = stats.damage_dealt.saturating_add(amount as u32);
                index
            }
            None => actor,
        };

        let entry = &mut self.entries[recipient];
        entry.take_damage(amount);
        entry.stats.damage_taken = entry.stats.damage_taken.saturating_add(amount as u32);
        debug!(
            "{} takes {} damage ({}/{})",
            entry.display_name, amount, entry.current_hp, entry.max_hp
        );
        Ok(recipient)
    }

    /// Apply healing from `actor`
    ///
    /// Capped at the recipient's maximum. The healing is always credited to
    /// the actor, whoever receives it.
    pub fn apply_healing(
        &mut self,
        actor: usize,
        amount: i32,
        target: Option<&str>,
    ) -> Result<usize, TrackerError> {
        self.require_started()?;
        if actor >= self.entries.len() {
            return Err(TrackerError::NoSuchCombatant(actor));
        }
        let amount = amount.max(0);

        let recipient = self.resolve_target(actor, target).unwrap_or(actor);
        let stats = &mut self.entries[actor].stats;
        stats.healing_done = stats.healing_done.saturating_add(amount as u32);

        let entry = &mut self.entries[recipient];
        entry.heal(amount);
        debug!(
            "{} healed by {} ({}/{})",
            entry.display_name, amount, entry.current_hp, entry.max_hp
        );
        Ok(recipient)
    }

    /// Add the condition if absent, remove it if present
    ///
    /// Returns whether the combatant now has it.
    pub fn toggle_condition(&mut self, index: usize, condition: Condition) -> Result<bool, TrackerError> {
        self.require_started()?;
        let entry = self.entry_mut(index)?;
        let active = if entry.conditions.remove(&condition) {
            false
        } else {
            entry.conditions.insert(condition);
            true
        };
        Ok(active)
    }

    pub fn clear_conditions(&mut self, index: usize) -> Result<(), TrackerError> {
        self.require_started()?;
        self.entry_mut(index)?.conditions.clear();
        Ok(())
    }

    /// Flip concentration, returning the new state
    pub fn toggle_concentration(&mut self, index: usize) -> Result<bool, TrackerError> {
        self.require_started()?;
        let entry = self.entry_mut(index)?;
        entry.concentrating = !entry.concentrating;
        Ok(entry.concentrating)
    }

    /// Edit hit points directly; current is clamped into 0..=max
    pub fn set_hit_points(&mut self, index: usize, current: i32, max: i32) -> Result<(), TrackerError> {
        self.require_started()?;
        if max < 0 {
            return Err(TrackerError::NegativeMaxHitPoints(max));
        }
        let entry = self.entry_mut(index)?;
        entry.max_hp = max;
        entry.current_hp = current.clamp(0, max);
        Ok(())
    }

    /// Rename a combatant
    ///
    /// A default party name can only be taken by the slot it belongs to.
    pub fn rename(&mut self, index: usize, new_name: &str) -> Result<(), TrackerError> {
        self.require_started()?;
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(TrackerError::EmptyName);
        }

        let party_size = self.party_size;
        let entry = self.entry_mut(index)?;
        let own_default = match entry.kind {
            CombatantKind::PartyMember { slot } => Some(default_party_name(slot)),
            CombatantKind::Creature { .. } => None,
        };
        let reserved = (1..=party_size).any(|slot| default_party_name(slot) == new_name);
        if reserved && entry.display_name != new_name && own_default.as_deref() != Some(new_name) {
            return Err(TrackerError::ReservedName(new_name.to_string()));
        }

        debug!("Renamed {} to {}", entry.display_name, new_name);
        entry.display_name = new_name.to_string();
        Ok(())
    }

    /// Discard all combatants and return to Setup
    pub fn reset(&mut self) {
        *self = Self::new();
        info!("Tracker reset");
    }

    /// Session summary of damage and healing
    pub fn battle_report(&self) -> BattleReport {
        BattleReport::from_entries(self.round_count, &self.entries)
    }
}

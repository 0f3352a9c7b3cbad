//! One table session: party, creature selections and the live tracker

use thiserror::Error;
use tracing::{info, warn};

use super::roster::{self, Roster, RosterError, Selection};
use crate::catalog::{MonsterCatalog, MonsterRecord};
use crate::combat::{CombatTracker, PartyConfig, TrackerError};
use crate::source::MonsterSource;
use crate::statblock::ParsedStatBlock;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Roster(#[from] RosterError),

    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

#[derive(Debug, Default)]
pub struct EncounterSession {
    pub party: PartyConfig,
    selections: Vec<Selection>,
    tracker: CombatTracker,
}

impl EncounterSession {
    pub fn new(party: PartyConfig) -> Self {
        Self {
            party,
            selections: Vec::new(),
            tracker: CombatTracker::new(),
        }
    }

    pub fn selections(&self) -> &[Selection] {
        &self.selections
    }

    pub fn tracker(&self) -> &CombatTracker {
        &self.tracker
    }

    pub fn tracker_mut(&mut self) -> &mut CombatTracker {
        &mut self.tracker
    }

    /// Queue `quantity` copies of a creature
    pub fn add(&mut self, record: MonsterRecord, quantity: u32) -> Result<(), RosterError> {
        self.selections.push(Selection::new(record, quantity)?);
        Ok(())
    }

    pub fn remove(&mut self, position: usize) -> Result<Selection, RosterError> {
        if position >= self.selections.len() {
            return Err(RosterError::NoSuchSelection(position));
        }
        Ok(self.selections.remove(position))
    }

    pub fn clear(&mut self) {
        self.selections.clear();
    }

    pub fn summary_lines(&self) -> Vec<String> {
        self.selections.iter().map(Selection::summary_line).collect()
    }

    pub fn total_xp(&self) -> u64 {
        roster::total_experience(&self.selections)
    }

    /// Build the roster and open initiative entry
    ///
    /// Hit points come from each creature's stat block, read once per
    /// selection and shared by its instances.
    pub async fn start<S: MonsterSource>(
        &mut self,
        catalog: &MonsterCatalog,
        source: &S,
    ) -> Result<Roster, SessionError> {
        if self.selections.is_empty() {
            return Err(RosterError::NoSelections.into());
        }
        if self.party.size < 1 {
            return Err(TrackerError::EmptyParty.into());
        }

        let mut hit_points = Vec::with_capacity(self.selections.len());
        for selection in &self.selections {
            let block = catalog.stat_block(&selection.record, source).await;
            if block.is_error() {
                warn!(
                    "No stat block for {}, starting at {} HP",
                    selection.record.name, block.average_hp
                );
            }
            info!("Setting HP for {}: {}", selection.record.name, block.average_hp);
            hit_points.push((selection.record.name.clone(), block.average_hp));
        }

        let roster = roster::build(&self.selections, |record| {
            hit_points
                .iter()
                .find(|(name, _)| *name == record.name)
                .map(|(_, hp)| *hp)
                .unwrap_or(1)
        });

        self.tracker.start(self.party, &roster.seeds)?;
        info!(
            "Encounter started: {} party members, {} creatures, {} XP",
            self.party.size,
            roster.seeds.len(),
            roster.total_xp
        );
        Ok(roster)
    }

    /// Drop all combat state and go back to choosing creatures
    ///
    /// Selections are kept; cached stat blocks are not.
    pub async fn return_to_configuration(&mut self, catalog: &MonsterCatalog) {
        self.tracker.reset();
        catalog.clear_cache().await;
    }

    /// Stat block of the creature behind a combatant, None for party members
    pub async fn combatant_summary<S: MonsterSource>(
        &self,
        index: usize,
        catalog: &MonsterCatalog,
        source: &S,
    ) -> Option<ParsedStatBlock> {
        let monster_name = self.tracker.entry(index)?.monster_name()?;
        let record = self
            .selections
            .iter()
            .map(|s| &s.record)
            .find(|r| r.name == monster_name)?;
        Some(catalog.stat_block(record, source).await)
    }
}

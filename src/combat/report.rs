//! Battle report

use serde::Serialize;

use super::tracker::{CombatStats, CombatantEntry};

/// One combatant's line in the report
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CombatantReport {
    pub name: String,
    pub alive: bool,
    pub current_hp: i32,
    pub max_hp: i32,
    pub stats: CombatStats,
}

/// Damage and healing summary of the session so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleReport {
    pub round: u32,
    pub total_damage_dealt: u64,
    pub total_damage_taken: u64,
    pub total_healing: u64,
    pub party: Vec<CombatantReport>,
    /// Everyone who is not a party member
    pub others: Vec<CombatantReport>,
}

impl BattleReport {
    pub fn from_entries(round: u32, entries: &[CombatantEntry]) -> Self {
        let line = |e: &CombatantEntry| CombatantReport {
            name: e.display_name.clone(),
            alive: e.current_hp > 0,
            current_hp: e.current_hp,
            max_hp: e.max_hp,
            stats: e.stats,
        };

        Self {
            round,
            total_damage_dealt: entries.iter().map(|e| e.stats.damage_dealt as u64).sum(),
            total_damage_taken: entries.iter().map(|e| e.stats.damage_taken as u64).sum(),
            total_healing: entries.iter().map(|e| e.stats.healing_done as u64).sum(),
            party: entries.iter().filter(|e| e.is_party_member()).map(line).collect(),
            others: entries.iter().filter(|e| !e.is_party_member()).map(line).collect(),
        }
    }

    /// Combatants still standing on each side
    pub fn survivors(&self) -> (usize, usize) {
        (
            self.party.iter().filter(|c| c.alive).count(),
            self.others.iter().filter(|c| c.alive).count(),
        )
    }
}

fn write_section(
    f: &mut std::fmt::Formatter<'_>,
    title: &str,
    empty: &str,
    down_label: &str,
    lines: &[CombatantReport],
) -> std::fmt::Result {
    writeln!(f, "{}", title)?;
    if lines.is_empty() {
        return writeln!(f, "  {}", empty);
    }
    for c in lines {
        let status = if c.alive { "alive" } else { down_label };
        writeln!(f, "  {} ({}, {}/{} HP)", c.name, status, c.current_hp, c.max_hp)?;
        writeln!(
            f,
            "    dealt {}  taken {}  healed {}",
            c.stats.damage_dealt, c.stats.damage_taken, c.stats.healing_done
        )?;
    }
    Ok(())
}

impl std::fmt::Display for BattleReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Battle report - round {}", self.round)?;
        writeln!(f, "Total damage dealt: {}", self.total_damage_dealt)?;
        writeln!(f, "Total damage taken: {}", self.total_damage_taken)?;
        writeln!(f, "Total healing: {}", self.total_healing)?;
        writeln!(f)?;
        write_section(f, "Party", "No party members in the battle.", "down", &self.party)?;
        writeln!(f)?;
        write_section(f, "Creatures", "No creatures in the battle.", "dead", &self.others)
    }
}

//! Encounter building
//!
//! Selections of catalog creatures become combatant seeds with hit points
//! and a total experience value, and a session carries them into the
//! combat tracker.

mod roster;
mod session;

pub use roster::{build, build_from_records, total_experience, Roster, RosterError, Selection};
pub use session::{EncounterSession, SessionError};

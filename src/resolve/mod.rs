//! Turn resolution.
//!
//! Dice combat and the phase state machine that gates which actions a
//! player may take.

pub mod combat;
pub mod phase;

pub use combat::{
    resolve_attack, CombatOutcome, CombatRules, DiceSource, LoadedDice, RandomDice, DIE_FACES,
};
pub use phase::{Advance, Phase, TurnState, DEFAULT_PHASE_DEBOUNCE};

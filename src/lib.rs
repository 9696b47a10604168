//! Conquest rules engine library.
//!
//! Exposes the territory graph, ownership ledger, dice combat, turn phases,
//! and the game session that ties them together for a presentation layer.

pub mod board;
pub mod config;
pub mod error;
pub mod intent;
pub mod resolve;
pub mod session;

pub use board::{Ledger, PlayerId, Seat, TerritoryGraph, TerritoryId, WorldData, DEFAULT_LINKS};
pub use config::RulesConfig;
pub use error::GameError;
pub use intent::{ActionKind, Intent};
pub use resolve::{resolve_attack, CombatOutcome, DiceSource, LoadedDice, Phase, RandomDice};
pub use session::{ActionOutcome, AttackOutcome, Session, SessionView};

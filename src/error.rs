//! Error type for every rules operation.
//!
//! All variants except `DataIntegrity` are recoverable at the action
//! boundary: a rejected action leaves the session untouched and the caller
//! decides how to surface the message. `DataIntegrity` is only produced while
//! loading world data or configuration, before a session exists.

use crate::board::{PlayerId, TerritoryId};
use crate::intent::ActionKind;
use crate::resolve::Phase;

/// Errors that can occur while building a world or applying an action.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("unknown territory: '{0}'")]
    UnknownTerritory(String),

    #[error("unknown player: {0}")]
    UnknownPlayer(PlayerId),

    #[error("data integrity error: {0}")]
    DataIntegrity(String),

    #[error("territory {0} already has an owner")]
    AlreadyOwned(TerritoryId),

    #[error("territory {0} has no owner")]
    NotOwned(TerritoryId),

    #[error("territory {territory} holds {armies} armies, cannot apply {delta}")]
    NegativeArmyCount {
        territory: TerritoryId,
        armies: u32,
        delta: i64,
    },

    #[error("territory {territory} cannot change hands with {remaining} armies")]
    InvalidTransfer { territory: TerritoryId, remaining: u32 },

    #[error("{armies} armies available, at least {required} required")]
    InsufficientArmies { armies: u32, required: u32 },

    #[error("{action} is not allowed during {phase}")]
    WrongPhase { action: ActionKind, phase: Phase },

    #[error("it is {acting}'s turn, not {player}'s")]
    NotYourTurn { player: PlayerId, acting: PlayerId },

    #[error("territories {from} and {to} are not adjacent")]
    NotAdjacent { from: TerritoryId, to: TerritoryId },

    #[error("territory {territory} is not owned by {player}")]
    NotOwnedBy {
        territory: TerritoryId,
        player: PlayerId,
    },

    #[error("territory {0} belongs to the attacker")]
    OwnTerritory(TerritoryId),

    #[error("territory {territory} is outside the frontier of {player}")]
    OutsideFrontier {
        territory: TerritoryId,
        player: PlayerId,
    },

    #[error("{0} has no armies left to place")]
    NoReinforcements(PlayerId),

    #[error("a move must carry at least one army")]
    EmptyMove,

    #[error("invalid dice: {0}")]
    InvalidDice(String),

    #[error("the game is over, {0} owns every territory")]
    GameOver(PlayerId),
}

impl GameError {
    /// Returns true for errors that abort world construction.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GameError::DataIntegrity(_))
    }
}

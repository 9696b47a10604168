//! Player intents.
//!
//! The presentation layer resolves raw pointer and key events into these
//! values and hands them to `Session::apply`. The engine never polls an input
//! device itself.
//!
//! JSON form: `{"kind": "attack", "player": 0, "from": 4, "to": 7}`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::board::{PlayerId, TerritoryId};

/// The kind of action a player can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    PlaceArmy,
    MoveUnits,
    Attack,
    AdvancePhase,
}

impl ActionKind {
    pub const fn name(self) -> &'static str {
        match self {
            ActionKind::PlaceArmy => "place army",
            ActionKind::MoveUnits => "move units",
            ActionKind::Attack => "attack",
            ActionKind::AdvancePhase => "finish phase",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single player request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Add one army to a territory on the player's frontier.
    PlaceArmy {
        player: PlayerId,
        territory: TerritoryId,
    },

    /// Shift `count` armies between two adjacent owned territories.
    MoveUnits {
        player: PlayerId,
        from: TerritoryId,
        to: TerritoryId,
        count: u32,
    },

    /// Attack an adjacent enemy territory.
    Attack {
        player: PlayerId,
        from: TerritoryId,
        to: TerritoryId,
    },

    /// Finish the current phase.
    AdvancePhase { player: PlayerId },
}

impl Intent {
    pub fn kind(&self) -> ActionKind {
        match self {
            Intent::PlaceArmy { .. } => ActionKind::PlaceArmy,
            Intent::MoveUnits { .. } => ActionKind::MoveUnits,
            Intent::Attack { .. } => ActionKind::Attack,
            Intent::AdvancePhase { .. } => ActionKind::AdvancePhase,
        }
    }

    /// The player issuing the intent.
    pub fn player(&self) -> PlayerId {
        match *self {
            Intent::PlaceArmy { player, .. }
            | Intent::MoveUnits { player, .. }
            | Intent::Attack { player, .. }
            | Intent::AdvancePhase { player } => player,
        }
    }
}

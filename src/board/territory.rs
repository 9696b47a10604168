//! Territory and player identities.
//!
//! Territories and players are arena entries referenced by small integer
//! ids. Names live once (territory names in the graph, player names on the
//! `Player` record) and are never used as lookup keys inside the engine.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Index of a territory in the graph arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TerritoryId(pub u16);

impl TerritoryId {
    /// Returns the arena index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TerritoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Index of a player in the session's seat order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Returns the seat index.
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player {}", self.0)
    }
}

/// A seat requested when creating a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub name: String,
    /// RGB color, carried for the presentation layer only.
    pub color: [u8; 3],
}

impl Seat {
    pub fn new(name: impl Into<String>, color: [u8; 3]) -> Self {
        Seat {
            name: name.into(),
            color,
        }
    }
}

/// A player taking part in a session.
///
/// Owned territories are not stored here; they are always read from the
/// ownership ledger so they can never go stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub color: [u8; 3],
    /// Armies granted for the current placement phase and not yet placed.
    pub(crate) pending: u32,
}

impl Player {
    pub(crate) fn from_seat(id: PlayerId, seat: Seat) -> Self {
        Player {
            id,
            name: seat.name,
            color: seat.color,
            pending: 0,
        }
    }

    /// Armies still waiting to be placed.
    pub fn pending(&self) -> u32 {
        self.pending
    }
}

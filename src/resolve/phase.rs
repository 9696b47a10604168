//! Turn phase sequencing.
//!
//! Phase flow within a player's turn:
//! - Placing units   -> Moving units
//! - Moving units    -> Attacking country
//! - Attacking       -> Placing units (next player's turn)
//!
//! There is no terminal phase; the session decides when the game is won.
//! A phase change is accepted only once the debounce interval has elapsed
//! since the previous change. Early requests are ignored, not rejected.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::board::PlayerId;
use crate::intent::ActionKind;

/// Minimum time between two accepted phase changes.
pub const DEFAULT_PHASE_DEBOUNCE: Duration = Duration::from_millis(500);

/// A stage of a player's turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    PlacingUnits,
    MovingUnits,
    AttackingCountry,
}

impl Phase {
    /// All phases in turn order.
    pub const ALL: [Phase; 3] = [Phase::PlacingUnits, Phase::MovingUnits, Phase::AttackingCountry];

    /// The phase that follows this one.
    pub const fn next(self) -> Phase {
        match self {
            Phase::PlacingUnits => Phase::MovingUnits,
            Phase::MovingUnits => Phase::AttackingCountry,
            Phase::AttackingCountry => Phase::PlacingUnits,
        }
    }

    /// Human-readable name.
    pub const fn name(self) -> &'static str {
        match self {
            Phase::PlacingUnits => "placing units",
            Phase::MovingUnits => "moving units",
            Phase::AttackingCountry => "attacking country",
        }
    }

    /// Returns true if `action` may be taken during this phase.
    pub fn permits(self, action: ActionKind) -> bool {
        match action {
            ActionKind::PlaceArmy => self == Phase::PlacingUnits,
            ActionKind::MoveUnits => self == Phase::MovingUnits,
            ActionKind::Attack => self == Phase::AttackingCountry,
            ActionKind::AdvancePhase => true,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of a phase change request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Advance {
    Advanced { from: Phase, to: Phase },
    /// Requested inside the debounce interval; the phase is unchanged.
    Debounced { phase: Phase },
}

impl Advance {
    /// The phase in effect after the request.
    pub fn phase(self) -> Phase {
        match self {
            Advance::Advanced { to, .. } => to,
            Advance::Debounced { phase } => phase,
        }
    }

    /// Returns true if this request starts a new player's turn.
    pub fn starts_turn(self) -> bool {
        matches!(
            self,
            Advance::Advanced {
                to: Phase::PlacingUnits,
                ..
            }
        )
    }
}

/// Phase, acting player and debounce clock of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    phase: Phase,
    acting: PlayerId,
    turn: u32,
    entered_at: Instant,
    debounce: Duration,
}

impl TurnState {
    /// Starts turn 1 in the placement phase.
    pub fn new(first: PlayerId, now: Instant, debounce: Duration) -> Self {
        TurnState {
            phase: Phase::PlacingUnits,
            acting: first,
            turn: 1,
            entered_at: now,
            debounce,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn acting(&self) -> PlayerId {
        self.acting
    }

    /// Turn number, starting at 1 and incremented each time play passes on.
    pub fn turn(&self) -> u32 {
        self.turn
    }

    /// When the current phase was entered.
    pub fn entered_at(&self) -> Instant {
        self.entered_at
    }

    /// Returns true if a phase change at `now` would be accepted.
    pub fn ready(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.entered_at) >= self.debounce
    }

    /// Moves to the next phase unless still inside the debounce interval.
    pub fn advance(&mut self, now: Instant) -> Advance {
        if !self.ready(now) {
            return Advance::Debounced { phase: self.phase };
        }
        let from = self.phase;
        self.phase = from.next();
        self.entered_at = now;
        Advance::Advanced {
            from,
            to: self.phase,
        }
    }

    /// Hands the turn to another player.
    pub(crate) fn pass_to(&mut self, player: PlayerId) {
        self.acting = player;
        self.turn += 1;
    }
}

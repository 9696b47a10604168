//! Game session.
//!
//! Composes the territory graph, ownership ledger, turn state and combat
//! rules behind the action API used by the presentation layer. Each action
//! is validated in full before its first mutation, so a rejected action
//! leaves the session exactly as it was.

use std::time::Instant;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::board::{Ledger, Player, PlayerId, Seat, TerritoryGraph, TerritoryId};
use crate::config::RulesConfig;
use crate::error::GameError;
use crate::intent::{ActionKind, Intent};
use crate::resolve::{Advance, CombatOutcome, CombatRules, DiceSource, Phase, TurnState};

/// An attack as applied to the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttackOutcome {
    /// Territory the attack was launched from.
    pub attacker: TerritoryId,
    /// Territory that was attacked.
    pub defender: TerritoryId,
    pub combat: CombatOutcome,
    /// Set when the attacker took the defending territory.
    pub conquered: bool,
}

/// Result of an applied intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionOutcome {
    Placed {
        territory: TerritoryId,
        armies: u32,
        pending: u32,
    },
    Moved {
        from: TerritoryId,
        to: TerritoryId,
        count: u32,
    },
    Attacked {
        outcome: AttackOutcome,
    },
    PhaseChanged {
        advance: Advance,
    },
}

/// Read-only snapshot of one territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TerritoryView {
    pub id: TerritoryId,
    pub name: String,
    pub owner: Option<PlayerId>,
    pub armies: u32,
    pub neighbors: Vec<TerritoryId>,
}

/// Read-only snapshot of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: String,
    pub color: [u8; 3],
    pub pending: u32,
    pub territories: usize,
    pub armies: u64,
}

/// Everything the presentation layer needs to draw a frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub acting: PlayerId,
    pub turn: u32,
    pub winner: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    pub territories: Vec<TerritoryView>,
    pub last_outcome: Option<AttackOutcome>,
}

/// A running game.
#[derive(Debug, Clone)]
pub struct Session {
    graph: TerritoryGraph,
    ledger: Ledger,
    players: Vec<Player>,
    turn: TurnState,
    config: RulesConfig,
    combat: CombatRules,
    last_outcome: Option<AttackOutcome>,
}

impl Session {
    /// Creates a session with every territory unowned.
    ///
    /// The host assigns territories with `assign_initial_ownership`. The
    /// first seat starts in the placement phase with the minimum
    /// reinforcement grant.
    pub fn new(
        graph: TerritoryGraph,
        seats: Vec<Seat>,
        config: RulesConfig,
        now: Instant,
    ) -> Result<Self, GameError> {
        config.validate()?;
        if seats.len() < 2 {
            return Err(GameError::DataIntegrity(
                "a session needs at least two players".into(),
            ));
        }
        if seats.len() > usize::from(u8::MAX) + 1 {
            return Err(GameError::DataIntegrity(format!(
                "{} players exceed the supported maximum",
                seats.len()
            )));
        }

        let players: Vec<Player> = seats
            .into_iter()
            .enumerate()
            .map(|(i, seat)| Player::from_seat(PlayerId(i as u8), seat))
            .collect();
        let first = PlayerId(0);
        let mut session = Session {
            ledger: Ledger::new(graph.len()),
            graph,
            players,
            turn: TurnState::new(first, now, config.phase_debounce()),
            combat: config.combat_rules(),
            config,
            last_outcome: None,
        };
        session.grant_reinforcements(first);
        Ok(session)
    }

    /// Creates a session and deals every territory.
    ///
    /// Territories are shuffled and handed out round-robin, each with a
    /// random garrison from the configured initial range.
    pub fn deal<R: Rng>(
        graph: TerritoryGraph,
        seats: Vec<Seat>,
        config: RulesConfig,
        rng: &mut R,
        now: Instant,
    ) -> Result<Self, GameError> {
        if seats.len() > graph.len() {
            return Err(GameError::DataIntegrity(format!(
                "{} players cannot share {} territories",
                seats.len(),
                graph.len()
            )));
        }
        let mut session = Self::new(graph, seats, config, now)?;

        let mut order: Vec<TerritoryId> = session.graph.ids().collect();
        order.shuffle(rng);
        let seat_count = session.players.len();
        let (min, max) = (
            session.config.initial_armies_min,
            session.config.initial_armies_max,
        );
        for (i, t) in order.into_iter().enumerate() {
            let player = PlayerId((i % seat_count) as u8);
            let armies = rng.gen_range(min..=max);
            session.ledger.assign_initial_ownership(t, player, armies)?;
        }

        let first = session.turn.acting();
        session.players[first.index()].pending = 0;
        session.grant_reinforcements(first);
        info!(
            players = seat_count,
            territories = session.graph.len(),
            "territories dealt"
        );
        Ok(session)
    }

    /// Gives an unowned territory its first owner.
    pub fn assign_initial_ownership(
        &mut self,
        t: TerritoryId,
        player: PlayerId,
        armies: u32,
    ) -> Result<(), GameError> {
        self.player(player)?;
        self.ledger.assign_initial_ownership(t, player, armies)
    }

    /// Places one reinforcement. Returns the territory's new army count.
    ///
    /// The territory must be owned by `player` or, with frontier placement
    /// enabled, adjacent to a territory `player` owns.
    pub fn place_army(&mut self, player: PlayerId, t: TerritoryId) -> Result<u32, GameError> {
        self.check_action(player, ActionKind::PlaceArmy)?;
        self.check_territory(t)?;
        let owner = self.ledger.owner(t)?.ok_or(GameError::NotOwned(t))?;
        if owner != player {
            if !self.config.frontier_placement {
                return Err(GameError::NotOwnedBy {
                    territory: t,
                    player,
                });
            }
            if !self.borders(player, t) {
                return Err(GameError::OutsideFrontier {
                    territory: t,
                    player,
                });
            }
        }
        if self.players[player.index()].pending == 0 {
            return Err(GameError::NoReinforcements(player));
        }

        let armies = self.ledger.add_armies(t, 1)?;
        let seat = &mut self.players[player.index()];
        seat.pending -= 1;
        debug!(%player, territory = %t, armies, pending = seat.pending, "army placed");
        Ok(armies)
    }

    /// Moves `count` armies between two adjacent territories of `player`.
    pub fn move_armies(
        &mut self,
        player: PlayerId,
        from: TerritoryId,
        to: TerritoryId,
        count: u32,
    ) -> Result<(), GameError> {
        self.check_action(player, ActionKind::MoveUnits)?;
        self.check_territory(from)?;
        self.check_territory(to)?;
        if count == 0 {
            return Err(GameError::EmptyMove);
        }
        self.require_owner(from, player)?;
        self.require_owner(to, player)?;
        if !self.graph.is_adjacent(from, to) {
            return Err(GameError::NotAdjacent { from, to });
        }
        let available = self.ledger.armies(from)?;
        if available <= count {
            return Err(GameError::InsufficientArmies {
                armies: available,
                required: count.saturating_add(1),
            });
        }

        // Destination first: it is the only step that can still fail.
        self.ledger.add_armies(to, i64::from(count))?;
        self.ledger.add_armies(from, -i64::from(count))?;
        debug!(%player, from = %from, to = %to, count, "armies moved");
        Ok(())
    }

    /// Attacks `to` from `from` with one exchange of dice.
    ///
    /// On conquest every surviving attacker but one moves into the taken
    /// territory.
    pub fn attack<D: DiceSource + ?Sized>(
        &mut self,
        player: PlayerId,
        from: TerritoryId,
        to: TerritoryId,
        dice: &mut D,
    ) -> Result<AttackOutcome, GameError> {
        self.check_action(player, ActionKind::Attack)?;
        self.check_territory(from)?;
        self.check_territory(to)?;
        self.require_owner(from, player)?;
        if !self.graph.is_adjacent(from, to) {
            return Err(GameError::NotAdjacent { from, to });
        }
        let defender = self.ledger.owner(to)?.ok_or(GameError::NotOwned(to))?;
        if defender == player {
            return Err(GameError::OwnTerritory(to));
        }

        let combat = self
            .combat
            .resolve(self.ledger.armies(from)?, self.ledger.armies(to)?, dice)?;
        let conquered = combat.ownership_transfers;
        let survivors = combat.attacker_armies;
        if conquered && survivors < 2 {
            return Err(GameError::InvalidTransfer {
                territory: to,
                remaining: survivors.saturating_sub(1),
            });
        }

        self.ledger
            .add_armies(from, -i64::from(combat.attacker_losses))?;
        self.ledger.add_armies(to, -i64::from(combat.defender_losses))?;
        if conquered {
            let moving = survivors - 1;
            self.ledger.transfer_ownership(to, player, moving)?;
            self.ledger.add_armies(from, -i64::from(moving))?;
            info!(%player, from = %from, to = %to, armies = moving, "territory conquered");
            if self.ledger.territory_count(defender) == 0 {
                info!(player = %defender, "player eliminated");
            }
            if let Some(winner) = self.winner() {
                info!(player = %winner, "game won");
            }
        } else {
            debug!(
                %player,
                from = %from,
                to = %to,
                attacker_losses = combat.attacker_losses,
                defender_losses = combat.defender_losses,
                "attack resolved"
            );
        }

        let outcome = AttackOutcome {
            attacker: from,
            defender: to,
            combat,
            conquered,
        };
        self.last_outcome = Some(outcome.clone());
        Ok(outcome)
    }

    /// Finishes the current phase, subject to the debounce interval.
    ///
    /// Leaving the attack phase passes the turn to the next player still in
    /// the game and grants their reinforcements.
    pub fn advance_phase(&mut self, player: PlayerId, now: Instant) -> Result<Advance, GameError> {
        self.check_action(player, ActionKind::AdvancePhase)?;
        let advance = self.turn.advance(now);
        match advance {
            Advance::Debounced { phase } => {
                debug!(%player, %phase, "phase change debounced");
            }
            Advance::Advanced { from, to } if advance.starts_turn() => {
                let next = self.next_player(player);
                self.turn.pass_to(next);
                self.grant_reinforcements(next);
                info!(
                    turn = self.turn.turn(),
                    player = %next,
                    pending = self.players[next.index()].pending,
                    %from,
                    %to,
                    "turn passed"
                );
            }
            Advance::Advanced { from, to } => {
                info!(%player, %from, %to, "phase advanced");
            }
        }
        Ok(advance)
    }

    /// Applies an intent from the presentation layer.
    pub fn apply<D: DiceSource + ?Sized>(
        &mut self,
        intent: Intent,
        now: Instant,
        dice: &mut D,
    ) -> Result<ActionOutcome, GameError> {
        let result = match intent {
            Intent::PlaceArmy { player, territory } => {
                self.place_army(player, territory).map(|armies| ActionOutcome::Placed {
                    territory,
                    armies,
                    pending: self.pending_armies(player),
                })
            }
            Intent::MoveUnits {
                player,
                from,
                to,
                count,
            } => self
                .move_armies(player, from, to, count)
                .map(|()| ActionOutcome::Moved { from, to, count }),
            Intent::Attack { player, from, to } => self
                .attack(player, from, to, dice)
                .map(|outcome| ActionOutcome::Attacked { outcome }),
            Intent::AdvancePhase { player } => self
                .advance_phase(player, now)
                .map(|advance| ActionOutcome::PhaseChanged { advance }),
        };
        if let Err(e) = &result {
            warn!(?intent, error = %e, "intent rejected");
        }
        result
    }

    pub fn graph(&self) -> &TerritoryGraph {
        &self.graph
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.turn.phase()
    }

    pub fn acting_player(&self) -> PlayerId {
        self.turn.acting()
    }

    /// Turn number, starting at 1.
    pub fn turn(&self) -> u32 {
        self.turn.turn()
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Result<&Player, GameError> {
        self.players
            .get(id.index())
            .ok_or(GameError::UnknownPlayer(id))
    }

    /// Reinforcements `id` still has to place (0 for unknown players).
    pub fn pending_armies(&self, id: PlayerId) -> u32 {
        self.players.get(id.index()).map_or(0, Player::pending)
    }

    /// The most recent attack, for display.
    pub fn last_outcome(&self) -> Option<&AttackOutcome> {
        self.last_outcome.as_ref()
    }

    /// The player owning every territory, once there is one.
    pub fn winner(&self) -> Option<PlayerId> {
        self.ledger.sole_owner()
    }

    /// Territories `player` owns or borders, in id order.
    pub fn frontier(&self, player: PlayerId) -> Vec<TerritoryId> {
        let mut frontier = Vec::new();
        for t in self.ledger.territories_owned_by(player) {
            frontier.push(t);
            if let Ok(neighbors) = self.graph.neighbors(t) {
                frontier.extend_from_slice(neighbors);
            }
        }
        frontier.sort_unstable();
        frontier.dedup();
        frontier
    }

    /// Snapshot of one territory.
    pub fn territory_view(&self, t: TerritoryId) -> Result<TerritoryView, GameError> {
        self.check_territory(t)?;
        Ok(self.describe(t))
    }

    /// Snapshot of the whole session.
    pub fn view(&self) -> SessionView {
        let players = self
            .players
            .iter()
            .map(|p| PlayerView {
                id: p.id,
                name: p.name.clone(),
                color: p.color,
                pending: p.pending,
                territories: self.ledger.territory_count(p.id),
                armies: self.ledger.army_total(p.id),
            })
            .collect();
        SessionView {
            phase: self.phase(),
            acting: self.acting_player(),
            turn: self.turn(),
            winner: self.winner(),
            players,
            territories: self.graph.ids().map(|t| self.describe(t)).collect(),
            last_outcome: self.last_outcome.clone(),
        }
    }

    fn describe(&self, t: TerritoryId) -> TerritoryView {
        TerritoryView {
            id: t,
            name: self.graph.name(t).unwrap_or_default().to_string(),
            owner: self.ledger.owner(t).unwrap_or(None),
            armies: self.ledger.armies(t).unwrap_or(0),
            neighbors: self.graph.neighbors(t).map(<[_]>::to_vec).unwrap_or_default(),
        }
    }

    /// Gate shared by every action: game still running, known player, legal
    /// phase, and the player's turn.
    fn check_action(&self, player: PlayerId, action: ActionKind) -> Result<(), GameError> {
        if let Some(winner) = self.winner() {
            return Err(GameError::GameOver(winner));
        }
        self.player(player)?;
        let phase = self.turn.phase();
        if !phase.permits(action) {
            return Err(GameError::WrongPhase { action, phase });
        }
        let acting = self.turn.acting();
        if player != acting {
            return Err(GameError::NotYourTurn { player, acting });
        }
        Ok(())
    }

    fn check_territory(&self, t: TerritoryId) -> Result<(), GameError> {
        if self.graph.contains(t) {
            Ok(())
        } else {
            Err(GameError::UnknownTerritory(t.to_string()))
        }
    }

    fn require_owner(&self, t: TerritoryId, player: PlayerId) -> Result<(), GameError> {
        match self.ledger.owner(t)? {
            Some(owner) if owner == player => Ok(()),
            _ => Err(GameError::NotOwnedBy {
                territory: t,
                player,
            }),
        }
    }

    /// Returns true if `t` is adjacent to a territory owned by `player`.
    fn borders(&self, player: PlayerId, t: TerritoryId) -> bool {
        self.graph.neighbors(t).is_ok_and(|neighbors| {
            neighbors
                .iter()
                .any(|&n| matches!(self.ledger.owner(n), Ok(Some(owner)) if owner == player))
        })
    }

    /// A player is out once every territory is assigned and they hold none.
    fn is_eliminated(&self, player: PlayerId) -> bool {
        self.ledger.territory_count(player) == 0 && self.ledger.unowned().is_empty()
    }

    /// Next seat after `current` that is still in the game.
    fn next_player(&self, current: PlayerId) -> PlayerId {
        let seats = self.players.len();
        (1..=seats)
            .map(|step| PlayerId(((current.index() + step) % seats) as u8))
            .find(|&p| !self.is_eliminated(p))
            .unwrap_or(current)
    }

    fn grant_reinforcements(&mut self, player: PlayerId) {
        let grant = self
            .config
            .reinforcements_for(self.ledger.territory_count(player));
        let seat = &mut self.players[player.index()];
        seat.pending = seat.pending.saturating_add(grant);
    }
}

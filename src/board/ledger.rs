//! Ownership ledger.
//!
//! The single place where territory owners and army counts change. Uses
//! parallel vectors indexed by `TerritoryId`, like a board array.
//!
//! Invariants held between session actions:
//! - an army count is never negative (enforced by `u32` and checked deltas);
//! - an owned territory holds at least one army.
//!
//! A defender can transiently reach zero armies inside an attack; the
//! session transfers it within the same action.

use serde::Serialize;

use super::territory::{PlayerId, TerritoryId};
use crate::error::GameError;

/// Owner and army count per territory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ledger {
    owners: Vec<Option<PlayerId>>,
    armies: Vec<u32>,
}

impl Ledger {
    /// Creates a ledger with every territory unowned and empty.
    pub fn new(territories: usize) -> Self {
        Ledger {
            owners: vec![None; territories],
            armies: vec![0; territories],
        }
    }

    fn slot(&self, t: TerritoryId) -> Result<usize, GameError> {
        let idx = t.index();
        if idx < self.owners.len() {
            Ok(idx)
        } else {
            Err(GameError::UnknownTerritory(t.to_string()))
        }
    }

    /// Gives an unowned territory its first owner.
    pub fn assign_initial_ownership(
        &mut self,
        t: TerritoryId,
        player: PlayerId,
        armies: u32,
    ) -> Result<(), GameError> {
        let idx = self.slot(t)?;
        if self.owners[idx].is_some() {
            return Err(GameError::AlreadyOwned(t));
        }
        if armies == 0 {
            return Err(GameError::InvalidTransfer {
                territory: t,
                remaining: 0,
            });
        }
        self.owners[idx] = Some(player);
        self.armies[idx] = armies;
        Ok(())
    }

    /// Adds (or, with a negative delta, removes) armies. Returns the new count.
    pub fn add_armies(&mut self, t: TerritoryId, delta: i64) -> Result<u32, GameError> {
        let idx = self.slot(t)?;
        if self.owners[idx].is_none() {
            return Err(GameError::NotOwned(t));
        }
        let current = self.armies[idx];
        let next = i64::from(current) + delta;
        if next < 0 {
            return Err(GameError::NegativeArmyCount {
                territory: t,
                armies: current,
                delta,
            });
        }
        let next = u32::try_from(next).map_err(|_| GameError::NegativeArmyCount {
            territory: t,
            armies: current,
            delta,
        })?;
        self.armies[idx] = next;
        Ok(next)
    }

    /// Hands a conquered territory to its new owner with the surviving force.
    pub fn transfer_ownership(
        &mut self,
        t: TerritoryId,
        new_owner: PlayerId,
        remaining: u32,
    ) -> Result<(), GameError> {
        let idx = self.slot(t)?;
        if self.owners[idx].is_none() {
            return Err(GameError::NotOwned(t));
        }
        if remaining == 0 {
            return Err(GameError::InvalidTransfer {
                territory: t,
                remaining,
            });
        }
        self.owners[idx] = Some(new_owner);
        self.armies[idx] = remaining;
        Ok(())
    }

    /// Territories currently owned by `player`, in id order.
    pub fn territories_owned_by(&self, player: PlayerId) -> Vec<TerritoryId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, owner)| **owner == Some(player))
            .map(|(i, _)| TerritoryId(i as u16))
            .collect()
    }

    pub fn owner(&self, t: TerritoryId) -> Result<Option<PlayerId>, GameError> {
        Ok(self.owners[self.slot(t)?])
    }

    pub fn armies(&self, t: TerritoryId) -> Result<u32, GameError> {
        Ok(self.armies[self.slot(t)?])
    }

    /// Number of territories owned by `player`.
    pub fn territory_count(&self, player: PlayerId) -> usize {
        self.owners.iter().filter(|o| **o == Some(player)).count()
    }

    /// Sum of armies over the territories owned by `player`.
    pub fn army_total(&self, player: PlayerId) -> u64 {
        self.owners
            .iter()
            .zip(&self.armies)
            .filter(|(o, _)| **o == Some(player))
            .map(|(_, a)| u64::from(*a))
            .sum()
    }

    /// The player owning every territory, if there is one.
    pub fn sole_owner(&self) -> Option<PlayerId> {
        let first = (*self.owners.first()?)?;
        self.owners
            .iter()
            .all(|o| *o == Some(first))
            .then_some(first)
    }

    /// Territories that have not been assigned yet.
    pub fn unowned(&self) -> Vec<TerritoryId> {
        self.owners
            .iter()
            .enumerate()
            .filter(|(_, o)| o.is_none())
            .map(|(i, _)| TerritoryId(i as u16))
            .collect()
    }

    /// Number of territories tracked.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: TerritoryId = TerritoryId(0);
    const T1: TerritoryId = TerritoryId(1);
    const T2: TerritoryId = TerritoryId(2);
    const P0: PlayerId = PlayerId(0);
    const P1: PlayerId = PlayerId(1);

    #[test]
    fn new_ledger_is_unowned() {
        let ledger = Ledger::new(3);
        assert_eq!(ledger.unowned(), vec![T0, T1, T2]);
        assert_eq!(ledger.armies(T1).unwrap(), 0);
        assert_eq!(ledger.owner(T1).unwrap(), None);
        assert_eq!(ledger.sole_owner(), None);
    }

    #[test]
    fn assign_twice_is_rejected() {
        let mut ledger = Ledger::new(2);
        ledger.assign_initial_ownership(T0, P0, 2).unwrap();
        assert_eq!(
            ledger.assign_initial_ownership(T0, P1, 3),
            Err(GameError::AlreadyOwned(T0))
        );
        assert_eq!(ledger.owner(T0).unwrap(), Some(P0));
        assert_eq!(ledger.armies(T0).unwrap(), 2);
    }

    #[test]
    fn assign_requires_a_garrison() {
        let mut ledger = Ledger::new(1);
        assert!(matches!(
            ledger.assign_initial_ownership(T0, P0, 0),
            Err(GameError::InvalidTransfer { .. })
        ));
        assert_eq!(ledger.owner(T0).unwrap(), None);
    }

    #[test]
    fn add_armies_checks_owner_and_floor() {
        let mut ledger = Ledger::new(2);
        assert_eq!(ledger.add_armies(T1, 1), Err(GameError::NotOwned(T1)));

        ledger.assign_initial_ownership(T0, P0, 2).unwrap();
        assert_eq!(ledger.add_armies(T0, 3).unwrap(), 5);
        assert_eq!(ledger.add_armies(T0, -4).unwrap(), 1);
        assert_eq!(
            ledger.add_armies(T0, -2),
            Err(GameError::NegativeArmyCount {
                territory: T0,
                armies: 1,
                delta: -2
            })
        );
        assert_eq!(ledger.armies(T0).unwrap(), 1);
    }

    #[test]
    fn transfer_sets_owner_and_armies_together() {
        let mut ledger = Ledger::new(2);
        ledger.assign_initial_ownership(T1, P1, 1).unwrap();
        ledger.add_armies(T1, -1).unwrap();

        assert!(matches!(
            ledger.transfer_ownership(T1, P0, 0),
            Err(GameError::InvalidTransfer { remaining: 0, .. })
        ));
        assert_eq!(ledger.owner(T1).unwrap(), Some(P1));

        ledger.transfer_ownership(T1, P0, 3).unwrap();
        assert_eq!(ledger.owner(T1).unwrap(), Some(P0));
        assert_eq!(ledger.armies(T1).unwrap(), 3);
        assert_eq!(ledger.transfer_ownership(T0, P0, 1), Err(GameError::NotOwned(T0)));
    }

    #[test]
    fn owned_view_tracks_every_mutation() {
        let mut ledger = Ledger::new(3);
        ledger.assign_initial_ownership(T0, P0, 3).unwrap();
        ledger.assign_initial_ownership(T1, P1, 1).unwrap();
        ledger.assign_initial_ownership(T2, P1, 4).unwrap();
        assert_eq!(ledger.territories_owned_by(P1), vec![T1, T2]);
        assert_eq!(ledger.army_total(P1), 5);

        ledger.transfer_ownership(T1, P0, 2).unwrap();
        assert_eq!(ledger.territories_owned_by(P0), vec![T0, T1]);
        assert_eq!(ledger.territories_owned_by(P1), vec![T2]);
        assert_eq!(ledger.territory_count(P0), 2);

        ledger.transfer_ownership(T2, P0, 1).unwrap();
        assert_eq!(ledger.sole_owner(), Some(P0));
        assert!(ledger.territories_owned_by(P1).is_empty());
    }

    #[test]
    fn unknown_territory_is_reported() {
        let mut ledger = Ledger::new(1);
        assert!(matches!(ledger.armies(T2), Err(GameError::UnknownTerritory(_))));
        assert!(matches!(
            ledger.assign_initial_ownership(T2, P0, 1),
            Err(GameError::UnknownTerritory(_))
        ));
    }
}

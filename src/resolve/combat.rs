//! Dice-based combat resolution.
//!
//! One attack is one exchange of dice:
//! - the attacker rolls `min(attack_dice, attacker_armies - 1)` dice, since one
//!   army always stays home;
//! - the defender rolls `min(defense_dice, defender_armies)` dice;
//! - both rolls are sorted descending and compared index by index up to the
//!   shorter roll, the defender winning ties;
//! - each comparison costs the loser one army; dice beyond the shorter roll
//!   are not compared.
//!
//! Because both rolls are sorted first, comparing index by index is the same
//! as comparing highest against highest, second against second.
//!
//! Resolution is pure: it reads army counts and dice and returns a
//! `CombatOutcome`. Applying it to the ledger is the session's job.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::GameError;

/// Number of faces on a die.
pub const DIE_FACES: u8 = 6;

/// Source of die rolls, each uniform in `1..=DIE_FACES`.
pub trait DiceSource {
    fn roll(&mut self) -> u8;

    /// Rolls `count` dice.
    fn roll_many(&mut self, count: usize) -> Vec<u8> {
        (0..count).map(|_| self.roll()).collect()
    }
}

/// Dice backed by a `rand` generator.
#[derive(Debug, Clone)]
pub struct RandomDice<R = SmallRng> {
    rng: R,
}

impl<R: Rng> RandomDice<R> {
    pub fn new(rng: R) -> Self {
        RandomDice { rng }
    }
}

impl RandomDice<SmallRng> {
    /// Reproducible dice for a fixed seed.
    pub fn seeded(seed: u64) -> Self {
        RandomDice::new(SmallRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        RandomDice::new(SmallRng::from_entropy())
    }
}

impl<R: Rng> DiceSource for RandomDice<R> {
    fn roll(&mut self) -> u8 {
        self.rng.gen_range(1..=DIE_FACES)
    }
}

/// Replays a fixed sequence of faces, e.g. to reproduce a recorded game.
///
/// Yields 0 once the sequence is exhausted, which resolution rejects as an
/// invalid die.
#[derive(Debug, Clone, Default)]
pub struct LoadedDice {
    faces: VecDeque<u8>,
}

impl LoadedDice {
    pub fn new(faces: impl IntoIterator<Item = u8>) -> Self {
        LoadedDice {
            faces: faces.into_iter().collect(),
        }
    }

    /// Faces not yet rolled.
    pub fn remaining(&self) -> usize {
        self.faces.len()
    }
}

impl DiceSource for LoadedDice {
    fn roll(&mut self) -> u8 {
        self.faces.pop_front().unwrap_or(0)
    }
}

impl<D: DiceSource + ?Sized> DiceSource for &mut D {
    fn roll(&mut self) -> u8 {
        (**self).roll()
    }
}

/// Result of one dice exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatOutcome {
    /// Attacker dice, sorted descending.
    pub attacker_dice: Vec<u8>,
    /// Defender dice, sorted descending.
    pub defender_dice: Vec<u8>,
    /// Compared `(attacker, defender)` pairs, in order.
    pub pairs: Vec<(u8, u8)>,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    /// Attacker armies after the exchange.
    pub attacker_armies: u32,
    /// Defender armies after the exchange.
    pub defender_armies: u32,
    /// Set when the defender has no armies left.
    pub ownership_transfers: bool,
}

impl CombatOutcome {
    /// Attacker dice that were not compared.
    pub fn unpaired_attacker_dice(&self) -> &[u8] {
        &self.attacker_dice[self.pairs.len()..]
    }

    /// Defender dice that were not compared.
    pub fn unpaired_defender_dice(&self) -> &[u8] {
        &self.defender_dice[self.pairs.len()..]
    }
}

/// Dice limits for one exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRules {
    pub attack_dice: u8,
    pub defense_dice: u8,
}

impl Default for CombatRules {
    fn default() -> Self {
        CombatRules {
            attack_dice: 3,
            defense_dice: 2,
        }
    }
}

impl CombatRules {
    /// Number of dice each side rolls, or `InsufficientArmies`.
    pub fn dice_counts(&self, attacker_armies: u32, defender_armies: u32) -> Result<(usize, usize), GameError> {
        if attacker_armies < 2 {
            return Err(GameError::InsufficientArmies {
                armies: attacker_armies,
                required: 2,
            });
        }
        if defender_armies < 1 {
            return Err(GameError::InsufficientArmies {
                armies: defender_armies,
                required: 1,
            });
        }
        let attack = (attacker_armies - 1).min(u32::from(self.attack_dice));
        let defense = defender_armies.min(u32::from(self.defense_dice));
        Ok((attack as usize, defense as usize))
    }

    /// Validates the armies, rolls both sides, and resolves the exchange.
    pub fn resolve<D: DiceSource + ?Sized>(
        &self,
        attacker_armies: u32,
        defender_armies: u32,
        dice: &mut D,
    ) -> Result<CombatOutcome, GameError> {
        let (attack, defense) = self.dice_counts(attacker_armies, defender_armies)?;
        let attacker_dice = dice.roll_many(attack);
        let defender_dice = dice.roll_many(defense);
        self.resolve_with_dice(attacker_armies, defender_armies, attacker_dice, defender_dice)
    }

    /// Resolves an exchange with dice already rolled.
    pub fn resolve_with_dice(
        &self,
        attacker_armies: u32,
        defender_armies: u32,
        mut attacker_dice: Vec<u8>,
        mut defender_dice: Vec<u8>,
    ) -> Result<CombatOutcome, GameError> {
        let (attack, defense) = self.dice_counts(attacker_armies, defender_armies)?;
        check_roll("attacker", &attacker_dice, attack)?;
        check_roll("defender", &defender_dice, defense)?;

        attacker_dice.sort_unstable_by(|a, b| b.cmp(a));
        defender_dice.sort_unstable_by(|a, b| b.cmp(a));

        let pairs: Vec<(u8, u8)> = attacker_dice
            .iter()
            .copied()
            .zip(defender_dice.iter().copied())
            .collect();
        let defender_losses = pairs.iter().filter(|(a, d)| a > d).count() as u32;
        let attacker_losses = pairs.len() as u32 - defender_losses;

        // At most attacker_armies - 1 dice were compared, so neither side
        // can underflow.
        let attacker_armies = attacker_armies - attacker_losses;
        let defender_armies = defender_armies - defender_losses;

        Ok(CombatOutcome {
            attacker_dice,
            defender_dice,
            pairs,
            attacker_losses,
            defender_losses,
            attacker_armies,
            defender_armies,
            ownership_transfers: defender_armies == 0,
        })
    }
}

fn check_roll(side: &str, dice: &[u8], expected: usize) -> Result<(), GameError> {
    if dice.len() != expected {
        return Err(GameError::InvalidDice(format!(
            "{} rolled {} dice, expected {}",
            side,
            dice.len(),
            expected
        )));
    }
    if let Some(face) = dice.iter().find(|f| !(1..=DIE_FACES).contains(*f)) {
        return Err(GameError::InvalidDice(format!(
            "{} die shows {}, faces are 1..={}",
            side, face, DIE_FACES
        )));
    }
    Ok(())
}

/// Resolves an attack with the standard 3/2 dice limits.
pub fn resolve_attack<D: DiceSource + ?Sized>(
    attacker_armies: u32,
    defender_armies: u32,
    dice: &mut D,
) -> Result<CombatOutcome, GameError> {
    CombatRules::default().resolve(attacker_armies, defender_armies, dice)
}

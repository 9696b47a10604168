//! Rules configuration.
//!
//! Every tunable of a session in one struct. `Default` gives the standard
//! rules; hosts can override fields or load the whole thing from JSON, where
//! missing fields fall back to their defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::resolve::CombatRules;

/// Tunable rules for a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Minimum time between two accepted phase changes, in milliseconds.
    pub phase_debounce_ms: u64,
    /// Most dice the attacker may roll.
    pub attack_dice: u8,
    /// Most dice the defender may roll.
    pub defense_dice: u8,
    /// Allow placing armies on territories adjacent to owned ones, not just
    /// on owned ones.
    pub frontier_placement: bool,
    /// Reinforcements granted per turn are never below this.
    pub min_reinforcements: u32,
    /// One reinforcement per this many owned territories.
    pub territories_per_reinforcement: u32,
    /// Smallest garrison dealt to a territory at setup.
    pub initial_armies_min: u32,
    /// Largest garrison dealt to a territory at setup.
    pub initial_armies_max: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        RulesConfig {
            phase_debounce_ms: 500,
            attack_dice: 3,
            defense_dice: 2,
            frontier_placement: true,
            min_reinforcements: 3,
            territories_per_reinforcement: 3,
            initial_armies_min: 1,
            initial_armies_max: 3,
        }
    }
}

impl RulesConfig {
    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> Result<Self, GameError> {
        let config: RulesConfig = serde_json::from_str(json)
            .map_err(|e| GameError::DataIntegrity(format!("failed to parse rules config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings under which no game can be played.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.attack_dice == 0 || self.defense_dice == 0 {
            return Err(GameError::DataIntegrity(
                "both sides must roll at least one die".into(),
            ));
        }
        if self.territories_per_reinforcement == 0 {
            return Err(GameError::DataIntegrity(
                "territories_per_reinforcement must be positive".into(),
            ));
        }
        if self.initial_armies_min == 0 || self.initial_armies_min > self.initial_armies_max {
            return Err(GameError::DataIntegrity(format!(
                "initial armies range {}..={} is invalid",
                self.initial_armies_min, self.initial_armies_max
            )));
        }
        Ok(())
    }

    pub fn phase_debounce(&self) -> Duration {
        Duration::from_millis(self.phase_debounce_ms)
    }

    pub fn combat_rules(&self) -> CombatRules {
        CombatRules {
            attack_dice: self.attack_dice,
            defense_dice: self.defense_dice,
        }
    }

    /// Reinforcements for a player owning `territories` territories.
    pub fn reinforcements_for(&self, territories: usize) -> u32 {
        let earned = territories / self.territories_per_reinforcement.max(1) as usize;
        u32::try_from(earned)
            .unwrap_or(u32::MAX)
            .max(self.min_reinforcements)
    }
}

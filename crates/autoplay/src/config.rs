use crate::AutoplayError;
use pitstop_core::TirePressure;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Terminal reward shaping multipliers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RewardConfig {
    pub win_bonus: f64,
    pub speed_multiplier: f64,
    pub distance_multiplier: f64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            win_bonus: 1.0,
            speed_multiplier: 1.0,
            distance_multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub seed: u64,
    /// Number of evenly spaced fuel amounts over `[0, fuel_max)`.
    pub fuel_levels: u32,
    pub tire_pressures: Vec<TirePressure>,
    /// Scale on the UCT confidence term; 1.0 is plain UCT.
    pub exploration: f64,
    /// Optional hard cap on iterations per planning call, applied on top of
    /// the deadline.
    pub max_iterations: Option<u32>,
    pub rewards: RewardConfig,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            seed: 0xC0FFEE,
            fuel_levels: 6,
            tire_pressures: vec![
                TirePressure::FIFTY_PERCENT,
                TirePressure::SEVENTY_FIVE_PERCENT,
                TirePressure::ONE_HUNDRED_PERCENT,
            ],
            exploration: 1.0,
            max_iterations: None,
            rewards: RewardConfig::default(),
        }
    }
}

impl PlannerConfig {
    pub fn validate(&self) -> Result<(), AutoplayError> {
        let invalid = |msg: &str| Err(AutoplayError::InvalidConfig(msg.to_string()));
        if self.fuel_levels == 0 {
            return invalid("fuel_levels must be positive");
        }
        if self.tire_pressures.is_empty() {
            return invalid("tire_pressures is empty");
        }
        if self.tire_pressures.iter().any(|p| p.percent() == 0) {
            return invalid("tire pressure must be above 0%");
        }
        let unique: HashSet<TirePressure> = self.tire_pressures.iter().copied().collect();
        if unique.len() != self.tire_pressures.len() {
            return invalid("duplicate tire pressure");
        }
        if !self.exploration.is_finite() || self.exploration < 0.0 {
            return invalid("exploration must be finite and non-negative");
        }
        let rewards = [
            self.rewards.win_bonus,
            self.rewards.speed_multiplier,
            self.rewards.distance_multiplier,
        ];
        if rewards.iter().any(|value| !value.is_finite() || *value < 0.0) {
            return invalid("reward multipliers must be finite and non-negative");
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoplayConfig {
    pub planner: PlannerConfig,
    pub step_time_ms: u64,
    /// Held back from `step_time_ms`: the search overshoots its deadline by
    /// up to one iteration.
    pub step_time_buffer_ms: u64,
    pub trials: u32,
}

impl Default for AutoplayConfig {
    fn default() -> Self {
        Self {
            planner: PlannerConfig::default(),
            step_time_ms: 15_000,
            step_time_buffer_ms: 100,
            trials: 1,
        }
    }
}

impl AutoplayConfig {
    pub fn from_json(text: &str) -> Result<Self, AutoplayError> {
        let config: AutoplayConfig = serde_json::from_str(text)?;
        config.planner.validate()?;
        Ok(config)
    }

    pub fn search_budget(&self) -> Duration {
        Duration::from_millis(self.step_time_ms.saturating_sub(self.step_time_buffer_ms))
    }
}

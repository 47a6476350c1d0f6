//! Continuous gridworld configuration

use serde::{Deserialize, Serialize};

use gridworld_core::{EnvironmentConfig, GridBounds, GridState, RLError, Result, RewardMode};

use crate::obstacle::{Obstacle, ObstacleMap};

/// Per-axis closeness test, `|x - goal| <= atol + rtol * |goal|`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Relative tolerance
    pub rtol: f64,
    /// Absolute tolerance
    pub atol: f64,
}

impl Tolerance {
    /// Create a new tolerance
    #[must_use]
    pub const fn new(rtol: f64, atol: f64) -> Self {
        Self { rtol, atol }
    }

    /// Whether `value` is close to `target`
    #[must_use]
    pub fn is_close(&self, value: f64, target: f64) -> bool {
        (value - target).abs() <= self.atol + self.rtol * target.abs()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::new(0.001, 0.5)
    }
}

/// Geometry, dynamics and reward settings of the continuous gridworld
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuousGridConfig {
    /// Inclusive coordinate bounds
    pub bounds: GridBounds,
    /// State returned by `reset`
    pub start: GridState,
    /// Goal coordinate
    pub goal: GridState,
    /// Goal closeness on the row axis
    pub goal_row_tolerance: Tolerance,
    /// Goal closeness on the column axis
    pub goal_column_tolerance: Tolerance,
    /// Displacement of one noiseless move
    pub action_effect_size: f64,
    /// Noise is drawn from `U(-noise_range, noise_range)`
    pub noise_range: f64,
    /// Obstacles split by crossing direction
    pub obstacles: ObstacleMap,
    /// Sparse or dense reward
    pub reward_mode: RewardMode,
    /// Seed for the noise generator
    pub seed: Option<u64>,
}

impl Default for ContinuousGridConfig {
    /// A 6 x 9 maze with three walls between the west start and the north-east goal
    fn default() -> Self {
        let walls = [
            (2.0, 4.0, 1.5, 2.5),
            (0.5, 1.5, 4.5, 5.5),
            (3.0, 5.0, 6.5, 7.5),
        ]
        .into_iter()
        .filter_map(|(bottom, top, left, right)| Obstacle::new(bottom, top, left, right).ok())
        .collect();

        Self {
            bounds: GridBounds {
                min_row: 0.0,
                max_row: 5.0,
                min_column: 0.0,
                max_column: 8.0,
            },
            start: GridState::new(2.0, 0.0),
            goal: GridState::new(5.0, 8.0),
            goal_row_tolerance: Tolerance::default(),
            goal_column_tolerance: Tolerance::default(),
            action_effect_size: 1.0,
            noise_range: 0.1,
            obstacles: ObstacleMap::symmetric(walls),
            reward_mode: RewardMode::Sparse,
            seed: None,
        }
    }
}

impl ContinuousGridConfig {
    /// Default geometry with the shared environment settings applied
    #[must_use]
    pub fn from_env_config(config: &EnvironmentConfig) -> Self {
        Self {
            seed: config.seed,
            ..Self::default()
        }
    }

    /// Parse a full configuration from JSON; omitted fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| RLError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration once before an environment is built
    pub fn validate(&self) -> Result<()> {
        self.bounds.validate()?;
        if !self.bounds.contains(&self.start) {
            return Err(RLError::Config(format!(
                "start state {:?} lies outside {:?}",
                self.start, self.bounds
            )));
        }
        if !self.bounds.contains(&self.goal) {
            return Err(RLError::Config(format!(
                "goal state {:?} lies outside {:?}",
                self.goal, self.bounds
            )));
        }
        if !self.action_effect_size.is_finite() || self.action_effect_size < 0.0 {
            return Err(RLError::Config(format!(
                "action effect size must be finite and non-negative, got {}",
                self.action_effect_size
            )));
        }
        if !self.noise_range.is_finite() || self.noise_range < 0.0 {
            return Err(RLError::Config(format!(
                "noise range must be finite and non-negative, got {}",
                self.noise_range
            )));
        }
        for tolerance in [self.goal_row_tolerance, self.goal_column_tolerance] {
            let valid = |v: f64| v.is_finite() && v >= 0.0;
            if !valid(tolerance.rtol) || !valid(tolerance.atol) {
                return Err(RLError::Config(format!(
                    "goal tolerance must be finite and non-negative, got {tolerance:?}"
                )));
            }
        }
        Ok(())
    }
}

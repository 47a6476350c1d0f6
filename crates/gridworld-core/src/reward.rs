//! Reward signals and reward modes

use serde::{Deserialize, Serialize};

/// Reward signal from the environment
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reward(pub f64);

impl Reward {
    /// Create a new reward
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the reward value
    #[must_use]
    pub fn value(&self) -> f64 {
        self.0
    }
}

impl From<f64> for Reward {
    fn from(value: f64) -> Self {
        Self(value)
    }
}

impl From<Reward> for f64 {
    fn from(reward: Reward) -> Self {
        reward.0
    }
}

impl std::ops::Add for Reward {
    type Output = Self;

    fn add(self, other: Self) -> Self::Output {
        Self(self.0 + other.0)
    }
}

/// How the environment pays out per step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardMode {
    /// 1 on reaching the goal, 0 otherwise
    #[default]
    Sparse,
    /// 0 on reaching the goal, -1 for every other step
    Dense,
}

impl RewardMode {
    /// Pick the mode from the driver's sparse flag
    #[must_use]
    pub fn from_sparse_flag(is_sparse: bool) -> Self {
        if is_sparse {
            Self::Sparse
        } else {
            Self::Dense
        }
    }

    /// Reward for a step that did or did not reach the goal
    #[must_use]
    pub fn reward(self, reached_goal: bool) -> Reward {
        match (self, reached_goal) {
            (Self::Sparse, true) => Reward(1.0),
            (Self::Sparse, false) => Reward(0.0),
            (Self::Dense, true) => Reward(0.0),
            (Self::Dense, false) => Reward(-1.0),
        }
    }
}

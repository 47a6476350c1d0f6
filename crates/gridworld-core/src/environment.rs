//! Environment traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Action, Reward, State};

/// Result of a single environment step.
///
/// Serializes to exactly `{"reward", "state", "isTerminal"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step<S> {
    /// Reward signal
    pub reward: Reward,
    /// State after the transition
    pub state: S,
    /// Whether the episode has ended
    #[serde(rename = "isTerminal")]
    pub is_terminal: bool,
}

/// Parameters the driver may send to an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvParams {
    /// Sparse (true) or dense (false) reward
    #[serde(rename = "IS_SPARSE")]
    pub is_sparse: bool,
}

impl EnvParams {
    /// Parse the driver's JSON message
    pub fn from_json(message: &str) -> crate::Result<Self> {
        serde_json::from_str(message).map_err(|e| crate::RLError::Config(e.to_string()))
    }
}

/// Messages accepted by environments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvMessage {
    /// Apply new parameters
    Configure(EnvParams),
}

/// Configuration shared by all environments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnvironmentConfig {
    /// Random seed for transition noise
    pub seed: Option<u64>,
}

/// Core environment trait
#[async_trait]
pub trait Environment: Send + Sync {
    /// State type
    type State: State;
    /// Action type
    type Action: Action;

    /// Reset the environment and return the initial state
    async fn reset(&mut self) -> crate::Result<Self::State>;

    /// Take a step in the environment
    async fn step(&mut self, action: Self::Action) -> crate::Result<Step<Self::State>>;

    /// Handle a driver message
    async fn message(&mut self, message: EnvMessage) -> crate::Result<()>;

    /// Close the environment
    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

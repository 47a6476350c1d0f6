//! Agent traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Action, Reward, State};

/// Where an agent is within the episode lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AgentPhase {
    /// No episode in progress
    #[default]
    Idle,
    /// `start` has selected the first action
    EpisodeStart,
    /// At least one `step` has been processed
    EpisodeRunning,
    /// `end` has been called, waiting for `cleanup`
    EpisodeTerminal,
}

/// Agent metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentMetrics {
    /// Global step counter across episodes (every `step` and `end` call)
    pub total_steps: u64,
    /// Completed episodes (`cleanup` calls)
    pub total_episodes: u64,
    /// Gradient passes performed
    pub updates: u64,
    /// Target estimator synchronizations
    pub target_syncs: u64,
    /// Loss of the most recent gradient pass
    pub loss: Option<f64>,
    /// Current exploration rate
    pub epsilon: f64,
}

/// Core agent trait, driven one call per environment event
#[async_trait]
pub trait Agent: Send {
    /// State type
    type State: State;
    /// Action type
    type Action: Action;
    /// Driver messages understood by the agent
    type Message: Send;
    /// Replies to driver messages
    type Response: Send;

    /// Begin an episode from its initial state and pick the first action
    async fn start(&mut self, state: Self::State) -> crate::Result<Self::Action>;

    /// Learn from the reward and next state of a non-terminal step, return the next action
    async fn step(&mut self, reward: Reward, state: Self::State) -> crate::Result<Self::Action>;

    /// Learn from the final reward of an episode
    async fn end(&mut self, reward: Reward) -> crate::Result<()>;

    /// Per-episode housekeeping after `end`
    async fn cleanup(&mut self) -> crate::Result<()>;

    /// Handle a driver message
    async fn message(&mut self, message: Self::Message) -> crate::Result<Self::Response>;

    /// Mark the following episodes as evaluation-only (or not)
    fn set_trial_episode(&mut self, trial: bool);

    /// Current lifecycle phase
    fn phase(&self) -> AgentPhase;

    /// Get agent metrics
    fn metrics(&self) -> AgentMetrics {
        AgentMetrics::default()
    }
}

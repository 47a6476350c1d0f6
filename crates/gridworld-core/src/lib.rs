//! Core reinforcement learning traits and types for the gridworld testbed
//!
//! This crate provides the foundational abstractions shared by the
//! environment and agent crates: states, actions, rewards, step results,
//! the `Environment` and `Agent` traits, errors, and the episode driver.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod action;
pub mod agent;
pub mod environment;
pub mod error;
pub mod experiment;
pub mod reward;
pub mod state;

// Re-export core traits and types
pub use action::{Action, ActionSpace, CompassSpace, GridAction};
pub use agent::{Agent, AgentMetrics, AgentPhase};
pub use environment::{EnvMessage, EnvParams, Environment, EnvironmentConfig, Step};
pub use error::{RLError, Result};
pub use experiment::{EpisodeRecord, Experiment, ExperimentConfig};
pub use reward::{Reward, RewardMode};
pub use state::{GridBounds, GridState, State};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Action, ActionSpace, Agent, Environment, GridAction, GridState, Result, Reward, State,
        Step,
    };
}

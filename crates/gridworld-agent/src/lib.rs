//! Value-based learning agents for the gridworld testbed
//!
//! This crate provides:
//! - A neural action-value agent with experience replay and a target estimator
//! - A uniformly random baseline agent
//! - A pure `ndarray` multi-layer perceptron and its optimizers
//! - The driver messages both agents understand

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod buffer;
pub mod config;
pub mod encoding;
pub mod message;
pub mod network;
pub mod neural;
pub mod optimizer;
pub mod random;
pub mod registry;
pub mod utils;

// Re-export agents
pub use neural::NeuralAgent;
pub use random::RandomAgent;
pub use registry::{make_agent, GridAgent};

// Re-export configuration and messages
pub use config::{
    AgentParams, AgentVariant, DqnConfig, EnvVariant, Initializer, OptimizerKind, StateEncoding,
};
pub use message::{AgentMessage, AgentResponse, PlotRange, ValueSurface, MAX_PLOT_POINTS};

// Re-export estimator and replay components
pub use buffer::{BufferCategory, ExperienceStore, SamplingPolicy, Transition};
pub use encoding::StateEncoder;
pub use network::{MlpQNetwork, MlpSpec, QNetwork};
pub use optimizer::Optimizer;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        make_agent, AgentMessage, AgentResponse, DqnConfig, GridAgent, NeuralAgent, QNetwork,
        RandomAgent,
    };
    pub use gridworld_core::prelude::*;
}

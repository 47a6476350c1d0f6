//! Continuous gridworld environment for the gridworld testbed
//!
//! This crate provides:
//! - Rectangular obstacle geometry and segment blocking
//! - The continuous gridworld with noisy moves, goal tolerance and
//!   sparse/dense rewards

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod continuous;
pub mod obstacle;

// Re-export environments
pub use config::{ContinuousGridConfig, Tolerance};
pub use continuous::ContinuousGridEnv;
pub use obstacle::{Corners, Obstacle, ObstacleMap};

// Re-export core types
pub use gridworld_core::{
    EnvMessage, EnvParams, Environment, EnvironmentConfig, GridAction, GridBounds, GridState,
    Reward, RewardMode, Step,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{ContinuousGridConfig, ContinuousGridEnv, Obstacle, ObstacleMap};
    pub use gridworld_core::prelude::*;
}

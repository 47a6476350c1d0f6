//! Continuous gridworld
//!
//! The agent moves a fixed distance plus uniform noise per step along one
//! axis. Moves are clamped to the grid unless they land on the goal, and are
//! cancelled entirely if they cross an obstacle face.

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, trace};

use gridworld_core::{
    EnvMessage, EnvParams, Environment, EnvironmentConfig, GridAction, GridState, Result, RewardMode,
    Step,
};

use crate::config::ContinuousGridConfig;

/// Continuous gridworld environment
pub struct ContinuousGridEnv {
    /// Configuration
    config: ContinuousGridConfig,
    /// Current state
    state: GridState,
    /// Noise generator
    rng: StdRng,
}

impl ContinuousGridEnv {
    /// Create a new environment from a validated configuration
    pub fn new(config: ContinuousGridConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            state: config.start,
            config,
            rng,
        })
    }

    /// Create the default maze with the shared environment settings
    pub fn from_env_config(config: &EnvironmentConfig) -> Result<Self> {
        Self::new(ContinuousGridConfig::from_env_config(config))
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> GridState {
        self.state
    }

    /// Configuration
    #[must_use]
    pub fn config(&self) -> &ContinuousGridConfig {
        &self.config
    }

    /// Current reward mode
    #[must_use]
    pub fn reward_mode(&self) -> RewardMode {
        self.config.reward_mode
    }

    /// Whether `state` is within goal tolerance on both axes
    #[must_use]
    pub fn is_goal_state(&self, state: &GridState) -> bool {
        self.config.goal_row_tolerance.is_close(state.row, self.config.goal.row)
            && self.config.goal_column_tolerance.is_close(state.column, self.config.goal.column)
    }

    fn noise(&mut self) -> f64 {
        let range = self.config.noise_range;
        if range > 0.0 {
            self.rng.gen_range(-range..=range)
        } else {
            0.0
        }
    }

    /// Apply one move and return the outcome
    pub fn transition(&mut self, action: GridAction) -> Step<GridState> {
        let old_state = self.state;
        let displacement = self.config.action_effect_size + self.noise();
        let (d_row, d_column) = action.direction();

        let mut candidate = GridState::new(
            old_state.row + d_row * displacement,
            old_state.column + d_column * displacement,
        );

        // Overshooting into the goal still counts as reaching it
        if !self.is_goal_state(&candidate) {
            candidate = self.config.bounds.clamp(candidate);
        }

        if self.config.obstacles.is_blocked(&old_state, &candidate) {
            debug!(?old_state, ?candidate, %action, "move blocked by obstacle");
            candidate = old_state;
        }

        let is_terminal = self.is_goal_state(&candidate);
        let reward = self.config.reward_mode.reward(is_terminal);
        self.state = candidate;

        trace!(?old_state, new_state = ?self.state, %action, displacement, is_terminal, "transition");
        Step {
            reward,
            state: self.state,
            is_terminal,
        }
    }

    /// Step with a raw action id.
    ///
    /// # Panics
    ///
    /// An id outside the action set is a programming error in the caller and
    /// aborts the run.
    pub fn step_id(&mut self, id: usize) -> Step<GridState> {
        match GridAction::try_from(id) {
            Ok(action) => self.transition(action),
            Err(err) => {
                error!(action = id, current_state = ?self.state, "invalid action taken");
                panic!("{err} (current state {:?})", self.state);
            }
        }
    }

    /// Apply driver parameters
    pub fn configure(&mut self, params: EnvParams) {
        self.config.reward_mode = RewardMode::from_sparse_flag(params.is_sparse);
        debug!(reward_mode = ?self.config.reward_mode, "environment configured");
    }
}

#[async_trait]
impl Environment for ContinuousGridEnv {
    type State = GridState;
    type Action = GridAction;

    async fn reset(&mut self) -> Result<GridState> {
        self.state = self.config.start;
        Ok(self.state)
    }

    async fn step(&mut self, action: GridAction) -> Result<Step<GridState>> {
        Ok(self.transition(action))
    }

    async fn message(&mut self, message: EnvMessage) -> Result<()> {
        match message {
            EnvMessage::Configure(params) => self.configure(params),
        }
        Ok(())
    }
}

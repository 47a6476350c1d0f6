//! Agent configuration
//!
//! `DqnConfig` holds every hyperparameter of a run and is validated once when
//! an agent is built. `AgentParams` is the subset the experiment driver sends
//! as a JSON message; applying it onto a `DqnConfig` re-derives the input
//! width from the encoding flag.

use serde::{Deserialize, Serialize};

use gridworld_core::{GridBounds, GridState, RLError, Result};

/// Which agent implementation to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentVariant {
    /// Neural action-value agent with replay and a target estimator
    #[default]
    Neural,
    /// Uniformly random baseline
    Random,
}

/// Which environment the agent is paired with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvVariant {
    /// Integer cell gridworld
    #[serde(alias = "grid")]
    Discrete,
    /// Continuous coordinate gridworld
    #[default]
    Continuous,
}

/// How states are fed to the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateEncoding {
    /// One input per grid cell, the nearest cell set to 1
    OneHot,
    /// The raw (row, column) coordinates
    #[default]
    Raw,
}

impl StateEncoding {
    /// Pick the encoding from the driver's one-hot flag
    #[must_use]
    pub fn from_one_hot_flag(is_one_hot: bool) -> Self {
        if is_one_hot {
            Self::OneHot
        } else {
            Self::Raw
        }
    }
}

/// Gradient descent variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    /// Plain stochastic gradient descent
    Sgd,
    /// Adam
    #[default]
    Adam,
    /// RMSprop
    #[serde(alias = "rmsprop")]
    RmsProp,
    /// Adagrad
    Adagrad,
}

/// Weight initialization scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Initializer {
    /// U(-0.05, 0.05)
    RandomUniform,
    /// N(0, 2 / (fan_in + fan_out))
    #[default]
    GlorotNormal,
    /// N(0, 2 / fan_in)
    HeNormal,
}

/// Full agent configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    /// Agent implementation
    pub agent: AgentVariant,
    /// Environment the agent is paired with
    pub env: EnvVariant,
    /// Exploration rate at the first episode
    pub epsilon_start: f64,
    /// Exploration floor
    pub epsilon_min: f64,
    /// Amount subtracted from epsilon after every training episode
    pub epsilon_decay_rate: f64,
    /// Optimizer step size
    pub learning_rate: f64,
    /// Discount factor
    pub gamma: f64,
    /// Rows per gradient pass once replay is ready
    pub batch_size: usize,
    /// Stored observations needed before replay batches are assembled
    pub buffer_size: usize,
    /// Evict the oldest observation beyond this many; unbounded when unset
    pub replay_capacity: Option<usize>,
    /// Copy online parameters into the target every this many global steps
    pub num_steps_to_update: u64,
    /// Length of the state context window stored with each observation
    pub context_size: usize,
    /// Widths of the hidden layers
    pub hidden_layers: Vec<usize>,
    /// Optimizer
    pub optimizer: OptimizerKind,
    /// Weight initializer
    pub initializer: Initializer,
    /// Input representation
    pub encoding: StateEncoding,
    /// Grid extent used for one-hot encoding and value surfaces
    pub grid: GridBounds,
    /// Whether the paired environment is stochastic
    pub is_stochastic: bool,
    /// Seed for exploration, replay sampling and weight initialization
    pub seed: Option<u64>,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            agent: AgentVariant::Neural,
            env: EnvVariant::Continuous,
            epsilon_start: 1.0,
            epsilon_min: 0.1,
            epsilon_decay_rate: 0.01,
            learning_rate: 0.001,
            gamma: 0.95,
            batch_size: 32,
            buffer_size: 100,
            replay_capacity: None,
            num_steps_to_update: 100,
            context_size: 1,
            hidden_layers: vec![64, 32],
            optimizer: OptimizerKind::Adam,
            initializer: Initializer::GlorotNormal,
            encoding: StateEncoding::Raw,
            grid: GridBounds {
                min_row: 0.0,
                max_row: 5.0,
                min_column: 0.0,
                max_column: 8.0,
            },
            is_stochastic: true,
            seed: None,
        }
    }
}

impl DqnConfig {
    /// Width of the estimator input
    #[must_use]
    pub fn feature_vector_size(&self) -> usize {
        match self.encoding {
            StateEncoding::OneHot => self.grid.num_rows() * self.grid.num_columns(),
            StateEncoding::Raw => GridState::NUM_COORDINATES,
        }
    }

    /// Overwrite the driver-controlled fields
    pub fn apply(&mut self, params: &AgentParams) {
        self.epsilon_min = params.epsilon_min;
        self.learning_rate = params.learning_rate;
        self.gamma = params.gamma;
        self.agent = params.agent;
        self.is_stochastic = params.is_stochastic;
        self.encoding = StateEncoding::from_one_hot_flag(params.is_one_hot);
        self.env = params.env;
        if let Some(buffer_size) = params.buffer_size {
            self.buffer_size = buffer_size;
        }
        if let Some(num_steps) = params.num_steps_to_update {
            self.num_steps_to_update = num_steps;
        }
    }

    /// Parse a full configuration from JSON; omitted fields take defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| RLError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field once before an agent is built
    pub fn validate(&self) -> Result<()> {
        let fail = |msg: String| Err(RLError::Config(msg));

        if !(0.0..=1.0).contains(&self.gamma) {
            return fail(format!("gamma must be in [0, 1], got {}", self.gamma));
        }
        if !(0.0..=1.0).contains(&self.epsilon_min)
            || !(0.0..=1.0).contains(&self.epsilon_start)
            || self.epsilon_min > self.epsilon_start
        {
            return fail(format!(
                "epsilon bounds must satisfy 0 <= min ({}) <= start ({}) <= 1",
                self.epsilon_min, self.epsilon_start
            ));
        }
        if !self.epsilon_decay_rate.is_finite() || self.epsilon_decay_rate < 0.0 {
            return fail(format!("epsilon decay rate must be non-negative, got {}", self.epsilon_decay_rate));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return fail(format!("learning rate must be positive, got {}", self.learning_rate));
        }
        if self.batch_size == 0 {
            return fail("batch size must be at least 1".into());
        }
        if self.buffer_size == 0 {
            return fail("buffer size must be at least 1".into());
        }
        if self.replay_capacity == Some(0) {
            return fail("replay capacity must be at least 1 when set".into());
        }
        if self.num_steps_to_update == 0 {
            return fail("target sync cadence must be at least 1".into());
        }
        if self.context_size == 0 {
            return fail("context size must be at least 1".into());
        }
        if self.hidden_layers.contains(&0) {
            return fail(format!("hidden layer widths must be non-zero, got {:?}", self.hidden_layers));
        }
        self.grid.validate()
    }
}

/// Configuration message sent by the experiment driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentParams {
    /// Exploration floor
    #[serde(rename = "EPSILON")]
    pub epsilon_min: f64,
    /// Learning rate
    #[serde(rename = "ALPHA")]
    pub learning_rate: f64,
    /// Discount factor
    #[serde(rename = "GAMMA")]
    pub gamma: f64,
    /// Agent implementation
    #[serde(rename = "AGENT")]
    pub agent: AgentVariant,
    /// Whether the environment is stochastic
    #[serde(rename = "IS_STOCHASTIC")]
    pub is_stochastic: bool,
    /// One-hot (true) or raw coordinate (false) input
    #[serde(rename = "IS_1_HOT")]
    pub is_one_hot: bool,
    /// Environment variant
    #[serde(rename = "ENV")]
    pub env: EnvVariant,
    /// Replay readiness threshold
    #[serde(rename = "BUFFER_SIZE", default, skip_serializing_if = "Option::is_none")]
    pub buffer_size: Option<usize>,
    /// Target sync cadence
    #[serde(rename = "NUM_STEPS_TO_UPDATE", default, skip_serializing_if = "Option::is_none")]
    pub num_steps_to_update: Option<u64>,
}

impl AgentParams {
    /// Parse the driver's JSON message
    pub fn from_json(message: &str) -> Result<Self> {
        serde_json::from_str(message).map_err(|e| RLError::Config(e.to_string()))
    }
}

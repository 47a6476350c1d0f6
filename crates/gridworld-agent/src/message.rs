//! Driver messages understood by the agents and their replies

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use gridworld_core::{GridBounds, GridState, RLError, Result};

use crate::config::{AgentParams, EnvVariant};
use crate::network::QNetwork;

/// Most states a single plot range may sample
pub const MAX_PLOT_POINTS: usize = 250_000;

/// Rectangle of states sampled for value surfaces and representations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlotRange {
    /// Lowest row
    pub min_row: f64,
    /// Highest row
    pub max_row: f64,
    /// Lowest column
    pub min_column: f64,
    /// Highest column
    pub max_column: f64,
    /// Spacing between sampled coordinates
    pub resolution: f64,
}

impl PlotRange {
    /// The whole grid at unit spacing
    #[must_use]
    pub fn from_bounds(bounds: &GridBounds) -> Self {
        Self {
            min_row: bounds.min_row,
            max_row: bounds.max_row,
            min_column: bounds.min_column,
            max_column: bounds.max_column,
            resolution: 1.0,
        }
    }

    /// Reject empty ranges, non-positive spacing and ranges sampling more
    /// than [`MAX_PLOT_POINTS`] states
    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(RLError::Config(format!(
                "plot resolution must be positive, got {}",
                self.resolution
            )));
        }
        GridBounds::new(self.min_row, self.max_row, self.min_column, self.max_column)?;
        self.check_point_count(EnvVariant::Continuous)
    }

    fn check_point_count(&self, env: EnvVariant) -> Result<()> {
        let points = match env {
            EnvVariant::Continuous => {
                axis_len(self.min_row, self.max_row, self.resolution)
                    * axis_len(self.min_column, self.max_column, self.resolution)
            }
            EnvVariant::Discrete => {
                axis_len(self.min_row.ceil(), self.max_row, 1.0)
                    * axis_len(self.min_column.ceil(), self.max_column, 1.0)
            }
        };
        if points > MAX_PLOT_POINTS as f64 {
            return Err(RLError::Config(format!(
                "plot range {self:?} would sample {points} states, limit is {MAX_PLOT_POINTS}"
            )));
        }
        Ok(())
    }

    /// States covering the range, row-major.
    ///
    /// The continuous variant samples every `resolution` from the minimum;
    /// the discrete variant takes every integer cell inside the range.
    pub fn states(&self, env: EnvVariant) -> Result<Vec<GridState>> {
        self.validate()?;
        self.check_point_count(env)?;
        let (rows, columns) = match env {
            EnvVariant::Continuous => (
                axis(self.min_row, self.max_row, self.resolution),
                axis(self.min_column, self.max_column, self.resolution),
            ),
            EnvVariant::Discrete => (
                axis(self.min_row.ceil(), self.max_row, 1.0),
                axis(self.min_column.ceil(), self.max_column, 1.0),
            ),
        };
        Ok(rows
            .iter()
            .flat_map(|&row| columns.iter().map(move |&column| GridState::new(row, column)))
            .collect())
    }
}

/// Number of samples from `min` to `max` at `step` spacing
fn axis_len(min: f64, max: f64, step: f64) -> f64 {
    // tolerate accumulated rounding at the upper edge
    let last = ((max - min) / step + 1e-9).floor();
    if last < 0.0 {
        0.0
    } else {
        last + 1.0
    }
}

fn axis(min: f64, max: f64, step: f64) -> Vec<f64> {
    let len = axis_len(min, max, step) as usize;
    (0..len).map(|i| min + i as f64 * step).collect()
}

/// Action values over a set of states
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSurface {
    /// Sampled states
    pub states: Vec<GridState>,
    /// One row of action values per state
    pub values: Array2<f32>,
}

/// Messages from the experiment driver
#[derive(Debug)]
pub enum AgentMessage {
    /// Action values of the online estimator over a range (whole grid if unset)
    Plot(Option<PlotRange>),
    /// Last hidden layer activations over a range
    Tsne(Option<PlotRange>),
    /// Last hidden layer activations of saved snapshots and a comparison estimator
    Cca {
        /// States to evaluate (whole grid if unset)
        range: Option<PlotRange>,
        /// Saved estimators
        snapshots: Vec<Box<dyn QNetwork>>,
        /// Estimator the snapshots are compared against
        compare_to: Box<dyn QNetwork>,
    },
    /// Deep copy of the online estimator
    GetSnapshot,
    /// Toggle evaluation-only episodes
    SetTrialEpisode(bool),
    /// Re-initialize with driver parameters
    Configure(AgentParams),
}

/// Replies to [`AgentMessage`]
#[derive(Debug)]
pub enum AgentResponse {
    /// Message applied
    Ack,
    /// Reply to `Plot`
    Values(ValueSurface),
    /// Reply to `Tsne`
    Representations {
        /// Sampled states
        states: Vec<GridState>,
        /// One row of activations per state
        activations: Array2<f32>,
    },
    /// Reply to `Cca`
    SnapshotRepresentations {
        /// Sampled states
        states: Vec<GridState>,
        /// Activations of each snapshot, in order
        snapshots: Vec<Array2<f32>>,
        /// Activations of the comparison estimator
        compare_to: Array2<f32>,
    },
    /// Reply to `GetSnapshot`
    Snapshot(Box<dyn QNetwork>),
}

//! State representations and state bounds

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Trait for states in an RL environment
pub trait State: Clone + Debug + Send + Sync {
    /// Get a feature representation of the state
    fn features(&self) -> Vec<f64>;
}

/// A continuous (row, column) coordinate.
///
/// Serialized as a two element array `[row, column]`, which is the shape the
/// experiment driver exchanges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct GridState {
    /// Row coordinate; grows to the north
    pub row: f64,
    /// Column coordinate; grows to the east
    pub column: f64,
}

impl GridState {
    /// Number of coordinates in a state
    pub const NUM_COORDINATES: usize = 2;

    /// Create a new state
    #[must_use]
    pub const fn new(row: f64, column: f64) -> Self {
        Self { row, column }
    }
}

impl State for GridState {
    fn features(&self) -> Vec<f64> {
        vec![self.row, self.column]
    }
}

impl From<[f64; 2]> for GridState {
    fn from([row, column]: [f64; 2]) -> Self {
        Self { row, column }
    }
}

impl From<GridState> for [f64; 2] {
    fn from(state: GridState) -> Self {
        [state.row, state.column]
    }
}

/// Inclusive rectangular bounds of the grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridBounds {
    /// Lowest row
    pub min_row: f64,
    /// Highest row
    pub max_row: f64,
    /// Lowest column
    pub min_column: f64,
    /// Highest column
    pub max_column: f64,
}

impl GridBounds {
    /// Create new bounds, rejecting empty or non-finite ranges
    pub fn new(min_row: f64, max_row: f64, min_column: f64, max_column: f64) -> crate::Result<Self> {
        let bounds = Self { min_row, max_row, min_column, max_column };
        bounds.validate()?;
        Ok(bounds)
    }

    /// Check that both ranges are finite and non-empty
    pub fn validate(&self) -> crate::Result<()> {
        let finite = [self.min_row, self.max_row, self.min_column, self.max_column]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.min_row > self.max_row || self.min_column > self.max_column {
            return Err(crate::RLError::Config(format!("invalid grid bounds {self:?}")));
        }
        Ok(())
    }

    /// Whether the state lies inside the bounds (inclusive)
    #[must_use]
    pub fn contains(&self, state: &GridState) -> bool {
        (self.min_row..=self.max_row).contains(&state.row)
            && (self.min_column..=self.max_column).contains(&state.column)
    }

    /// Clamp each coordinate independently into its range
    #[must_use]
    pub fn clamp(&self, state: GridState) -> GridState {
        GridState {
            row: state.row.clamp(self.min_row, self.max_row),
            column: state.column.clamp(self.min_column, self.max_column),
        }
    }

    /// Number of unit rows spanned, counting both ends
    #[must_use]
    pub fn num_rows(&self) -> usize {
        (self.max_row - self.min_row).floor() as usize + 1
    }

    /// Number of unit columns spanned, counting both ends
    #[must_use]
    pub fn num_columns(&self) -> usize {
        (self.max_column - self.min_column).floor() as usize + 1
    }
}

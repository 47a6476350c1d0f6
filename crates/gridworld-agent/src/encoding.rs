//! State to estimator-input encoding

use ndarray::{Array1, Array2};

use gridworld_core::{GridBounds, GridState};

use crate::config::StateEncoding;

/// Turns grid states into estimator input vectors
#[derive(Debug, Clone, PartialEq)]
pub struct StateEncoder {
    encoding: StateEncoding,
    grid: GridBounds,
    rows: usize,
    columns: usize,
}

impl StateEncoder {
    /// Create an encoder for the given grid
    #[must_use]
    pub fn new(encoding: StateEncoding, grid: GridBounds) -> Self {
        Self {
            encoding,
            grid,
            rows: grid.num_rows(),
            columns: grid.num_columns(),
        }
    }

    /// Length of an encoded state
    #[must_use]
    pub fn width(&self) -> usize {
        match self.encoding {
            StateEncoding::OneHot => self.rows * self.columns,
            StateEncoding::Raw => GridState::NUM_COORDINATES,
        }
    }

    /// Index of the cell nearest to `state`, clamped into the grid
    #[must_use]
    pub fn cell_index(&self, state: &GridState) -> usize {
        let cell = |value: f64, min: f64, count: usize| -> usize {
            let offset = (value - min).round().max(0.0) as usize;
            offset.min(count - 1)
        };
        let row = cell(state.row, self.grid.min_row, self.rows);
        let column = cell(state.column, self.grid.min_column, self.columns);
        row * self.columns + column
    }

    /// Encode one state
    #[must_use]
    pub fn encode(&self, state: &GridState) -> Array1<f32> {
        match self.encoding {
            StateEncoding::OneHot => {
                let mut input = Array1::zeros(self.width());
                input[self.cell_index(state)] = 1.0;
                input
            }
            StateEncoding::Raw => Array1::from(vec![state.row as f32, state.column as f32]),
        }
    }

    /// Encode states as the rows of a matrix
    #[must_use]
    pub fn encode_batch(&self, states: &[GridState]) -> Array2<f32> {
        let mut inputs = Array2::zeros((states.len(), self.width()));
        for (mut row, state) in inputs.rows_mut().into_iter().zip(states) {
            row.assign(&self.encode(state));
        }
        inputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid() -> GridBounds {
        GridBounds::new(0.0, 5.0, 0.0, 8.0).unwrap()
    }

    #[test]
    fn test_raw_encoding() {
        let encoder = StateEncoder::new(StateEncoding::Raw, grid());
        assert_eq!(encoder.width(), 2);
        assert_eq!(encoder.encode(&GridState::new(2.5, 7.0)).to_vec(), vec![2.5, 7.0]);
    }

    #[test]
    fn test_one_hot_encoding() {
        let encoder = StateEncoder::new(StateEncoding::OneHot, grid());
        assert_eq!(encoder.width(), 54);

        let input = encoder.encode(&GridState::new(1.0, 2.0));
        assert_eq!(input.sum(), 1.0);
        assert_eq!(input[9 + 2], 1.0);

        // nearest cell, clamped at the edges
        assert_eq!(encoder.cell_index(&GridState::new(0.4, 0.6)), 1);
        assert_eq!(encoder.cell_index(&GridState::new(5.3, 8.4)), 53);
        assert_eq!(encoder.cell_index(&GridState::new(-2.0, -1.0)), 0);
    }

    #[test]
    fn test_batch_rows_match_single() {
        let encoder = StateEncoder::new(StateEncoding::OneHot, grid());
        let states = [GridState::new(0.0, 0.0), GridState::new(3.0, 4.0)];
        let batch = encoder.encode_batch(&states);
        assert_eq!(batch.dim(), (2, 54));
        assert_eq!(batch.row(1), encoder.encode(&states[1]));
    }
}

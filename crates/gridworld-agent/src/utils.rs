//! Utility functions and helpers for value-based agents

use ndarray::ArrayView1;

use gridworld_core::{AgentPhase, RLError, Result};

/// Reject episode calls made while no episode is in progress
pub fn ensure_episode_active(phase: AgentPhase, call: &str) -> Result<()> {
    if phase == AgentPhase::Idle {
        return Err(RLError::Agent(format!("`{call}` called with no episode in progress")));
    }
    Ok(())
}

/// Index of the largest value; ties go to the lowest index
#[must_use]
pub fn argmax(values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate() {
        if v > values[best] {
            best = i;
        }
    }
    best
}

/// Largest value, or negative infinity for an empty view
#[must_use]
pub fn max_value(values: ArrayView1<f32>) -> f32 {
    values.iter().copied().fold(f32::NEG_INFINITY, f32::max)
}

/// Per-episode linear decay toward a floor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearDecay {
    /// Lower bound
    pub floor: f64,
    /// Amount subtracted per decay
    pub rate: f64,
}

impl LinearDecay {
    /// Create a new schedule
    #[must_use]
    pub fn new(floor: f64, rate: f64) -> Self {
        Self { floor, rate }
    }

    /// Next value after one decay from `current`
    #[must_use]
    pub fn next(&self, current: f64) -> f64 {
        (current - self.rate).max(self.floor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    #[test]
    fn test_argmax_first_maximum() {
        assert_eq!(argmax(arr1(&[0.1, 0.5, 0.5, 0.2]).view()), 1);
        assert_eq!(argmax(arr1(&[2.0, 2.0, 2.0, 2.0]).view()), 0);
        assert_eq!(argmax(arr1(&[-3.0, -1.0, -2.0, -1.5]).view()), 1);
    }

    #[test]
    fn test_max_value() {
        assert_eq!(max_value(arr1(&[-3.0, -1.0, -2.0]).view()), -1.0);
    }

    #[test]
    fn test_episode_guard() {
        assert!(ensure_episode_active(AgentPhase::Idle, "step").is_err());
        assert!(ensure_episode_active(AgentPhase::EpisodeStart, "step").is_ok());
        assert!(ensure_episode_active(AgentPhase::EpisodeTerminal, "end").is_ok());
    }

    #[test]
    fn test_linear_decay_floor() {
        let decay = LinearDecay::new(0.1, 0.25);
        assert_relative_eq!(decay.next(1.0), 0.75);
        assert_relative_eq!(decay.next(decay.next(1.0)), 0.5);
        assert_relative_eq!(decay.next(0.2), 0.1);
        assert_relative_eq!(decay.next(0.1), 0.1);
    }
}

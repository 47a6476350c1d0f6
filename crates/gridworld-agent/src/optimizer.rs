//! First-order optimizers for the estimator parameters

use ndarray::{Array, Dimension};

use crate::config::OptimizerKind;

const ADAM_BETA1: f32 = 0.9;
const ADAM_BETA2: f32 = 0.999;
const RMSPROP_RHO: f32 = 0.9;
const EPSILON: f32 = 1e-7;

/// Per-tensor running statistics
#[derive(Debug, Clone, Default)]
struct Slot {
    first: Vec<f32>,
    second: Vec<f32>,
}

/// Stateful optimizer; each parameter tensor owns one slot
#[derive(Debug, Clone)]
pub struct Optimizer {
    kind: OptimizerKind,
    learning_rate: f32,
    slots: Vec<Slot>,
    iterations: i32,
}

impl Optimizer {
    /// Create a new optimizer
    #[must_use]
    pub fn new(kind: OptimizerKind, learning_rate: f32) -> Self {
        Self {
            kind,
            learning_rate,
            slots: Vec::new(),
            iterations: 0,
        }
    }

    /// Optimizer variant
    #[must_use]
    pub fn kind(&self) -> OptimizerKind {
        self.kind
    }

    /// Mark the start of a new update; Adam's bias correction depends on it
    pub fn begin_step(&mut self) {
        self.iterations = self.iterations.saturating_add(1);
    }

    /// Update one parameter tensor in place from its gradient
    pub fn apply<D: Dimension>(&mut self, slot: usize, param: &mut Array<f32, D>, grad: &Array<f32, D>) {
        if self.slots.len() <= slot {
            self.slots.resize_with(slot + 1, Slot::default);
        }
        let lr = self.learning_rate;
        let state = &mut self.slots[slot];
        if state.first.len() != param.len() {
            state.first = vec![0.0; param.len()];
            state.second = vec![0.0; param.len()];
        }

        let values = param.iter_mut().zip(grad.iter());
        match self.kind {
            OptimizerKind::Sgd => {
                for (p, g) in values {
                    *p -= lr * g;
                }
            }
            OptimizerKind::Adam => {
                let t = self.iterations.max(1);
                let lr_t = lr * (1.0 - ADAM_BETA2.powi(t)).sqrt() / (1.0 - ADAM_BETA1.powi(t));
                for ((p, g), (m, v)) in values.zip(state.first.iter_mut().zip(state.second.iter_mut())) {
                    *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * g;
                    *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * g * g;
                    *p -= lr_t * *m / (v.sqrt() + EPSILON);
                }
            }
            OptimizerKind::RmsProp => {
                for ((p, g), v) in values.zip(state.second.iter_mut()) {
                    *v = RMSPROP_RHO * *v + (1.0 - RMSPROP_RHO) * g * g;
                    *p -= lr * g / (v.sqrt() + EPSILON);
                }
            }
            OptimizerKind::Adagrad => {
                for ((p, g), v) in values.zip(state.second.iter_mut()) {
                    *v += g * g;
                    *p -= lr * g / (v.sqrt() + EPSILON);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::arr1;

    fn minimise(kind: OptimizerKind, lr: f32, steps: usize) -> f32 {
        // f(x) = (x - 3)^2
        let mut optimizer = Optimizer::new(kind, lr);
        let mut x = arr1(&[0.0f32]);
        for _ in 0..steps {
            optimizer.begin_step();
            let grad = x.mapv(|v| 2.0 * (v - 3.0));
            optimizer.apply(0, &mut x, &grad);
        }
        x[0]
    }

    #[test]
    fn test_sgd_single_step() {
        let mut optimizer = Optimizer::new(OptimizerKind::Sgd, 0.1);
        let mut x = arr1(&[1.0f32, -1.0]);
        optimizer.begin_step();
        optimizer.apply(0, &mut x, &arr1(&[2.0, -4.0]));
        assert_relative_eq!(x[0], 0.8);
        assert_relative_eq!(x[1], -0.6);
    }

    #[test]
    fn test_adam_first_step_moves_by_learning_rate() {
        let mut optimizer = Optimizer::new(OptimizerKind::Adam, 0.01);
        let mut x = arr1(&[0.0f32]);
        optimizer.begin_step();
        optimizer.apply(0, &mut x, &arr1(&[5.0]));
        assert_relative_eq!(x[0], -0.01, epsilon = 1e-5);
    }

    #[test]
    fn test_every_kind_converges() {
        assert_relative_eq!(minimise(OptimizerKind::Sgd, 0.1, 200), 3.0, epsilon = 1e-3);
        assert_relative_eq!(minimise(OptimizerKind::Adam, 0.1, 500), 3.0, epsilon = 1e-2);
        assert_relative_eq!(minimise(OptimizerKind::RmsProp, 0.01, 2000), 3.0, epsilon = 5e-2);
        assert_relative_eq!(minimise(OptimizerKind::Adagrad, 1.0, 500), 3.0, epsilon = 1e-2);
    }
}

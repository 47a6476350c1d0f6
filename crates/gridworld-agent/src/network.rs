//! Action-value estimators
//!
//! `QNetwork` is the seam between the agent and its function approximator.
//! `MlpQNetwork` is a pure ndarray multi-layer perceptron: ReLU hidden
//! layers, a linear output with one value per action, mean squared error
//! loss and one of the optimizers in [`crate::optimizer`].

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use rand_distr::{Distribution, Normal};

use gridworld_core::{RLError, Result};

use crate::config::{Initializer, OptimizerKind};
use crate::optimizer::Optimizer;

/// A trainable mapping from encoded states to one value per action
pub trait QNetwork: std::fmt::Debug + Send + Sync {
    /// Width of the input vector
    fn input_dim(&self) -> usize;

    /// Number of action values produced
    fn num_actions(&self) -> usize;

    /// Action values for a batch of inputs, one row per input
    fn predict_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// Action values for a single input
    fn predict(&self, input: ArrayView1<f32>) -> Result<Array1<f32>> {
        let batch = input.insert_axis(Axis(0));
        let values = self.predict_batch(batch)?;
        Ok(values.row(0).to_owned())
    }

    /// Activations of the last hidden layer, one row per input
    fn hidden_representation(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>>;

    /// One gradient pass over the batch toward `targets`; returns the loss before the update
    fn train_step(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32>;

    /// All parameters, flattened layer by layer
    fn parameters(&self) -> Vec<f32>;

    /// Overwrite all parameters from a flat vector
    fn set_parameters(&mut self, params: &[f32]) -> Result<()>;

    /// Whole-parameter copy from another estimator of the same architecture
    fn clone_parameters_from(&mut self, other: &dyn QNetwork) -> Result<()> {
        if other.layer_sizes() != self.layer_sizes() {
            return Err(RLError::Computation(format!(
                "cannot copy parameters from architecture {:?} into {:?}",
                other.layer_sizes(),
                self.layer_sizes()
            )));
        }
        self.set_parameters(&other.parameters())
    }

    /// Layer widths from input to output
    fn layer_sizes(&self) -> Vec<usize>;

    /// Deep copy
    fn boxed_clone(&self) -> Box<dyn QNetwork>;
}

/// Architecture and training settings of an MLP estimator
#[derive(Debug, Clone, PartialEq)]
pub struct MlpSpec {
    /// Input dimension
    pub input_dim: usize,
    /// Hidden layer sizes
    pub hidden_dims: Vec<usize>,
    /// Output dimension (action count)
    pub output_dim: usize,
    /// Weight initializer
    pub initializer: Initializer,
    /// Optimizer
    pub optimizer: OptimizerKind,
    /// Optimizer step size
    pub learning_rate: f32,
}

#[derive(Debug, Clone)]
struct Dense {
    weights: Array2<f32>,
    bias: Array1<f32>,
}

/// Pure ndarray multi-layer perceptron
#[derive(Debug, Clone)]
pub struct MlpQNetwork {
    spec: MlpSpec,
    layers: Vec<Dense>,
    optimizer: Optimizer,
}

impl MlpQNetwork {
    /// Create a network with freshly initialized weights and zero biases
    pub fn new<R: Rng + ?Sized>(spec: MlpSpec, rng: &mut R) -> Result<Self> {
        if spec.input_dim == 0 || spec.output_dim == 0 || spec.hidden_dims.contains(&0) {
            return Err(RLError::Config(format!("layer widths must be non-zero: {spec:?}")));
        }

        let mut layers = Vec::with_capacity(spec.hidden_dims.len() + 1);
        let mut prev_dim = spec.input_dim;
        for &dim in spec.hidden_dims.iter().chain(std::iter::once(&spec.output_dim)) {
            layers.push(Dense {
                weights: Self::init_weights(spec.initializer, prev_dim, dim, rng)?,
                bias: Array1::zeros(dim),
            });
            prev_dim = dim;
        }

        let optimizer = Optimizer::new(spec.optimizer, spec.learning_rate);
        Ok(Self { spec, layers, optimizer })
    }

    fn init_weights<R: Rng + ?Sized>(
        initializer: Initializer,
        in_dim: usize,
        out_dim: usize,
        rng: &mut R,
    ) -> Result<Array2<f32>> {
        let std = match initializer {
            Initializer::RandomUniform => {
                return Ok(Array2::from_shape_fn((in_dim, out_dim), |_| rng.gen_range(-0.05..0.05)));
            }
            Initializer::GlorotNormal => (2.0 / (in_dim + out_dim) as f32).sqrt(),
            Initializer::HeNormal => (2.0 / in_dim as f32).sqrt(),
        };
        let normal = Normal::new(0.0f32, std).map_err(|e| RLError::Computation(e.to_string()))?;
        Ok(Array2::from_shape_fn((in_dim, out_dim), |_| normal.sample(rng)))
    }

    /// Architecture and training settings
    #[must_use]
    pub fn spec(&self) -> &MlpSpec {
        &self.spec
    }

    fn check_input(&self, inputs: &ArrayView2<f32>) -> Result<()> {
        if inputs.ncols() != self.spec.input_dim {
            return Err(RLError::DimensionMismatch {
                expected: self.spec.input_dim,
                actual: inputs.ncols(),
            });
        }
        Ok(())
    }

    /// Forward pass keeping every layer's activation; index 0 is the input
    fn forward(&self, inputs: ArrayView2<f32>) -> Vec<Array2<f32>> {
        let mut activations = Vec::with_capacity(self.layers.len() + 1);
        activations.push(inputs.to_owned());
        let last = self.layers.len() - 1;
        for (i, layer) in self.layers.iter().enumerate() {
            let mut z = activations[i].dot(&layer.weights) + &layer.bias;
            if i < last {
                z.mapv_inplace(|v| v.max(0.0));
            }
            activations.push(z);
        }
        activations
    }
}

impl QNetwork for MlpQNetwork {
    fn input_dim(&self) -> usize {
        self.spec.input_dim
    }

    fn num_actions(&self) -> usize {
        self.spec.output_dim
    }

    fn predict_batch(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&inputs)?;
        let mut activations = self.forward(inputs);
        activations
            .pop()
            .ok_or_else(|| RLError::Computation("network has no layers".into()))
    }

    fn hidden_representation(&self, inputs: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_input(&inputs)?;
        let mut activations = self.forward(inputs);
        // drop the output; what remains last is the deepest hidden layer (or the input)
        activations.pop();
        activations
            .pop()
            .ok_or_else(|| RLError::Computation("network has no layers".into()))
    }

    fn train_step(&mut self, inputs: ArrayView2<f32>, targets: ArrayView2<f32>) -> Result<f32> {
        self.check_input(&inputs)?;
        if targets.dim() != (inputs.nrows(), self.spec.output_dim) {
            return Err(RLError::DimensionMismatch {
                expected: inputs.nrows() * self.spec.output_dim,
                actual: targets.len(),
            });
        }
        if inputs.nrows() == 0 {
            return Ok(0.0);
        }

        let activations = self.forward(inputs);
        let output = &activations[self.layers.len()];
        let error = output - &targets;
        let count = error.len() as f32;
        let loss = error.mapv(|e| e * e).sum() / count;

        // d(mean squared error)/d(output)
        let mut delta = error * (2.0 / count);
        let mut gradients = Vec::with_capacity(self.layers.len());
        for i in (0..self.layers.len()).rev() {
            let input = &activations[i];
            let grad_w = input.t().dot(&delta);
            let grad_b = delta.sum_axis(Axis(0));
            if i > 0 {
                let mut upstream = delta.dot(&self.layers[i].weights.t());
                // ReLU derivative of the layer that produced `input`
                upstream.zip_mut_with(input, |d, &a| {
                    if a <= 0.0 {
                        *d = 0.0;
                    }
                });
                delta = upstream;
            }
            gradients.push((i, grad_w, grad_b));
        }

        self.optimizer.begin_step();
        for (i, grad_w, grad_b) in gradients {
            let layer = &mut self.layers[i];
            self.optimizer.apply(2 * i, &mut layer.weights, &grad_w);
            self.optimizer.apply(2 * i + 1, &mut layer.bias, &grad_b);
        }

        Ok(loss)
    }

    fn parameters(&self) -> Vec<f32> {
        let mut params = Vec::new();
        for layer in &self.layers {
            params.extend(layer.weights.iter().copied());
            params.extend(layer.bias.iter().copied());
        }
        params
    }

    fn set_parameters(&mut self, params: &[f32]) -> Result<()> {
        let expected: usize = self.layers.iter().map(|l| l.weights.len() + l.bias.len()).sum();
        if params.len() != expected {
            return Err(RLError::DimensionMismatch {
                expected,
                actual: params.len(),
            });
        }

        let mut values = params.iter().copied();
        for layer in &mut self.layers {
            for (w, v) in layer.weights.iter_mut().zip(values.by_ref()) {
                *w = v;
            }
            for (b, v) in layer.bias.iter_mut().zip(values.by_ref()) {
                *b = v;
            }
        }
        Ok(())
    }

    fn layer_sizes(&self) -> Vec<usize> {
        std::iter::once(self.spec.input_dim)
            .chain(self.spec.hidden_dims.iter().copied())
            .chain(std::iter::once(self.spec.output_dim))
            .collect()
    }

    fn boxed_clone(&self) -> Box<dyn QNetwork> {
        Box::new(self.clone())
    }
}

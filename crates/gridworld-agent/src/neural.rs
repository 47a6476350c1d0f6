//! Neural action-value agent
//!
//! Epsilon-greedy control over an online estimator, bootstrapped from a
//! periodically synchronized target estimator, with uniform experience
//! replay once enough observations are stored.

use async_trait::async_trait;
use metrics::{counter, gauge, histogram};
use ndarray::{Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

use gridworld_core::{
    Action, ActionSpace, Agent, AgentMetrics, AgentPhase, CompassSpace, GridAction, GridState,
    RLError, Result, Reward,
};

use crate::buffer::{ExperienceStore, SamplingPolicy, Transition};
use crate::config::{AgentVariant, DqnConfig};
use crate::encoding::StateEncoder;
use crate::message::{AgentMessage, AgentResponse, PlotRange, ValueSurface};
use crate::network::{MlpQNetwork, MlpSpec, QNetwork};
use crate::utils::{argmax, ensure_episode_active, max_value, LinearDecay};

/// Agent with an online/target estimator pair and experience replay
#[derive(Debug)]
pub struct NeuralAgent {
    config: DqnConfig,
    encoder: StateEncoder,
    online: Box<dyn QNetwork>,
    target: Box<dyn QNetwork>,
    store: ExperienceStore,
    context: VecDeque<GridState>,
    epsilon: f64,
    decay: LinearDecay,
    trial: bool,
    phase: AgentPhase,
    current_state: Option<GridState>,
    current_action: Option<GridAction>,
    last_batch_rows: usize,
    rng: StdRng,
    metrics: AgentMetrics,
}

impl NeuralAgent {
    /// Build an agent from a validated configuration
    pub fn new(config: DqnConfig) -> Result<Self> {
        config.validate()?;
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let encoder = StateEncoder::new(config.encoding, config.grid);
        let spec = MlpSpec {
            input_dim: config.feature_vector_size(),
            hidden_dims: config.hidden_layers.clone(),
            output_dim: GridAction::COUNT,
            initializer: config.initializer,
            optimizer: config.optimizer,
            learning_rate: config.learning_rate as f32,
        };
        let online: Box<dyn QNetwork> = Box::new(MlpQNetwork::new(spec, &mut rng)?);
        let target = online.boxed_clone();
        info!(
            layers = ?online.layer_sizes(),
            optimizer = ?config.optimizer,
            encoding = ?config.encoding,
            "estimator initialized"
        );

        let decay = LinearDecay::new(config.epsilon_min, config.epsilon_decay_rate);
        let epsilon = config.epsilon_start;
        gauge!("gridworld_agent_epsilon", epsilon);

        Ok(Self {
            store: ExperienceStore::new(config.replay_capacity, SamplingPolicy::Uniform),
            context: VecDeque::with_capacity(config.context_size),
            encoder,
            online,
            target,
            epsilon,
            decay,
            trial: false,
            phase: AgentPhase::Idle,
            current_state: None,
            current_action: None,
            last_batch_rows: 0,
            rng,
            metrics: AgentMetrics {
                epsilon,
                ..AgentMetrics::default()
            },
            config,
        })
    }

    /// Current exploration rate
    #[must_use]
    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    /// Whether episodes are evaluation-only
    #[must_use]
    pub fn is_trial(&self) -> bool {
        self.trial
    }

    /// Configuration in effect
    #[must_use]
    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Replay store
    #[must_use]
    pub fn store(&self) -> &ExperienceStore {
        &self.store
    }

    /// Estimator trained every step
    #[must_use]
    pub fn online(&self) -> &dyn QNetwork {
        self.online.as_ref()
    }

    /// Estimator used for bootstrapped targets
    #[must_use]
    pub fn target(&self) -> &dyn QNetwork {
        self.target.as_ref()
    }

    /// Rows in the most recent gradient pass
    #[must_use]
    pub fn last_batch_rows(&self) -> usize {
        self.last_batch_rows
    }

    fn current(&self) -> Result<(GridState, GridAction)> {
        match (self.current_state, self.current_action) {
            (Some(state), Some(action)) => Ok((state, action)),
            _ => Err(RLError::Agent("no current state and action; call start first".into())),
        }
    }

    fn select_action(&mut self, state: &GridState) -> Result<GridAction> {
        // the roll is drawn in trial episodes too so the sequence stays aligned
        let roll: f64 = self.rng.gen();
        if !self.trial && roll < self.epsilon {
            return Ok(CompassSpace.sample(&mut self.rng));
        }
        let values = self.online.predict(self.encoder.encode(state).view())?;
        GridAction::try_from(argmax(values.view()))
    }

    /// `reward + gamma * max_a target(next_state)[a]`
    fn td_target(&self, reward: Reward, next_state: &GridState) -> Result<f32> {
        let next_values = self.target.predict(self.encoder.encode(next_state).view())?;
        Ok(reward.value() as f32 + self.config.gamma as f32 * max_value(next_values.view()))
    }

    /// Online output for `state` with only `action`'s entry replaced by `value`
    fn masked_row(&self, state: &GridState, action: GridAction, value: f32) -> Result<Array1<f32>> {
        let mut row = self.online.predict(self.encoder.encode(state).view())?;
        row[action.index()] = value;
        Ok(row)
    }

    /// Input and target row for a stored observation, from its own reward and action
    fn replay_example(&self, observation: &Transition) -> Result<(Array1<f32>, Array1<f32>)> {
        let state = observation
            .most_recent_state()
            .ok_or_else(|| RLError::InvalidState("stored observation has an empty context".into()))?;
        let value = self.td_target(observation.reward, &observation.next_state)?;
        let row = self.masked_row(state, observation.action, value)?;
        Ok((self.encoder.encode(state), row))
    }

    fn train(&mut self, inputs: &Array2<f32>, targets: &Array2<f32>) -> Result<()> {
        let loss = self.online.train_step(inputs.view(), targets.view())?;
        self.last_batch_rows = inputs.nrows();
        self.metrics.updates += 1;
        self.metrics.loss = Some(f64::from(loss));
        counter!("gridworld_agent_updates", 1);
        histogram!("gridworld_agent_loss", f64::from(loss));
        Ok(())
    }

    fn learn(&mut self, state: GridState, action: GridAction, reward: Reward, next_state: GridState) -> Result<()> {
        let value = self.td_target(reward, &next_state)?;
        let row = self.masked_row(&state, action, value)?;
        let input = self.encoder.encode(&state);

        let rows = if self.store.is_ready(self.config.buffer_size) {
            self.config.batch_size
        } else {
            1
        };
        let mut inputs = Array2::zeros((rows, self.encoder.width()));
        let mut targets = Array2::zeros((rows, GridAction::COUNT));
        inputs.row_mut(0).assign(&input);
        targets.row_mut(0).assign(&row);

        for i in 1..rows {
            let observation = self
                .store
                .sample(&mut self.rng)
                .cloned()
                .ok_or_else(|| RLError::Computation("replay store emptied while sampling".into()))?;
            let (input, row) = self.replay_example(&observation)?;
            inputs.row_mut(i).assign(&input);
            targets.row_mut(i).assign(&row);
        }
        if rows > 1 {
            debug!(rows, stored = self.store.len(), "replay batch assembled");
        }

        self.train(&inputs, &targets)
    }

    fn sync_target(&mut self) -> Result<()> {
        self.target.clone_parameters_from(self.online.as_ref())?;
        self.metrics.target_syncs += 1;
        counter!("gridworld_agent_target_syncs", 1);
        debug!(step = self.metrics.total_steps, "target estimator synchronized");
        Ok(())
    }

    fn plot_states(&self, range: Option<PlotRange>) -> Result<Vec<GridState>> {
        range
            .unwrap_or_else(|| PlotRange::from_bounds(&self.config.grid))
            .states(self.config.env)
    }

    fn handle_message(&mut self, message: AgentMessage) -> Result<AgentResponse> {
        match message {
            AgentMessage::Plot(range) => {
                let states = self.plot_states(range)?;
                let values = self.online.predict_batch(self.encoder.encode_batch(&states).view())?;
                Ok(AgentResponse::Values(ValueSurface { states, values }))
            }
            AgentMessage::Tsne(range) => {
                let states = self.plot_states(range)?;
                let activations = self
                    .online
                    .hidden_representation(self.encoder.encode_batch(&states).view())?;
                Ok(AgentResponse::Representations { states, activations })
            }
            AgentMessage::Cca {
                range,
                snapshots,
                compare_to,
            } => {
                let states = self.plot_states(range)?;
                let inputs = self.encoder.encode_batch(&states);
                let snapshots = snapshots
                    .iter()
                    .map(|net| net.hidden_representation(inputs.view()))
                    .collect::<Result<Vec<_>>>()?;
                let compare_to = compare_to.hidden_representation(inputs.view())?;
                Ok(AgentResponse::SnapshotRepresentations {
                    states,
                    snapshots,
                    compare_to,
                })
            }
            AgentMessage::GetSnapshot => Ok(AgentResponse::Snapshot(self.online.boxed_clone())),
            AgentMessage::SetTrialEpisode(trial) => {
                self.set_trial_episode(trial);
                Ok(AgentResponse::Ack)
            }
            AgentMessage::Configure(params) => {
                if params.agent != AgentVariant::Neural {
                    return Err(RLError::Config(format!(
                        "a neural agent cannot become {:?}; rebuild it with make_agent",
                        params.agent
                    )));
                }
                let mut config = self.config.clone();
                config.apply(&params);
                let trial = self.trial;
                *self = Self::new(config)?;
                self.trial = trial;
                info!(
                    input_dim = self.online.input_dim(),
                    epsilon = self.epsilon,
                    "agent reconfigured"
                );
                Ok(AgentResponse::Ack)
            }
        }
    }
}

#[async_trait]
impl Agent for NeuralAgent {
    type State = GridState;
    type Action = GridAction;
    type Message = AgentMessage;
    type Response = AgentResponse;

    async fn start(&mut self, state: GridState) -> Result<GridAction> {
        if self.phase != AgentPhase::Idle {
            warn!(phase = ?self.phase, "episode started before the previous one was cleaned up");
        }
        self.context.clear();
        let action = self.select_action(&state)?;
        self.current_state = Some(state);
        self.current_action = Some(action);
        self.phase = AgentPhase::EpisodeStart;
        Ok(action)
    }

    async fn step(&mut self, reward: Reward, state: GridState) -> Result<GridAction> {
        ensure_episode_active(self.phase, "step")?;
        let (current_state, current_action) = self.current()?;
        self.metrics.total_steps += 1;

        self.context.push_back(current_state);
        while self.context.len() > self.config.context_size {
            self.context.pop_front();
        }
        if !self.trial {
            self.store.insert(Transition {
                states: self.context.iter().copied().collect(),
                action: current_action,
                reward,
                next_state: state,
            });
        }

        let next_action = self.select_action(&state)?;

        if !self.trial {
            self.learn(current_state, current_action, reward, state)?;
            if self.metrics.total_steps % self.config.num_steps_to_update == 0 {
                self.sync_target()?;
            }
        }

        self.current_state = Some(state);
        self.current_action = Some(next_action);
        self.phase = AgentPhase::EpisodeRunning;
        Ok(next_action)
    }

    async fn end(&mut self, reward: Reward) -> Result<()> {
        ensure_episode_active(self.phase, "end")?;
        let (current_state, current_action) = self.current()?;
        self.metrics.total_steps += 1;

        if !self.trial {
            let row = self.masked_row(&current_state, current_action, reward.value() as f32)?;
            let input = self.encoder.encode(&current_state).insert_axis(Axis(0));
            let targets = row.insert_axis(Axis(0));
            self.train(&input, &targets)?;
        }

        self.phase = AgentPhase::EpisodeTerminal;
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<()> {
        if !self.trial {
            self.epsilon = self.decay.next(self.epsilon);
            self.metrics.epsilon = self.epsilon;
            gauge!("gridworld_agent_epsilon", self.epsilon);
        }
        self.metrics.total_episodes += 1;
        info!(
            episode = self.metrics.total_episodes,
            epsilon = self.epsilon,
            trial = self.trial,
            "episode cleaned up"
        );

        self.current_state = None;
        self.current_action = None;
        self.phase = AgentPhase::Idle;
        Ok(())
    }

    async fn message(&mut self, message: AgentMessage) -> Result<AgentResponse> {
        self.handle_message(message)
    }

    fn set_trial_episode(&mut self, trial: bool) {
        self.trial = trial;
    }

    fn phase(&self) -> AgentPhase {
        self.phase
    }

    fn metrics(&self) -> AgentMetrics {
        self.metrics.clone()
    }
}

//! Episode driver for an environment/agent pair
//!
//! Sequences the calls of one run: `reset` → `start` → (`step` → `step`)* →
//! `end` → `cleanup`, with optional step limits and evaluation (trial)
//! episodes interleaved with training.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{Agent, Environment};

/// Summary of one finished episode
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeRecord {
    /// Episode ID
    pub id: String,
    /// Zero-based index within the run
    pub index: usize,
    /// Whether the episode ran in evaluation mode
    pub trial: bool,
    /// Total reward
    pub total_reward: f64,
    /// Number of environment steps
    pub steps: usize,
    /// Whether the goal was reached (as opposed to hitting the step limit)
    pub reached_terminal: bool,
    /// Start time
    pub start_time: chrono::DateTime<chrono::Utc>,
    /// End time
    pub end_time: chrono::DateTime<chrono::Utc>,
}

/// Run-level settings of the driver
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentConfig {
    /// Episodes to run
    pub num_episodes: usize,
    /// Cut an episode off after this many steps
    pub max_steps_per_episode: Option<usize>,
    /// Every n-th episode (1-based) is a trial episode
    pub trial_every: Option<usize>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            num_episodes: 100,
            max_steps_per_episode: Some(1000),
            trial_every: None,
        }
    }
}

impl ExperimentConfig {
    /// Whether episode `index` (zero-based) is an evaluation episode
    #[must_use]
    pub fn is_trial(&self, index: usize) -> bool {
        match self.trial_every {
            Some(n) if n > 0 => (index + 1) % n == 0,
            _ => false,
        }
    }
}

/// Drives episodes of one environment/agent pair
pub struct Experiment<E, A> {
    env: E,
    agent: A,
    config: ExperimentConfig,
    total_steps: u64,
    records: Vec<EpisodeRecord>,
}

impl<E, A> Experiment<E, A>
where
    E: Environment,
    A: Agent<State = E::State, Action = E::Action>,
{
    /// Create a new experiment
    pub fn new(env: E, agent: A, config: ExperimentConfig) -> Self {
        Self {
            env,
            agent,
            config,
            total_steps: 0,
            records: Vec::new(),
        }
    }

    /// Run one episode to termination or to the step limit
    pub async fn run_episode(&mut self, trial: bool) -> crate::Result<EpisodeRecord> {
        let index = self.records.len();
        let start_time = chrono::Utc::now();
        self.agent.set_trial_episode(trial);

        let state = self.env.reset().await?;
        let mut action = self.agent.start(state).await?;
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut reached_terminal = false;

        loop {
            let step = self.env.step(action).await?;
            steps += 1;
            self.total_steps += 1;
            total_reward += step.reward.value();

            if step.is_terminal {
                self.agent.end(step.reward).await?;
                reached_terminal = true;
                break;
            }

            action = self.agent.step(step.reward, step.state).await?;

            if self.config.max_steps_per_episode.is_some_and(|max| steps >= max) {
                debug!(episode = index, steps, "episode cut off at step limit");
                break;
            }
        }

        self.agent.cleanup().await?;

        let record = EpisodeRecord {
            id: uuid::Uuid::new_v4().to_string(),
            index,
            trial,
            total_reward,
            steps,
            reached_terminal,
            start_time,
            end_time: chrono::Utc::now(),
        };
        info!(
            episode = index,
            trial,
            steps,
            total_reward,
            reached_terminal,
            "episode finished"
        );
        self.records.push(record.clone());
        Ok(record)
    }

    /// Run every configured episode
    pub async fn run(&mut self) -> crate::Result<&[EpisodeRecord]> {
        for index in 0..self.config.num_episodes {
            let trial = self.config.is_trial(index);
            self.run_episode(trial).await?;
        }
        self.env.close().await?;
        Ok(&self.records)
    }

    /// Environment steps taken across the whole run
    #[must_use]
    pub fn total_steps(&self) -> u64 {
        self.total_steps
    }

    /// Records of the episodes run so far
    #[must_use]
    pub fn records(&self) -> &[EpisodeRecord] {
        &self.records
    }

    /// The agent
    pub fn agent(&self) -> &A {
        &self.agent
    }

    /// The agent, mutably (for snapshot or plot messages between episodes)
    pub fn agent_mut(&mut self) -> &mut A {
        &mut self.agent
    }

    /// The environment
    pub fn env(&self) -> &E {
        &self.env
    }

    /// Give back the environment and the agent
    pub fn into_parts(self) -> (E, A) {
        (self.env, self.agent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AgentPhase, EnvMessage, GridAction, GridState, Reward, Step};
    use async_trait::async_trait;

    /// Walks east one column per step; terminal at column 3
    struct Corridor {
        state: GridState,
    }

    #[async_trait]
    impl Environment for Corridor {
        type State = GridState;
        type Action = GridAction;

        async fn reset(&mut self) -> crate::Result<GridState> {
            self.state = GridState::new(0.0, 0.0);
            Ok(self.state)
        }

        async fn step(&mut self, action: GridAction) -> crate::Result<Step<GridState>> {
            let (dr, dc) = action.direction();
            self.state = GridState::new(self.state.row + dr, self.state.column + dc);
            let is_terminal = self.state.column >= 3.0;
            Ok(Step {
                reward: Reward(if is_terminal { 1.0 } else { 0.0 }),
                state: self.state,
                is_terminal,
            })
        }

        async fn message(&mut self, _message: EnvMessage) -> crate::Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
        trials: Vec<bool>,
        trial: bool,
        phase: AgentPhase,
    }

    #[async_trait]
    impl Agent for Recorder {
        type State = GridState;
        type Action = GridAction;
        type Message = ();
        type Response = ();

        async fn start(&mut self, _state: GridState) -> crate::Result<GridAction> {
            self.calls.push("start");
            self.trials.push(self.trial);
            self.phase = AgentPhase::EpisodeStart;
            Ok(GridAction::East)
        }

        async fn step(&mut self, _reward: Reward, _state: GridState) -> crate::Result<GridAction> {
            self.calls.push("step");
            self.phase = AgentPhase::EpisodeRunning;
            Ok(GridAction::East)
        }

        async fn end(&mut self, reward: Reward) -> crate::Result<()> {
            assert_eq!(reward, Reward(1.0));
            self.calls.push("end");
            self.phase = AgentPhase::EpisodeTerminal;
            Ok(())
        }

        async fn cleanup(&mut self) -> crate::Result<()> {
            self.calls.push("cleanup");
            self.phase = AgentPhase::Idle;
            Ok(())
        }

        async fn message(&mut self, _message: ()) -> crate::Result<()> {
            Ok(())
        }

        fn set_trial_episode(&mut self, trial: bool) {
            self.trial = trial;
        }

        fn phase(&self) -> AgentPhase {
            self.phase
        }
    }

    #[tokio::test]
    async fn test_episode_call_sequence() {
        let env = Corridor { state: GridState::new(0.0, 0.0) };
        let mut experiment = Experiment::new(env, Recorder::default(), ExperimentConfig::default());

        let record = experiment.run_episode(false).await.unwrap();
        assert!(record.reached_terminal);
        assert_eq!(record.steps, 3);
        assert_eq!(record.total_reward, 1.0);
        assert_eq!(
            experiment.agent().calls,
            vec!["start", "step", "step", "end", "cleanup"]
        );
        assert_eq!(experiment.agent().phase(), AgentPhase::Idle);
    }

    #[tokio::test]
    async fn test_step_limit_skips_end() {
        let env = Corridor { state: GridState::new(0.0, 0.0) };
        let config = ExperimentConfig {
            num_episodes: 1,
            max_steps_per_episode: Some(2),
            trial_every: None,
        };
        let mut experiment = Experiment::new(env, Recorder::default(), config);

        let record = experiment.run_episode(false).await.unwrap();
        assert!(!record.reached_terminal);
        assert_eq!(record.steps, 2);
        assert!(!experiment.agent().calls.contains(&"end"));
        assert_eq!(experiment.agent().calls.last(), Some(&"cleanup"));
    }

    #[tokio::test]
    async fn test_trial_schedule_and_step_counter() {
        let env = Corridor { state: GridState::new(0.0, 0.0) };
        let config = ExperimentConfig {
            num_episodes: 4,
            max_steps_per_episode: None,
            trial_every: Some(2),
        };
        let mut experiment = Experiment::new(env, Recorder::default(), config);

        let records = experiment.run().await.unwrap();
        assert_eq!(records.len(), 4);
        let trials: Vec<bool> = records.iter().map(|r| r.trial).collect();
        assert_eq!(trials, vec![false, true, false, true]);
        assert_eq!(experiment.total_steps(), 12);
        assert_eq!(experiment.agent().trials, trials);
    }

    #[test]
    fn test_no_trials_without_schedule() {
        let config = ExperimentConfig::default();
        assert!((0..10).all(|i| !config.is_trial(i)));
    }
}

//! Random agent for baseline comparisons

use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, warn};

use gridworld_core::{
    ActionSpace, Agent, AgentMetrics, AgentPhase, CompassSpace, GridAction, GridState, RLError,
    Result, Reward,
};

use crate::config::{AgentVariant, DqnConfig};
use crate::message::{AgentMessage, AgentResponse};
use crate::utils::ensure_episode_active;

/// Random agent that selects actions uniformly at random
#[derive(Debug)]
pub struct RandomAgent {
    /// Configuration
    config: DqnConfig,
    /// Action space
    action_space: CompassSpace,
    /// Action sampler
    rng: StdRng,
    trial: bool,
    phase: AgentPhase,
    metrics: AgentMetrics,
}

impl RandomAgent {
    /// Create a new random agent
    pub fn new(config: DqnConfig) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self {
            config,
            action_space: CompassSpace,
            rng,
            trial: false,
            phase: AgentPhase::Idle,
            metrics: AgentMetrics::default(),
        })
    }

    /// Configuration in effect
    #[must_use]
    pub fn config(&self) -> &DqnConfig {
        &self.config
    }

    /// Whether the current episode is a trial episode
    #[must_use]
    pub fn is_trial(&self) -> bool {
        self.trial
    }
}

#[async_trait]
impl Agent for RandomAgent {
    type State = GridState;
    type Action = GridAction;
    type Message = AgentMessage;
    type Response = AgentResponse;

    async fn start(&mut self, _state: GridState) -> Result<GridAction> {
        if self.phase != AgentPhase::Idle {
            warn!(phase = ?self.phase, "episode started before the previous one was cleaned up");
        }
        self.phase = AgentPhase::EpisodeStart;
        Ok(self.action_space.sample(&mut self.rng))
    }

    async fn step(&mut self, _reward: Reward, _state: GridState) -> Result<GridAction> {
        // Random agent doesn't learn from experience
        ensure_episode_active(self.phase, "step")?;
        self.metrics.total_steps += 1;
        self.phase = AgentPhase::EpisodeRunning;
        Ok(self.action_space.sample(&mut self.rng))
    }

    async fn end(&mut self, _reward: Reward) -> Result<()> {
        ensure_episode_active(self.phase, "end")?;
        self.metrics.total_steps += 1;
        self.phase = AgentPhase::EpisodeTerminal;
        Ok(())
    }

    async fn cleanup(&mut self) -> Result<()> {
        self.metrics.total_episodes += 1;
        debug!(episode = self.metrics.total_episodes, trial = self.trial, "episode cleaned up");
        self.phase = AgentPhase::Idle;
        Ok(())
    }

    async fn message(&mut self, message: AgentMessage) -> Result<AgentResponse> {
        match message {
            AgentMessage::SetTrialEpisode(trial) => {
                self.trial = trial;
                Ok(AgentResponse::Ack)
            }
            AgentMessage::Configure(params) => {
                if params.agent != AgentVariant::Random {
                    return Err(RLError::Config(format!(
                        "a random agent cannot become {:?}; rebuild it with make_agent",
                        params.agent
                    )));
                }
                let mut config = self.config.clone();
                config.apply(&params);
                config.validate()?;
                self.config = config;
                Ok(AgentResponse::Ack)
            }
            AgentMessage::Plot(_)
            | AgentMessage::Tsne(_)
            | AgentMessage::Cca { .. }
            | AgentMessage::GetSnapshot => {
                Err(RLError::Agent("the random agent has no value estimator".into()))
            }
        }
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

#[cfg(test)]
mod tests {
    use super::*;

    fn agent() -> RandomAgent {
        RandomAgent::new(DqnConfig {
            seed: Some(3),
            ..DqnConfig::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_uses_every_action() {
        let mut agent = agent();
        let mut seen = [false; GridAction::COUNT];
        agent.start(GridState::new(0.0, 0.0)).await.unwrap();
        for _ in 0..100 {
            let action = agent.step(Reward(-1.0), GridState::new(0.0, 0.0)).await.unwrap();
            seen[action as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
        assert_eq!(agent.metrics().total_steps, 100);
    }

    #[tokio::test]
    async fn test_estimator_messages_fail() {
        let mut agent = agent();
        assert!(agent.message(AgentMessage::Plot(None)).await.is_err());
        assert!(agent.message(AgentMessage::GetSnapshot).await.is_err());
        assert!(matches!(
            agent.message(AgentMessage::SetTrialEpisode(true)).await.unwrap(),
            AgentResponse::Ack
        ));
    }

    #[tokio::test]
    async fn test_step_requires_episode() {
        let mut agent = agent();
        assert!(agent.step(Reward(0.0), GridState::new(0.0, 0.0)).await.is_err());
    }

    #[tokio::test]
    async fn test_configure_keeps_the_variant() {
        let mut agent = agent();
        let json = |variant: &str| {
            crate::AgentParams::from_json(&format!(
                r#"{{"EPSILON": 0.2, "ALPHA": 0.01, "GAMMA": 0.9, "AGENT": "{variant}",
                    "IS_STOCHASTIC": true, "IS_1_HOT": false, "ENV": "continuous"}}"#
            ))
            .unwrap()
        };

        let err = agent.message(AgentMessage::Configure(json("neural"))).await.unwrap_err();
        assert!(matches!(err, RLError::Config(_)));

        let reply = agent.message(AgentMessage::Configure(json("random"))).await.unwrap();
        assert!(matches!(reply, AgentResponse::Ack));
        assert_eq!(agent.config().agent, AgentVariant::Random);
        assert!((agent.config().epsilon_min - 0.2).abs() < 1e-12);
    }
}

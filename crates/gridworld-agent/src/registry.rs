//! Agent selection by configured variant

use async_trait::async_trait;
use tracing::info;

use gridworld_core::{Agent, AgentMetrics, AgentPhase, GridAction, GridState, Result, Reward};

use crate::config::{AgentVariant, DqnConfig};
use crate::message::{AgentMessage, AgentResponse};
use crate::neural::NeuralAgent;
use crate::random::RandomAgent;

/// Any agent the testbed can run
#[derive(Debug)]
pub enum GridAgent {
    /// Neural action-value agent
    Neural(NeuralAgent),
    /// Uniformly random baseline
    Random(RandomAgent),
}

/// Build the agent named by `config.agent`
pub fn make_agent(config: DqnConfig) -> Result<GridAgent> {
    let variant = config.agent;
    let agent = match variant {
        AgentVariant::Neural => GridAgent::Neural(NeuralAgent::new(config)?),
        AgentVariant::Random => GridAgent::Random(RandomAgent::new(config)?),
    };
    info!(?variant, "agent created");
    Ok(agent)
}

macro_rules! delegate {
    ($self:ident, $agent:ident => $call:expr) => {
        match $self {
            GridAgent::Neural($agent) => $call,
            GridAgent::Random($agent) => $call,
        }
    };
}

impl GridAgent {
    /// Variant of the agent currently held
    #[must_use]
    pub fn variant(&self) -> AgentVariant {
        match self {
            GridAgent::Neural(_) => AgentVariant::Neural,
            GridAgent::Random(_) => AgentVariant::Random,
        }
    }

    fn config(&self) -> &DqnConfig {
        delegate!(self, agent => agent.config())
    }

    fn is_trial(&self) -> bool {
        delegate!(self, agent => agent.is_trial())
    }
}

#[async_trait]
impl Agent for GridAgent {
    type State = GridState;
    type Action = GridAction;
    type Message = AgentMessage;
    type Response = AgentResponse;

    async fn start(&mut self, state: GridState) -> Result<GridAction> {
        delegate!(self, agent => agent.start(state).await)
    }

    async fn step(&mut self, reward: Reward, state: GridState) -> Result<GridAction> {
        delegate!(self, agent => agent.step(reward, state).await)
    }

    async fn end(&mut self, reward: Reward) -> Result<()> {
        delegate!(self, agent => agent.end(reward).await)
    }

    async fn cleanup(&mut self) -> Result<()> {
        delegate!(self, agent => agent.cleanup().await)
    }

    async fn message(&mut self, message: AgentMessage) -> Result<AgentResponse> {
        match message {
            AgentMessage::Configure(params) if params.agent != self.variant() => {
                let mut config = self.config().clone();
                config.apply(&params);
                let trial = self.is_trial();
                *self = make_agent(config)?;
                self.set_trial_episode(trial);
                Ok(AgentResponse::Ack)
            }
            message => delegate!(self, agent => agent.message(message).await),
        }
    }

    fn set_trial_episode(&mut self, trial: bool) {
        delegate!(self, agent => agent.set_trial_episode(trial));
    }

    fn phase(&self) -> AgentPhase {
        delegate!(self, agent => agent.phase())
    }

    fn metrics(&self) -> AgentMetrics {
        delegate!(self, agent => agent.metrics())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AgentParams;

    #[test]
    fn test_make_agent_by_variant() {
        let neural = make_agent(DqnConfig {
            seed: Some(1),
            ..DqnConfig::default()
        })
        .unwrap();
        assert!(matches!(neural, GridAgent::Neural(_)));

        let random = make_agent(DqnConfig {
            agent: AgentVariant::Random,
            seed: Some(1),
            ..DqnConfig::default()
        })
        .unwrap();
        assert!(matches!(random, GridAgent::Random(_)));
        assert_eq!(random.phase(), AgentPhase::Idle);
    }

    #[test]
    fn test_make_agent_rejects_invalid_config() {
        let config = DqnConfig {
            gamma: 2.0,
            ..DqnConfig::default()
        };
        assert!(make_agent(config).is_err());
    }

    fn params(variant: &str) -> AgentParams {
        AgentParams::from_json(&format!(
            r#"{{"EPSILON": 0.05, "ALPHA": 0.01, "GAMMA": 0.9, "AGENT": "{variant}",
                "IS_STOCHASTIC": true, "IS_1_HOT": true, "ENV": "continuous"}}"#
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_configure_switches_variant() {
        let mut agent = make_agent(DqnConfig {
            seed: Some(1),
            ..DqnConfig::default()
        })
        .unwrap();
        agent.set_trial_episode(true);

        let reply = agent.message(AgentMessage::Configure(params("random"))).await.unwrap();
        assert!(matches!(reply, AgentResponse::Ack));
        assert_eq!(agent.variant(), AgentVariant::Random);
        assert!(agent.is_trial());
        assert!(agent.message(AgentMessage::GetSnapshot).await.is_err());

        agent.message(AgentMessage::Configure(params("neural"))).await.unwrap();
        match &agent {
            GridAgent::Neural(neural) => {
                assert_eq!(neural.online().input_dim(), 54);
                assert!((neural.config().epsilon_min - 0.05).abs() < 1e-12);
                assert!(neural.is_trial());
            }
            GridAgent::Random(_) => panic!("agent stayed random"),
        }
    }

    #[tokio::test]
    async fn test_configure_same_variant_keeps_agent_kind() {
        let mut agent = make_agent(DqnConfig {
            seed: Some(1),
            ..DqnConfig::default()
        })
        .unwrap();
        agent.message(AgentMessage::Configure(params("neural"))).await.unwrap();
        assert_eq!(agent.variant(), AgentVariant::Neural);
        assert_eq!(agent.config().encoding, crate::config::StateEncoding::OneHot);
    }
}

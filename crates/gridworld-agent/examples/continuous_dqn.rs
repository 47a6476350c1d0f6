//! Example: neural agent learning the continuous maze

use gridworld_agent::{make_agent, AgentMessage, AgentParams, AgentResponse, DqnConfig};
use gridworld_core::{Agent, EnvMessage, EnvParams, Environment, Experiment, ExperimentConfig};
use gridworld_env::{ContinuousGridConfig, ContinuousGridEnv};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut env = ContinuousGridEnv::new(ContinuousGridConfig {
        seed: Some(0),
        ..ContinuousGridConfig::default()
    })?;
    env.message(EnvMessage::Configure(EnvParams::from_json(r#"{"IS_SPARSE": true}"#)?))
        .await?;

    let mut agent = make_agent(DqnConfig {
        seed: Some(0),
        ..DqnConfig::default()
    })?;
    let params = AgentParams::from_json(
        r#"{"EPSILON": 0.1, "ALPHA": 0.001, "GAMMA": 0.95, "AGENT": "neural",
            "IS_STOCHASTIC": true, "IS_1_HOT": false, "ENV": "continuous"}"#,
    )?;
    agent.message(AgentMessage::Configure(params)).await?;

    let config = ExperimentConfig {
        num_episodes: 50,
        max_steps_per_episode: Some(500),
        trial_every: Some(10),
    };
    let mut experiment = Experiment::new(env, agent, config);
    let records = experiment.run().await?.to_vec();

    for record in records.iter().filter(|r| r.trial) {
        println!(
            "Trial episode {}: steps = {}, reward = {:.1}, reached goal = {}",
            record.index + 1,
            record.steps,
            record.total_reward,
            record.reached_terminal
        );
    }

    let (_, mut agent) = experiment.into_parts();
    if let AgentResponse::Values(surface) = agent.message(AgentMessage::Plot(None)).await? {
        println!("\nGreedy value per cell:");
        for (state, values) in surface.states.iter().zip(surface.values.rows()) {
            let best = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            println!("  ({:.0}, {:.0}) -> {best:.3}", state.row, state.column);
        }
    }

    Ok(())
}

use gridworld_agent::{make_agent, AgentMessage, AgentResponse, AgentVariant, DqnConfig, GridAgent, NeuralAgent};
use gridworld_core::{Agent, Experiment, ExperimentConfig};
use gridworld_env::{ContinuousGridConfig, ContinuousGridEnv};

fn env(seed: u64) -> ContinuousGridEnv {
    ContinuousGridEnv::new(ContinuousGridConfig {
        seed: Some(seed),
        ..ContinuousGridConfig::default()
    })
    .unwrap()
}

fn agent_config(seed: u64) -> DqnConfig {
    DqnConfig {
        hidden_layers: vec![32, 16],
        learning_rate: 0.005,
        batch_size: 8,
        buffer_size: 20,
        num_steps_to_update: 10,
        epsilon_decay_rate: 0.2,
        epsilon_min: 0.3,
        seed: Some(seed),
        ..DqnConfig::default()
    }
}

fn experiment(episodes: usize, trial_every: Option<usize>) -> Experiment<ContinuousGridEnv, NeuralAgent> {
    let config = ExperimentConfig {
        num_episodes: episodes,
        max_steps_per_episode: Some(40),
        trial_every,
    };
    Experiment::new(env(7), NeuralAgent::new(agent_config(7)).unwrap(), config)
}

#[tokio::test]
async fn test_agent_and_driver_count_the_same_steps() {
    let mut experiment = experiment(5, Some(2));
    let records = experiment.run().await.unwrap().to_vec();

    assert_eq!(records.len(), 5);
    let trials: Vec<bool> = records.iter().map(|r| r.trial).collect();
    assert_eq!(trials, vec![false, true, false, true, false]);

    let metrics = experiment.agent().metrics();
    assert_eq!(metrics.total_steps, experiment.total_steps());
    assert_eq!(metrics.total_episodes, 5);
    // syncs only happen on multiples of the cadence, and the first episode is long enough to reach one
    assert!(metrics.target_syncs >= 1);
    assert!(metrics.target_syncs <= metrics.total_steps / 10);
    assert!(metrics.loss.is_some());
}

#[tokio::test]
async fn test_trial_episode_leaves_learning_state_untouched() {
    let mut experiment = experiment(0, None);
    experiment.run_episode(false).await.unwrap();

    let params = experiment.agent().online().parameters();
    let target = experiment.agent().target().parameters();
    let stored = experiment.agent().store().len();
    let epsilon = experiment.agent().epsilon();
    let updates = experiment.agent().metrics().updates;

    let record = experiment.run_episode(true).await.unwrap();
    assert!(record.trial);
    assert!(record.steps > 0);

    let agent = experiment.agent();
    assert_eq!(agent.online().parameters(), params);
    assert_eq!(agent.target().parameters(), target);
    assert_eq!(agent.store().len(), stored);
    assert_eq!(agent.epsilon(), epsilon);
    assert_eq!(agent.metrics().updates, updates);
}

#[tokio::test]
async fn test_epsilon_never_increases_and_stops_at_floor() {
    let mut experiment = experiment(0, None);
    let mut previous = experiment.agent().epsilon();
    for _ in 0..6 {
        experiment.run_episode(false).await.unwrap();
        let epsilon = experiment.agent().epsilon();
        assert!(epsilon <= previous);
        assert!(epsilon >= 0.3);
        previous = epsilon;
    }
    assert!((previous - 0.3).abs() < 1e-12);
}

#[tokio::test]
async fn test_store_grows_with_non_trial_steps_only() {
    let mut experiment = experiment(0, None);
    let first = experiment.run_episode(false).await.unwrap();
    // the final step of an episode goes through `end` (not stored) only when the goal is reached
    let expected = if first.reached_terminal { first.steps - 1 } else { first.steps };
    assert_eq!(experiment.agent().store().len(), expected);
}

#[tokio::test]
async fn test_value_surface_after_training() {
    let mut experiment = experiment(2, None);
    experiment.run().await.unwrap();
    let (_, mut agent) = experiment.into_parts();
    match agent.message(AgentMessage::Plot(None)).await.unwrap() {
        AgentResponse::Values(surface) => {
            assert_eq!(surface.values.dim(), (54, 4));
            assert!(surface.values.iter().all(|v| v.is_finite()));
        }
        other => panic!("unexpected reply {other:?}"),
    }
}

#[tokio::test]
async fn test_random_baseline_runs_through_the_driver() {
    let agent = make_agent(DqnConfig {
        agent: AgentVariant::Random,
        seed: Some(2),
        ..DqnConfig::default()
    })
    .unwrap();
    assert!(matches!(agent, GridAgent::Random(_)));

    let config = ExperimentConfig {
        num_episodes: 3,
        max_steps_per_episode: Some(25),
        trial_every: None,
    };
    let mut experiment = Experiment::new(env(3), agent, config);
    let records = experiment.run().await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.steps <= 25));
}

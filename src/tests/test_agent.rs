use ndarray::{array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::agent::trainer::{self, EpisodeSummary, TrainingContext};
use crate::agent::{
    bellman_targets, decay_epsilon, epsilon_greedy, greedy_action, td_target, DqnAgent, DqnAgentBuilder,
    DqnConfig,
};
use crate::env::{CartPole, RenderMode};
use crate::loss::HuberLoss;
use crate::optimizer::OptimizerWrapper;
use crate::replay_buffer::Experience;

fn transition(reward: f32, action: usize, done: bool) -> Experience {
    Experience {
        state: array![0.1, -0.2, 0.05, 0.0],
        action,
        reward,
        next_state: array![0.2, -0.1, 0.0, 0.1],
        done,
    }
}

#[test]
fn test_td_target_terminal_is_reward() {
    assert_eq!(td_target(1.0, true, 0.99, 123.0), 1.0);
}

#[test]
fn test_td_target_bootstraps() {
    let target = td_target(1.0, false, 0.99, 2.0);
    assert!((target - 2.98).abs() < 1e-6);
}

#[test]
fn test_bellman_targets_only_touch_taken_action() {
    let current = array![[0.5, 0.7], [0.3, 0.1]];
    let next = array![[1.0, 3.0], [2.0, -1.0]];
    let a = transition(1.0, 1, true);
    let b = transition(0.5, 0, false);
    let targets = bellman_targets(current.view(), next.view(), &[&a, &b], 0.9).unwrap();

    assert_eq!(targets[[0, 0]], 0.5);
    assert_eq!(targets[[0, 1]], 1.0);
    assert!((targets[[1, 0]] - (0.5 + 0.9 * 2.0)).abs() < 1e-6);
    assert_eq!(targets[[1, 1]], 0.1);
}

#[test]
fn test_bellman_targets_rejects_bad_action() {
    let current = Array2::zeros((1, 2));
    let next = Array2::zeros((1, 2));
    let exp = transition(1.0, 5, false);
    assert!(bellman_targets(current.view(), next.view(), &[&exp], 0.9).is_err());
}

#[test]
fn test_greedy_action_ties_pick_lowest() {
    assert_eq!(greedy_action(array![1.0, 3.0, 3.0].view()), 1);
    assert_eq!(greedy_action(array![f32::NAN, 0.5].view()), 1);
}

#[test]
fn test_epsilon_greedy_extremes() {
    let mut rng = StdRng::seed_from_u64(3);
    let q = array![0.0, 5.0, 1.0];
    for _ in 0..50 {
        assert_eq!(epsilon_greedy(q.view(), 0.0, &mut rng), 1);
    }
    let mut seen = [false; 3];
    for _ in 0..300 {
        seen[epsilon_greedy(q.view(), 1.0, &mut rng)] = true;
    }
    assert!(seen.iter().all(|&s| s));
}

#[test]
fn test_epsilon_decay_respects_floor() {
    let mut epsilon = 1.0;
    for _ in 0..5000 {
        epsilon = decay_epsilon(epsilon, 0.995, 0.01);
        assert!(epsilon >= 0.01);
    }
    assert_eq!(epsilon, 0.01);
}

#[test]
fn test_target_sync_makes_outputs_equal() {
    let mut rng = StdRng::seed_from_u64(4);
    let mut agent = DqnAgent::new(&[4, 8, 2], OptimizerWrapper::adam(), &mut rng);
    let exp = transition(1.0, 0, false);
    for _ in 0..5 {
        agent.train_on_batch(&[&exp], 0.99, 0.01, &HuberLoss::default()).unwrap();
    }

    let state = array![0.3, 0.1, -0.2, 0.4];
    assert_ne!(agent.q_network.forward(state.view()), agent.target_network.forward(state.view()));
    agent.sync_target().unwrap();
    assert_eq!(agent.q_network.forward(state.view()), agent.target_network.forward(state.view()));
}

#[test]
fn test_train_on_empty_batch_is_noop() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut agent = DqnAgent::new(&[4, 8, 2], OptimizerWrapper::sgd(), &mut rng);
    let loss = agent.train_on_batch(&[], 0.99, 0.01, &HuberLoss::default()).unwrap();
    assert_eq!(loss, 0.0);
    assert_eq!(agent.train_steps, 0);
}

#[test]
fn test_dqn_builder() {
    let mut rng = StdRng::seed_from_u64(6);
    let agent = DqnAgentBuilder::new()
        .layer_sizes(&[4, 16, 2])
        .optimizer(OptimizerWrapper::sgd())
        .build(&mut rng)
        .unwrap();
    assert_eq!(agent.action_count(), 2);
    assert_eq!(agent.q_network.layers.len(), 2);

    assert!(DqnAgentBuilder::new().layer_sizes(&[4]).build(&mut rng).is_err());
}

#[test]
fn test_training_context_underfilled_memory() {
    let config = DqnConfig { batch_size: 4, ..DqnConfig::default() };
    let mut ctx = TrainingContext::new(config, 4, 2).unwrap();
    ctx.remember(transition(1.0, 0, false));
    assert_eq!(ctx.train_step().unwrap(), 0.0);
}

#[test]
fn test_dqn_config_validation() {
    assert!(DqnConfig::default().validate().is_ok());
    let bad = DqnConfig { gamma: 1.5, ..DqnConfig::default() };
    assert!(bad.validate().is_err());
    assert_eq!(DqnConfig::default().layer_sizes(4, 2), vec![4, 24, 24, 2]);
}

#[test]
fn test_agent_save_load() {
    let mut rng = StdRng::seed_from_u64(8);
    let agent = DqnAgent::new(&[4, 8, 2], OptimizerWrapper::adam(), &mut rng);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("agent.bin");
    agent.save(&path).unwrap();
    let loaded = DqnAgent::load(&path).unwrap();

    let state = array![0.1, 0.2, 0.3, 0.4];
    assert_eq!(agent.q_values(state.view()), loaded.q_values(state.view()));
}

fn episode(total_reward: f32) -> EpisodeSummary {
    EpisodeSummary { total_reward, steps: total_reward as usize, mean_loss: None }
}

fn schedule_context(target_update_every: usize, print_every: usize, solve_avg: f32) -> TrainingContext {
    let config = DqnConfig {
        batch_size: 1,
        learning_rate: 0.01,
        hidden_layers: vec![8],
        target_update_every,
        print_every,
        solve_avg,
        ..DqnConfig::default()
    };
    TrainingContext::new(config, 4, 2).unwrap()
}

#[test]
fn test_target_syncs_only_on_schedule() {
    let mut ctx = schedule_context(3, 100, f32::MAX);
    ctx.remember(transition(1.0, 0, false));
    let state = array![0.3, 0.1, -0.2, 0.4];
    let diverged = |ctx: &TrainingContext| {
        ctx.agent.q_network.forward(state.view()) != ctx.agent.target_network.forward(state.view())
    };

    for round in 0..2 {
        ctx.train_step().unwrap();
        assert!(diverged(&ctx));

        for offset in 1..=2 {
            ctx.finish_episode(round * 3 + offset, &episode(10.0)).unwrap();
            assert!(diverged(&ctx), "target synced early at episode {}", round * 3 + offset);
        }

        ctx.finish_episode(round * 3 + 3, &episode(10.0)).unwrap();
        assert!(!diverged(&ctx), "target not synced at episode {}", round * 3 + 3);
    }
}

#[test]
fn test_epsilon_decays_once_per_finished_episode() {
    let mut ctx = schedule_context(100, 100, f32::MAX);
    assert_eq!(ctx.epsilon, 1.0);

    for k in 1..=1_000 {
        ctx.finish_episode(k, &episode(10.0)).unwrap();
        let expected = 0.995f32.powi(k as i32).max(0.01);
        assert!(
            (ctx.epsilon - expected).abs() < 1e-4,
            "episode {}: epsilon {} expected {}",
            k,
            ctx.epsilon,
            expected
        );
    }
    assert_eq!(ctx.epsilon, 0.01);
}

#[test]
fn test_reports_only_on_print_episodes() {
    let mut ctx = schedule_context(100, 2, 15.0);

    assert!(ctx.finish_episode(1, &episode(10.0)).unwrap().is_none());
    let report = ctx.finish_episode(2, &episode(30.0)).unwrap().unwrap();
    assert_eq!(report.episode, 2);
    assert_eq!(report.avg_score, 20.0);
    assert_eq!(report.max_score, 30.0);
    assert_eq!(report.best_avg, 20.0);
    assert!(report.solved);

    // The window covers only the last `print_every` episodes
    ctx.finish_episode(3, &episode(10.0)).unwrap();
    let report = ctx.finish_episode(4, &episode(10.0)).unwrap().unwrap();
    assert_eq!(report.avg_score, 10.0);
    assert_eq!(report.best_avg, 20.0);
    assert!(!report.solved);
}

#[test]
fn test_training_stops_once_solved() {
    let config = DqnConfig {
        episodes: 50,
        print_every: 2,
        solve_avg: 1.0,
        hidden_layers: vec![8],
        ..DqnConfig::default()
    };
    let mut env = CartPole::seeded(RenderMode::None, 9);
    let ctx = trainer::train(&mut env, config).unwrap();

    // Every CartPole episode earns at least 1.0, so the first report solves it
    assert_eq!(ctx.tracker.episode_count(), 2);
}

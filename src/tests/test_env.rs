use std::cell::Cell;
use std::rc::Rc;

use ndarray::Array1;
use crate::agent::trainer::{self, DqnConfig, TrainingContext};
use crate::env::cartpole::{MAX_EPISODE_STEPS, THETA_THRESHOLD, X_THRESHOLD};
use crate::env::{CartPole, EnvSession, Environment, RenderMode, StepResult};
use crate::error::MlError;

#[test]
fn test_cartpole_reset_is_small_and_seeded() {
    let mut a = CartPole::seeded(RenderMode::None, 7);
    let mut b = CartPole::seeded(RenderMode::None, 7);
    let state = a.reset();
    assert_eq!(state.len(), 4);
    assert!(state.iter().all(|v| v.abs() <= 0.05));
    assert_eq!(state, b.reset());
}

#[test]
fn test_cartpole_step_before_reset_fails() {
    let mut env = CartPole::seeded(RenderMode::None, 0);
    assert!(matches!(env.step(0), Err(MlError::EnvironmentError(_))));
    env.reset();
    assert!(matches!(env.step(2), Err(MlError::InvalidAction { action: 2, max_actions: 2 })));
}

#[test]
fn test_cartpole_terminates_when_cart_leaves_track() {
    let mut env = CartPole::seeded(RenderMode::None, 1);
    env.reset();
    env.set_state(X_THRESHOLD - 0.001, 1.0, 0.0, 0.0);
    let outcome = env.step(1).unwrap();
    assert!(outcome.terminated);
    assert!(!outcome.truncated);
    assert_eq!(outcome.reward, 1.0);
    // The episode is over until the next reset
    assert!(env.step(0).is_err());
}

#[test]
fn test_cartpole_terminates_when_pole_falls() {
    let mut env = CartPole::seeded(RenderMode::None, 2);
    env.reset();
    env.set_state(0.0, 0.0, THETA_THRESHOLD + 0.01, 0.0);
    assert!(env.step(0).unwrap().terminated);
}

#[test]
fn test_cartpole_truncates_at_step_limit() {
    let mut env = CartPole::seeded(RenderMode::None, 3);
    env.reset();
    let mut steps = 0;
    let last = loop {
        // Hold the pole upright so only the time limit can end the episode
        env.set_state(0.0, 0.0, 0.0, 0.0);
        let outcome = env.step(steps % 2).unwrap();
        steps += 1;
        if outcome.is_done() {
            break outcome;
        }
    };
    assert_eq!(steps, MAX_EPISODE_STEPS);
    assert!(last.truncated);
    assert!(!last.terminated);
}

/// Counts `close` calls through a shared cell
struct Probe {
    closes: Rc<Cell<usize>>,
}

impl Environment for Probe {
    fn observation_size(&self) -> usize {
        1
    }

    fn action_count(&self) -> usize {
        1
    }

    fn reset(&mut self) -> Array1<f32> {
        Array1::zeros(1)
    }

    fn step(&mut self, _action: usize) -> crate::error::Result<StepResult> {
        Err(MlError::EnvironmentError("probe cannot step".to_string()))
    }

    fn close(&mut self) {
        self.closes.set(self.closes.get() + 1);
    }
}

#[test]
fn test_env_session_closes_on_drop() {
    let closes = Rc::new(Cell::new(0));
    {
        let mut session = EnvSession::open(Probe { closes: Rc::clone(&closes) });
        session.reset();
        assert_eq!(closes.get(), 0);
    }
    assert_eq!(closes.get(), 1);
}

#[test]
fn test_env_session_closes_on_error_path() {
    fn fails(closes: Rc<Cell<usize>>) -> crate::error::Result<()> {
        let mut session = EnvSession::open(Probe { closes });
        session.step(0)?;
        Ok(())
    }
    let closes = Rc::new(Cell::new(0));
    assert!(fails(Rc::clone(&closes)).is_err());
    assert_eq!(closes.get(), 1);
}

#[test]
fn test_cartpole_close_is_idempotent() {
    let mut env = CartPole::seeded(RenderMode::None, 4);
    env.close();
    env.close();
    assert!(env.is_closed());
}

#[test]
fn test_frame_marks_cart() {
    let mut env = CartPole::seeded(RenderMode::None, 5);
    env.reset();
    let frame = env.frame();
    assert!(frame.contains('#'));
    assert!(frame.contains("step   0"));
}

#[test]
fn test_short_training_run_on_cartpole() {
    let config = DqnConfig {
        episodes: 3,
        train_start: 16,
        batch_size: 8,
        print_every: 1,
        target_update_every: 2,
        solve_avg: f32::MAX,
        hidden_layers: vec![8],
        ..DqnConfig::default()
    };
    let mut session = EnvSession::open(CartPole::seeded(RenderMode::None, 6));
    let ctx = trainer::train(&mut *session, config).unwrap();

    assert_eq!(ctx.tracker.episode_count(), 3);
    assert!(ctx.epsilon < 1.0);
    assert!(ctx.memory.len() > 0);

    let scores = trainer::evaluate(&ctx.agent, &mut *session, 2).unwrap();
    assert_eq!(scores.len(), 2);
    assert!(scores.iter().all(|&s| s >= 1.0 && s <= MAX_EPISODE_STEPS as f32));
}

#[test]
fn test_run_episode_stores_every_transition() {
    let config = DqnConfig { train_start: usize::MAX, hidden_layers: vec![4], ..DqnConfig::default() };
    let mut ctx = TrainingContext::new(config, 4, 2).unwrap();
    let mut env = CartPole::seeded(RenderMode::None, 9);
    let summary = ctx.run_episode(&mut env).unwrap();

    assert_eq!(ctx.memory.len(), summary.steps);
    assert_eq!(summary.total_reward, summary.steps as f32);
    assert!(summary.mean_loss.is_none());
    // Only the final transition can be terminal
    let terminal = ctx.memory.iter().filter(|e| e.done).count();
    assert!(terminal <= 1);
}

#[test]
fn test_training_and_evaluation_use_separate_environments() {
    let training = crate::workflows::dqn::training_env(11);
    let evaluation = crate::workflows::dqn::evaluation_env(11);
    assert_eq!(training.render_mode(), RenderMode::None);
    assert_eq!(evaluation.render_mode(), RenderMode::Human);
}

#[test]
fn test_dqn_workflow_writes_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let config = DqnConfig {
        episodes: 2,
        print_every: 1,
        solve_avg: f32::MAX,
        test_episodes: 1,
        hidden_layers: vec![8],
        ..DqnConfig::default()
    };
    crate::workflows::dqn::train(dir.path(), config).unwrap();

    let model = dir.path().join(crate::workflows::dqn::MODEL_FILE);
    assert!(model.exists());
    assert!(dir.path().join(crate::workflows::dqn::METRICS_FILE).exists());
    let replayed = crate::workflows::dqn::play(&model, Some(3)).unwrap();
    assert!(replayed >= 1.0 && replayed <= MAX_EPISODE_STEPS as f32);
}

//! Episode loop for DQN training and greedy evaluation.
//!
//! Every piece of mutable training state lives in [`TrainingContext`], so
//! action selection and replay training can be exercised without an
//! environment.

use rand::rngs::StdRng;
use rand::SeedableRng;
use ndarray::{Array1, ArrayView1};
use serde::{Serialize, Deserialize};

use super::dqn::DqnAgent;
use super::policy;
use crate::env::Environment;
use crate::error::{MlError, Result};
use crate::loss::HuberLoss;
use crate::metrics::MetricsTracker;
use crate::optimizer::{Adam, OptimizerWrapper};
use crate::replay_buffer::{Experience, ReplayBuffer};

/// Hyperparameters of a DQN run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DqnConfig {
    pub episodes: usize,
    pub gamma: f32,
    pub learning_rate: f32,
    pub epsilon_start: f32,
    pub epsilon_min: f32,
    pub epsilon_decay: f32,
    pub batch_size: usize,
    pub memory_size: usize,
    /// Replay size required before any gradient step
    pub train_start: usize,
    /// Target network sync period, in episodes
    pub target_update_every: usize,
    /// Reporting period and solve-check window, in episodes
    pub print_every: usize,
    pub solve_avg: f32,
    pub test_episodes: usize,
    pub hidden_layers: Vec<usize>,
    pub huber_delta: f32,
    pub seed: u64,
}

impl Default for DqnConfig {
    fn default() -> Self {
        Self {
            episodes: 800,
            gamma: 0.99,
            learning_rate: 0.001,
            epsilon_start: 1.0,
            epsilon_min: 0.01,
            epsilon_decay: 0.995,
            batch_size: 32,
            memory_size: 100_000,
            train_start: 1_000,
            target_update_every: 100,
            print_every: 100,
            solve_avg: 170.0,
            test_episodes: 5,
            hidden_layers: vec![24, 24],
            huber_delta: 1.0,
            seed: 42,
        }
    }
}

impl DqnConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("episodes", self.episodes),
            ("batch_size", self.batch_size),
            ("memory_size", self.memory_size),
            ("target_update_every", self.target_update_every),
            ("print_every", self.print_every),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(MlError::invalid_parameter(name, "must be positive"));
            }
        }
        if !(0.0..=1.0).contains(&self.gamma) {
            return Err(MlError::invalid_parameter("gamma", "must lie in [0, 1]"));
        }
        if self.epsilon_min > self.epsilon_start {
            return Err(MlError::invalid_parameter("epsilon_min", "must not exceed epsilon_start"));
        }
        Ok(())
    }

    pub fn layer_sizes(&self, state_dim: usize, action_dim: usize) -> Vec<usize> {
        let mut sizes = Vec::with_capacity(self.hidden_layers.len() + 2);
        sizes.push(state_dim);
        sizes.extend_from_slice(&self.hidden_layers);
        sizes.push(action_dim);
        sizes
    }
}

/// Result of one episode
#[derive(Debug, Clone, PartialEq)]
pub struct EpisodeSummary {
    pub total_reward: f32,
    pub steps: usize,
    /// Mean loss of the gradient steps taken, if any
    pub mean_loss: Option<f32>,
}

/// Periodic progress line
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressReport {
    pub episode: usize,
    pub avg_score: f32,
    pub max_score: f32,
    pub epsilon: f32,
    pub avg_loss: f32,
    pub best_avg: f32,
    pub solved: bool,
}

/// Everything the training loop mutates
pub struct TrainingContext {
    pub config: DqnConfig,
    pub agent: DqnAgent,
    pub memory: ReplayBuffer,
    pub epsilon: f32,
    pub tracker: MetricsTracker,
    pub best_avg: f32,
    pub rng: StdRng,
    loss: HuberLoss,
}

impl TrainingContext {
    pub fn new(config: DqnConfig, state_dim: usize, action_dim: usize) -> Result<Self> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let optimizer = OptimizerWrapper::Adam(Adam::default());
        let agent = DqnAgent::new(&config.layer_sizes(state_dim, action_dim), optimizer, &mut rng);

        Ok(TrainingContext {
            memory: ReplayBuffer::new(config.memory_size)?,
            epsilon: config.epsilon_start,
            tracker: MetricsTracker::new(config.episodes.max(1)),
            best_avg: 0.0,
            loss: HuberLoss::new(config.huber_delta),
            agent,
            rng,
            config,
        })
    }

    pub fn choose_action(&mut self, state: ArrayView1<f32>) -> usize {
        self.agent.act(state, self.epsilon, &mut self.rng)
    }

    pub fn remember(&mut self, experience: Experience) {
        self.memory.add(experience);
    }

    /// Sample a mini-batch and take one gradient step. Returns the zero-loss
    /// sentinel when the memory holds fewer than `batch_size` transitions.
    pub fn train_step(&mut self) -> Result<f32> {
        if self.memory.len() < self.config.batch_size {
            return Ok(0.0);
        }
        let batch = self.memory.sample(self.config.batch_size, &mut self.rng);
        self.agent.train_on_batch(&batch, self.config.gamma, self.config.learning_rate, &self.loss)
    }

    /// Play one episode: observe, then act / step / store / train until it ends.
    pub fn run_episode<E: Environment>(&mut self, env: &mut E) -> Result<EpisodeSummary> {
        let mut state: Array1<f32> = env.reset();
        let mut total_reward = 0.0;
        let mut steps = 0;
        let mut losses = Vec::new();

        loop {
            let action = self.choose_action(state.view());
            let outcome = env.step(action)?;
            let done = outcome.is_done();

            self.remember(Experience {
                state: state.clone(),
                action,
                reward: outcome.reward,
                next_state: outcome.state.clone(),
                done: outcome.terminated,
            });

            if self.memory.len() >= self.config.train_start {
                losses.push(self.train_step()?);
            }

            state = outcome.state;
            total_reward += outcome.reward;
            steps += 1;

            if done {
                break;
            }
        }

        let mean_loss = if losses.is_empty() {
            None
        } else {
            Some(losses.iter().sum::<f32>() / losses.len() as f32)
        };
        Ok(EpisodeSummary { total_reward, steps, mean_loss })
    }

    /// Bookkeeping after episode `episode` (1-based): record metrics, decay
    /// epsilon, sync the target network on schedule, and produce a report
    /// every `print_every` episodes.
    pub fn finish_episode(&mut self, episode: usize, summary: &EpisodeSummary) -> Result<Option<ProgressReport>> {
        self.tracker.record_episode(summary.total_reward, summary.steps);
        if let Some(loss) = summary.mean_loss {
            self.tracker.record_loss(loss);
        }
        self.tracker.record_epsilon(self.epsilon);

        self.epsilon = policy::decay_epsilon(self.epsilon, self.config.epsilon_decay, self.config.epsilon_min);

        if episode % self.config.target_update_every == 0 {
            self.agent.sync_target()?;
            tracing::debug!(episode, "target network synchronised");
        }

        if episode % self.config.print_every != 0 {
            return Ok(None);
        }

        let window = self.config.print_every;
        let avg_score = self.tracker.avg_episode_reward(window).unwrap_or(0.0);
        let max_score = self.tracker.max_episode_reward(window).unwrap_or(0.0);
        let avg_loss = self.tracker.avg_loss(window).unwrap_or(0.0);
        self.best_avg = self.best_avg.max(avg_score);

        Ok(Some(ProgressReport {
            episode,
            avg_score,
            max_score,
            epsilon: self.epsilon,
            avg_loss,
            best_avg: self.best_avg,
            solved: avg_score >= self.config.solve_avg,
        }))
    }
}

/// Train until solved or out of episodes. The caller owns the environment's lifetime.
pub fn train<E: Environment>(env: &mut E, config: DqnConfig) -> Result<TrainingContext> {
    let mut ctx = TrainingContext::new(config, env.observation_size(), env.action_count())?;
    tracing::info!(
        state_dim = env.observation_size(),
        action_dim = env.action_count(),
        episodes = ctx.config.episodes,
        "starting DQN training"
    );

    for episode in 1..=ctx.config.episodes {
        let summary = ctx.run_episode(env)?;
        tracing::trace!(episode, reward = summary.total_reward, steps = summary.steps, "episode finished");

        if let Some(report) = ctx.finish_episode(episode, &summary)? {
            println!(
                "Ep {:4} | Avg: {:6.2} | Max: {:6.2} | Eps: {:.3} | Loss: {:.4} | Best: {:.2}",
                report.episode, report.avg_score, report.max_score, report.epsilon, report.avg_loss, report.best_avg
            );
            if report.solved {
                println!("\n SOLVED at episode {} Average: {:.2}", report.episode, report.avg_score);
                tracing::info!(episode, avg = report.avg_score, "solve threshold reached");
                break;
            }
        }
    }

    println!("\nTraining finished. Best average: {:.2}", ctx.best_avg);
    Ok(ctx)
}

/// Greedy rollouts (epsilon = 0). Returns each episode's total reward.
pub fn evaluate<E: Environment>(agent: &DqnAgent, env: &mut E, episodes: usize) -> Result<Vec<f32>> {
    let mut scores = Vec::with_capacity(episodes);
    for _ in 0..episodes {
        scores.push(greedy_rollout(agent, env)?);
    }
    Ok(scores)
}

/// One greedy episode
pub fn greedy_rollout<E: Environment>(agent: &DqnAgent, env: &mut E) -> Result<f32> {
    let mut state = env.reset();
    let mut total = 0.0;
    loop {
        let action = policy::greedy_action(agent.q_values(state.view()).view());
        let outcome = env.step(action)?;
        total += outcome.reward;
        if outcome.is_done() {
            return Ok(total);
        }
        state = outcome.state;
    }
}

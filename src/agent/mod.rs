//! # Reinforcement Learning Agents
//!
//! Deep Q-learning for small discrete-action control tasks.
//!
//! ## Pieces
//!
//! - [`policy`]: greedy and epsilon-greedy action selection, epsilon decay
//! - [`dqn`]: the [`DqnAgent`] (online + target network) and TD target computation
//! - [`trainer`]: the episode loop, periodic reporting and greedy evaluation
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mlcourse::agent::{trainer, DqnConfig};
//! use mlcourse::env::{CartPole, EnvSession, RenderMode};
//!
//! let mut env = EnvSession::open(CartPole::new(RenderMode::None));
//! let config = DqnConfig { episodes: 50, ..DqnConfig::default() };
//! let ctx = trainer::train(&mut *env, config).unwrap();
//! let scores = trainer::evaluate(&ctx.agent, &mut *env, 5).unwrap();
//! println!("{:?}", scores);
//! ```
//!
//! The replay buffer stores `terminated` as the done flag, so time-limit
//! truncation still bootstraps from the next state.

pub mod dqn;
pub mod policy;
pub mod trainer;

pub use dqn::{bellman_targets, td_target, DqnAgent, DqnAgentBuilder};
pub use policy::{decay_epsilon, epsilon_greedy, greedy_action};
pub use trainer::{DqnConfig, EpisodeSummary, ProgressReport, TrainingContext};

//! # mlcourse
//!
//! A small machine-learning course toolkit in Rust. It bundles the numerics
//! (dense and LSTM layers, optimizers, losses), a Bayesian network toolkit and
//! a DQN agent with its CartPole environment, plus the workflows that drive them
//! from the `mlcourse` binary.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use mlcourse::agent::DqnAgent;
//! use mlcourse::optimizer::OptimizerWrapper;
//! use mlcourse::replay_buffer::ReplayBuffer;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! # fn main() -> mlcourse::error::Result<()> {
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! // Online and target Q-networks for a 4-dimensional state and 2 actions
//! let agent = DqnAgent::new(&[4, 24, 24, 2], OptimizerWrapper::adam(), &mut rng);
//!
//! // Bounded experience memory
//! let buffer = ReplayBuffer::new(100_000)?;
//! # let _ = (agent, buffer);
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`activations`] - Activation functions and row-wise softmax
//! - [`agent`] - DQN agent, exploration policy and the training context
//! - [`bayes`] - DAGs, CPDs, structure search, estimators and variable elimination
//! - [`config`] - JSON configuration loading
//! - [`data`] - `.npz` image sets, CSV tables and train/test splitting
//! - [`env`] - Episodic environment interface and CartPole
//! - [`error`] - Error types and result handling
//! - [`layers`] - Dense, dropout and LSTM layers
//! - [`loss`] - Loss functions for training
//! - [`metrics`] - Training histories, episode tracking and summary statistics
//! - [`models`] - The recurrent and tabular classifiers
//! - [`network`] - Feed-forward network
//! - [`optimizer`] - SGD and Adam with per-slot state
//! - [`replay_buffer`] - Experience replay for RL
//! - [`visualization`] - ASCII plots and PNG charts
//! - [`workflows`] - One end-to-end use case per CLI subcommand

pub mod activations;
pub mod agent;
pub mod bayes;
pub mod config;
pub mod data;
pub mod env;
pub mod error;
pub mod layers;
pub mod loss;
pub mod metrics;
pub mod models;
pub mod network;
pub mod optimizer;
pub mod replay_buffer;
pub mod visualization;
pub mod workflows;

#[cfg(test)]
mod tests;

//! # Environments
//!
//! A minimal episodic environment interface and the CartPole control task.
//!
//! Environments hold rendering resources, so workflows acquire them through
//! [`EnvSession`], which closes the environment when dropped. That covers normal
//! completion, early exits such as reaching the solve threshold, and `?` returns.

pub mod cartpole;

pub use cartpole::CartPole;

use ndarray::Array1;
use std::ops::{Deref, DerefMut};

use crate::error::Result;

/// How an environment presents itself while stepping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    #[default]
    None,
    /// Draw a frame on stdout after every reset and step
    Human,
}

/// Outcome of a single environment step
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub state: Array1<f32>,
    pub reward: f32,
    /// The episode reached a terminal state of the task
    pub terminated: bool,
    /// The episode was cut short by a time limit
    pub truncated: bool,
}

impl StepResult {
    pub fn is_done(&self) -> bool {
        self.terminated || self.truncated
    }
}

pub trait Environment {
    fn observation_size(&self) -> usize;

    fn action_count(&self) -> usize;

    /// Start a new episode and return the initial observation
    fn reset(&mut self) -> Array1<f32>;

    fn step(&mut self, action: usize) -> Result<StepResult>;

    /// Release rendering resources. Must be idempotent.
    fn close(&mut self);
}

/// Scoped ownership of an environment; closes it on drop.
pub struct EnvSession<E: Environment> {
    env: E,
}

impl<E: Environment> EnvSession<E> {
    pub fn open(env: E) -> Self {
        tracing::debug!("environment session opened");
        EnvSession { env }
    }
}

impl<E: Environment> Deref for EnvSession<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.env
    }
}

impl<E: Environment> DerefMut for EnvSession<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.env
    }
}

impl<E: Environment> Drop for EnvSession<E> {
    fn drop(&mut self) {
        self.env.close();
        tracing::debug!("environment session closed");
    }
}

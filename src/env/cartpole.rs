use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Environment, RenderMode, StepResult};
use crate::error::{MlError, Result};

const GRAVITY: f32 = 9.8;
const MASS_CART: f32 = 1.0;
const MASS_POLE: f32 = 0.1;
const TOTAL_MASS: f32 = MASS_CART + MASS_POLE;
/// Half the pole's length
const LENGTH: f32 = 0.5;
const POLE_MASS_LENGTH: f32 = MASS_POLE * LENGTH;
const FORCE_MAG: f32 = 10.0;
const TAU: f32 = 0.02;
/// 12 degrees
pub const THETA_THRESHOLD: f32 = 12.0 * 2.0 * std::f32::consts::PI / 360.0;
pub const X_THRESHOLD: f32 = 2.4;
pub const MAX_EPISODE_STEPS: usize = 500;

/// CartPole-v1: balance a pole on a cart by pushing left (0) or right (1).
pub struct CartPole {
    x: f32,
    x_dot: f32,
    theta: f32,
    theta_dot: f32,
    steps: usize,
    episode_over: bool,
    render_mode: RenderMode,
    closed: bool,
    rng: StdRng,
}

impl CartPole {
    pub fn new(render_mode: RenderMode) -> Self {
        Self::with_rng(render_mode, StdRng::from_entropy())
    }

    pub fn seeded(render_mode: RenderMode, seed: u64) -> Self {
        Self::with_rng(render_mode, StdRng::seed_from_u64(seed))
    }

    fn with_rng(render_mode: RenderMode, rng: StdRng) -> Self {
        CartPole {
            x: 0.0,
            x_dot: 0.0,
            theta: 0.0,
            theta_dot: 0.0,
            steps: 0,
            episode_over: true,
            render_mode,
            closed: false,
            rng,
        }
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    /// Overwrite the physical state, for tests and scripted scenarios
    pub fn set_state(&mut self, x: f32, x_dot: f32, theta: f32, theta_dot: f32) {
        self.x = x;
        self.x_dot = x_dot;
        self.theta = theta;
        self.theta_dot = theta_dot;
        self.episode_over = false;
    }

    pub fn state(&self) -> Array1<f32> {
        array![self.x, self.x_dot, self.theta, self.theta_dot]
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// ASCII frame: track, cart position and pole lean
    pub fn frame(&self) -> String {
        const WIDTH: usize = 61;
        let mut track = vec!['-'; WIDTH];
        let pos = ((self.x + X_THRESHOLD) / (2.0 * X_THRESHOLD) * (WIDTH - 1) as f32)
            .round()
            .clamp(0.0, (WIDTH - 1) as f32) as usize;
        track[pos] = '#';
        let lean = if self.theta > 0.02 {
            '/'
        } else if self.theta < -0.02 {
            '\\'
        } else {
            '|'
        };
        let mut pole = vec![' '; WIDTH];
        pole[pos] = lean;
        format!(
            "{}\n{}\nstep {:>3}  x={:+.3}  theta={:+.3}",
            pole.iter().collect::<String>(),
            track.iter().collect::<String>(),
            self.steps,
            self.x,
            self.theta
        )
    }

    fn render(&self) {
        if self.render_mode == RenderMode::Human && !self.closed {
            println!("{}\n", self.frame());
        }
    }
}

impl Environment for CartPole {
    fn observation_size(&self) -> usize {
        4
    }

    fn action_count(&self) -> usize {
        2
    }

    fn reset(&mut self) -> Array1<f32> {
        self.x = self.rng.gen_range(-0.05..0.05);
        self.x_dot = self.rng.gen_range(-0.05..0.05);
        self.theta = self.rng.gen_range(-0.05..0.05);
        self.theta_dot = self.rng.gen_range(-0.05..0.05);
        self.steps = 0;
        self.episode_over = false;
        self.render();
        self.state()
    }

    fn step(&mut self, action: usize) -> Result<StepResult> {
        if action >= self.action_count() {
            return Err(MlError::InvalidAction { action, max_actions: self.action_count() });
        }
        if self.episode_over {
            return Err(MlError::EnvironmentError(
                "step() called before reset() or after the episode ended".to_string(),
            ));
        }

        let force = if action == 1 { FORCE_MAG } else { -FORCE_MAG };
        let cos_theta = self.theta.cos();
        let sin_theta = self.theta.sin();

        let temp = (force + POLE_MASS_LENGTH * self.theta_dot * self.theta_dot * sin_theta) / TOTAL_MASS;
        let theta_acc = (GRAVITY * sin_theta - cos_theta * temp)
            / (LENGTH * (4.0 / 3.0 - MASS_POLE * cos_theta * cos_theta / TOTAL_MASS));
        let x_acc = temp - POLE_MASS_LENGTH * theta_acc * cos_theta / TOTAL_MASS;

        // Euler integration
        self.x += TAU * self.x_dot;
        self.x_dot += TAU * x_acc;
        self.theta += TAU * self.theta_dot;
        self.theta_dot += TAU * theta_acc;
        self.steps += 1;

        let terminated = self.x.abs() > X_THRESHOLD || self.theta.abs() > THETA_THRESHOLD;
        let truncated = !terminated && self.steps >= MAX_EPISODE_STEPS;
        self.episode_over = terminated || truncated;
        self.render();

        Ok(StepResult {
            state: self.state(),
            reward: 1.0,
            terminated,
            truncated,
        })
    }

    fn close(&mut self) {
        self.closed = true;
    }
}

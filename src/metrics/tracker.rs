use std::collections::VecDeque;
use std::path::Path;
use serde::{Serialize, Deserialize};

/// Per-episode series collected during reinforcement learning
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EpisodeMetrics {
    /// Total reward per episode
    pub episode_rewards: VecDeque<f32>,

    /// Steps per episode
    pub episode_lengths: VecDeque<usize>,

    /// Mean training loss of each episode that trained
    pub losses: VecDeque<f32>,

    /// Exploration rate at the end of each episode
    pub epsilons: VecDeque<f32>,
}

/// Bounded history of episode metrics with windowed summaries
#[derive(Debug, Clone)]
pub struct MetricsTracker {
    metrics: EpisodeMetrics,
    history_size: usize,
    episode_count: usize,
    total_steps: usize,
}

fn push_bounded<T>(series: &mut VecDeque<T>, value: T, limit: usize) {
    if series.len() >= limit {
        series.pop_front();
    }
    series.push_back(value);
}

fn window_mean(series: &VecDeque<f32>, window: usize) -> Option<f32> {
    if series.is_empty() || window == 0 {
        return None;
    }
    let n = window.min(series.len());
    let sum: f32 = series.iter().rev().take(n).sum();
    Some(sum / n as f32)
}

impl MetricsTracker {
    pub fn new(history_size: usize) -> Self {
        MetricsTracker {
            metrics: EpisodeMetrics::default(),
            history_size: history_size.max(1),
            episode_count: 0,
            total_steps: 0,
        }
    }

    pub fn record_episode(&mut self, reward: f32, steps: usize) {
        push_bounded(&mut self.metrics.episode_rewards, reward, self.history_size);
        push_bounded(&mut self.metrics.episode_lengths, steps, self.history_size);
        self.episode_count += 1;
        self.total_steps += steps;
    }

    pub fn record_loss(&mut self, loss: f32) {
        push_bounded(&mut self.metrics.losses, loss, self.history_size);
    }

    pub fn record_epsilon(&mut self, epsilon: f32) {
        push_bounded(&mut self.metrics.epsilons, epsilon, self.history_size);
    }

    pub fn metrics(&self) -> &EpisodeMetrics {
        &self.metrics
    }

    pub fn episode_count(&self) -> usize {
        self.episode_count
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Mean of the last `window` recorded losses
    pub fn avg_loss(&self, window: usize) -> Option<f32> {
        window_mean(&self.metrics.losses, window)
    }

    /// Mean reward of the last `window` episodes
    pub fn avg_episode_reward(&self, window: usize) -> Option<f32> {
        window_mean(&self.metrics.episode_rewards, window)
    }

    /// Best reward among the last `window` episodes
    pub fn max_episode_reward(&self, window: usize) -> Option<f32> {
        if self.metrics.episode_rewards.is_empty() || window == 0 {
            return None;
        }
        self.metrics.episode_rewards.iter().rev().take(window).copied().reduce(f32::max)
    }

    pub fn clear(&mut self) {
        self.metrics = EpisodeMetrics::default();
        self.episode_count = 0;
        self.total_steps = 0;
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::error::Result<()> {
        let serialized = serde_json::to_string_pretty(&self.metrics)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

impl Default for MetricsTracker {
    fn default() -> Self {
        Self::new(1000)
    }
}

//! # Metrics
//!
//! - [`History`]: per-epoch supervised training curves, saved as JSON
//! - [`MetricsTracker`]: windowed episode rewards and losses for RL
//! - [`Statistics`]: summary of a series (timings, scores)
//! - [`accuracy`] helpers for classifier outputs

pub mod history;
pub mod statistics;
pub mod tracker;

pub use history::History;
pub use statistics::{median, Statistics};
pub use tracker::{EpisodeMetrics, MetricsTracker};

use ndarray::{ArrayView1, ArrayView2, Axis};

/// Fraction of rows whose argmax equals the label
pub fn accuracy(probabilities: ArrayView2<f32>, labels: ArrayView1<u8>) -> f32 {
    if labels.is_empty() {
        return 0.0;
    }
    let correct = probabilities
        .axis_iter(Axis(0))
        .zip(labels.iter())
        .filter(|(row, &label)| crate::agent::greedy_action(row.view()) == label as usize)
        .count();
    correct as f32 / labels.len() as f32
}

/// Fraction of sigmoid outputs that land on the right side of `threshold`
pub fn binary_accuracy(outputs: ArrayView1<f32>, targets: ArrayView1<f32>, threshold: f32) -> f32 {
    if outputs.is_empty() {
        return 0.0;
    }
    let correct = outputs
        .iter()
        .zip(targets.iter())
        .filter(|(&p, &t)| (p >= threshold) == (t >= 0.5))
        .count();
    correct as f32 / outputs.len() as f32
}

//! Action-selection and exploration schedule, independent of any network.

use ndarray::ArrayView1;
use rand::Rng;

/// Index of the largest value. Ties resolve to the lowest index; NaN never wins.
pub fn greedy_action(q_values: ArrayView1<f32>) -> usize {
    let mut best = 0;
    let mut best_value = f32::NEG_INFINITY;
    for (i, &q) in q_values.iter().enumerate() {
        if q > best_value {
            best = i;
            best_value = q;
        }
    }
    best
}

/// With probability `epsilon` a uniformly random action, otherwise the greedy one.
pub fn epsilon_greedy<R: Rng + ?Sized>(q_values: ArrayView1<f32>, epsilon: f32, rng: &mut R) -> usize {
    if !q_values.is_empty() && rng.gen::<f32>() < epsilon {
        rng.gen_range(0..q_values.len())
    } else {
        greedy_action(q_values)
    }
}

/// Multiplicative per-episode decay, clamped at `floor`.
pub fn decay_epsilon(epsilon: f32, decay: f32, floor: f32) -> f32 {
    (epsilon * decay).max(floor)
}

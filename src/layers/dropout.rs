use ndarray::{Array, ArrayView, Dimension};
use rand::Rng;
use serde::{Serialize, Deserialize};

/// Dropout Layer
///
/// Randomly sets input units to 0 with probability p during training and
/// scales the survivors by `1 / (1 - p)` (inverted dropout), so inference
/// is the identity. Works on tensors of any rank.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DropoutLayer<D: Dimension> {
    /// Dropout probability (probability of dropping a unit)
    pub dropout_rate: f32,

    /// Whether we're in training mode
    pub training: bool,

    /// Cached mask for backward pass
    #[serde(skip)]
    cached_mask: Option<Array<f32, D>>,
}

impl<D: Dimension> DropoutLayer<D> {
    pub fn new(dropout_rate: f32) -> Self {
        assert!((0.0..1.0).contains(&dropout_rate),
                "Dropout rate must be in [0, 1)");

        DropoutLayer {
            dropout_rate,
            training: true,
            cached_mask: None,
        }
    }

    pub fn set_training(&mut self, training: bool) {
        self.training = training;
        if !training {
            self.cached_mask = None;
        }
    }

    pub fn forward<R: Rng + ?Sized>(&mut self, inputs: ArrayView<f32, D>, rng: &mut R) -> Array<f32, D> {
        if !self.training || self.dropout_rate == 0.0 {
            return inputs.to_owned();
        }

        let scale = 1.0 / (1.0 - self.dropout_rate);
        let rate = self.dropout_rate;
        let mask = Array::from_shape_simple_fn(inputs.raw_dim(), || {
            if rng.gen::<f32>() >= rate { scale } else { 0.0 }
        });
        let output = &inputs * &mask;
        self.cached_mask = Some(mask);
        output
    }

    pub fn backward(&self, grad_output: ArrayView<f32, D>) -> Array<f32, D> {
        match &self.cached_mask {
            Some(mask) if self.training => &grad_output * mask,
            _ => grad_output.to_owned(),
        }
    }
}

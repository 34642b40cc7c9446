use ndarray::{Array2, ArrayView1, ArrayView2, Axis};

const EPSILON: f32 = 1e-7;

/// Trait defining the interface for loss functions over `(batch, outputs)` arrays
pub trait Loss {
    /// Compute the mean loss for a batch of predictions and targets
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32;

    /// Compute the gradient of the mean loss with respect to predictions
    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32>;
}

/// Mean Squared Error loss
pub struct MSE;

impl Loss for MSE {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| x * x).mean().unwrap_or(0.0)
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        (&predictions - &targets) * (2.0 / predictions.len().max(1) as f32)
    }
}

/// Huber loss (smooth L1), averaged over every element like Keras' `huber`
pub struct HuberLoss {
    pub delta: f32,
}

impl HuberLoss {
    pub fn new(delta: f32) -> Self {
        HuberLoss { delta }
    }
}

impl Default for HuberLoss {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl Loss for HuberLoss {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let diff = &predictions - &targets;
        diff.mapv(|x| {
            let abs_x = x.abs();
            if abs_x <= self.delta {
                0.5 * x * x
            } else {
                self.delta * abs_x - 0.5 * self.delta * self.delta
            }
        }).mean().unwrap_or(0.0)
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let diff = &predictions - &targets;
        let n = predictions.len().max(1) as f32;
        diff.mapv(|x| {
            if x.abs() <= self.delta {
                x
            } else {
                self.delta * x.signum()
            }
        }) / n
    }
}

/// Binary cross-entropy for sigmoid outputs in (0, 1)
pub struct BinaryCrossEntropy;

impl Loss for BinaryCrossEntropy {
    fn compute_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> f32 {
        let n = predictions.len().max(1) as f32;
        predictions.iter()
            .zip(targets.iter())
            .map(|(&p, &t)| {
                let p = p.clamp(EPSILON, 1.0 - EPSILON);
                -(t * p.ln() + (1.0 - t) * (1.0 - p).ln())
            })
            .sum::<f32>() / n
    }

    fn gradient_batch(&self, predictions: ArrayView2<f32>, targets: ArrayView2<f32>) -> Array2<f32> {
        let n = predictions.len().max(1) as f32;
        let mut grad = predictions.to_owned();
        grad.zip_mut_with(&targets, |p, &t| {
            let q = p.clamp(EPSILON, 1.0 - EPSILON);
            *p = (q - t) / (q * (1.0 - q)) / n;
        });
        grad
    }
}

/// Cross-entropy between softmax probabilities and integer class labels.
///
/// Not a [`Loss`] implementation: labels are indices, and the gradient is
/// taken with respect to the logits that produced `probabilities`.
pub struct SparseCategoricalCrossEntropy;

impl SparseCategoricalCrossEntropy {
    pub fn compute(probabilities: ArrayView2<f32>, labels: ArrayView1<u8>) -> f32 {
        let batch = probabilities.nrows().max(1) as f32;
        probabilities.axis_iter(Axis(0))
            .zip(labels.iter())
            .map(|(row, &label)| -(row[label as usize].max(EPSILON)).ln())
            .sum::<f32>() / batch
    }

    /// `(softmax - one_hot) / batch`
    pub fn logits_gradient(probabilities: ArrayView2<f32>, labels: ArrayView1<u8>) -> Array2<f32> {
        let batch = probabilities.nrows().max(1) as f32;
        let mut grad = probabilities.to_owned();
        for (mut row, &label) in grad.axis_iter_mut(Axis(0)).zip(labels.iter()) {
            row[label as usize] -= 1.0;
        }
        grad / batch
    }
}

use ndarray::{Array1, Array2, ArrayView2};

/// Gradients produced by a single layer's backward pass
pub struct LayerGradients {
    /// Error propagated to the layer's inputs
    pub input_error: Array2<f32>,
    pub weights: Array2<f32>,
    pub biases: Array1<f32>,
}

/// Trait defining the interface for feed-forward layers operating on `(batch, features)`
pub trait Layer {
    /// Perform forward propagation for a batch of inputs, caching what backward needs
    fn forward_batch(&mut self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Forward pass that leaves the cache untouched
    fn predict_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32>;

    /// Perform backward propagation for a batch of output errors.
    /// `forward_batch` must have been called first.
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> LayerGradients;

    fn weights_mut(&mut self) -> &mut Array2<f32>;

    fn biases_mut(&mut self) -> &mut Array1<f32>;

    fn weights(&self) -> &Array2<f32>;

    fn biases(&self) -> &Array1<f32>;

    fn output_size(&self) -> usize {
        self.weights().shape()[1]
    }

    fn input_size(&self) -> usize {
        self.weights().shape()[0]
    }
}

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use std::fs;
use std::path::Path;

use crate::activations::Activation;
use crate::error::{MlError, Result};
use crate::layers::{DenseLayer, LayerTrait, WeightInit};
use crate::loss::Loss;
use crate::optimizer::{Optimizer, OptimizerWrapper};

/// A feed-forward Neural Network consisting of dense layers and an optimizer.
///
/// Used both as the DQN's action-value function and as the tabular
/// binary classifier.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NeuralNetwork {
    pub layers: Vec<DenseLayer>,
    pub optimizer: OptimizerWrapper,
}

impl NeuralNetwork {
    /// Create a new neural network with the given layer sizes, activations, and optimizer.
    /// `activations` holds one entry per weight layer, so it is one shorter than `layer_sizes`.
    pub fn new(layer_sizes: &[usize], activations: &[Activation], optimizer: OptimizerWrapper) -> Self {
        Self::new_with_init(
            layer_sizes,
            activations,
            optimizer,
            WeightInit::default(),
            &mut rand::thread_rng(),
        )
    }

    pub fn new_with_init<R: Rng + ?Sized>(
        layer_sizes: &[usize],
        activations: &[Activation],
        optimizer: OptimizerWrapper,
        init: WeightInit,
        rng: &mut R,
    ) -> Self {
        assert_eq!(layer_sizes.len() - 1, activations.len());

        let layers = layer_sizes
            .windows(2)
            .zip(activations.iter())
            .map(|(window, &activation)| {
                DenseLayer::new_with_init(window[0], window[1], activation, init, rng)
            })
            .collect::<Vec<_>>();

        NeuralNetwork { layers, optimizer }
    }

    pub fn input_size(&self) -> usize {
        self.layers.first().map(|l| l.input_size()).unwrap_or(0)
    }

    pub fn output_size(&self) -> usize {
        self.layers.last().map(|l| l.output_size()).unwrap_or(0)
    }

    /// Forward pass for a single input vector
    pub fn forward(&self, input: ArrayView1<f32>) -> Array1<f32> {
        let output = self.forward_batch(input.insert_axis(Axis(0)));
        output.index_axis_move(Axis(0), 0)
    }

    /// Forward pass for a batch of input vectors without recording backward state
    pub fn forward_batch(&self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &self.layers {
            current_output = layer.predict_batch(current_output.view());
        }
        current_output
    }

    fn forward_training(&mut self, inputs: ArrayView2<f32>) -> Array2<f32> {
        let mut current_output = inputs.to_owned();
        for layer in &mut self.layers {
            current_output = layer.forward_batch(current_output.view());
        }
        current_output
    }

    /// Gradients for every layer, in layer order
    fn backward_batch(&self, output_errors: ArrayView2<f32>) -> Vec<(Array2<f32>, Array1<f32>)> {
        let mut gradients = Vec::with_capacity(self.layers.len());
        let mut current_error = output_errors.to_owned();

        for layer in self.layers.iter().rev() {
            let grads = layer.backward_batch(current_error.view());
            gradients.push((grads.weights, grads.biases));
            current_error = grads.input_error;
        }

        gradients.reverse();
        gradients
    }

    /// One gradient step on a batch. Returns the loss measured before the update.
    pub fn train_batch(
        &mut self,
        inputs: ArrayView2<f32>,
        targets: ArrayView2<f32>,
        loss: &dyn Loss,
        learning_rate: f32,
    ) -> Result<f32> {
        if inputs.ncols() != self.input_size() {
            return Err(MlError::dimension_mismatch(
                format!("{} input features", self.input_size()),
                format!("{}", inputs.ncols()),
            ));
        }
        let outputs = self.forward_training(inputs);
        if outputs.dim() != targets.dim() {
            return Err(MlError::dimension_mismatch(
                format!("targets of shape {:?}", outputs.dim()),
                format!("{:?}", targets.dim()),
            ));
        }

        let loss_value = loss.compute_batch(outputs.view(), targets);
        let output_errors = loss.gradient_batch(outputs.view(), targets);
        let gradients = self.backward_batch(output_errors.view());

        for (slot, (layer, (weight_gradients, bias_gradients))) in self.layers.iter_mut().zip(gradients).enumerate() {
            self.optimizer.update_weights(slot, &mut layer.weights, &weight_gradients, learning_rate);
            self.optimizer.update_biases(slot, &mut layer.biases, &bias_gradients, learning_rate);
        }
        self.optimizer.step();

        Ok(loss_value)
    }

    /// Overwrite this network's parameters with `other`'s. Optimizer state is kept.
    pub fn copy_weights_from(&mut self, other: &NeuralNetwork) -> Result<()> {
        if self.layers.len() != other.layers.len() {
            return Err(MlError::dimension_mismatch(
                format!("{} layers", self.layers.len()),
                format!("{} layers", other.layers.len()),
            ));
        }
        for (dst, src) in self.layers.iter_mut().zip(&other.layers) {
            if dst.weights.dim() != src.weights.dim() {
                return Err(MlError::dimension_mismatch(
                    format!("{:?}", dst.weights.dim()),
                    format!("{:?}", src.weights.dim()),
                ));
            }
            dst.weights.assign(&src.weights);
            dst.biases.assign(&src.biases);
        }
        Ok(())
    }

    /// Save the network, including optimizer state, with bincode.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let buffer = fs::read(path)?;
        Ok(bincode::deserialize(&buffer)?)
    }
}

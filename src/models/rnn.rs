//! Stacked-LSTM image classifier. Each image row is one time step.

use std::path::Path;

use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis, Ix3};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::{softmax_rows, Activation};
use crate::agent::greedy_action;
use crate::data::ImageDataset;
use crate::error::{MlError, Result};
use crate::layers::{DenseLayer, DropoutLayer, LSTMLayer, LayerTrait, WeightInit};
use crate::loss::SparseCategoricalCrossEntropy;
use crate::metrics::{accuracy, history, History};
use crate::optimizer::{Adam, Optimizer, OptimizerWrapper};
use crate::visualization::training_progress;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RnnConfig {
    /// Hidden width of each LSTM layer; all but the last return sequences
    pub hidden_sizes: Vec<usize>,
    pub dropout: f32,
    pub learning_rate: f32,
    pub batch_size: usize,
    pub num_classes: usize,
    /// Epoch budget of the first (saved) model
    pub long_epochs: usize,
    /// Epoch budget of the comparison model
    pub short_epochs: usize,
    pub limit_train: Option<usize>,
    pub limit_test: Option<usize>,
    pub seed: u64,
}

impl Default for RnnConfig {
    fn default() -> Self {
        RnnConfig {
            hidden_sizes: vec![128, 32, 32],
            dropout: 0.2,
            learning_rate: 1e-3,
            batch_size: 128,
            num_classes: 10,
            long_epochs: 6,
            short_epochs: 2,
            limit_train: None,
            limit_test: None,
            seed: 42,
        }
    }
}

/// LSTM stack -> dropout after each LSTM -> dense softmax head
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct RnnClassifier {
    pub recurrent: Vec<LSTMLayer>,
    pub dropouts: Vec<DropoutLayer<Ix3>>,
    pub head: DenseLayer,
    pub optimizer: OptimizerWrapper,
    pub learning_rate: f32,
    pub batch_size: usize,
}

impl RnnClassifier {
    /// `input_size` is the width of one time step (image columns)
    pub fn new<R: Rng + ?Sized>(input_size: usize, config: &RnnConfig, rng: &mut R) -> Result<Self> {
        if config.hidden_sizes.is_empty() {
            return Err(MlError::invalid_parameter("hidden_sizes", "at least one LSTM layer is required"));
        }
        if !(0.0..1.0).contains(&config.dropout) {
            return Err(MlError::invalid_parameter("dropout", "must lie in [0, 1)"));
        }
        if config.batch_size == 0 || config.num_classes == 0 {
            return Err(MlError::invalid_parameter("batch_size", "batch size and class count must be positive"));
        }

        let last = config.hidden_sizes.len() - 1;
        let mut recurrent = Vec::with_capacity(config.hidden_sizes.len());
        let mut width = input_size;
        for (k, &hidden) in config.hidden_sizes.iter().enumerate() {
            recurrent.push(LSTMLayer::new(width, hidden, k != last, Activation::Relu, rng));
            width = hidden;
        }
        let dropouts = (0..recurrent.len()).map(|_| DropoutLayer::new(config.dropout)).collect();
        let head = DenseLayer::new_with_init(width, config.num_classes, Activation::Linear, WeightInit::XavierUniform, rng);

        Ok(RnnClassifier {
            recurrent,
            dropouts,
            head,
            optimizer: OptimizerWrapper::Adam(Adam::default()),
            learning_rate: config.learning_rate,
            batch_size: config.batch_size,
        })
    }

    pub fn input_size(&self) -> usize {
        self.recurrent[0].input_size
    }

    pub fn num_classes(&self) -> usize {
        self.head.output_size()
    }

    /// Keras-style layer table with parameter counts
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("{:<24}{:<20}{:>10}", "Layer (type)", "Output Shape", "Param #"),
            "=".repeat(54),
        ];
        let mut total = 0;
        for (k, (layer, dropout)) in self.recurrent.iter().zip(self.dropouts.iter()).enumerate() {
            let params = layer.w_x.len() + layer.w_h.len() + layer.b.len();
            total += params;
            let shape = if layer.return_sequences {
                format!("(None, None, {})", layer.hidden_size)
            } else {
                format!("(None, {})", layer.hidden_size)
            };
            lines.push(format!("{:<24}{:<20}{:>10}", format!("lstm_{} (LSTM)", k), shape, params));
            lines.push(format!(
                "{:<24}{:<20}{:>10}",
                format!("dropout_{} ({:.2})", k, dropout.dropout_rate),
                shape,
                0
            ));
        }
        let head_params = self.head.weights.len() + self.head.biases.len();
        total += head_params;
        lines.push(format!(
            "{:<24}{:<20}{:>10}",
            "dense (Dense)",
            format!("(None, {})", self.num_classes()),
            head_params
        ));
        lines.push("=".repeat(54));
        lines.push(format!("Total params: {}", total));
        lines.join("\n")
    }

    fn check_input(&self, images: ArrayView3<f32>) -> Result<()> {
        let width = images.len_of(Axis(2));
        if width != self.input_size() {
            return Err(MlError::dimension_mismatch(
                format!("time steps of width {}", self.input_size()),
                format!("{}", width),
            ));
        }
        Ok(())
    }

    /// Class probabilities, no dropout
    pub fn predict_proba(&self, images: ArrayView3<f32>) -> Array2<f32> {
        let mut activations = images.to_owned();
        for layer in &self.recurrent {
            activations = layer.predict_sequence(activations.view());
        }
        let features = activations.index_axis(Axis(1), 0).to_owned();
        softmax_rows(self.head.predict_batch(features.view()).view())
    }

    fn forward_train<R: Rng + ?Sized>(&mut self, images: ArrayView3<f32>, rng: &mut R) -> Array2<f32> {
        let mut activations = images.to_owned();
        for (layer, dropout) in self.recurrent.iter_mut().zip(self.dropouts.iter_mut()) {
            let out = layer.forward_sequence(activations.view());
            activations = dropout.forward(out.view(), rng);
        }
        let features = activations.index_axis(Axis(1), 0).to_owned();
        softmax_rows(self.head.forward_batch(features.view()).view())
    }

    /// One Adam step on a mini-batch. Returns `(loss, accuracy)` before the update.
    pub fn train_batch<R: Rng + ?Sized>(
        &mut self,
        images: ArrayView3<f32>,
        labels: ArrayView1<u8>,
        rng: &mut R,
    ) -> Result<(f32, f32)> {
        self.check_input(images)?;
        if images.len_of(Axis(0)) != labels.len() {
            return Err(MlError::dimension_mismatch(
                format!("{} labels", images.len_of(Axis(0))),
                format!("{}", labels.len()),
            ));
        }
        if let Some(&bad) = labels.iter().find(|&&l| l as usize >= self.num_classes()) {
            return Err(MlError::invalid_parameter("labels", format!("label {} out of range", bad)));
        }

        let probabilities = self.forward_train(images, rng);
        let loss = SparseCategoricalCrossEntropy::compute(probabilities.view(), labels);
        let batch_accuracy = accuracy(probabilities.view(), labels);

        let logits_grad = SparseCategoricalCrossEntropy::logits_gradient(probabilities.view(), labels);
        let head_grads = self.head.backward_batch(logits_grad.view());
        let mut grad = head_grads.input_error.insert_axis(Axis(1));

        let mut recurrent_grads = Vec::with_capacity(self.recurrent.len());
        for k in (0..self.recurrent.len()).rev() {
            let through_dropout = self.dropouts[k].backward(grad.view());
            let grads = self.recurrent[k].backward_sequence(through_dropout.view());
            grad = grads.dx.clone();
            recurrent_grads.push((k, grads));
        }

        let lr = self.learning_rate;
        for (k, grads) in recurrent_grads {
            let layer = &mut self.recurrent[k];
            self.optimizer.update_weights(2 * k, &mut layer.w_x, &grads.dw_x, lr);
            self.optimizer.update_weights(2 * k + 1, &mut layer.w_h, &grads.dw_h, lr);
            self.optimizer.update_biases(k, &mut layer.b, &grads.db, lr);
        }
        let head_slot = self.recurrent.len();
        self.optimizer.update_weights(2 * head_slot, &mut self.head.weights, &head_grads.weights, lr);
        self.optimizer.update_biases(head_slot, &mut self.head.biases, &head_grads.biases, lr);
        self.optimizer.step();

        Ok((loss, batch_accuracy))
    }

    fn set_training(&mut self, training: bool) {
        for dropout in &mut self.dropouts {
            dropout.set_training(training);
        }
    }

    /// Mean loss and accuracy over a labelled set, evaluated in batches
    pub fn evaluate(&self, images: ArrayView3<f32>, labels: ArrayView1<u8>) -> Result<(f32, f32)> {
        self.check_input(images)?;
        let n = labels.len();
        if n == 0 || images.len_of(Axis(0)) != n {
            return Err(MlError::dimension_mismatch(
                format!("{} labels", images.len_of(Axis(0))),
                format!("{}", n),
            ));
        }

        let (mut loss_sum, mut correct) = (0.0f32, 0.0f32);
        for start in (0..n).step_by(self.batch_size) {
            let end = (start + self.batch_size).min(n);
            let probabilities = self.predict_proba(images.slice(s![start..end, .., ..]));
            let batch_labels = labels.slice(s![start..end]);
            let count = (end - start) as f32;
            loss_sum += SparseCategoricalCrossEntropy::compute(probabilities.view(), batch_labels) * count;
            correct += accuracy(probabilities.view(), batch_labels) * count;
        }
        Ok((loss_sum / n as f32, correct / n as f32))
    }

    /// Most probable class for one `(steps, width)` image
    pub fn predict_one(&self, image: ArrayView2<f32>) -> Result<usize> {
        let batch = image.insert_axis(Axis(0));
        self.check_input(batch)?;
        let probabilities = self.predict_proba(batch);
        Ok(greedy_action(probabilities.row(0)))
    }

    /// Shuffled mini-batch training; validation uses the test split after every epoch.
    pub fn fit<R: Rng + ?Sized>(&mut self, data: &ImageDataset, epochs: usize, rng: &mut R) -> Result<History> {
        let n = data.y_train.len();
        if n == 0 {
            return Err(MlError::TrainingError("training set is empty".to_string()));
        }
        let mut history = History::new();
        let mut order: Vec<usize> = (0..n).collect();

        for epoch in 1..=epochs {
            self.set_training(true);
            order.shuffle(rng);

            let (mut loss_sum, mut acc_sum, mut seen) = (0.0f32, 0.0f32, 0usize);
            for chunk in order.chunks(self.batch_size) {
                let images: Array3<f32> = data.x_train.select(Axis(0), chunk);
                let labels: Array1<u8> = data.y_train.select(Axis(0), chunk);
                let (loss, acc) = self.train_batch(images.view(), labels.view(), rng)?;
                loss_sum += loss * chunk.len() as f32;
                acc_sum += acc * chunk.len() as f32;
                seen += chunk.len();
                tracing::trace!(
                    epoch,
                    "{}",
                    training_progress(seen, n, loss_sum / seen as f32, acc_sum / seen as f32)
                );
            }
            self.set_training(false);

            let (train_loss, train_acc) = (loss_sum / n as f32, acc_sum / n as f32);
            let (val_loss, val_acc) = self.evaluate(data.x_test.view(), data.y_test.view())?;
            history.record_epoch(&[
                (history::LOSS, train_loss),
                (history::ACCURACY, train_acc),
                (history::VAL_LOSS, val_loss),
                (history::VAL_ACCURACY, val_acc),
            ])?;

            tracing::info!(epoch, train_loss, val_loss, "epoch finished");
            println!(
                "Epoch {}/{} - loss: {:.4} - accuracy: {:.4} - val_loss: {:.4} - val_accuracy: {:.4}",
                epoch, epochs, train_loss, train_acc, val_loss, val_acc
            );
        }
        Ok(history)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }
}

/// Build a fresh classifier for `data` and train it for `epochs`
pub fn train<R: Rng + ?Sized>(
    data: &ImageDataset,
    epochs: usize,
    config: &RnnConfig,
    rng: &mut R,
) -> Result<(RnnClassifier, History)> {
    let width = data.x_train.len_of(Axis(2));
    let mut model = RnnClassifier::new(width, config, rng)?;
    let history = model.fit(data, epochs, rng)?;
    Ok((model, history))
}

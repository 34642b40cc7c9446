//! Feed-forward binary classifier over the four lesion markers, with a
//! per-epoch wall-clock timing harness.

use std::path::Path;
use std::time::Instant;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activations::Activation;
use crate::error::{MlError, Result};
use crate::layers::WeightInit;
use crate::loss::BinaryCrossEntropy;
use crate::metrics::{binary_accuracy, Statistics};
use crate::network::NeuralNetwork;
use crate::optimizer::{Adam, OptimizerWrapper, SGD};

/// Hand-picked marker vectors and their descriptions
pub const PROBES: [([f32; 4], &str); 4] = [
    ([1.0, 1.0, 1.0, 1.0], "All markers present"),
    ([0.0, 0.0, 0.0, 0.0], "No markers present"),
    ([1.0, 1.0, 0.0, 0.0], "Size and shape markers"),
    ([0.0, 0.0, 0.0, 1.0], "Only boundary marker"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerKind {
    Adam,
    Sgd,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabularConfig {
    pub hidden_sizes: Vec<usize>,
    pub optimizer: OptimizerKind,
    pub learning_rate: f32,
    pub epochs: usize,
    pub test_fraction: f64,
    pub threshold: f32,
    /// Print a progress line every this many epochs
    pub log_every: usize,
    pub seed: u64,
}

impl Default for TabularConfig {
    fn default() -> Self {
        TabularConfig {
            hidden_sizes: vec![16, 8],
            optimizer: OptimizerKind::Adam,
            learning_rate: 0.01,
            epochs: 50,
            test_fraction: 0.2,
            threshold: 0.5,
            log_every: 10,
            seed: 42,
        }
    }
}

/// Outcome of a timed training run
#[derive(Debug, Clone)]
pub struct TimingReport {
    /// Seconds per epoch
    pub epoch_times: Vec<f32>,
    pub losses: Vec<f32>,
    pub stats: Statistics,
}

impl TimingReport {
    pub fn total_time(&self) -> f32 {
        self.epoch_times.iter().sum()
    }

    pub fn summary(&self) -> String {
        format!(
            "Minimum time: {:.4}s (Epoch {})\n\
             Maximum time: {:.4}s (Epoch {})\n\
             Mean time: {:.4}s\n\
             Median time: {:.4}s\n\
             Std deviation: {:.4}s",
            self.stats.min,
            self.stats.argmin + 1,
            self.stats.max,
            self.stats.argmax + 1,
            self.stats.mean,
            self.stats.median,
            self.stats.std
        )
    }
}

/// ReLU hidden layers and a single sigmoid output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TabularClassifier {
    pub network: NeuralNetwork,
    pub learning_rate: f32,
}

impl TabularClassifier {
    pub fn new<R: Rng + ?Sized>(input_size: usize, config: &TabularConfig, rng: &mut R) -> Result<Self> {
        if input_size == 0 || config.hidden_sizes.contains(&0) {
            return Err(MlError::invalid_parameter("hidden_sizes", "layer sizes must be positive"));
        }
        let mut sizes = vec![input_size];
        sizes.extend_from_slice(&config.hidden_sizes);
        sizes.push(1);

        let mut activations = vec![Activation::Relu; config.hidden_sizes.len()];
        activations.push(Activation::Sigmoid);

        let optimizer = match config.optimizer {
            OptimizerKind::Adam => OptimizerWrapper::Adam(Adam::default()),
            OptimizerKind::Sgd => OptimizerWrapper::SGD(SGD::new()),
        };

        Ok(TabularClassifier {
            network: NeuralNetwork::new_with_init(&sizes, &activations, optimizer, WeightInit::HeUniform, rng),
            learning_rate: config.learning_rate,
        })
    }

    /// One full-batch gradient step; returns the loss before the step
    pub fn train_epoch(&mut self, features: ArrayView2<f32>, targets: ArrayView1<f32>) -> Result<f32> {
        let targets = targets.insert_axis(Axis(1));
        self.network.train_batch(features, targets, &BinaryCrossEntropy, self.learning_rate)
    }

    /// Train for `epochs` full-batch steps, timing each one
    pub fn train_timed(
        &mut self,
        features: ArrayView2<f32>,
        targets: ArrayView1<f32>,
        epochs: usize,
        log_every: usize,
    ) -> Result<TimingReport> {
        let mut epoch_times = Vec::with_capacity(epochs);
        let mut losses = Vec::with_capacity(epochs);

        for epoch in 1..=epochs {
            let start = Instant::now();
            let loss = self.train_epoch(features, targets)?;
            let elapsed = start.elapsed().as_secs_f32();
            epoch_times.push(elapsed);
            losses.push(loss);

            tracing::debug!(epoch, loss, elapsed, "epoch finished");
            if log_every > 0 && epoch % log_every == 0 {
                println!("Epoch [{}/{}], Loss: {:.4}, Time: {:.4}s", epoch, epochs, loss, elapsed);
            }
        }

        let stats = Statistics::from_slice(&epoch_times)
            .ok_or_else(|| MlError::TrainingError("no epochs were run".to_string()))?;
        Ok(TimingReport { epoch_times, losses, stats })
    }

    /// Probability of the positive class for each row
    pub fn predict_proba(&self, features: ArrayView2<f32>) -> Array1<f32> {
        self.network.forward_batch(features).column(0).to_owned()
    }

    pub fn predict_one(&self, features: &[f32]) -> Result<f32> {
        if features.len() != self.network.input_size() {
            return Err(MlError::dimension_mismatch(
                format!("{} features", self.network.input_size()),
                format!("{}", features.len()),
            ));
        }
        let row = Array2::from_shape_vec((1, features.len()), features.to_vec())
            .map_err(|e| MlError::TrainingError(e.to_string()))?;
        Ok(self.predict_proba(row.view())[0])
    }

    pub fn accuracy(&self, features: ArrayView2<f32>, targets: ArrayView1<f32>, threshold: f32) -> f32 {
        binary_accuracy(self.predict_proba(features).view(), targets, threshold)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }
}

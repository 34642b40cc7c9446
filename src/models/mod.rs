//! # Supervised models
//!
//! - [`rnn`]: stacked-LSTM image classifier trained with sparse categorical cross-entropy
//! - [`tabular`]: small ReLU/sigmoid classifier with a per-epoch timing harness

pub mod rnn;
pub mod tabular;

pub use rnn::{RnnClassifier, RnnConfig};
pub use tabular::{OptimizerKind, TabularClassifier, TabularConfig, TimingReport, PROBES};

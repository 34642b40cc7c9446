//! Loss functions used by the trainers.
//!
//! [`HuberLoss`] drives the DQN regression, [`BinaryCrossEntropy`] the tabular
//! classifier, and [`SparseCategoricalCrossEntropy`] the recurrent image classifier.

pub mod functions;

pub use functions::{BinaryCrossEntropy, HuberLoss, Loss, SparseCategoricalCrossEntropy, MSE};

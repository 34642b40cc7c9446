//! # Activation Functions Module
//!
//! Element-wise non-linearities used by the dense and recurrent layers.
//!
//! ## Available Activations
//!
//! - **ReLU**: `max(0, x)`, the hidden-layer default
//! - **Sigmoid**: `1 / (1 + e^(-x))`, used for binary outputs and LSTM gates
//! - **Tanh**: hyperbolic tangent, the classic LSTM cell activation
//! - **Linear**: identity, used for Q-value heads and softmax logits
//!
//! Softmax is not an `Activation` variant; classification heads produce
//! logits and call [`softmax_rows`] so the cross-entropy gradient stays exact.
//!
//! ```rust
//! use mlcourse::activations::Activation;
//! use ndarray::array;
//!
//! let mut data = array![[1.0, -0.5, 0.0, 2.0]];
//! Activation::Relu.apply(&mut data);
//! assert_eq!(data, array![[1.0, 0.0, 0.0, 2.0]]);
//! ```

pub mod functions;

pub use functions::{sigmoid, softmax_rows, Activation};

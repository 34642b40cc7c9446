pub mod traits;
pub mod dense;
pub mod dropout;
pub mod initialization;
pub mod lstm;

pub use traits::{Layer as LayerTrait, LayerGradients};
pub use dense::DenseLayer;
pub use dropout::DropoutLayer;
pub use initialization::WeightInit;
pub use lstm::{LSTMGradients, LSTMLayer};

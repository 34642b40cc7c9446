//! # Data loading
//!
//! - [`npz`]: image archives with `x_train`, `y_train`, `x_test`, `y_test`
//! - [`tabular`]: the headerless five-column CSV, as categorical or numeric data
//! - [`split`]: seeded shuffled train/test split

pub mod npz;
pub mod split;
pub mod tabular;

pub use npz::{load_image_npz, ImageDataset, RawImageDataset, REQUIRED_ARRAYS};
pub use split::train_test_split;
pub use tabular::{CategoricalTable, NumericTable};

//! Packed image datasets stored as `.npz` archives.

use std::fs::File;
use std::path::Path;

use ndarray::{Array1, Array3, Axis};
use ndarray_npy::NpzReader;

use crate::error::{MlError, Result};

/// Array names every image archive must contain
pub const REQUIRED_ARRAYS: [&str; 4] = ["x_train", "y_train", "x_test", "y_test"];

/// Images and labels exactly as stored: `u8` pixels `(n, rows, cols)` and `u8` labels
#[derive(Debug, Clone)]
pub struct RawImageDataset {
    pub x_train: Array3<u8>,
    pub y_train: Array1<u8>,
    pub x_test: Array3<u8>,
    pub y_test: Array1<u8>,
}

/// Images scaled into `[0, 1]`
#[derive(Debug, Clone)]
pub struct ImageDataset {
    pub x_train: Array3<f32>,
    pub y_train: Array1<u8>,
    pub x_test: Array3<f32>,
    pub y_test: Array1<u8>,
}

fn strip_npy(name: &str) -> &str {
    name.strip_suffix(".npy").unwrap_or(name)
}

/// Read the four required arrays. A missing name is an error that lists both
/// the missing names and the names the archive does contain.
pub fn load_image_npz<P: AsRef<Path>>(path: P) -> Result<RawImageDataset> {
    let path = path.as_ref();
    let mut npz = NpzReader::new(File::open(path)?)?;
    let stored = npz.names()?;

    let found: Vec<String> = stored.iter().map(|n| strip_npy(n).to_string()).collect();
    let missing: Vec<String> = REQUIRED_ARRAYS
        .iter()
        .filter(|required| !found.iter().any(|f| f == *required))
        .map(|s| s.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(MlError::MissingArrays {
            path: path.display().to_string(),
            missing,
            found,
        });
    }

    // Read through the stored name so either naming convention works
    let stored_name = |key: &str| -> String {
        stored
            .iter()
            .find(|n| strip_npy(n) == key)
            .cloned()
            .unwrap_or_else(|| key.to_string())
    };

    let x_train: Array3<u8> = npz.by_name(&stored_name("x_train"))?;
    let y_train: Array1<u8> = npz.by_name(&stored_name("y_train"))?;
    let x_test: Array3<u8> = npz.by_name(&stored_name("x_test"))?;
    let y_test: Array1<u8> = npz.by_name(&stored_name("y_test"))?;

    let dataset = RawImageDataset { x_train, y_train, x_test, y_test };
    dataset.validate()?;
    tracing::debug!(path = %path.display(), train = dataset.y_train.len(), test = dataset.y_test.len(), "image archive loaded");
    Ok(dataset)
}

impl RawImageDataset {
    fn validate(&self) -> Result<()> {
        if self.x_train.len_of(Axis(0)) != self.y_train.len() {
            return Err(MlError::dimension_mismatch(
                format!("{} training labels", self.x_train.len_of(Axis(0))),
                format!("{}", self.y_train.len()),
            ));
        }
        if self.x_test.len_of(Axis(0)) != self.y_test.len() {
            return Err(MlError::dimension_mismatch(
                format!("{} test labels", self.x_test.len_of(Axis(0))),
                format!("{}", self.y_test.len()),
            ));
        }
        if self.x_train.shape()[1..] != self.x_test.shape()[1..] {
            return Err(MlError::dimension_mismatch(
                format!("test images shaped {:?}", &self.x_train.shape()[1..]),
                format!("{:?}", &self.x_test.shape()[1..]),
            ));
        }
        Ok(())
    }

    /// Keep at most the first `train` and `test` samples
    pub fn truncated(&self, train: Option<usize>, test: Option<usize>) -> Self {
        let n_train = train.unwrap_or(usize::MAX).min(self.y_train.len());
        let n_test = test.unwrap_or(usize::MAX).min(self.y_test.len());
        RawImageDataset {
            x_train: self.x_train.slice(ndarray::s![..n_train, .., ..]).to_owned(),
            y_train: self.y_train.slice(ndarray::s![..n_train]).to_owned(),
            x_test: self.x_test.slice(ndarray::s![..n_test, .., ..]).to_owned(),
            y_test: self.y_test.slice(ndarray::s![..n_test]).to_owned(),
        }
    }

    /// Pixel values divided by 255
    pub fn scaled(&self) -> ImageDataset {
        let scale = |x: &Array3<u8>| x.mapv(|p| p as f32 / 255.0);
        ImageDataset {
            x_train: scale(&self.x_train),
            y_train: self.y_train.clone(),
            x_test: scale(&self.x_test),
            y_test: self.y_test.clone(),
        }
    }

    pub fn shape_report(&self) -> String {
        format!(
            "x_train: {:?}\ny_train: {:?}\nx_test: {:?}\ny_test: {:?}",
            self.x_train.shape(),
            self.y_train.shape(),
            self.x_test.shape(),
            self.y_test.shape()
        )
    }
}

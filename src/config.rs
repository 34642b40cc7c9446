//! Workflow configuration files.
//!
//! Every workflow has a serde config struct whose `Default` carries the
//! standard hyperparameters. A JSON file may override any subset of fields.

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Read `path` as JSON, or fall back to the defaults when no path is given
pub fn load_or_default<T: DeserializeOwned + Default>(path: Option<&Path>) -> Result<T> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            let config = serde_json::from_str(&text)?;
            tracing::info!(path = %path.display(), "configuration loaded");
            Ok(config)
        }
        None => Ok(T::default()),
    }
}

pub fn save<T: Serialize, P: AsRef<Path>>(config: &T, path: P) -> Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

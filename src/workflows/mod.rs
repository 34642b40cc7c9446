//! # Workflows
//!
//! One use case per CLI subcommand. Each takes its configuration and an
//! output directory, prints a human-readable report to stdout, and writes
//! its artifacts (JSON histories, PNG charts, model files) under the
//! output directory.

pub mod bayes;
pub mod dqn;
pub mod history;
pub mod rnn;
pub mod tabular;

use std::path::{Path, PathBuf};

use crate::error::Result;

/// Create the output directory if needed and return the artifact path within it
pub(crate) fn artifact(output_dir: &Path, name: &str) -> Result<PathBuf> {
    std::fs::create_dir_all(output_dir)?;
    Ok(output_dir.join(name))
}

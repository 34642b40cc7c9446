//! Per-epoch training history, persisted as a JSON object mapping each
//! metric name to its list of per-epoch values.

use std::collections::BTreeMap;
use std::path::Path;
use serde::{Serialize, Deserialize};

use crate::error::{MlError, Result};

pub const LOSS: &str = "loss";
pub const ACCURACY: &str = "accuracy";
pub const VAL_LOSS: &str = "val_loss";
pub const VAL_ACCURACY: &str = "val_accuracy";

/// Metric name to per-epoch values. All series have the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    series: BTreeMap<String, Vec<f32>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from raw series, rejecting unequal lengths
    pub fn from_series(series: BTreeMap<String, Vec<f32>>) -> Result<Self> {
        let history = History { series };
        history.validate()?;
        Ok(history)
    }

    /// Append one epoch. The first epoch fixes the metric names; later epochs
    /// must supply exactly the same names.
    pub fn record_epoch(&mut self, values: &[(&str, f32)]) -> Result<()> {
        if !self.series.is_empty() {
            let same_keys = values.len() == self.series.len()
                && values.iter().all(|(name, _)| self.series.contains_key(*name));
            if !same_keys {
                return Err(MlError::InconsistentHistory(format!(
                    "epoch metrics {:?} do not match recorded metrics {:?}",
                    values.iter().map(|(n, _)| *n).collect::<Vec<_>>(),
                    self.series.keys().collect::<Vec<_>>()
                )));
            }
        }
        for (name, value) in values {
            self.series.entry((*name).to_string()).or_default().push(*value);
        }
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&[f32]> {
        self.series.get(name).map(|v| v.as_slice())
    }

    pub fn metric_names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(|k| k.as_str())
    }

    pub fn epochs(&self) -> usize {
        self.series.values().next().map_or(0, |v| v.len())
    }

    pub fn is_empty(&self) -> bool {
        self.epochs() == 0
    }

    /// Last recorded value of `name`
    pub fn last(&self, name: &str) -> Option<f32> {
        self.series.get(name).and_then(|v| v.last().copied())
    }

    pub fn validate(&self) -> Result<()> {
        let mut lengths = self.series.iter().map(|(k, v)| (k, v.len()));
        if let Some((first_name, expected)) = lengths.next() {
            for (name, len) in lengths {
                if len != expected {
                    return Err(MlError::InconsistentHistory(format!(
                        "'{}' has {} epochs but '{}' has {}",
                        name, len, first_name, expected
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let history: History = serde_json::from_str(&data)?;
        history.validate()?;
        Ok(history)
    }
}

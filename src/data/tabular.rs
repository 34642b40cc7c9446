//! The five-column lesion dataset: `size, shape, color, boundary, diagnosis`,
//! stored as CSV without a header row.
//!
//! Two views are offered. [`CategoricalTable`] keeps every value as a discrete
//! state for the Bayesian network; [`NumericTable`] coerces every value to a
//! number for the feed-forward classifier.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use ndarray::{Array1, Array2};

use crate::error::{MlError, Result};

pub const COLUMNS: [&str; 5] = ["size", "shape", "color", "boundary", "diagnosis"];
pub const FEATURES: [&str; 4] = ["size", "shape", "color", "boundary"];
pub const TARGET: &str = "diagnosis";

fn read_records<P: AsRef<Path>>(path: P) -> Result<Vec<csv::StringRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)?;
    let mut records = Vec::new();
    for record in reader.records() {
        records.push(record?);
    }
    Ok(records)
}

/// Orders state labels numerically when every label is a number, else lexically
fn sort_states(states: BTreeSet<String>) -> Vec<String> {
    let mut states: Vec<String> = states.into_iter().collect();
    if states.iter().all(|s| s.parse::<f64>().is_ok()) {
        states.sort_by(|a, b| {
            let (x, y) = (a.parse::<f64>().unwrap_or(0.0), b.parse::<f64>().unwrap_or(0.0));
            x.total_cmp(&y)
        });
    }
    states
}

/// Discrete dataset: each variable has an ordered list of state labels and
/// each cell holds a state index.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalTable {
    names: Vec<String>,
    states: Vec<Vec<String>>,
    /// Row-major state indices
    rows: Vec<Vec<usize>>,
}

impl CategoricalTable {
    /// Build from string records. Records with the wrong arity or an empty
    /// cell are dropped.
    pub fn from_records<S: AsRef<str>>(names: &[&str], records: &[Vec<S>]) -> Result<Self> {
        if names.is_empty() {
            return Err(MlError::invalid_parameter("names", "at least one column is required"));
        }
        let complete: Vec<&Vec<S>> = records
            .iter()
            .filter(|r| r.len() == names.len() && r.iter().all(|v| !v.as_ref().trim().is_empty()))
            .collect();

        let mut state_sets = vec![BTreeSet::new(); names.len()];
        for record in &complete {
            for (set, value) in state_sets.iter_mut().zip(record.iter()) {
                set.insert(value.as_ref().trim().to_string());
            }
        }
        let states: Vec<Vec<String>> = state_sets.into_iter().map(sort_states).collect();

        let rows = complete
            .iter()
            .map(|record| {
                record
                    .iter()
                    .zip(states.iter())
                    .map(|(value, labels)| {
                        let value = value.as_ref().trim();
                        labels.iter().position(|l| l == value).unwrap_or(0)
                    })
                    .collect()
            })
            .collect();

        Ok(CategoricalTable {
            names: names.iter().map(|n| n.to_string()).collect(),
            states,
            rows,
        })
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records: Vec<Vec<String>> = read_records(path)?
            .iter()
            .map(|r| r.iter().map(str::to_string).collect())
            .collect();
        let table = Self::from_records(&COLUMNS, &records)?;
        let dropped = records.len() - table.n_rows();
        if dropped > 0 {
            tracing::warn!(dropped, "incomplete rows skipped");
        }
        Ok(table)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn n_vars(&self) -> usize {
        self.names.len()
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn states(&self, var: usize) -> &[String] {
        &self.states[var]
    }

    pub fn cardinality(&self, var: usize) -> usize {
        self.states[var].len()
    }

    pub fn row(&self, row: usize) -> &[usize] {
        &self.rows[row]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[usize]> {
        self.rows.iter().map(|r| r.as_slice())
    }

    /// State label of `var` in `row`
    pub fn label(&self, row: usize, var: usize) -> &str {
        &self.states[var][self.rows[row][var]]
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.n_rows(), self.n_vars())
    }
}

impl fmt::Display for CategoricalTable {
    /// The first five rows, pandas-style
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:>4}", "")?;
        for name in &self.names {
            write!(f, " {:>10}", name)?;
        }
        writeln!(f)?;
        for row in 0..self.n_rows().min(5) {
            write!(f, "{:>4}", row)?;
            for var in 0..self.n_vars() {
                write!(f, " {:>10}", self.label(row, var))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Numeric dataset: feature matrix and binary target
#[derive(Debug, Clone, PartialEq)]
pub struct NumericTable {
    pub features: Array2<f32>,
    pub targets: Array1<f32>,
    /// Rows discarded because a cell was missing or not a number
    pub dropped: usize,
}

impl NumericTable {
    /// Every cell is parsed as a number; a row with any missing or
    /// unparseable cell is dropped. The last column is the target.
    pub fn from_records<S: AsRef<str>>(records: &[Vec<S>], n_columns: usize) -> Result<Self> {
        if n_columns < 2 {
            return Err(MlError::invalid_parameter("n_columns", "need at least one feature and a target"));
        }
        let parsed: Vec<Vec<f32>> = records
            .iter()
            .filter(|r| r.len() == n_columns)
            .filter_map(|r| {
                r.iter()
                    .map(|v| v.as_ref().trim().parse::<f32>().ok().filter(|x| x.is_finite()))
                    .collect::<Option<Vec<f32>>>()
            })
            .collect();

        let n_features = n_columns - 1;
        let mut features = Array2::zeros((parsed.len(), n_features));
        let mut targets = Array1::zeros(parsed.len());
        for (i, row) in parsed.iter().enumerate() {
            for (j, &value) in row[..n_features].iter().enumerate() {
                features[[i, j]] = value;
            }
            targets[i] = row[n_features];
        }

        Ok(NumericTable {
            features,
            targets,
            dropped: records.len() - parsed.len(),
        })
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let records: Vec<Vec<String>> = read_records(path)?
            .iter()
            .map(|r| r.iter().map(str::to_string).collect())
            .collect();
        let table = Self::from_records(&records, COLUMNS.len())?;
        if table.dropped > 0 {
            tracing::warn!(dropped = table.dropped, "non-numeric rows dropped");
        }
        Ok(table)
    }

    pub fn n_rows(&self) -> usize {
        self.targets.len()
    }

    /// Count of each distinct target value, ascending
    pub fn target_counts(&self) -> Vec<(f32, usize)> {
        let mut counts: Vec<(f32, usize)> = Vec::new();
        for &t in self.targets.iter() {
            match counts.iter_mut().find(|(v, _)| *v == t) {
                Some((_, c)) => *c += 1,
                None => counts.push((t, 1)),
            }
        }
        counts.sort_by(|a, b| a.0.total_cmp(&b.0));
        counts
    }

    /// Rows at `indices`, in order
    pub fn select(&self, indices: &[usize]) -> (Array2<f32>, Array1<f32>) {
        (
            self.features.select(ndarray::Axis(0), indices),
            self.targets.select(ndarray::Axis(0), indices),
        )
    }
}

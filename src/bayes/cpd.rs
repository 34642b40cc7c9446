use std::fmt;

use ndarray::{Array2, Axis};

use crate::data::CategoricalTable;
use crate::error::{MlError, Result};

/// Joint state counts of `var` against every configuration of `parents`.
///
/// Rows index the states of `var`; columns index parent configurations in
/// mixed radix with the last parent varying fastest.
pub fn state_counts(data: &CategoricalTable, var: usize, parents: &[usize]) -> Array2<f64> {
    let parent_cards: Vec<usize> = parents.iter().map(|&p| data.cardinality(p)).collect();
    let columns: usize = parent_cards.iter().product();
    let mut counts = Array2::zeros((data.cardinality(var), columns.max(1)));
    for row in data.rows() {
        let column = parent_config_index(parents.iter().map(|&p| row[p]), &parent_cards);
        counts[[row[var], column]] += 1.0;
    }
    counts
}

/// Mixed-radix index of a parent configuration, last parent fastest
pub fn parent_config_index<I: IntoIterator<Item = usize>>(states: I, cards: &[usize]) -> usize {
    states
        .into_iter()
        .zip(cards.iter())
        .fold(0, |index, (state, &card)| index * card + state)
}

/// Conditional probability table `P(variable | parents)`.
///
/// `values` has one row per state of the variable and one column per parent
/// configuration; each column sums to one.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularCpd {
    pub variable: usize,
    pub variable_name: String,
    pub states: Vec<String>,
    pub parents: Vec<usize>,
    pub parent_names: Vec<String>,
    pub parent_states: Vec<Vec<String>>,
    pub values: Array2<f64>,
}

impl TabularCpd {
    /// Build from raw (non-negative) column weights, normalising every column.
    /// An all-zero column becomes uniform.
    pub fn from_weights(
        data: &CategoricalTable,
        variable: usize,
        parents: &[usize],
        mut weights: Array2<f64>,
    ) -> Result<Self> {
        let card = data.cardinality(variable);
        let columns: usize = parents.iter().map(|&p| data.cardinality(p)).product();
        if weights.dim() != (card, columns.max(1)) {
            return Err(MlError::dimension_mismatch(
                format!("({}, {})", card, columns.max(1)),
                format!("{:?}", weights.dim()),
            ));
        }

        for mut column in weights.axis_iter_mut(Axis(1)) {
            let total = column.sum();
            if total > 0.0 {
                column /= total;
            } else {
                column.fill(1.0 / card as f64);
            }
        }

        Ok(TabularCpd {
            variable,
            variable_name: data.names()[variable].clone(),
            states: data.states(variable).to_vec(),
            parents: parents.to_vec(),
            parent_names: parents.iter().map(|&p| data.names()[p].clone()).collect(),
            parent_states: parents.iter().map(|&p| data.states(p).to_vec()).collect(),
            values: weights,
        })
    }

    pub fn cardinality(&self) -> usize {
        self.states.len()
    }

    pub fn parent_cardinalities(&self) -> Vec<usize> {
        self.parent_states.iter().map(Vec::len).collect()
    }

    /// `P(variable = state | parents = parent_states)`, parent states in `parents` order
    pub fn probability(&self, state: usize, parent_states: &[usize]) -> f64 {
        let column = parent_config_index(parent_states.iter().copied(), &self.parent_cardinalities());
        self.values[[state, column]]
    }

    /// Largest deviation of any column sum from one
    pub fn normalization_error(&self) -> f64 {
        self.values
            .sum_axis(Axis(0))
            .iter()
            .map(|s| (s - 1.0).abs())
            .fold(0.0, f64::max)
    }
}

impl fmt::Display for TabularCpd {
    /// Grid layout: one header row per parent, then one row per state
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let cards = self.parent_cardinalities();
        let columns = self.values.ncols();

        let mut header_rows: Vec<Vec<String>> = Vec::new();
        for (p, name) in self.parent_names.iter().enumerate() {
            let inner: usize = cards[p + 1..].iter().product();
            let mut row = vec![name.clone()];
            for column in 0..columns {
                let state = (column / inner) % cards[p];
                row.push(format!("{}({})", name, self.parent_states[p][state]));
            }
            header_rows.push(row);
        }

        let body: Vec<Vec<String>> = self
            .states
            .iter()
            .enumerate()
            .map(|(s, label)| {
                let mut row = vec![format!("{}({})", self.variable_name, label)];
                row.extend(self.values.row(s).iter().map(|v| format!("{:.4}", v)));
                row
            })
            .collect();

        let all_rows: Vec<&Vec<String>> = header_rows.iter().chain(body.iter()).collect();
        let widths: Vec<usize> = (0..=columns)
            .map(|c| all_rows.iter().map(|r| r[c].len()).max().unwrap_or(0))
            .collect();
        let rule: String = widths.iter().map(|w| format!("+{}", "-".repeat(w + 2))).collect::<String>() + "+";

        writeln!(f, "{}", rule)?;
        for row in &all_rows {
            for (cell, width) in row.iter().zip(widths.iter()) {
                write!(f, "| {:<width$} ", cell, width = width)?;
            }
            writeln!(f, "|")?;
            writeln!(f, "{}", rule)?;
        }
        Ok(())
    }
}

//! Exact inference by variable elimination.

use std::fmt;

use super::cpd::TabularCpd;
use super::model::BayesianNetwork;
use crate::error::{MlError, Result};

/// Non-negative table over a set of discrete variables. Values are stored in
/// mixed radix order with the last variable varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Factor {
    vars: Vec<usize>,
    cards: Vec<usize>,
    values: Vec<f64>,
}

impl Factor {
    pub fn new(vars: Vec<usize>, cards: Vec<usize>, values: Vec<f64>) -> Result<Self> {
        let size: usize = cards.iter().product();
        if vars.len() != cards.len() || values.len() != size {
            return Err(MlError::dimension_mismatch(
                format!("{} values over {} variables", size, cards.len()),
                format!("{} values over {} variables", values.len(), vars.len()),
            ));
        }
        Ok(Factor { vars, cards, values })
    }

    /// `P(var | parents)` as a factor over `[var, parents...]`
    pub fn from_cpd(cpd: &TabularCpd) -> Self {
        let mut vars = vec![cpd.variable];
        vars.extend_from_slice(&cpd.parents);
        let mut cards = vec![cpd.cardinality()];
        cards.extend(cpd.parent_cardinalities());
        Factor {
            vars,
            cards,
            values: cpd.values.iter().copied().collect(),
        }
    }

    pub fn vars(&self) -> &[usize] {
        &self.vars
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn contains(&self, var: usize) -> bool {
        self.vars.contains(&var)
    }

    fn position(&self, var: usize) -> Option<usize> {
        self.vars.iter().position(|&v| v == var)
    }

    fn flat_index(&self, assignment: &[usize]) -> usize {
        assignment
            .iter()
            .zip(self.cards.iter())
            .fold(0, |index, (&state, &card)| index * card + state)
    }

    /// Decode a flat index into one state per variable
    fn assignment(&self, mut index: usize) -> Vec<usize> {
        let mut states = vec![0; self.cards.len()];
        for (slot, &card) in states.iter_mut().zip(self.cards.iter()).rev() {
            *slot = index % card;
            index /= card;
        }
        states
    }

    pub fn value(&self, assignment: &[usize]) -> f64 {
        self.values[self.flat_index(assignment)]
    }

    pub fn product(&self, other: &Factor) -> Factor {
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        for (&v, &c) in other.vars.iter().zip(other.cards.iter()) {
            if !vars.contains(&v) {
                vars.push(v);
                cards.push(c);
            }
        }

        let self_map: Vec<usize> = self.vars.iter().filter_map(|&v| vars.iter().position(|&u| u == v)).collect();
        let other_map: Vec<usize> = other.vars.iter().filter_map(|&v| vars.iter().position(|&u| u == v)).collect();

        let mut result = Factor { values: Vec::new(), vars, cards };
        let size: usize = result.cards.iter().product();
        result.values = (0..size)
            .map(|i| {
                let joint = result.assignment(i);
                let a: Vec<usize> = self_map.iter().map(|&p| joint[p]).collect();
                let b: Vec<usize> = other_map.iter().map(|&p| joint[p]).collect();
                self.value(&a) * other.value(&b)
            })
            .collect();
        result
    }

    /// Marginalise `var` out
    pub fn sum_out(&self, var: usize) -> Factor {
        let Some(pos) = self.position(var) else {
            return self.clone();
        };
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);

        let mut result = Factor { values: vec![0.0; cards.iter().product()], vars, cards };
        for (i, &value) in self.values.iter().enumerate() {
            let mut states = self.assignment(i);
            states.remove(pos);
            let j = result.flat_index(&states);
            result.values[j] += value;
        }
        result
    }

    /// Condition on `var = state`, dropping `var`
    pub fn reduce(&self, var: usize, state: usize) -> Factor {
        let Some(pos) = self.position(var) else {
            return self.clone();
        };
        let mut vars = self.vars.clone();
        let mut cards = self.cards.clone();
        vars.remove(pos);
        cards.remove(pos);

        let values = self
            .values
            .iter()
            .enumerate()
            .filter(|(i, _)| self.assignment(*i)[pos] == state)
            .map(|(_, &v)| v)
            .collect();
        Factor { vars, cards, values }
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Permute the variables into `order`, which must name exactly this factor's variables
    fn reordered(&self, order: &[usize]) -> Factor {
        let cards: Vec<usize> = order
            .iter()
            .filter_map(|&v| self.position(v).map(|p| self.cards[p]))
            .collect();
        let mut result = Factor { vars: order.to_vec(), cards, values: Vec::new() };
        let source_positions: Vec<usize> = self.vars.iter().filter_map(|&v| order.iter().position(|&u| u == v)).collect();
        let size: usize = result.cards.iter().product();
        result.values = (0..size)
            .map(|i| {
                let target = result.assignment(i);
                let source: Vec<usize> = source_positions.iter().map(|&p| target[p]).collect();
                self.value(&source)
            })
            .collect();
        result
    }
}

/// Normalised distribution over the queried variables
#[derive(Debug, Clone, PartialEq)]
pub struct Posterior {
    pub variables: Vec<String>,
    pub states: Vec<Vec<String>>,
    /// Joint probabilities, last variable fastest
    pub values: Vec<f64>,
}

impl Posterior {
    /// Probability of a joint assignment given by state labels, in `variables` order
    pub fn probability(&self, labels: &[&str]) -> Option<f64> {
        if labels.len() != self.variables.len() {
            return None;
        }
        let mut index = 0;
        for (label, states) in labels.iter().zip(self.states.iter()) {
            let state = states.iter().position(|s| s == label)?;
            index = index * states.len() + state;
        }
        self.values.get(index).copied()
    }

    /// Most probable joint assignment
    pub fn map_assignment(&self) -> Vec<&str> {
        let best = self
            .values
            .iter()
            .enumerate()
            .fold((0, f64::NEG_INFINITY), |(bi, bv), (i, &v)| if v > bv { (i, v) } else { (bi, bv) })
            .0;
        let mut index = best;
        let mut labels = vec![""; self.states.len()];
        for (slot, states) in labels.iter_mut().zip(self.states.iter()).rev() {
            *slot = states[index % states.len()].as_str();
            index /= states.len();
        }
        labels
    }
}

impl fmt::Display for Posterior {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let phi = format!("phi({})", self.variables.join(","));
        let rows: Vec<(Vec<String>, String)> = (0..self.values.len())
            .map(|i| {
                let mut index = i;
                let mut cells = vec![String::new(); self.variables.len()];
                for ((cell, states), name) in cells.iter_mut().zip(self.states.iter()).zip(self.variables.iter()).rev() {
                    *cell = format!("{}({})", name, states[index % states.len()]);
                    index /= states.len();
                }
                (cells, format!("{:.4}", self.values[i]))
            })
            .collect();

        let mut widths: Vec<usize> = self.variables.iter().map(String::len).collect();
        for (cells, _) in &rows {
            for (w, cell) in widths.iter_mut().zip(cells.iter()) {
                *w = (*w).max(cell.len());
            }
        }
        let value_width = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0).max(phi.len());
        let rule = |c: char| -> String {
            let mut line: String = widths.iter().map(|w| format!("+{}", c.to_string().repeat(w + 2))).collect();
            line.push_str(&format!("+{}+", c.to_string().repeat(value_width + 2)));
            line
        };

        writeln!(f, "{}", rule('-'))?;
        for (name, w) in self.variables.iter().zip(widths.iter()) {
            write!(f, "| {:<w$} ", name, w = w)?;
        }
        writeln!(f, "| {:>w$} |", phi, w = value_width)?;
        writeln!(f, "{}", rule('='))?;
        for (cells, value) in &rows {
            for (cell, w) in cells.iter().zip(widths.iter()) {
                write!(f, "| {:<w$} ", cell, w = w)?;
            }
            writeln!(f, "| {:>w$} |", value, w = value_width)?;
            writeln!(f, "{}", rule('-'))?;
        }
        Ok(())
    }
}

/// Variable elimination over a fitted network
pub struct VariableElimination<'a> {
    network: &'a BayesianNetwork,
}

impl<'a> VariableElimination<'a> {
    pub fn new(network: &'a BayesianNetwork) -> Self {
        VariableElimination { network }
    }

    fn resolve_var(&self, name: &str) -> Result<usize> {
        self.network
            .var_index(name)
            .ok_or_else(|| MlError::InferenceError(format!("unknown variable '{}'", name)))
    }

    /// Posterior over `variables` given `evidence` as `(variable, state)` labels
    pub fn query(&self, variables: &[&str], evidence: &[(&str, &str)]) -> Result<Posterior> {
        if variables.is_empty() {
            return Err(MlError::InferenceError("no query variables given".to_string()));
        }
        let query: Vec<usize> = variables.iter().map(|v| self.resolve_var(v)).collect::<Result<_>>()?;

        let mut observed: Vec<(usize, usize)> = Vec::with_capacity(evidence.len());
        for (name, label) in evidence {
            let var = self.resolve_var(name)?;
            let state = self.network.state_index(var, label).ok_or_else(|| {
                MlError::InferenceError(format!("unknown state '{}' for variable '{}'", label, name))
            })?;
            if query.contains(&var) {
                return Err(MlError::InferenceError(format!(
                    "'{}' is both a query and an evidence variable",
                    name
                )));
            }
            if observed.iter().any(|&(v, s)| v == var && s != state) {
                return Err(MlError::InferenceError(format!("conflicting evidence for '{}'", name)));
            }
            observed.push((var, state));
        }

        let mut factors: Vec<Factor> = self
            .network
            .cpds()
            .iter()
            .map(|cpd| {
                observed
                    .iter()
                    .fold(Factor::from_cpd(cpd), |factor, &(var, state)| factor.reduce(var, state))
            })
            .collect();

        let mut hidden: Vec<usize> = (0..self.network.dag().len())
            .filter(|v| !query.contains(v) && !observed.iter().any(|(o, _)| o == v))
            .collect();

        while !hidden.is_empty() {
            let (pick, var) = self.cheapest(&hidden, &factors);
            hidden.swap_remove(pick);

            let (touching, rest): (Vec<Factor>, Vec<Factor>) = factors.into_iter().partition(|f| f.contains(var));
            factors = rest;
            if let Some(joint) = touching.into_iter().reduce(|a, b| a.product(&b)) {
                factors.push(joint.sum_out(var));
            }
        }

        let joint = factors
            .into_iter()
            .reduce(|a, b| a.product(&b))
            .ok_or_else(|| MlError::InferenceError("network has no factors".to_string()))?
            .reordered(&query);

        let total = joint.total();
        if !(total > 0.0) {
            return Err(MlError::InferenceError("evidence has zero probability".to_string()));
        }

        Ok(Posterior {
            variables: variables.iter().map(|v| v.to_string()).collect(),
            states: query.iter().map(|&v| self.network.states(v).to_vec()).collect(),
            values: joint.values.iter().map(|v| v / total).collect(),
        })
    }

    /// Hidden variable whose elimination creates the smallest factor
    fn cheapest(&self, hidden: &[usize], factors: &[Factor]) -> (usize, usize) {
        let mut best = (0, hidden[0], usize::MAX);
        for (i, &var) in hidden.iter().enumerate() {
            let mut scope: Vec<usize> = Vec::new();
            for factor in factors.iter().filter(|f| f.contains(var)) {
                for &v in factor.vars() {
                    if v != var && !scope.contains(&v) {
                        scope.push(v);
                    }
                }
            }
            let size: usize = scope.iter().map(|&v| self.network.cardinality(v)).product();
            if size < best.2 {
                best = (i, var, size);
            }
        }
        (best.0, best.1)
    }
}

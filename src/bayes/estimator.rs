use super::cpd::{state_counts, TabularCpd};
use super::dag::Dag;
use crate::data::CategoricalTable;
use crate::error::{MlError, Result};

/// Fits one conditional probability table per node of a graph
pub trait ParameterEstimator {
    fn estimate_cpd(&self, data: &CategoricalTable, dag: &Dag, var: usize) -> Result<TabularCpd>;

    fn estimate_all(&self, data: &CategoricalTable, dag: &Dag) -> Result<Vec<TabularCpd>> {
        (0..dag.len()).map(|v| self.estimate_cpd(data, dag, v)).collect()
    }
}

fn parents_of(dag: &Dag, var: usize) -> Vec<usize> {
    dag.parents(var).iter().copied().collect()
}

/// Relative frequencies. Parent configurations absent from the data get a
/// uniform column.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaximumLikelihoodEstimator;

impl ParameterEstimator for MaximumLikelihoodEstimator {
    fn estimate_cpd(&self, data: &CategoricalTable, dag: &Dag, var: usize) -> Result<TabularCpd> {
        let parents = parents_of(dag, var);
        let counts = state_counts(data, var, &parents);
        TabularCpd::from_weights(data, var, &parents, counts)
    }
}

/// Dirichlet-smoothed counts with the BDeu prior: every cell receives the
/// pseudo-count `ess / (r * q)`, where `r` is the variable's cardinality and
/// `q` the number of parent configurations.
#[derive(Debug, Clone, Copy)]
pub struct BayesianEstimator {
    pub equivalent_sample_size: f64,
}

impl BayesianEstimator {
    pub fn bdeu(equivalent_sample_size: f64) -> Result<Self> {
        if !(equivalent_sample_size > 0.0) {
            return Err(MlError::invalid_parameter("equivalent_sample_size", "must be positive"));
        }
        Ok(BayesianEstimator { equivalent_sample_size })
    }
}

impl Default for BayesianEstimator {
    fn default() -> Self {
        BayesianEstimator { equivalent_sample_size: 5.0 }
    }
}

impl ParameterEstimator for BayesianEstimator {
    fn estimate_cpd(&self, data: &CategoricalTable, dag: &Dag, var: usize) -> Result<TabularCpd> {
        let parents = parents_of(dag, var);
        let counts = state_counts(data, var, &parents);
        let (r, q) = counts.dim();
        let pseudo_count = self.equivalent_sample_size / (r * q) as f64;
        TabularCpd::from_weights(data, var, &parents, counts + pseudo_count)
    }
}

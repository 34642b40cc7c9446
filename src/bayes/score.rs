use ndarray::Axis;

use super::cpd::state_counts;
use super::dag::Dag;
use crate::data::CategoricalTable;

/// A decomposable structure score: the score of a graph is the sum of each
/// node's local score given its parent set.
pub trait StructureScore {
    fn local_score(&self, var: usize, parents: &[usize]) -> f64;

    fn score(&self, dag: &Dag) -> f64 {
        (0..dag.len())
            .map(|v| {
                let parents: Vec<usize> = dag.parents(v).iter().copied().collect();
                self.local_score(v, &parents)
            })
            .sum()
    }
}

/// Bayesian Information Criterion:
/// `sum N_jk ln(N_jk / N_j) - 0.5 ln(N) (r - 1) q`
pub struct BicScore<'a> {
    data: &'a CategoricalTable,
}

impl<'a> BicScore<'a> {
    pub fn new(data: &'a CategoricalTable) -> Self {
        BicScore { data }
    }
}

impl StructureScore for BicScore<'_> {
    fn local_score(&self, var: usize, parents: &[usize]) -> f64 {
        let counts = state_counts(self.data, var, parents);
        let column_totals = counts.sum_axis(Axis(0));

        let mut log_likelihood = 0.0;
        for ((_, column), &n_jk) in counts.indexed_iter() {
            if n_jk > 0.0 {
                log_likelihood += n_jk * (n_jk / column_totals[column]).ln();
            }
        }

        let sample_size = self.data.n_rows().max(1) as f64;
        let var_card = self.data.cardinality(var) as f64;
        let parent_configs: usize = parents.iter().map(|&p| self.data.cardinality(p)).product();

        log_likelihood - 0.5 * sample_size.ln() * parent_configs as f64 * (var_card - 1.0)
    }
}

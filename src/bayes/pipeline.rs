//! The two diagnosis workflows: a structure learned from data, and an
//! expert star structure with smoothed parameters.

use serde::{Serialize, Deserialize};

use super::dag::Dag;
use super::estimator::{BayesianEstimator, MaximumLikelihoodEstimator};
use super::inference::{Posterior, VariableElimination};
use super::model::BayesianNetwork;
use super::score::BicScore;
use super::search::{HillClimbSearch, SearchConfig};
use crate::data::tabular::{FEATURES, TARGET};
use crate::data::CategoricalTable;
use crate::error::{MlError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesConfig {
    pub search: SearchConfig,
    /// BDeu equivalent sample size for the expert network
    pub equivalent_sample_size: f64,
    /// Rows to diagnose with the expert network
    pub diagnose_rows: usize,
}

impl Default for BayesConfig {
    fn default() -> Self {
        BayesConfig {
            search: SearchConfig::default(),
            equivalent_sample_size: 5.0,
            diagnose_rows: 10,
        }
    }
}

/// Hill-climb a BIC-optimal structure from the empty graph, then fit it by
/// maximum likelihood.
pub fn learn_structure(data: &CategoricalTable, search: &SearchConfig) -> Result<BayesianNetwork> {
    let score = BicScore::new(data);
    let dag = HillClimbSearch::new(&score, search.clone()).estimate(Dag::empty(data.names()))?;
    tracing::info!(edges = dag.edge_count(), "structure search finished");
    BayesianNetwork::fit(dag, data, &MaximumLikelihoodEstimator)
}

/// Every feature points at the diagnosis
pub fn expert_structure(data: &CategoricalTable) -> Result<Dag> {
    let edges: Vec<(&str, &str)> = FEATURES.iter().map(|&f| (f, TARGET)).collect();
    Dag::from_edges(data.names(), &edges)
}

pub fn expert_network(data: &CategoricalTable, equivalent_sample_size: f64) -> Result<BayesianNetwork> {
    let dag = expert_structure(data)?;
    BayesianNetwork::fit(dag, data, &BayesianEstimator::bdeu(equivalent_sample_size)?)
}

/// One diagnosed row
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub row: usize,
    pub evidence: Vec<(String, String)>,
    pub actual: String,
    pub posterior: Posterior,
}

/// Posterior over the diagnosis for the first `limit` rows, using the row's
/// features as evidence
pub fn diagnose_rows(network: &BayesianNetwork, data: &CategoricalTable, limit: usize) -> Result<Vec<Diagnosis>> {
    let target = data
        .var_index(TARGET)
        .ok_or_else(|| MlError::InferenceError(format!("data has no '{}' column", TARGET)))?;
    let features: Vec<usize> = FEATURES
        .iter()
        .map(|f| data.var_index(f).ok_or_else(|| MlError::InferenceError(format!("data has no '{}' column", f))))
        .collect::<Result<_>>()?;

    let inference = VariableElimination::new(network);
    (0..limit.min(data.n_rows()))
        .map(|row| {
            let evidence: Vec<(String, String)> = features
                .iter()
                .map(|&f| (data.names()[f].clone(), data.label(row, f).to_string()))
                .collect();
            let borrowed: Vec<(&str, &str)> = evidence.iter().map(|(n, s)| (n.as_str(), s.as_str())).collect();
            let posterior = inference.query(&[TARGET], &borrowed)?;
            Ok(Diagnosis {
                row,
                actual: data.label(row, target).to_string(),
                evidence,
                posterior,
            })
        })
        .collect()
}

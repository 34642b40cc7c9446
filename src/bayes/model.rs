use super::cpd::TabularCpd;
use super::dag::Dag;
use super::estimator::ParameterEstimator;
use crate::data::CategoricalTable;
use crate::error::{MlError, Result};

/// A DAG with one fitted CPD per node
#[derive(Debug, Clone)]
pub struct BayesianNetwork {
    dag: Dag,
    cpds: Vec<TabularCpd>,
}

impl BayesianNetwork {
    /// Fit every node's CPD from `data`. The graph's nodes must be the
    /// table's columns, in the same order.
    pub fn fit(dag: Dag, data: &CategoricalTable, estimator: &dyn ParameterEstimator) -> Result<Self> {
        if dag.nodes() != data.names() {
            return Err(MlError::invalid_parameter(
                "dag",
                format!("nodes {:?} do not match data columns {:?}", dag.nodes(), data.names()),
            ));
        }
        let cpds = estimator.estimate_all(data, &dag)?;
        let network = BayesianNetwork { dag, cpds };
        network.check_model()?;
        Ok(network)
    }

    /// Every CPD belongs to its node, lists the node's parents, and has columns summing to one
    pub fn check_model(&self) -> Result<()> {
        for (var, cpd) in self.cpds.iter().enumerate() {
            let parents: Vec<usize> = self.dag.parents(var).iter().copied().collect();
            if cpd.variable != var || cpd.parents != parents {
                return Err(MlError::invalid_parameter(
                    "cpd",
                    format!("CPD of {} does not match the graph", cpd.variable_name),
                ));
            }
            if cpd.normalization_error() > 1e-6 {
                return Err(MlError::invalid_parameter(
                    "cpd",
                    format!("CPD of {} is not normalised", cpd.variable_name),
                ));
            }
        }
        Ok(())
    }

    pub fn dag(&self) -> &Dag {
        &self.dag
    }

    pub fn cpds(&self) -> &[TabularCpd] {
        &self.cpds
    }

    pub fn cpd(&self, var: usize) -> &TabularCpd {
        &self.cpds[var]
    }

    pub fn var_index(&self, name: &str) -> Option<usize> {
        self.dag.node_index(name)
    }

    pub fn states(&self, var: usize) -> &[String] {
        &self.cpds[var].states
    }

    pub fn cardinality(&self, var: usize) -> usize {
        self.cpds[var].cardinality()
    }

    pub fn state_index(&self, var: usize, label: &str) -> Option<usize> {
        self.cpds[var].states.iter().position(|s| s == label)
    }
}

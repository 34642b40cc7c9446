//! # Bayesian Networks
//!
//! Discrete Bayesian networks over a [`CategoricalTable`](crate::data::CategoricalTable).
//!
//! ## Components
//!
//! - [`Dag`]: acyclic graph over named variables
//! - [`BicScore`] and [`HillClimbSearch`]: score-based structure learning
//!   with add, remove and reverse moves and a tabu list
//! - [`MaximumLikelihoodEstimator`] and [`BayesianEstimator`] (BDeu prior)
//!   for the conditional probability tables
//! - [`VariableElimination`]: exact posterior queries under evidence
//!
//! ## Example
//!
//! ```rust
//! use mlcourse::bayes::{Dag, BayesianNetwork, BayesianEstimator, VariableElimination};
//! use mlcourse::data::CategoricalTable;
//!
//! let rows = vec![
//!     vec!["1", "1"], vec!["1", "1"], vec!["0", "0"], vec!["0", "1"],
//! ];
//! let data = CategoricalTable::from_records(&["marker", "diagnosis"], &rows).unwrap();
//! let dag = Dag::from_edges(data.names(), &[("marker", "diagnosis")]).unwrap();
//! let network = BayesianNetwork::fit(dag, &data, &BayesianEstimator::default()).unwrap();
//!
//! let posterior = VariableElimination::new(&network)
//!     .query(&["diagnosis"], &[("marker", "1")])
//!     .unwrap();
//! let total: f64 = posterior.values.iter().sum();
//! assert!((total - 1.0).abs() < 1e-9);
//! ```

pub mod cpd;
pub mod dag;
pub mod estimator;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod score;
pub mod search;

pub use cpd::{state_counts, TabularCpd};
pub use dag::Dag;
pub use estimator::{BayesianEstimator, MaximumLikelihoodEstimator, ParameterEstimator};
pub use inference::{Factor, Posterior, VariableElimination};
pub use model::BayesianNetwork;
pub use pipeline::{BayesConfig, Diagnosis};
pub use score::{BicScore, StructureScore};
pub use search::{HillClimbSearch, Operation, SearchConfig};

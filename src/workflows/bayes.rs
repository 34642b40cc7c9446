use std::path::Path;

use super::artifact;
use crate::bayes::pipeline::{self, BayesConfig};
use crate::bayes::BayesianNetwork;
use crate::data::CategoricalTable;
use crate::error::Result;
use crate::visualization::draw_dag;

fn draw(network: &BayesianNetwork, title: &str, path: &Path) -> Result<()> {
    draw_dag(network.dag().nodes(), &network.dag().edges(), title, path)?;
    println!("DAG saved to '{}'", path.display());
    Ok(())
}

/// Structure learning on the raw table, then the expert network with its
/// CPDs and per-row diagnoses.
pub fn run(data_path: &Path, output_dir: &Path, config: &BayesConfig) -> Result<()> {
    let data = CategoricalTable::read_csv(data_path)?;
    let (rows, cols) = data.shape();
    println!("Shape: ({}, {})", rows, cols);
    println!("\nFirst few rows:\n{}", data);

    // Exploratory pipeline
    let learned = pipeline::learn_structure(&data, &config.search)?;
    println!("Self-learned model structure:");
    println!("Edges: {}\n", learned.dag());
    draw(&learned, "Self-Learned DAG", &artifact(output_dir, "dag_selflearned.png")?)?;

    // Expert pipeline
    let expert = pipeline::expert_network(&data, config.equivalent_sample_size)?;
    println!("\nCorrected edges: {}\n", expert.dag());
    println!("Model fitted using Bayesian estimation (BDeu, equivalent sample size {})\n", config.equivalent_sample_size);

    println!("CONDITIONAL PROBABILITY DISTRIBUTIONS");
    for cpd in expert.cpds() {
        println!("\nCPD of {}:", cpd.variable_name);
        print!("{}", cpd);
    }

    println!("\nDIAGNOSIS PROBABILITIES FOR {} SAMPLES", config.diagnose_rows.min(data.n_rows()));
    for diagnosis in pipeline::diagnose_rows(&expert, &data, config.diagnose_rows)? {
        let evidence: Vec<String> = diagnosis
            .evidence
            .iter()
            .map(|(name, state)| format!("'{}': {}", name, state))
            .collect();
        println!("\nSample {}:", diagnosis.row + 1);
        println!("Evidence: {{{}}}", evidence.join(", "));
        println!("Actual diagnosis: {}", diagnosis.actual);
        print!("Predicted probabilities:\n{}", diagnosis.posterior);
    }

    draw(&expert, "Final Corrected DAG - All Features Point to Diagnosis", &artifact(output_dir, "dag_final.png")?)?;
    Ok(())
}

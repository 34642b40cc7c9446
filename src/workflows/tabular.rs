use std::path::Path;

use rand::rngs::StdRng;
use rand::SeedableRng;

use super::artifact;
use crate::data::{train_test_split, NumericTable};
use crate::error::{MlError, Result};
use crate::models::tabular::{TabularClassifier, TabularConfig, PROBES};
use crate::visualization::plot_epoch_times;

pub const CHART_FILE: &str = "neural_network_speed_test.png";

/// Clean the table, train with per-epoch timing, report accuracy, probe
/// predictions and timing statistics, and chart the epoch times.
pub fn run(data_path: &Path, output_dir: &Path, config: &TabularConfig) -> Result<()> {
    let table = NumericTable::read_csv(data_path)?;
    println!("Dataset loaded successfully!");
    println!("Shape after cleaning: ({}, {})", table.n_rows(), table.features.ncols() + 1);
    println!("Rows dropped: {}", table.dropped);
    for (value, count) in table.target_counts() {
        println!("diagnosis {}: {}", value, count);
    }
    if table.n_rows() < 2 {
        return Err(MlError::TrainingError("need at least two clean rows".to_string()));
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let (train_idx, test_idx) = train_test_split(table.n_rows(), config.test_fraction, &mut rng);
    let (x_train, y_train) = table.select(&train_idx);
    let (x_test, y_test) = table.select(&test_idx);
    println!("\nTraining samples: {}", train_idx.len());
    println!("Testing samples: {}\n", test_idx.len());

    let mut model = TabularClassifier::new(x_train.ncols(), config, &mut rng)?;
    println!("SPEED TEST - Training for {} epochs\n", config.epochs);
    let report = model.train_timed(x_train.view(), y_train.view(), config.epochs, config.log_every)?;

    println!("\nAverage time per epoch: {:.4}s", report.stats.mean);
    println!("Total training time: {:.4}s\n", report.total_time());

    if !test_idx.is_empty() {
        let accuracy = model.accuracy(x_test.view(), y_test.view(), config.threshold);
        println!("MODEL ACCURACY");
        println!("Accuracy Score: {:.4} ({:.2}%)\n", accuracy, accuracy * 100.0);
    }

    println!("DIAGNOSIS PREDICTIONS\n");
    for (i, (probe, description)) in PROBES.iter().enumerate() {
        let probability = model.predict_one(probe)?;
        let verdict = if probability >= config.threshold { "POSITIVE" } else { "NEGATIVE" };
        println!("Case {}: {:?} - {}", i + 1, probe, description);
        println!("  Probability: {:.4} ({:.2}%)", probability, probability * 100.0);
        println!("  Diagnosis: {} for skin cancer\n", verdict);
    }

    let chart = artifact(output_dir, CHART_FILE)?;
    plot_epoch_times(&report.epoch_times, &chart)?;
    println!("Speed test plot saved to '{}'\n", chart.display());

    println!("SPEED TEST STATISTICS");
    println!("{}", report.summary());
    Ok(())
}

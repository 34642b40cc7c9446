use std::path::Path;

use super::artifact;
use crate::error::Result;
use crate::metrics::history::{LOSS, VAL_LOSS};
use crate::metrics::History;
use crate::visualization::{history_summary, plot_history, plot_history_metric};

/// Load each history file and chart its training and validation loss
pub fn run(histories: &[&Path], output_dir: &Path) -> Result<()> {
    for path in histories {
        let history = History::load(path)?;
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("history");
        let title = format!("Loss ({}, {} epochs)", stem, history.epochs());

        let chart = artifact(output_dir, &format!("{}_loss.png", stem))?;
        plot_history(&history, &[LOSS, VAL_LOSS], &title, &chart)?;

        println!("{}", history_summary(&history));
        println!("{}", plot_history_metric(&history, LOSS, 60, 12));
        println!("{}", plot_history_metric(&history, VAL_LOSS, 60, 12));
        println!("Chart saved to {}\n", chart.display());
    }
    Ok(())
}

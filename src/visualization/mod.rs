//! # Visualization
//!
//! ASCII plots for the terminal and PNG charts for files.

pub mod charts;
pub mod text_plots;

pub use charts::{circular_layout, draw_dag, gray, plot_epoch_times, plot_history, plot_samples};
pub use text_plots::{history_summary, plot_history_metric, plot_series, render_image, render_samples, training_progress};

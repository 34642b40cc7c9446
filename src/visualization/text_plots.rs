use ndarray::{ArrayView1, ArrayView2, ArrayView3, Axis};

use crate::metrics::History;

/// ASCII chart of one history metric
pub fn plot_history_metric(history: &History, metric: &str, width: usize, height: usize) -> String {
    match history.get(metric) {
        Some(values) if !values.is_empty() => plot_series(values, metric, width, height),
        _ => format!("No {} data available", metric),
    }
}

/// Generic series plotter
pub fn plot_series(values: &[f32], title: &str, width: usize, height: usize) -> String {
    if values.is_empty() || width < 10 || height < 5 {
        return format!("{}: Invalid data or dimensions", title);
    }

    let min_val = values.iter().copied().fold(f32::INFINITY, f32::min);
    let max_val = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);

    if (max_val - min_val).abs() < f32::EPSILON {
        return format!("{}: All values are {:.4}", title, min_val);
    }

    let mut plot = vec![vec![' '; width]; height];

    // Axes
    for row in plot.iter_mut() {
        row[0] = '|';
    }
    for cell in plot[height - 1].iter_mut() {
        *cell = '-';
    }
    plot[height - 1][0] = '+';

    let x_scale = (values.len().max(2) - 1) as f32 / (width - 3) as f32;
    let y_scale = (height - 3) as f32 / (max_val - min_val);

    for (i, &value) in values.iter().enumerate() {
        let x = ((i as f32 / x_scale) as usize + 2).min(width - 1);
        let y = (height - 3).saturating_sub(((value - min_val) * y_scale) as usize).min(height - 2);
        plot[y][x] = '*';
    }

    let mut output = format!("{}\n", title);
    output.push_str(&format!("Max: {:.4}\n", max_val));

    for row in plot.iter() {
        output.push_str(&row.iter().collect::<String>());
        output.push('\n');
    }

    output.push_str(&format!("Min: {:.4}\n", min_val));
    output.push_str(&format!("Points: {}\n", values.len()));

    output
}

/// Final-epoch value of every metric in the history
pub fn history_summary(history: &History) -> String {
    let mut output = String::new();
    output.push_str(&format!("Training History ({} epochs)\n", history.epochs()));
    output.push_str("==========================\n");
    for name in history.metric_names() {
        if let Some(last) = history.last(name) {
            output.push_str(&format!("{:<14} {:.4}\n", name, last));
        }
    }
    output
}

/// Progress bar line for long-running loops
pub fn training_progress(step: usize, total: usize, loss: f32, accuracy: f32) -> String {
    let progress = if total == 0 { 1.0 } else { step as f32 / total as f32 };
    let bar_length = 30;
    let filled = ((progress * bar_length as f32) as usize).min(bar_length);
    let bar = format!("[{}{}]", "=".repeat(filled), " ".repeat(bar_length - filled));

    format!(
        "{}/{} {} {:.1}% | loss: {:.4} | accuracy: {:.4}",
        step, total, bar, progress * 100.0, loss, accuracy
    )
}

/// Grey-scale image in `[0, 1]` as ASCII shades, one character per pixel
pub fn render_image(image: ArrayView2<f32>) -> String {
    const SHADES: [char; 5] = [' ', '.', ':', '#', '@'];
    let mut output = String::with_capacity(image.len() + image.nrows());
    for row in image.rows() {
        for &pixel in row {
            let level = (pixel.clamp(0.0, 1.0) * (SHADES.len() - 1) as f32).round() as usize;
            output.push(SHADES[level]);
        }
        output.push('\n');
    }
    output
}

/// The first `count` images, each under a `Label: n` header
pub fn render_samples(images: ArrayView3<f32>, labels: ArrayView1<u8>, count: usize) -> String {
    let count = count.min(images.len_of(Axis(0))).min(labels.len());
    let mut output = String::new();
    for i in 0..count {
        output.push_str(&format!("Label: {}\n", labels[i]));
        output.push_str(&render_image(images.index_axis(Axis(0), i)));
    }
    output
}

//! PNG charts rendered with `plotters`.

use std::path::Path;

use ndarray::{ArrayView1, ArrayView3, Axis};
use plotters::prelude::*;

use crate::error::{MlError, Result};
use crate::metrics::History;

const CHART_SIZE: (u32, u32) = (1000, 600);

fn value_range<'a, I: IntoIterator<Item = &'a f32>>(values: I) -> (f32, f32) {
    let (lo, hi) = values
        .into_iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() || !hi.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((hi - lo) * 0.05).max(1e-3);
    (lo - pad, hi + pad)
}

/// Line chart of the named history series against epoch number.
/// Series absent from the history are skipped.
pub fn plot_history<P: AsRef<Path>>(history: &History, metrics: &[&str], title: &str, path: P) -> Result<()> {
    let present: Vec<(&str, &[f32])> = metrics
        .iter()
        .filter_map(|&name| history.get(name).map(|values| (name, values)))
        .filter(|(_, values)| !values.is_empty())
        .collect();
    if present.is_empty() {
        return Err(MlError::PlotError(format!("none of {:?} present in history", metrics)));
    }

    let epochs = history.epochs().max(2) as f32;
    let (y_min, y_max) = value_range(present.iter().flat_map(|(_, v)| v.iter()));

    let root = BitMapBackend::new(path.as_ref(), CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(MlError::plot)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(1f32..epochs, y_min..y_max)
        .map_err(MlError::plot)?;

    chart
        .configure_mesh()
        .x_desc("epoch")
        .y_desc(metrics.first().copied().unwrap_or("value"))
        .draw()
        .map_err(MlError::plot)?;

    let palette = [BLUE, RED, GREEN, MAGENTA];
    for (i, (name, values)) in present.iter().enumerate() {
        let color = palette[i % palette.len()];
        let points = values.iter().enumerate().map(|(epoch, &v)| ((epoch + 1) as f32, v));
        chart
            .draw_series(LineSeries::new(points, color.stroke_width(2)))
            .map_err(MlError::plot)?
            .label(*name)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color));
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()
        .map_err(MlError::plot)?;

    root.present().map_err(MlError::plot)?;
    tracing::debug!(path = %path.as_ref().display(), "history chart written");
    Ok(())
}

/// Two panels: per-epoch time as a line (left) and as bars (right)
pub fn plot_epoch_times<P: AsRef<Path>>(times_secs: &[f32], path: P) -> Result<()> {
    if times_secs.is_empty() {
        return Err(MlError::PlotError("no epoch timings to plot".to_string()));
    }
    let n = times_secs.len() as f32;
    let y_max = times_secs.iter().copied().fold(0.0f32, f32::max).max(1e-6) * 1.1;

    let root = BitMapBackend::new(path.as_ref(), (1400, 600)).into_drawing_area();
    root.fill(&WHITE).map_err(MlError::plot)?;
    let (left, right) = root.split_horizontally(700);

    let mut line = ChartBuilder::on(&left)
        .caption("Training time per epoch", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(1f32..n.max(2.0), 0f32..y_max)
        .map_err(MlError::plot)?;
    line.configure_mesh()
        .x_desc("epoch")
        .y_desc("seconds")
        .draw()
        .map_err(MlError::plot)?;
    line.draw_series(LineSeries::new(
        times_secs.iter().enumerate().map(|(i, &t)| ((i + 1) as f32, t)),
        BLUE.stroke_width(2),
    ))
    .map_err(MlError::plot)?;
    line.draw_series(
        times_secs
            .iter()
            .enumerate()
            .map(|(i, &t)| Circle::new(((i + 1) as f32, t), 3, BLUE.filled())),
    )
    .map_err(MlError::plot)?;

    let mut bars = ChartBuilder::on(&right)
        .caption("Epoch time distribution", ("sans-serif", 24))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(0.5f32..n + 0.5, 0f32..y_max)
        .map_err(MlError::plot)?;
    bars.configure_mesh()
        .x_desc("epoch")
        .y_desc("seconds")
        .draw()
        .map_err(MlError::plot)?;
    bars.draw_series(times_secs.iter().enumerate().map(|(i, &t)| {
        let x = (i + 1) as f32;
        Rectangle::new([(x - 0.35, 0.0), (x + 0.35, t)], GREEN.mix(0.7).filled())
    }))
    .map_err(MlError::plot)?;

    root.present().map_err(MlError::plot)?;
    Ok(())
}

/// Grey shade of a pixel intensity in `[0, 1]`
pub fn gray(pixel: f32) -> RGBColor {
    let level = (pixel.clamp(0.0, 1.0) * 255.0).round() as u8;
    RGBColor(level, level, level)
}

/// The first `count` images side by side, each titled with its label
pub fn plot_samples<P: AsRef<Path>>(
    images: ArrayView3<f32>,
    labels: ArrayView1<u8>,
    count: usize,
    path: P,
) -> Result<()> {
    const PANEL: i32 = 200;
    const TITLE: i32 = 40;

    let count = count.min(images.len_of(Axis(0)));
    if count == 0 {
        return Err(MlError::PlotError("no images to preview".to_string()));
    }
    if labels.len() < count {
        return Err(MlError::dimension_mismatch(
            format!("at least {} labels", count),
            format!("{}", labels.len()),
        ));
    }

    let (rows, cols) = (images.len_of(Axis(1)), images.len_of(Axis(2)));
    let cell = ((PANEL - 20) / rows.max(cols).max(1) as i32).max(1);

    let size = ((PANEL * count as i32) as u32, (PANEL + TITLE) as u32);
    let root = BitMapBackend::new(path.as_ref(), size).into_drawing_area();
    root.fill(&WHITE).map_err(MlError::plot)?;

    for (i, panel) in root.split_evenly((1, count)).iter().enumerate() {
        let (title_area, image_area) = panel.split_vertically(TITLE);
        title_area
            .draw(&Text::new(labels[i].to_string(), (PANEL / 2 - 6, 8), ("sans-serif", 24).into_font()))
            .map_err(MlError::plot)?;

        for ((r, c), &pixel) in images.index_axis(Axis(0), i).indexed_iter() {
            let (x, y) = (10 + c as i32 * cell, r as i32 * cell);
            image_area
                .draw(&Rectangle::new([(x, y), (x + cell, y + cell)], gray(pixel).filled()))
                .map_err(MlError::plot)?;
        }
    }

    root.present().map_err(MlError::plot)?;
    tracing::debug!(path = %path.as_ref().display(), count, "sample preview written");
    Ok(())
}

/// Node positions on a circle inside a `size` canvas
pub fn circular_layout(count: usize, size: (u32, u32)) -> Vec<(i32, i32)> {
    let (w, h) = (size.0 as f64, size.1 as f64);
    let radius = w.min(h) * 0.35;
    let (cx, cy) = (w / 2.0, h / 2.0);
    (0..count)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / count.max(1) as f64 - std::f64::consts::FRAC_PI_2;
            ((cx + radius * angle.cos()) as i32, (cy + radius * angle.sin()) as i32)
        })
        .collect()
}

/// Directed graph drawing: labelled nodes on a circle, arrows for edges `(from, to)`
pub fn draw_dag<P: AsRef<Path>>(nodes: &[String], edges: &[(usize, usize)], title: &str, path: P) -> Result<()> {
    const SIZE: (u32, u32) = (800, 800);
    const NODE_RADIUS: i32 = 45;

    let root = BitMapBackend::new(path.as_ref(), SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(MlError::plot)?;
    root.draw(&Text::new(title.to_string(), (20, 20), ("sans-serif", 28).into_font()))
        .map_err(MlError::plot)?;

    let positions = circular_layout(nodes.len(), SIZE);

    for &(from, to) in edges {
        let (Some(&(x0, y0)), Some(&(x1, y1))) = (positions.get(from), positions.get(to)) else {
            return Err(MlError::PlotError(format!("edge ({}, {}) references a missing node", from, to)));
        };
        let (dx, dy) = ((x1 - x0) as f64, (y1 - y0) as f64);
        let len = (dx * dx + dy * dy).sqrt().max(1.0);
        let (ux, uy) = (dx / len, dy / len);
        let r = NODE_RADIUS as f64;
        let start = ((x0 as f64 + ux * r) as i32, (y0 as f64 + uy * r) as i32);
        let tip = (x1 as f64 - ux * r, y1 as f64 - uy * r);
        let end = (tip.0 as i32, tip.1 as i32);

        root.draw(&PathElement::new(vec![start, end], BLACK.stroke_width(2)))
            .map_err(MlError::plot)?;

        // Arrowhead
        let head = 16.0;
        for side in [-0.45f64, 0.45] {
            let (s, c) = side.sin_cos();
            let bx = -(ux * c - uy * s) * head;
            let by = -(ux * s + uy * c) * head;
            let wing = ((tip.0 + bx) as i32, (tip.1 + by) as i32);
            root.draw(&PathElement::new(vec![end, wing], BLACK.stroke_width(2)))
                .map_err(MlError::plot)?;
        }
    }

    for (name, &(x, y)) in nodes.iter().zip(positions.iter()) {
        root.draw(&Circle::new((x, y), NODE_RADIUS, RGBColor(173, 216, 230).filled()))
            .map_err(MlError::plot)?;
        root.draw(&Circle::new((x, y), NODE_RADIUS, BLACK.stroke_width(1)))
            .map_err(MlError::plot)?;
        let label_x = x - (name.len() as i32 * 4);
        root.draw(&Text::new(name.clone(), (label_x, y - 7), ("sans-serif", 16).into_font()))
            .map_err(MlError::plot)?;
    }

    root.present().map_err(MlError::plot)?;
    tracing::debug!(path = %path.as_ref().display(), edges = edges.len(), "graph drawing written");
    Ok(())
}

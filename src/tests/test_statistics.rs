use ndarray::{array, Array1, Array3};
use crate::metrics::{accuracy, binary_accuracy, median, MetricsTracker, Statistics};
use crate::models::tabular::{TabularClassifier, TabularConfig, TimingReport};
use crate::error::MlError;
use crate::visualization::{circular_layout, gray, plot_samples, render_image, render_samples};
use rand::rngs::StdRng;
use rand::SeedableRng;

#[test]
fn test_statistics_values() {
    let stats = Statistics::from_slice(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
    assert!((stats.mean - 5.0).abs() < 1e-6);
    assert!((stats.std - 2.0).abs() < 1e-6);
    assert!((stats.median - 4.5).abs() < 1e-6);
    assert_eq!((stats.min, stats.argmin), (2.0, 0));
    assert_eq!((stats.max, stats.argmax), (9.0, 7));
    assert_eq!(stats.count, 8);
    assert!(Statistics::from_slice(&[]).is_none());
}

#[test]
fn test_median_odd_and_first_extremes() {
    assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
    let stats = Statistics::from_slice(&[1.0, 3.0, 1.0, 3.0]).unwrap();
    assert_eq!(stats.argmin, 0);
    assert_eq!(stats.argmax, 1);
}

#[test]
fn test_timing_report_summary() {
    let epoch_times = vec![0.2, 0.1, 0.3];
    let report = TimingReport {
        stats: Statistics::from_slice(&epoch_times).unwrap(),
        losses: vec![0.7, 0.6, 0.5],
        epoch_times,
    };
    assert!((report.total_time() - 0.6).abs() < 1e-6);
    let summary = report.summary();
    assert!(summary.contains("Minimum time: 0.1000s (Epoch 2)"));
    assert!(summary.contains("Maximum time: 0.3000s (Epoch 3)"));
}

#[test]
fn test_tabular_classifier_timed_training() {
    let mut rng = StdRng::seed_from_u64(21);
    let config = TabularConfig { epochs: 5, log_every: 0, ..TabularConfig::default() };
    let mut model = TabularClassifier::new(4, &config, &mut rng).unwrap();

    let features = array![[1.0, 1.0, 1.0, 1.0], [0.0, 0.0, 0.0, 0.0], [1.0, 0.0, 1.0, 0.0]];
    let targets = array![1.0, 0.0, 1.0];
    let report = model.train_timed(features.view(), targets.view(), config.epochs, config.log_every).unwrap();
    assert_eq!(report.epoch_times.len(), 5);
    assert_eq!(report.losses.len(), 5);
    assert!(report.epoch_times.iter().all(|&t| t >= 0.0));

    let p = model.predict_one(&[1.0, 1.0, 1.0, 1.0]).unwrap();
    assert!((0.0..=1.0).contains(&p));
    assert!(model.predict_one(&[1.0, 1.0]).is_err());
    assert!(model.train_timed(features.view(), targets.view(), 0, 0).is_err());
}

#[test]
fn test_accuracy_helpers() {
    let probabilities = array![[0.7, 0.3], [0.2, 0.8], [0.6, 0.4]];
    let labels = array![0u8, 1, 1];
    assert!((accuracy(probabilities.view(), labels.view()) - 2.0 / 3.0).abs() < 1e-6);

    let outputs = array![0.9, 0.4, 0.5];
    let targets = array![1.0, 0.0, 0.0];
    assert!((binary_accuracy(outputs.view(), targets.view(), 0.5) - 2.0 / 3.0).abs() < 1e-6);
}

#[test]
fn test_metrics_tracker_windows() {
    let mut tracker = MetricsTracker::new(3);
    for (i, reward) in [10.0, 20.0, 30.0, 40.0].iter().enumerate() {
        tracker.record_episode(*reward, i + 1);
    }
    // Bounded to the last three episodes
    assert_eq!(tracker.metrics().episode_rewards.len(), 3);
    assert_eq!(tracker.episode_count(), 4);
    assert_eq!(tracker.total_steps(), 10);
    assert_eq!(tracker.avg_episode_reward(2), Some(35.0));
    assert_eq!(tracker.max_episode_reward(10), Some(40.0));
    assert_eq!(tracker.avg_loss(5), None);

    tracker.record_loss(0.5);
    tracker.record_loss(1.5);
    assert_eq!(tracker.avg_loss(5), Some(1.0));
}

#[test]
fn test_circular_layout_and_image_render() {
    let points = circular_layout(4, (400, 400));
    assert_eq!(points.len(), 4);
    let distinct: std::collections::HashSet<_> = points.iter().collect();
    assert_eq!(distinct.len(), 4);

    let image = array![[0.0, 1.0], [0.5, 0.0]];
    assert_eq!(render_image(image.view()), " @\n: \n");
}

#[test]
fn test_render_samples_heads_each_image_with_its_label() {
    let images = Array3::from_shape_fn((7, 2, 2), |(n, i, j)| if n % 2 == 0 && i == j { 1.0 } else { 0.0 });
    let labels = Array1::from_iter(0..7u8);

    let text = render_samples(images.view(), labels.view(), 5);
    assert_eq!(text.matches("Label: ").count(), 5);
    assert!(text.starts_with("Label: 0\n@ \n @\nLabel: 1\n  \n  \n"));
    assert!(text.contains("Label: 4"));
    assert!(!text.contains("Label: 5"));

    // Fewer images than requested
    let short = render_samples(images.slice(ndarray::s![..2, .., ..]), labels.view(), 5);
    assert_eq!(short.matches("Label: ").count(), 2);
}

#[test]
fn test_gray_maps_intensity_to_shade() {
    assert_eq!(gray(0.0), plotters::style::RGBColor(0, 0, 0));
    assert_eq!(gray(1.0), plotters::style::RGBColor(255, 255, 255));
    assert_eq!(gray(2.0), gray(1.0));
    assert_eq!(gray(0.5).0, 128);
}

#[test]
fn test_plot_samples_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("first_five.png");

    let empty = Array3::<f32>::zeros((0, 4, 4));
    assert!(matches!(
        plot_samples(empty.view(), Array1::<u8>::zeros(0).view(), 5, &path),
        Err(MlError::PlotError(_))
    ));

    let images = Array3::<f32>::zeros((5, 4, 4));
    assert!(matches!(
        plot_samples(images.view(), Array1::<u8>::zeros(3).view(), 5, &path),
        Err(MlError::DimensionMismatch { .. })
    ));
    assert!(!path.exists());
}

use std::fs::File;

use mlcourse::agent::trainer::{self, DqnConfig};
use mlcourse::agent::DqnAgent;
use mlcourse::bayes::pipeline;
use mlcourse::data::{load_image_npz, CategoricalTable, NumericTable};
use mlcourse::env::{CartPole, EnvSession, RenderMode};
use mlcourse::metrics::History;
use mlcourse::models::rnn::{self, RnnClassifier, RnnConfig};
use mlcourse::models::tabular::{TabularClassifier, TabularConfig};
use ndarray::{Array1, Array3};
use ndarray_npy::NpzWriter;
use rand::rngs::StdRng;
use rand::SeedableRng;

const LESION_CSV: &str = "\
1,1,1,1,1
1,1,0,1,1
0,0,0,0,0
0,1,0,0,0
1,0,1,1,1
0,0,1,0,0
1,1,1,0,1
0,0,0,1,0
1,0,0,0,0
0,1,1,1,1
1,1,?,1,1
0,0,0,0,0
";

#[test]
fn test_rnn_pipeline_on_tiny_images() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("digits.npz");
    {
        let mut npz = NpzWriter::new(File::create(&path).unwrap());
        let images = Array3::<u8>::from_shape_fn((12, 6, 6), |(n, i, j)| if (n % 3) == (i + j) % 3 { 255 } else { 0 });
        let labels = Array1::from_shape_fn(12, |n| (n % 3) as u8);
        npz.add_array("x_train", &images).unwrap();
        npz.add_array("y_train", &labels).unwrap();
        npz.add_array("x_test", &images).unwrap();
        npz.add_array("y_test", &labels).unwrap();
        npz.finish().unwrap();
    }

    let data = load_image_npz(&path).unwrap().truncated(Some(9), Some(6)).scaled();
    let config = RnnConfig {
        hidden_sizes: vec![8, 4],
        batch_size: 4,
        num_classes: 3,
        ..RnnConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(1);
    let (model, history) = rnn::train(&data, 2, &config, &mut rng).unwrap();

    assert_eq!(history.epochs(), 2);
    for metric in ["loss", "accuracy", "val_loss", "val_accuracy"] {
        assert_eq!(history.get(metric).map(<[f32]>::len), Some(2));
    }

    let history_path = dir.path().join("history_2.json");
    history.save(&history_path).unwrap();
    assert_eq!(History::load(&history_path).unwrap(), history);

    let (loss, accuracy) = model.evaluate(data.x_test.view(), data.y_test.view()).unwrap();
    assert!(loss.is_finite());
    assert!((0.0..=1.0).contains(&accuracy));

    let model_path = dir.path().join("mnist_rnn.bin");
    model.save(&model_path).unwrap();
    let restored = RnnClassifier::load(&model_path).unwrap();
    let sample = data.x_train.index_axis(ndarray::Axis(0), 0);
    assert_eq!(model.predict_one(sample).unwrap(), restored.predict_one(sample).unwrap());
}

#[test]
fn test_bayes_pipelines_on_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lesions.csv");
    std::fs::write(&path, LESION_CSV).unwrap();

    let data = CategoricalTable::read_csv(&path).unwrap();
    // Every cell of the '?' row is kept as a state label
    assert_eq!(data.n_rows(), 12);

    let learned = pipeline::learn_structure(&data, &Default::default()).unwrap();
    assert!(learned.dag().is_acyclic());

    let expert = pipeline::expert_network(&data, 5.0).unwrap();
    let diagnoses = pipeline::diagnose_rows(&expert, &data, 10).unwrap();
    assert_eq!(diagnoses.len(), 10);
    for diagnosis in diagnoses {
        assert!((diagnosis.posterior.values.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }
}

#[test]
fn test_tabular_pipeline_on_csv() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lesions.csv");
    std::fs::write(&path, LESION_CSV).unwrap();

    let table = NumericTable::read_csv(&path).unwrap();
    assert_eq!(table.n_rows(), 11);
    assert_eq!(table.dropped, 1);

    let config = TabularConfig { epochs: 20, log_every: 0, ..TabularConfig::default() };
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut model = TabularClassifier::new(4, &config, &mut rng).unwrap();
    let report = model
        .train_timed(table.features.view(), table.targets.view(), config.epochs, config.log_every)
        .unwrap();
    assert_eq!(report.epoch_times.len(), 20);
    assert!(report.losses.last().unwrap() < report.losses.first().unwrap());
    assert!(report.summary().contains("Median time"));
}

#[test]
fn test_dqn_train_save_and_replay() {
    let config = DqnConfig {
        episodes: 4,
        train_start: 32,
        print_every: 2,
        target_update_every: 2,
        test_episodes: 1,
        ..DqnConfig::default()
    };
    let mut session = EnvSession::open(CartPole::seeded(RenderMode::None, 42));
    let ctx = trainer::train(&mut *session, config).unwrap();
    assert_eq!(ctx.tracker.episode_count(), 4);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cartpole_dqn.bin");
    ctx.agent.save(&path).unwrap();
    let agent = DqnAgent::load(&path).unwrap();

    // Same seed, same greedy policy: identical rollouts
    let mut a = CartPole::seeded(RenderMode::None, 7);
    let mut b = CartPole::seeded(RenderMode::None, 7);
    assert_eq!(
        trainer::greedy_rollout(&ctx.agent, &mut a).unwrap(),
        trainer::greedy_rollout(&agent, &mut b).unwrap()
    );
}

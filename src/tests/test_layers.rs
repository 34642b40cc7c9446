use ndarray::{arr2, Array3, Axis, Ix2};
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::activations::Activation;
use crate::layers::{DenseLayer, DropoutLayer, LSTMLayer, LayerTrait, WeightInit};
use crate::models::rnn::{RnnClassifier, RnnConfig};

fn random_sequence(shape: (usize, usize, usize), seed: u64) -> Array3<f32> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array3::random_using(shape, Uniform::new(-1.0, 1.0), &mut rng)
}

#[test]
fn test_dense_forward_backward_shapes() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut layer = DenseLayer::new_with_init(3, 2, Activation::Relu, WeightInit::HeUniform, &mut rng);
    let inputs = arr2(&[[1.0, 2.0, 3.0], [-1.0, 0.5, 0.0]]);
    let outputs = layer.forward_batch(inputs.view());
    assert_eq!(outputs.shape(), [2, 2]);
    assert!(outputs.iter().all(|&v| v >= 0.0));

    let grads = layer.backward_batch(outputs.view());
    assert_eq!(grads.input_error.shape(), [2, 3]);
    assert_eq!(grads.weights.shape(), [3, 2]);
    assert_eq!(grads.biases.shape(), [2]);
}

#[test]
fn test_dropout_inference_is_identity() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut dropout = DropoutLayer::<Ix2>::new(0.5);
    dropout.set_training(false);
    let inputs = arr2(&[[1.0, 2.0], [3.0, 4.0]]);
    assert_eq!(dropout.forward(inputs.view(), &mut rng), inputs);
}

#[test]
fn test_dropout_training_scales_survivors() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut dropout = DropoutLayer::<Ix2>::new(0.5);
    let inputs = ndarray::Array2::<f32>::ones((20, 20));
    let outputs = dropout.forward(inputs.view(), &mut rng);
    assert!(outputs.iter().all(|&v| v == 0.0 || (v - 2.0).abs() < 1e-6));
    let kept = outputs.iter().filter(|&&v| v > 0.0).count();
    assert!(kept > 100 && kept < 300);

    // Gradient flows only through kept units
    let grad = dropout.backward(inputs.view());
    assert_eq!(grad, outputs);
}

#[test]
fn test_lstm_output_shapes() {
    let mut rng = StdRng::seed_from_u64(3);
    let input = random_sequence((2, 5, 3), 4);

    let mut sequences = LSTMLayer::new(3, 4, true, Activation::Tanh, &mut rng);
    assert_eq!(sequences.forward_sequence(input.view()).shape(), [2, 5, 4]);
    assert_eq!(sequences.predict_sequence(input.view()).shape(), [2, 5, 4]);

    let mut last = LSTMLayer::new(3, 4, false, Activation::Tanh, &mut rng);
    let out = last.forward_sequence(input.view());
    assert_eq!(out.shape(), [2, 1, 4]);
    assert_eq!(out, last.predict_sequence(input.view()));

    let grads = last.backward_sequence(out.view());
    assert_eq!(grads.dw_x.shape(), [3, 16]);
    assert_eq!(grads.dw_h.shape(), [4, 16]);
    assert_eq!(grads.db.shape(), [16]);
    assert_eq!(grads.dx.shape(), [2, 5, 3]);
}

#[test]
fn test_lstm_forget_bias_starts_at_one() {
    let mut rng = StdRng::seed_from_u64(5);
    let layer = LSTMLayer::new(2, 3, true, Activation::Tanh, &mut rng);
    assert!(layer.b.iter().skip(3).take(3).all(|&b| b == 1.0));
    assert!(layer.b.iter().take(3).all(|&b| b == 0.0));
}

/// Sum of all outputs, so the upstream gradient is all ones
fn lstm_loss(layer: &LSTMLayer, input: &Array3<f32>) -> f32 {
    layer.predict_sequence(input.view()).sum()
}

#[test]
fn test_lstm_gradients_match_finite_differences() {
    let mut rng = StdRng::seed_from_u64(6);
    let mut layer = LSTMLayer::new(2, 3, true, Activation::Tanh, &mut rng);
    let input = random_sequence((2, 4, 2), 7);

    let out = layer.forward_sequence(input.view());
    let grads = layer.backward_sequence(ndarray::Array3::ones(out.raw_dim()).view());

    let eps = 1e-2;
    for &(r, c) in &[(0, 0), (1, 5), (0, 9), (1, 11)] {
        let mut plus = layer.clone();
        plus.w_x[[r, c]] += eps;
        let mut minus = layer.clone();
        minus.w_x[[r, c]] -= eps;
        let numeric = (lstm_loss(&plus, &input) - lstm_loss(&minus, &input)) / (2.0 * eps);
        let analytic = grads.dw_x[[r, c]];
        assert!(
            (numeric - analytic).abs() < 2e-2 * (1.0 + analytic.abs()),
            "dw_x[{}, {}]: numeric {} vs analytic {}",
            r, c, numeric, analytic
        );
    }

    for &j in &[0, 4, 8] {
        let mut plus = layer.clone();
        plus.b[j] += eps;
        let mut minus = layer.clone();
        minus.b[j] -= eps;
        let numeric = (lstm_loss(&plus, &input) - lstm_loss(&minus, &input)) / (2.0 * eps);
        assert!((numeric - grads.db[j]).abs() < 2e-2 * (1.0 + grads.db[j].abs()));
    }

    // Input gradient of one element
    let mut shifted = input.clone();
    shifted[[1, 2, 0]] += eps;
    let mut lowered = input.clone();
    lowered[[1, 2, 0]] -= eps;
    let numeric = (lstm_loss(&layer, &shifted) - lstm_loss(&layer, &lowered)) / (2.0 * eps);
    assert!((numeric - grads.dx[[1, 2, 0]]).abs() < 2e-2 * (1.0 + grads.dx[[1, 2, 0]].abs()));
}

fn tiny_rnn_config() -> RnnConfig {
    RnnConfig {
        hidden_sizes: vec![6, 4],
        batch_size: 4,
        num_classes: 3,
        ..RnnConfig::default()
    }
}

#[test]
fn test_rnn_classifier_probabilities() {
    let mut rng = StdRng::seed_from_u64(8);
    let model = RnnClassifier::new(5, &tiny_rnn_config(), &mut rng).unwrap();
    let images = random_sequence((3, 7, 5), 9).mapv(f32::abs);
    let probabilities = model.predict_proba(images.view());
    assert_eq!(probabilities.shape(), [3, 3]);
    for row in probabilities.axis_iter(Axis(0)) {
        assert!((row.sum() - 1.0).abs() < 1e-5);
    }
    assert!(model.predict_one(images.index_axis(Axis(0), 0)).unwrap() < 3);
    assert!(model.summary().contains("Total params"));
}

#[test]
fn test_rnn_classifier_train_batch() {
    let mut rng = StdRng::seed_from_u64(10);
    let mut model = RnnClassifier::new(5, &tiny_rnn_config(), &mut rng).unwrap();
    let images = random_sequence((4, 7, 5), 11).mapv(f32::abs);
    let labels = ndarray::array![0u8, 1, 2, 1];

    let (loss, accuracy) = model.train_batch(images.view(), labels.view(), &mut rng).unwrap();
    assert!(loss.is_finite() && loss > 0.0);
    assert!((0.0..=1.0).contains(&accuracy));

    let bad_labels = ndarray::array![0u8, 1, 7, 1];
    assert!(model.train_batch(images.view(), bad_labels.view(), &mut rng).is_err());

    let wrong_width = random_sequence((4, 7, 6), 12);
    assert!(model.train_batch(wrong_width.view(), labels.view(), &mut rng).is_err());
}

#[test]
fn test_rnn_config_rejects_bad_dropout() {
    let mut rng = StdRng::seed_from_u64(13);
    let config = RnnConfig { dropout: 1.0, ..tiny_rnn_config() };
    assert!(RnnClassifier::new(5, &config, &mut rng).is_err());
}

#[test]
fn test_rnn_summary_is_available_before_training() {
    let mut rng = StdRng::seed_from_u64(14);
    let mut model = RnnClassifier::new(5, &tiny_rnn_config(), &mut rng).unwrap();
    let before = model.summary();
    // 4h(in + h + 1) per LSTM plus the dense head
    assert!(before.ends_with("Total params: 479"), "{}", before);

    let images = random_sequence((4, 7, 5), 15).mapv(f32::abs);
    let data = crate::data::ImageDataset {
        x_train: images.clone(),
        y_train: ndarray::array![0u8, 1, 2, 0],
        x_test: images,
        y_test: ndarray::array![0u8, 1, 2, 0],
    };
    model.fit(&data, 1, &mut rng).unwrap();
    assert_eq!(model.summary(), before);
}

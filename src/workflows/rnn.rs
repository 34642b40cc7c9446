use std::path::Path;

use ndarray::Axis;
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::artifact;
use crate::data::load_image_npz;
use crate::error::Result;
use crate::metrics::history::{LOSS, VAL_LOSS};
use crate::models::rnn::{RnnClassifier, RnnConfig};
use crate::visualization::{plot_history, plot_history_metric, plot_samples, render_image, render_samples};

pub const MODEL_FILE: &str = "mnist_rnn.bin";
pub const PREVIEW_FILE: &str = "first_five.png";
const PREVIEW_COUNT: usize = 5;

/// Train the long-budget model (saved) and the short-budget comparison model,
/// writing a history file and a loss chart for each.
pub fn run(data_path: &Path, output_dir: &Path, config: &RnnConfig) -> Result<()> {
    let raw = load_image_npz(data_path)?;
    println!("Raw shapes:\n{}", raw.shape_report());

    let raw = raw.truncated(config.limit_train, config.limit_test);
    let data = raw.scaled();
    println!("Shape of first train element: {:?}", &data.x_train.shape()[1..]);

    let preview = artifact(output_dir, PREVIEW_FILE)?;
    plot_samples(data.x_train.view(), data.y_train.view(), PREVIEW_COUNT, &preview)?;
    println!("{}", render_samples(data.x_train.view(), data.y_train.view(), PREVIEW_COUNT));
    println!("First training samples saved to {}", preview.display());

    let mut rng = StdRng::seed_from_u64(config.seed);
    let budgets = [(config.long_epochs, true), (config.short_epochs, false)];

    for (epochs, keep_model) in budgets {
        println!("\nTraining for {} epochs", epochs);
        let width = data.x_train.len_of(Axis(2));
        let mut model = RnnClassifier::new(width, config, &mut rng)?;
        println!("{}", model.summary());
        let history = model.fit(&data, epochs, &mut rng)?;

        let history_path = artifact(output_dir, &format!("history_{}.json", epochs))?;
        history.save(&history_path)?;
        println!("History saved to {}", history_path.display());

        let title = format!("Loss (epochs={})", epochs);
        plot_history(&history, &[LOSS, VAL_LOSS], &title, artifact(output_dir, &format!("loss_{}.png", epochs))?)?;
        println!("{}", plot_history_metric(&history, LOSS, 60, 12));

        let (loss, acc) = model.evaluate(data.x_test.view(), data.y_test.view())?;
        println!("(epochs={}) Eval loss: {:.4}", epochs, loss);
        println!("(epochs={}) Eval accuracy: {:.2}%", epochs, acc * 100.0);

        if keep_model {
            let sample = data.x_train.index_axis(Axis(0), 0);
            let label = data.y_train[0] as usize;
            let predicted = model.predict_one(sample)?;
            println!("{}", render_image(sample));
            println!("Saved sample true label: {}", label);
            println!("Saved sample predicted: {}", predicted);
            println!("Prediction correct?: {}", predicted == label);

            let model_path = artifact(output_dir, MODEL_FILE)?;
            model.save(&model_path)?;
            println!("Model saved as {}", model_path.display());
        }
    }
    Ok(())
}

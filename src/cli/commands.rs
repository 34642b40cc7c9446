//! Subcommands and their flags. Flags left unset keep the value from the
//! `--config` file, or the workflow default when no file is given.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Args, Subcommand};

use mlcourse::agent::DqnConfig;
use mlcourse::bayes::BayesConfig;
use mlcourse::config;
use mlcourse::models::rnn::RnnConfig;
use mlcourse::models::tabular::TabularConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the LSTM image classifier for the long and short epoch budgets
    Rnn(RnnArgs),

    /// Chart saved training histories
    PlotHistory(PlotHistoryArgs),

    /// Learn a Bayesian network structure and diagnose rows with the expert network
    Bayes(BayesArgs),

    /// Train the feed-forward classifier with per-epoch timing
    Tabular(TabularArgs),

    /// Train a DQN agent on CartPole
    DqnTrain(DqnTrainArgs),

    /// Render one greedy CartPole episode from a saved agent
    DqnPlay(DqnPlayArgs),
}

/// Flags shared by every training subcommand
#[derive(Args, Debug)]
pub struct CommonArgs {
    /// JSON file overriding the workflow defaults
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory for histories, charts and model files
    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl CommonArgs {
    fn load<T: serde::de::DeserializeOwned + Default>(&self) -> Result<T> {
        Ok(config::load_or_default(self.config.as_deref())?)
    }
}

#[derive(Args, Debug)]
pub struct RnnArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Packed image dataset with x_train, y_train, x_test, y_test
    #[arg(long, default_value = "mnist.npz")]
    pub data: PathBuf,

    /// Use only the first N training images
    #[arg(long)]
    pub limit_train: Option<usize>,

    /// Use only the first N test images
    #[arg(long)]
    pub limit_test: Option<usize>,

    /// Epoch budget of the saved model
    #[arg(long)]
    pub long_epochs: Option<usize>,

    /// Epoch budget of the comparison model
    #[arg(long)]
    pub short_epochs: Option<usize>,
}

impl RnnArgs {
    pub fn to_config(&self) -> Result<RnnConfig> {
        let mut config: RnnConfig = self.common.load()?;
        if let Some(seed) = self.common.seed {
            config.seed = seed;
        }
        if self.limit_train.is_some() {
            config.limit_train = self.limit_train;
        }
        if self.limit_test.is_some() {
            config.limit_test = self.limit_test;
        }
        if let Some(epochs) = self.long_epochs {
            config.long_epochs = epochs;
        }
        if let Some(epochs) = self.short_epochs {
            config.short_epochs = epochs;
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct PlotHistoryArgs {
    /// History JSON files to chart
    #[arg(default_values = ["output/history_6.json", "output/history_2.json"])]
    pub histories: Vec<PathBuf>,

    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,
}

impl PlotHistoryArgs {
    pub fn paths(&self) -> Vec<&Path> {
        self.histories.iter().map(PathBuf::as_path).collect()
    }
}

#[derive(Args, Debug)]
pub struct BayesArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Headerless CSV: size, shape, color, boundary, diagnosis
    #[arg(long, default_value = "skin_cancer.csv")]
    pub data: PathBuf,

    /// BDeu equivalent sample size of the expert network
    #[arg(long)]
    pub equivalent_sample_size: Option<f64>,

    /// Number of rows to diagnose
    #[arg(long)]
    pub diagnose_rows: Option<usize>,
}

impl BayesArgs {
    pub fn to_config(&self) -> Result<BayesConfig> {
        let mut config: BayesConfig = self.common.load()?;
        if let Some(ess) = self.equivalent_sample_size {
            config.equivalent_sample_size = ess;
        }
        if let Some(rows) = self.diagnose_rows {
            config.diagnose_rows = rows;
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct TabularArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Headerless CSV: size, shape, color, boundary, diagnosis
    #[arg(long, default_value = "skin_cancer.csv")]
    pub data: PathBuf,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long)]
    pub learning_rate: Option<f32>,
}

impl TabularArgs {
    pub fn to_config(&self) -> Result<TabularConfig> {
        let mut config: TabularConfig = self.common.load()?;
        if let Some(seed) = self.common.seed {
            config.seed = seed;
        }
        if let Some(epochs) = self.epochs {
            config.epochs = epochs;
        }
        if let Some(lr) = self.learning_rate {
            config.learning_rate = lr;
        }
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct DqnTrainArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[arg(long)]
    pub episodes: Option<usize>,

    /// Stop once the windowed average reward reaches this value
    #[arg(long)]
    pub solve_avg: Option<f32>,
}

impl DqnTrainArgs {
    pub fn to_config(&self) -> Result<DqnConfig> {
        let mut config: DqnConfig = self.common.load()?;
        if let Some(seed) = self.common.seed {
            config.seed = seed;
        }
        if let Some(episodes) = self.episodes {
            config.episodes = episodes;
        }
        if let Some(solve_avg) = self.solve_avg {
            config.solve_avg = solve_avg;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Args, Debug)]
pub struct DqnPlayArgs {
    /// Agent saved by dqn-train
    #[arg(long, default_value = "output/cartpole_dqn.bin")]
    pub model: PathBuf,

    #[arg(long)]
    pub seed: Option<u64>,
}

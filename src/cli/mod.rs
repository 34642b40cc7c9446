pub mod commands;

use anyhow::Result;
use clap::Parser;

use commands::Commands;
use mlcourse::workflows;

#[derive(Parser, Debug)]
#[command(
    name = "mlcourse",
    version,
    about = "Recurrent, tabular, Bayesian and reinforcement learning workflows"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route the subcommand to its workflow
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Rnn(args) => {
                let config = args.to_config()?;
                tracing::info!(data = %args.data.display(), "rnn workflow");
                workflows::rnn::run(&args.data, &args.common.output_dir, &config)?;
            }
            Commands::PlotHistory(args) => {
                workflows::history::run(&args.paths(), &args.output_dir)?;
            }
            Commands::Bayes(args) => {
                let config = args.to_config()?;
                tracing::info!(data = %args.data.display(), "bayes workflow");
                workflows::bayes::run(&args.data, &args.common.output_dir, &config)?;
            }
            Commands::Tabular(args) => {
                let config = args.to_config()?;
                tracing::info!(data = %args.data.display(), "tabular workflow");
                workflows::tabular::run(&args.data, &args.common.output_dir, &config)?;
            }
            Commands::DqnTrain(args) => {
                let config = args.to_config()?;
                workflows::dqn::train(&args.common.output_dir, config)?;
            }
            Commands::DqnPlay(args) => {
                workflows::dqn::play(&args.model, args.seed)?;
            }
        }
        Ok(())
    }
}

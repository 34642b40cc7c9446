use std::path::Path;

use super::artifact;
use crate::agent::trainer::{self, DqnConfig};
use crate::agent::DqnAgent;
use crate::env::{CartPole, EnvSession, Environment, RenderMode};
use crate::error::Result;
use crate::visualization::plot_series;

pub const MODEL_FILE: &str = "cartpole_dqn.bin";
pub const METRICS_FILE: &str = "cartpole_metrics.json";

/// Unrendered environment for the training episodes
pub fn training_env(seed: u64) -> EnvSession<CartPole> {
    EnvSession::open(CartPole::seeded(RenderMode::None, seed))
}

/// Separate rendered environment for the greedy test episodes
pub fn evaluation_env(seed: u64) -> EnvSession<CartPole> {
    EnvSession::open(CartPole::seeded(RenderMode::Human, seed.wrapping_add(1)))
}

/// Train on CartPole without rendering, then evaluate greedily in a fresh
/// rendered environment and save the agent
pub fn train(output_dir: &Path, config: DqnConfig) -> Result<()> {
    let mut env = training_env(config.seed);
    println!("State dim: {}, Action dim: {}", env.observation_size(), env.action_count());
    println!("Starting training\n");

    let (test_episodes, seed) = (config.test_episodes, config.seed);
    let ctx = trainer::train(&mut *env, config)?;
    drop(env);

    let rewards: Vec<f32> = ctx.tracker.metrics().episode_rewards.iter().copied().collect();
    println!("{}", plot_series(&rewards, "Episode rewards", 60, 12));

    println!("\nTesting trained agent...");
    let mut test_env = evaluation_env(seed);
    let scores = trainer::evaluate(&ctx.agent, &mut *test_env, test_episodes)?;
    drop(test_env);
    for (i, score) in scores.iter().enumerate() {
        println!("Test episode {}: {:.0}", i + 1, score);
    }
    if !scores.is_empty() {
        println!("\nTest average: {:.2}", scores.iter().sum::<f32>() / scores.len() as f32);
    }

    let model_path = artifact(output_dir, MODEL_FILE)?;
    ctx.agent.save(&model_path)?;
    ctx.tracker.save(artifact(output_dir, METRICS_FILE)?)?;
    println!("Model saved to {}", model_path.display());
    Ok(())
}

/// Load a saved agent and render one greedy episode
pub fn play(model_path: &Path, seed: Option<u64>) -> Result<f32> {
    let agent = DqnAgent::load(model_path)?;
    let cartpole = match seed {
        Some(seed) => CartPole::seeded(RenderMode::Human, seed),
        None => CartPole::new(RenderMode::Human),
    };
    let mut env = EnvSession::open(cartpole);
    let total = trainer::greedy_rollout(&agent, &mut *env)?;
    println!("Episode reward: {:.0}", total);
    Ok(total)
}

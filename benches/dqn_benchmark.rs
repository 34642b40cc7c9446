//! Throughput of the pieces on the DQN hot path: network forward passes,
//! replay sampling and one mini-batch update, plus a CartPole rollout.

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use mlcourse::agent::trainer::{self, DqnConfig, TrainingContext};
use mlcourse::agent::DqnAgent;
use mlcourse::env::{CartPole, Environment, RenderMode};
use mlcourse::loss::HuberLoss;
use mlcourse::optimizer::OptimizerWrapper;
use mlcourse::replay_buffer::{Experience, ReplayBuffer};
use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_state<R: Rng>(rng: &mut R) -> Array1<f32> {
    Array1::from_shape_fn(4, |_| rng.gen_range(-0.1..0.1))
}

fn filled_buffer(size: usize, rng: &mut StdRng) -> ReplayBuffer {
    let mut buffer = ReplayBuffer::new(size).unwrap();
    for i in 0..size {
        buffer.add(Experience {
            state: random_state(rng),
            action: i % 2,
            reward: 1.0,
            next_state: random_state(rng),
            done: i % 50 == 49,
        });
    }
    buffer
}

fn bench_forward(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let agent = DqnAgent::new(&[4, 24, 24, 2], OptimizerWrapper::adam(), &mut rng);
    let state = array![0.01, -0.02, 0.03, 0.0];
    c.bench_function("q_values_24x24", |b| b.iter(|| agent.q_values(black_box(state.view()))));
}

fn bench_replay_sample(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let buffer = filled_buffer(10_000, &mut rng);
    c.bench_function("replay_sample_32", |b| b.iter(|| buffer.sample(black_box(32), &mut rng).len()));
}

fn bench_train_on_batch(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(2);
    let buffer = filled_buffer(1_000, &mut rng);
    let loss = HuberLoss::default();
    let mut agent = DqnAgent::new(&[4, 24, 24, 2], OptimizerWrapper::adam(), &mut rng);
    c.bench_function("train_on_batch_32", |b| {
        b.iter(|| {
            let batch = buffer.sample(32, &mut rng);
            agent.train_on_batch(&batch, 0.99, 1e-3, &loss)
        })
    });
}

fn bench_episode(c: &mut Criterion) {
    c.bench_function("cartpole_episode_with_training", |b| {
        b.iter_batched(
            || {
                let config = DqnConfig { train_start: 32, ..DqnConfig::default() };
                (TrainingContext::new(config, 4, 2), CartPole::seeded(RenderMode::None, 3))
            },
            |(ctx, mut env)| ctx.map(|mut ctx| ctx.run_episode(&mut env).map(|s| s.steps)),
            BatchSize::SmallInput,
        )
    });

    let mut rng = StdRng::seed_from_u64(4);
    let agent = DqnAgent::new(&[4, 24, 24, 2], OptimizerWrapper::adam(), &mut rng);
    let mut env = CartPole::seeded(RenderMode::None, 5);
    c.bench_function("cartpole_greedy_rollout", |b| {
        b.iter(|| trainer::greedy_rollout(&agent, &mut env))
    });
    env.close();
}

criterion_group!(benches, bench_forward, bench_replay_sample, bench_train_on_batch, bench_episode);
criterion_main!(benches);

use ndarray::array;
use rand::rngs::StdRng;
use rand::SeedableRng;
use crate::error::MlError;
use crate::replay_buffer::{Experience, ReplayBuffer};

fn experience(i: usize) -> Experience {
    Experience {
        state: array![i as f32],
        action: i % 2,
        reward: i as f32,
        next_state: array![(i + 1) as f32],
        done: false,
    }
}

#[test]
fn test_replay_buffer_add_and_sample() {
    let mut rng = StdRng::seed_from_u64(0);
    let mut replay_buffer = ReplayBuffer::new(10).unwrap();
    let experience = experience(0);
    replay_buffer.add(experience.clone());
    assert_eq!(replay_buffer.len(), 1);
    let sample = replay_buffer.sample(1, &mut rng);
    assert_eq!(sample[0], &experience);
}

#[test]
fn test_replay_buffer_capacity_evicts_oldest() {
    let mut buffer = ReplayBuffer::new(3).unwrap();
    for i in 1..=5 {
        buffer.add(experience(i));
    }

    assert_eq!(buffer.len(), 3);
    let states: Vec<f32> = buffer.iter().map(|e| e.state[0]).collect();
    assert_eq!(states, vec![3.0, 4.0, 5.0]);
}

#[test]
fn test_replay_buffer_is_empty() {
    let mut buffer = ReplayBuffer::new(10).unwrap();
    assert!(buffer.is_empty());
    buffer.add(experience(0));
    assert!(!buffer.is_empty());
}

#[test]
fn test_replay_buffer_sample_size() {
    let mut rng = StdRng::seed_from_u64(1);
    let mut buffer = ReplayBuffer::new(10).unwrap();
    for i in 0..5 {
        buffer.add(experience(i));
    }

    assert_eq!(buffer.sample(1, &mut rng).len(), 1);
    assert_eq!(buffer.sample(5, &mut rng).len(), 5);
    // Never more than stored
    assert_eq!(buffer.sample(10, &mut rng).len(), 5);
}

#[test]
fn test_replay_buffer_sample_is_without_replacement() {
    let mut rng = StdRng::seed_from_u64(2);
    let mut buffer = ReplayBuffer::new(8).unwrap();
    for i in 0..8 {
        buffer.add(experience(i));
    }

    let mut states: Vec<f32> = buffer.sample(8, &mut rng).iter().map(|e| e.state[0]).collect();
    states.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(states, (0..8).map(|i| i as f32).collect::<Vec<_>>());
}

#[test]
fn test_replay_buffer_zero_capacity_is_rejected() {
    match ReplayBuffer::new(0) {
        Err(MlError::InvalidParameter { name, .. }) => assert_eq!(name, "capacity"),
        other => panic!("expected an invalid capacity error, got {:?}", other.map(|b| b.capacity())),
    }
}

use mlcourse::activations::softmax_rows;
use mlcourse::agent::{decay_epsilon, greedy_action, td_target};
use mlcourse::bayes::{BicScore, Dag, HillClimbSearch, SearchConfig};
use mlcourse::data::{train_test_split, CategoricalTable};
use mlcourse::metrics::{median, History, Statistics};
use mlcourse::replay_buffer::{Experience, ReplayBuffer};
use ndarray::{Array1, Array2};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn experience(i: usize) -> Experience {
    Experience {
        state: Array1::from_elem(2, i as f32),
        action: 0,
        reward: 0.0,
        next_state: Array1::zeros(2),
        done: false,
    }
}

// Small categorical datasets: 3 to 4 variables, binary or ternary states
fn table_strategy() -> impl Strategy<Value = Vec<Vec<u8>>> {
    (3usize..=4).prop_flat_map(|vars| {
        prop::collection::vec(prop::collection::vec(0u8..3, vars), 20..60)
    })
}

proptest! {
    #[test]
    fn replay_buffer_never_exceeds_capacity(capacity in 1usize..50, inserts in 0usize..200) {
        let mut buffer = ReplayBuffer::new(capacity).unwrap();
        for i in 0..inserts {
            buffer.add(experience(i));
        }
        prop_assert_eq!(buffer.len(), inserts.min(capacity));
        // The survivors are the most recent inserts, oldest first
        let first_kept = inserts.saturating_sub(capacity);
        for (offset, exp) in buffer.iter().enumerate() {
            prop_assert_eq!(exp.state[0], (first_kept + offset) as f32);
        }
    }

    #[test]
    fn epsilon_decay_is_monotone_and_floored(
        start in 0.0f32..=1.0,
        decay in 0.5f32..1.0,
        floor in 0.0f32..0.5,
        steps in 0usize..500,
    ) {
        let mut epsilon = start.max(floor);
        for _ in 0..steps {
            let next = decay_epsilon(epsilon, decay, floor);
            prop_assert!(next <= epsilon);
            prop_assert!(next >= floor);
            epsilon = next;
        }
    }

    #[test]
    fn terminal_td_target_ignores_bootstrap(reward in -10.0f32..10.0, gamma in 0.0f32..=1.0, q in -100.0f32..100.0) {
        prop_assert_eq!(td_target(reward, true, gamma, q), reward);
    }

    #[test]
    fn greedy_action_picks_a_maximum(values in prop::collection::vec(-1e3f32..1e3, 1..20)) {
        let q = Array1::from_vec(values.clone());
        let best = greedy_action(q.view());
        prop_assert!(values.iter().all(|&v| v <= values[best]));
        prop_assert!(values[..best].iter().all(|&v| v < values[best]));
    }

    #[test]
    fn softmax_rows_are_distributions(values in prop::collection::vec(-50.0f32..50.0, 12)) {
        let logits = Array2::from_shape_vec((3, 4), values).unwrap();
        let probabilities = softmax_rows(logits.view());
        for row in probabilities.rows() {
            prop_assert!((row.sum() - 1.0).abs() < 1e-4);
            prop_assert!(row.iter().all(|&p| (0.0..=1.0).contains(&p)));
        }
    }

    #[test]
    fn split_partitions_indices(n in 1usize..300, fraction in 0.0f64..=1.0, seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let (train, test) = train_test_split(n, fraction, &mut rng);
        prop_assert_eq!(train.len() + test.len(), n);
        prop_assert!(test.len() as f64 >= (n as f64 * fraction).floor());
        let mut all: Vec<usize> = train.into_iter().chain(test).collect();
        all.sort_unstable();
        prop_assert_eq!(all, (0..n).collect::<Vec<_>>());
    }

    #[test]
    fn statistics_are_bounded(values in prop::collection::vec(-1e4f32..1e4, 1..100)) {
        let stats = Statistics::from_slice(&values).unwrap();
        prop_assert!(stats.min <= stats.median && stats.median <= stats.max);
        let tolerance = 1e-3 * (1.0 + stats.max.abs().max(stats.min.abs()));
        prop_assert!(stats.min <= stats.mean + tolerance && stats.mean <= stats.max + tolerance);
        prop_assert!(stats.std >= 0.0);
        prop_assert_eq!(values[stats.argmin], stats.min);
        prop_assert_eq!(values[stats.argmax], stats.max);
        prop_assert_eq!(median(&values), stats.median);
    }

    #[test]
    fn history_epochs_stay_aligned(losses in prop::collection::vec(0.0f32..10.0, 1..30)) {
        let mut history = History::new();
        for &loss in &losses {
            history.record_epoch(&[("loss", loss), ("val_loss", loss * 2.0)]).unwrap();
        }
        prop_assert_eq!(history.epochs(), losses.len());
        prop_assert!(history.validate().is_ok());
        prop_assert!(history.record_epoch(&[("loss", 1.0)]).is_err());
    }

    #[test]
    fn hill_climb_never_yields_a_cycle(rows in table_strategy()) {
        let names: Vec<String> = (0..rows[0].len()).map(|i| format!("v{}", i)).collect();
        let name_refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let records: Vec<Vec<String>> = rows
            .iter()
            .map(|r| r.iter().map(|v| v.to_string()).collect())
            .collect();
        let data = CategoricalTable::from_records(&name_refs, &records).unwrap();

        let score = BicScore::new(&data);
        let config = SearchConfig { tabu_length: 5, ..SearchConfig::default() };
        let dag = HillClimbSearch::new(&score, config).estimate(Dag::empty(data.names())).unwrap();
        prop_assert!(dag.is_acyclic());
        prop_assert_eq!(dag.topological_order().len(), dag.len());
    }
}

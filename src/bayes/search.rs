//! Greedy hill climbing over DAG structures with a tabu list.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use serde::{Serialize, Deserialize};

use super::dag::Dag;
use super::score::StructureScore;
use crate::error::Result;

/// A single structural edit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Add(usize, usize),
    Remove(usize, usize),
    Flip(usize, usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Minimum score improvement for a move to be taken
    pub epsilon: f64,
    pub max_iter: usize,
    pub tabu_length: usize,
    /// Upper bound on the number of parents of any node
    pub max_indegree: Option<usize>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            epsilon: 1e-4,
            max_iter: 1_000_000,
            tabu_length: 100,
            max_indegree: None,
        }
    }
}

/// Memoises local scores by `(node, parent set)`
struct ScoreCache<'s> {
    score: &'s dyn StructureScore,
    cache: RefCell<HashMap<(usize, Vec<usize>), f64>>,
}

impl<'s> ScoreCache<'s> {
    fn new(score: &'s dyn StructureScore) -> Self {
        ScoreCache { score, cache: RefCell::new(HashMap::new()) }
    }

    fn local(&self, var: usize, parents: &[usize]) -> f64 {
        let mut key_parents = parents.to_vec();
        key_parents.sort_unstable();
        if let Some(&cached) = self.cache.borrow().get(&(var, key_parents.clone())) {
            return cached;
        }
        let value = self.score.local_score(var, &key_parents);
        self.cache.borrow_mut().insert((var, key_parents), value);
        value
    }
}

pub struct HillClimbSearch<'s> {
    scores: ScoreCache<'s>,
    config: SearchConfig,
}

impl<'s> HillClimbSearch<'s> {
    pub fn new(score: &'s dyn StructureScore, config: SearchConfig) -> Self {
        HillClimbSearch {
            scores: ScoreCache::new(score),
            config,
        }
    }

    fn parents_of(dag: &Dag, node: usize) -> Vec<usize> {
        dag.parents(node).iter().copied().collect()
    }

    fn indegree_allows(&self, dag: &Dag, node: usize) -> bool {
        self.config.max_indegree.map_or(true, |max| dag.in_degree(node) < max)
    }

    /// Every legal move not on the tabu list, with its score change
    pub fn legal_operations(&self, dag: &Dag, tabu: &VecDeque<Operation>) -> Vec<(Operation, f64)> {
        let n = dag.len();
        let mut operations = Vec::new();

        // Additions
        for from in 0..n {
            for to in 0..n {
                if from == to || dag.has_edge(from, to) || dag.has_edge(to, from) {
                    continue;
                }
                let op = Operation::Add(from, to);
                if tabu.contains(&op) || dag.would_create_cycle(from, to) || !self.indegree_allows(dag, to) {
                    continue;
                }
                let old = Self::parents_of(dag, to);
                let mut new = old.clone();
                new.push(from);
                let delta = self.scores.local(to, &new) - self.scores.local(to, &old);
                operations.push((op, delta));
            }
        }

        // Removals
        for (from, to) in dag.edges() {
            let op = Operation::Remove(from, to);
            if tabu.contains(&op) {
                continue;
            }
            let old = Self::parents_of(dag, to);
            let new: Vec<usize> = old.iter().copied().filter(|&p| p != from).collect();
            let delta = self.scores.local(to, &new) - self.scores.local(to, &old);
            operations.push((op, delta));
        }

        // Reversals
        for (from, to) in dag.edges() {
            let op = Operation::Flip(from, to);
            if tabu.contains(&op) || tabu.contains(&Operation::Flip(to, from)) {
                continue;
            }
            if !self.indegree_allows(dag, from) {
                continue;
            }
            let mut without = dag.clone();
            without.remove_edge(from, to);
            // Another path from -> to would close a cycle once reversed
            if without.has_path(from, to) {
                continue;
            }

            let old_to = Self::parents_of(dag, to);
            let new_to: Vec<usize> = old_to.iter().copied().filter(|&p| p != from).collect();
            let old_from = Self::parents_of(dag, from);
            let mut new_from = old_from.clone();
            new_from.push(to);

            let delta = self.scores.local(from, &new_from) - self.scores.local(from, &old_from)
                + self.scores.local(to, &new_to)
                - self.scores.local(to, &old_to);
            operations.push((op, delta));
        }

        operations
    }

    /// Climb from `start` until no legal move improves the score by at least
    /// `epsilon`, or `max_iter` moves have been made.
    pub fn estimate(&self, start: Dag) -> Result<Dag> {
        let mut dag = start;
        let mut tabu: VecDeque<Operation> = VecDeque::with_capacity(self.config.tabu_length);

        for iteration in 0..self.config.max_iter {
            let best = self
                .legal_operations(&dag, &tabu)
                .into_iter()
                .fold(None, |best: Option<(Operation, f64)>, (op, delta)| match best {
                    Some((_, best_delta)) if best_delta >= delta => best,
                    _ => Some((op, delta)),
                });

            let Some((op, delta)) = best else { break };
            if delta < self.config.epsilon {
                break;
            }

            let inverse = match op {
                Operation::Add(from, to) => {
                    dag.add_edge(from, to)?;
                    Operation::Remove(from, to)
                }
                Operation::Remove(from, to) => {
                    dag.remove_edge(from, to);
                    Operation::Add(from, to)
                }
                Operation::Flip(from, to) => {
                    dag.reverse_edge(from, to)?;
                    op
                }
            };
            tracing::debug!(iteration, ?op, delta, "hill climb move");

            if self.config.tabu_length > 0 {
                if tabu.len() >= self.config.tabu_length {
                    tabu.pop_front();
                }
                tabu.push_back(inverse);
            }
        }

        Ok(dag)
    }
}

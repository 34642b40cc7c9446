use crate::network::NeuralNetwork;
use crate::activations::Activation;
use crate::layers::WeightInit;
use crate::loss::Loss;
use crate::optimizer::OptimizerWrapper;
use crate::replay_buffer::Experience;
use crate::error::{Result, MlError};
use super::policy;
use rand::Rng;
use ndarray::{Array2, ArrayView1, ArrayView2};
use serde::{Serialize, Deserialize};
use std::path::Path;

/// One-step TD target: `reward` for terminal transitions, otherwise
/// `reward + gamma * max_next_q`.
pub fn td_target(reward: f32, done: bool, gamma: f32, max_next_q: f32) -> f32 {
    if done {
        reward
    } else {
        reward + gamma * max_next_q
    }
}

/// Regression targets for a batch: a copy of `current_q` where each row's taken
/// action is replaced by its TD target computed from `next_q`.
pub fn bellman_targets(
    current_q: ArrayView2<f32>,
    next_q: ArrayView2<f32>,
    batch: &[&Experience],
    gamma: f32,
) -> Result<Array2<f32>> {
    if current_q.nrows() != batch.len() || next_q.nrows() != batch.len() {
        return Err(MlError::dimension_mismatch(
            format!("{} rows", batch.len()),
            format!("{} and {} rows", current_q.nrows(), next_q.nrows()),
        ));
    }

    let mut targets = current_q.to_owned();
    for (i, exp) in batch.iter().enumerate() {
        if exp.action >= targets.ncols() {
            return Err(MlError::InvalidAction { action: exp.action, max_actions: targets.ncols() });
        }
        let max_next_q = next_q.row(i).iter()
            .fold(f32::NEG_INFINITY, |max, &val| max.max(val));
        targets[[i, exp.action]] = td_target(exp.reward, exp.done, gamma, max_next_q);
    }
    Ok(targets)
}

/// Deep Q-Network agent: an online network that is trained and a target
/// network used for bootstrapped targets, synchronised on request.
///
/// ```rust
/// use mlcourse::agent::DqnAgent;
/// use mlcourse::optimizer::OptimizerWrapper;
/// use rand::SeedableRng;
///
/// let mut rng = rand::rngs::StdRng::seed_from_u64(7);
/// let agent = DqnAgent::new(&[4, 24, 24, 2], OptimizerWrapper::adam(), &mut rng);
/// let action = agent.act(ndarray::array![0.0, 0.1, -0.1, 0.0].view(), 0.0, &mut rng);
/// assert!(action < 2);
/// ```
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DqnAgent {
    /// Main network for action selection
    pub q_network: NeuralNetwork,

    /// Target network for stable Q-value estimation
    pub target_network: NeuralNetwork,

    /// Number of gradient steps performed
    pub train_steps: usize,
}

impl DqnAgent {
    /// ReLU hidden layers, linear output, He-uniform weights. The target
    /// network starts as an exact copy.
    pub fn new<R: Rng + ?Sized>(layer_sizes: &[usize], optimizer: OptimizerWrapper, rng: &mut R) -> Self {
        assert!(layer_sizes.len() >= 2, "Network must have at least input and output layers");

        let mut activations = vec![Activation::Relu; layer_sizes.len() - 2];
        activations.push(Activation::Linear);

        let q_network = NeuralNetwork::new_with_init(
            layer_sizes,
            &activations,
            optimizer,
            WeightInit::HeUniform,
            rng,
        );
        let target_network = q_network.clone();

        DqnAgent {
            q_network,
            target_network,
            train_steps: 0,
        }
    }

    pub fn action_count(&self) -> usize {
        self.q_network.output_size()
    }

    pub fn q_values(&self, state: ArrayView1<f32>) -> ndarray::Array1<f32> {
        self.q_network.forward(state)
    }

    /// Epsilon-greedy action for `state`
    pub fn act<R: Rng + ?Sized>(&self, state: ArrayView1<f32>, epsilon: f32, rng: &mut R) -> usize {
        let q_values = self.q_network.forward(state);
        policy::epsilon_greedy(q_values.view(), epsilon, rng)
    }

    /// Overwrite the target network with the online network's parameters
    pub fn sync_target(&mut self) -> Result<()> {
        self.target_network.copy_weights_from(&self.q_network)
    }

    /// One regression step of the online network toward Bellman targets.
    /// Returns the pre-update loss. An empty batch trains nothing and returns `0.0`.
    pub fn train_on_batch(
        &mut self,
        batch: &[&Experience],
        gamma: f32,
        learning_rate: f32,
        loss: &dyn Loss,
    ) -> Result<f32> {
        if batch.is_empty() {
            return Ok(0.0);
        }

        let state_size = self.q_network.input_size();
        let mut states = Array2::zeros((batch.len(), state_size));
        let mut next_states = Array2::zeros((batch.len(), state_size));
        for (i, exp) in batch.iter().enumerate() {
            if exp.state.len() != state_size || exp.next_state.len() != state_size {
                return Err(MlError::dimension_mismatch(
                    format!("states of length {}", state_size),
                    format!("{} and {}", exp.state.len(), exp.next_state.len()),
                ));
            }
            states.row_mut(i).assign(&exp.state);
            next_states.row_mut(i).assign(&exp.next_state);
        }

        let current_q = self.q_network.forward_batch(states.view());
        let next_q = self.target_network.forward_batch(next_states.view());
        let targets = bellman_targets(current_q.view(), next_q.view(), batch, gamma)?;

        let loss_value = self.q_network.train_batch(states.view(), targets.view(), loss, learning_rate)?;
        self.train_steps += 1;
        Ok(loss_value)
    }

    /// Save the agent to disk
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let serialized = bincode::serialize(self)?;
        std::fs::write(path, serialized)?;
        Ok(())
    }

    /// Load agent from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(bincode::deserialize(&data)?)
    }
}

/// Builder pattern for DqnAgent
pub struct DqnAgentBuilder {
    layer_sizes: Vec<usize>,
    optimizer: Option<OptimizerWrapper>,
}

impl DqnAgentBuilder {
    pub fn new() -> Self {
        DqnAgentBuilder {
            layer_sizes: vec![],
            optimizer: None,
        }
    }

    pub fn layer_sizes(mut self, sizes: &[usize]) -> Self {
        self.layer_sizes = sizes.to_vec();
        self
    }

    pub fn optimizer(mut self, optimizer: OptimizerWrapper) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Result<DqnAgent> {
        if self.layer_sizes.len() < 2 {
            return Err(MlError::invalid_parameter("layer_sizes", "Must have at least 2 layers"));
        }
        if self.layer_sizes.contains(&0) {
            return Err(MlError::invalid_parameter("layer_sizes", "Layer sizes must be positive"));
        }

        let optimizer = self.optimizer
            .ok_or_else(|| MlError::invalid_parameter("optimizer", "Optimizer must be specified"))?;

        Ok(DqnAgent::new(&self.layer_sizes, optimizer, rng))
    }
}

impl Default for DqnAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}

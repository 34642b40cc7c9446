//! Gradient-descent optimizers.
//!
//! Each trainable tensor is addressed by a `slot` index chosen by the model that
//! owns it, so stateful optimizers keep one moment estimate per tensor. Models
//! call [`Optimizer::step`] once after every parameter of a batch was updated.

use std::collections::BTreeMap;

use ndarray::{Array, Dimension, Ix1, Ix2};
use serde::{Serialize, Deserialize};

pub trait Optimizer {
    fn update_weights(&mut self, slot: usize, weights: &mut Array<f32, Ix2>, gradients: &Array<f32, Ix2>, learning_rate: f32);
    fn update_biases(&mut self, slot: usize, biases: &mut Array<f32, Ix1>, gradients: &Array<f32, Ix1>, learning_rate: f32);

    /// Advance the optimizer's time step
    fn step(&mut self) {}
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub enum OptimizerWrapper {
    SGD(SGD),
    Adam(Adam),
}

impl OptimizerWrapper {
    pub fn sgd() -> Self {
        OptimizerWrapper::SGD(SGD::new())
    }

    pub fn adam() -> Self {
        OptimizerWrapper::Adam(Adam::default())
    }
}

impl Optimizer for OptimizerWrapper {
    fn update_weights(&mut self, slot: usize, weights: &mut Array<f32, Ix2>, gradients: &Array<f32, Ix2>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_weights(slot, weights, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_weights(slot, weights, gradients, learning_rate),
        }
    }

    fn update_biases(&mut self, slot: usize, biases: &mut Array<f32, Ix1>, gradients: &Array<f32, Ix1>, learning_rate: f32) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.update_biases(slot, biases, gradients, learning_rate),
            OptimizerWrapper::Adam(optimizer) => optimizer.update_biases(slot, biases, gradients, learning_rate),
        }
    }

    fn step(&mut self) {
        match self {
            OptimizerWrapper::SGD(optimizer) => optimizer.step(),
            OptimizerWrapper::Adam(optimizer) => optimizer.step(),
        }
    }
}

/// Plain gradient descent
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct SGD;

impl SGD {
    pub fn new() -> SGD {
        SGD
    }
}

impl Optimizer for SGD {
    fn update_weights(&mut self, _slot: usize, weights: &mut Array<f32, Ix2>, gradients: &Array<f32, Ix2>, learning_rate: f32) {
        weights.zip_mut_with(gradients, |w, &g| *w -= learning_rate * g);
    }

    fn update_biases(&mut self, _slot: usize, biases: &mut Array<f32, Ix1>, gradients: &Array<f32, Ix1>, learning_rate: f32) {
        biases.zip_mut_with(gradients, |b, &g| *b -= learning_rate * g);
    }
}

/// First and second moment estimates for one tensor
#[derive(Serialize, Deserialize, Clone, Debug)]
struct Moments<D: Dimension> {
    m: Array<f32, D>,
    v: Array<f32, D>,
}

/// Adam with bias-corrected moments, one state entry per slot
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Adam {
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    /// 1-based time step used for bias correction
    pub t: i32,
    weight_moments: BTreeMap<usize, Moments<Ix2>>,
    bias_moments: BTreeMap<usize, Moments<Ix1>>,
}

impl Adam {
    pub fn new(beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Adam {
            beta1,
            beta2,
            epsilon,
            t: 1,
            weight_moments: BTreeMap::new(),
            bias_moments: BTreeMap::new(),
        }
    }

    fn apply<D: Dimension>(&self, moments: &mut Moments<D>, param: &mut Array<f32, D>, gradients: &Array<f32, D>, learning_rate: f32) {
        let (beta1, beta2) = (self.beta1, self.beta2);
        moments.m.zip_mut_with(gradients, |m, &g| *m = beta1 * *m + (1.0 - beta1) * g);
        moments.v.zip_mut_with(gradients, |v, &g| *v = beta2 * *v + (1.0 - beta2) * g * g);

        let m_correction = 1.0 - beta1.powi(self.t);
        let v_correction = 1.0 - beta2.powi(self.t);
        let epsilon = self.epsilon;

        ndarray::Zip::from(param)
            .and(&moments.m)
            .and(&moments.v)
            .for_each(|p, &m, &v| {
                let m_hat = m / m_correction;
                let v_hat = v / v_correction;
                *p -= learning_rate * m_hat / (v_hat.sqrt() + epsilon);
            });
    }
}

impl Default for Adam {
    fn default() -> Self {
        Self::new(0.9, 0.999, 1e-7)
    }
}

impl Optimizer for Adam {
    fn update_weights(&mut self, slot: usize, weights: &mut Array<f32, Ix2>, gradients: &Array<f32, Ix2>, learning_rate: f32) {
        let mut moments = self.weight_moments.remove(&slot).unwrap_or_else(|| Moments {
            m: Array::zeros(weights.raw_dim()),
            v: Array::zeros(weights.raw_dim()),
        });
        self.apply(&mut moments, weights, gradients, learning_rate);
        self.weight_moments.insert(slot, moments);
    }

    fn update_biases(&mut self, slot: usize, biases: &mut Array<f32, Ix1>, gradients: &Array<f32, Ix1>, learning_rate: f32) {
        let mut moments = self.bias_moments.remove(&slot).unwrap_or_else(|| Moments {
            m: Array::zeros(biases.raw_dim()),
            v: Array::zeros(biases.raw_dim()),
        });
        self.apply(&mut moments, biases, gradients, learning_rate);
        self.bias_moments.insert(slot, moments);
    }

    fn step(&mut self) {
        self.t += 1;
    }
}

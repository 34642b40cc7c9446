use ndarray::{s, Array1, Array2, Array3, ArrayView2, ArrayView3, Axis};
use rand::Rng;
use serde::{Serialize, Deserialize};
use crate::activations::{sigmoid, Activation};
use super::initialization::WeightInit;

/// LSTM (Long Short-Term Memory) layer for sequence processing
///
/// Gate parameters are fused: columns `[0, h)` of every matrix belong to the
/// input gate, then forget, candidate and output gates. Gates use the logistic
/// sigmoid; `activation` is applied to the candidate and to the cell state
/// before the output gate (tanh classically, ReLU in the image classifier).
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct LSTMLayer {
    pub input_size: usize,
    pub hidden_size: usize,
    /// Whether to return sequences (all time steps) or just the last output
    pub return_sequences: bool,
    pub activation: Activation,

    /// Input-to-gates weights, `(input_size, 4 * hidden_size)`
    pub w_x: Array2<f32>,
    /// Hidden-to-gates weights, `(hidden_size, 4 * hidden_size)`
    pub w_h: Array2<f32>,
    /// Gate biases, `4 * hidden_size`
    pub b: Array1<f32>,

    #[serde(skip)]
    cache: Option<LSTMCache>,
}

#[derive(Clone, Debug)]
struct LSTMCache {
    inputs: Array3<f32>,
    hidden_states: Vec<Array2<f32>>,
    cell_states: Vec<Array2<f32>>,
    input_gates: Vec<Array2<f32>>,
    forget_gates: Vec<Array2<f32>>,
    candidate_pre: Vec<Array2<f32>>,
    candidates: Vec<Array2<f32>>,
    output_gates: Vec<Array2<f32>>,
}

/// Gradients for LSTM layer
pub struct LSTMGradients {
    pub dw_x: Array2<f32>,
    pub dw_h: Array2<f32>,
    pub db: Array1<f32>,
    /// Gradient with respect to the input sequence, `(batch, seq_len, input_size)`
    pub dx: Array3<f32>,
}

struct StepOutput {
    h: Array2<f32>,
    c: Array2<f32>,
    i: Array2<f32>,
    f: Array2<f32>,
    g_pre: Array2<f32>,
    g: Array2<f32>,
    o: Array2<f32>,
}

impl LSTMLayer {
    pub fn new<R: Rng + ?Sized>(
        input_size: usize,
        hidden_size: usize,
        return_sequences: bool,
        activation: Activation,
        rng: &mut R,
    ) -> Self {
        let gates = 4 * hidden_size;
        let w_x = WeightInit::XavierUniform.initialize_weights((input_size, gates), rng);
        let w_h = WeightInit::XavierUniform.initialize_weights((hidden_size, gates), rng);
        let mut b = Array1::zeros(gates);
        // Forget gate bias starts at 1
        b.slice_mut(s![hidden_size..2 * hidden_size]).fill(1.0);

        Self {
            input_size,
            hidden_size,
            return_sequences,
            activation,
            w_x,
            w_h,
            b,
            cache: None,
        }
    }

    /// Output width along the feature axis
    pub fn output_size(&self) -> usize {
        self.hidden_size
    }

    fn step(&self, x_t: ArrayView2<f32>, h_prev: &Array2<f32>, c_prev: &Array2<f32>) -> StepOutput {
        let hs = self.hidden_size;
        let z = x_t.dot(&self.w_x) + h_prev.dot(&self.w_h) + &self.b.view().insert_axis(Axis(0));

        let i = z.slice(s![.., 0..hs]).mapv(sigmoid);
        let f = z.slice(s![.., hs..2 * hs]).mapv(sigmoid);
        let g_pre = z.slice(s![.., 2 * hs..3 * hs]).to_owned();
        let mut g = g_pre.clone();
        self.activation.apply(&mut g);
        let o = z.slice(s![.., 3 * hs..4 * hs]).mapv(sigmoid);

        let c = &f * c_prev + &i * &g;
        let mut c_act = c.clone();
        self.activation.apply(&mut c_act);
        let h = &o * &c_act;

        StepOutput { h, c, i, f, g_pre, g, o }
    }

    /// Inference-only forward pass; does not touch the backward cache.
    /// Output is `(batch, seq_len, hidden)` when returning sequences, else `(batch, hidden)`
    /// wrapped as `(batch, 1, hidden)`.
    pub fn predict_sequence(&self, input: ArrayView3<f32>) -> Array3<f32> {
        let (batch_size, seq_len, _) = input.dim();
        let mut h = Array2::zeros((batch_size, self.hidden_size));
        let mut c = Array2::zeros((batch_size, self.hidden_size));
        let out_len = if self.return_sequences { seq_len } else { 1 };
        let mut output = Array3::zeros((batch_size, out_len, self.hidden_size));

        for t in 0..seq_len {
            let step = self.step(input.slice(s![.., t, ..]), &h, &c);
            h = step.h;
            c = step.c;
            if self.return_sequences {
                output.slice_mut(s![.., t, ..]).assign(&h);
            }
        }
        if !self.return_sequences {
            output.slice_mut(s![.., 0, ..]).assign(&h);
        }
        output
    }

    /// Forward pass for a sequence, caching activations for `backward_sequence`.
    /// Input shape: (batch_size, sequence_length, input_size)
    pub fn forward_sequence(&mut self, input: ArrayView3<f32>) -> Array3<f32> {
        let (batch_size, seq_len, _) = input.dim();
        let mut h = Array2::zeros((batch_size, self.hidden_size));
        let mut c = Array2::zeros((batch_size, self.hidden_size));

        let mut cache = LSTMCache {
            inputs: input.to_owned(),
            hidden_states: Vec::with_capacity(seq_len + 1),
            cell_states: Vec::with_capacity(seq_len + 1),
            input_gates: Vec::with_capacity(seq_len),
            forget_gates: Vec::with_capacity(seq_len),
            candidate_pre: Vec::with_capacity(seq_len),
            candidates: Vec::with_capacity(seq_len),
            output_gates: Vec::with_capacity(seq_len),
        };
        cache.hidden_states.push(h.clone());
        cache.cell_states.push(c.clone());

        let out_len = if self.return_sequences { seq_len } else { 1 };
        let mut output = Array3::zeros((batch_size, out_len, self.hidden_size));

        for t in 0..seq_len {
            let step = self.step(input.slice(s![.., t, ..]), &h, &c);
            h = step.h;
            c = step.c;
            if self.return_sequences {
                output.slice_mut(s![.., t, ..]).assign(&h);
            }
            cache.hidden_states.push(h.clone());
            cache.cell_states.push(c.clone());
            cache.input_gates.push(step.i);
            cache.forget_gates.push(step.f);
            cache.candidate_pre.push(step.g_pre);
            cache.candidates.push(step.g);
            cache.output_gates.push(step.o);
        }
        if !self.return_sequences {
            output.slice_mut(s![.., 0, ..]).assign(&h);
        }

        self.cache = Some(cache);
        output
    }

    /// Backpropagation through time.
    /// `output_grad` has the shape `forward_sequence` returned.
    pub fn backward_sequence(&self, output_grad: ArrayView3<f32>) -> LSTMGradients {
        let cache = self.cache.as_ref().expect("Forward pass must be called before backward");
        let (batch_size, seq_len, _) = cache.inputs.dim();
        let hs = self.hidden_size;

        let mut dw_x = Array2::zeros(self.w_x.raw_dim());
        let mut dw_h = Array2::zeros(self.w_h.raw_dim());
        let mut db = Array1::zeros(self.b.raw_dim());
        let mut dx = Array3::zeros((batch_size, seq_len, self.input_size));
        let mut dh_next = Array2::<f32>::zeros((batch_size, hs));
        let mut dc_next = Array2::<f32>::zeros((batch_size, hs));
        let mut dz = Array2::<f32>::zeros((batch_size, 4 * hs));

        for t in (0..seq_len).rev() {
            let mut dh = dh_next.clone();
            if self.return_sequences {
                dh += &output_grad.slice(s![.., t, ..]);
            } else if t == seq_len - 1 {
                dh += &output_grad.slice(s![.., 0, ..]);
            }

            let x_t = cache.inputs.slice(s![.., t, ..]);
            let h_prev = &cache.hidden_states[t];
            let c_prev = &cache.cell_states[t];
            let c_t = &cache.cell_states[t + 1];
            let i_t = &cache.input_gates[t];
            let f_t = &cache.forget_gates[t];
            let g_t = &cache.candidates[t];
            let o_t = &cache.output_gates[t];

            let mut c_act = c_t.clone();
            self.activation.apply(&mut c_act);
            let c_deriv = self.activation.derivative(c_t.view());

            let d_o = &dh * &c_act;
            let dc = &dh * o_t * &c_deriv + &dc_next;

            let d_i = &dc * g_t;
            let d_f = &dc * c_prev;
            let d_g = &dc * i_t;
            dc_next = &dc * f_t;

            dz.slice_mut(s![.., 0..hs]).assign(&(d_i * &gate_derivative(i_t)));
            dz.slice_mut(s![.., hs..2 * hs]).assign(&(d_f * &gate_derivative(f_t)));
            dz.slice_mut(s![.., 2 * hs..3 * hs])
                .assign(&(d_g * &self.activation.derivative(cache.candidate_pre[t].view())));
            dz.slice_mut(s![.., 3 * hs..4 * hs]).assign(&(d_o * &gate_derivative(o_t)));

            dw_x += &x_t.t().dot(&dz);
            dw_h += &h_prev.t().dot(&dz);
            db += &dz.sum_axis(Axis(0));

            dx.slice_mut(s![.., t, ..]).assign(&dz.dot(&self.w_x.t()));
            dh_next = dz.dot(&self.w_h.t());
        }

        LSTMGradients { dw_x, dw_h, db, dx }
    }
}

/// Sigmoid derivative expressed through the sigmoid output
fn gate_derivative(s: &Array2<f32>) -> Array2<f32> {
    s * &(1.0 - s)
}

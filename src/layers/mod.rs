pub mod bidirectional;
pub mod init;
pub mod lstm;
pub mod param;
pub mod rnn_output;

use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

pub use bidirectional::BidirectionalLstm;
pub use init::WeightInit;
pub use lstm::LstmLayer;
pub use param::Param;
pub use rnn_output::RnnOutputLayer;

/// One layer of a sequence network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Layer {
    Lstm(LstmLayer),
    Bidirectional(BidirectionalLstm),
    Output(RnnOutputLayer),
}

impl Layer {
    /// Forward pass over one `T x n_in` sample. `rng` enables dropout.
    pub fn forward(&mut self, input: &Matrix, rng: Option<&mut StdRng>) -> Matrix {
        match self {
            Layer::Lstm(l) => l.forward(input, rng),
            Layer::Bidirectional(l) => l.feed(input, rng),
            Layer::Output(l) => l.feed_from(input),
        }
    }

    /// Backward pass for the sample seen by the last `forward()`.
    pub fn backward(&mut self, grad_output: &Matrix) -> Matrix {
        match self {
            Layer::Lstm(l) => l.backward(grad_output),
            Layer::Bidirectional(l) => l.backprop(grad_output),
            Layer::Output(l) => l.backprop(grad_output),
        }
    }

    pub fn n_in(&self) -> usize {
        match self {
            Layer::Lstm(l) => l.n_in,
            Layer::Bidirectional(l) => l.n_in(),
            Layer::Output(l) => l.n_in,
        }
    }

    pub fn n_out(&self) -> usize {
        match self {
            Layer::Lstm(l) => l.n_out,
            Layer::Bidirectional(l) => l.n_out(),
            Layer::Output(l) => l.n_out,
        }
    }

    pub fn params(&self) -> Vec<&Param> {
        match self {
            Layer::Lstm(l) => l.params(),
            Layer::Bidirectional(l) => l.params(),
            Layer::Output(l) => l.params(),
        }
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        match self {
            Layer::Lstm(l) => l.params_mut(),
            Layer::Bidirectional(l) => l.params_mut(),
            Layer::Output(l) => l.params_mut(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Layer::Lstm(_) => "lstm",
            Layer::Bidirectional(_) => "bidirectional_lstm",
            Layer::Output(_) => "rnn_output",
        }
    }
}

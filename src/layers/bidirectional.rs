use rand::rngs::StdRng;
use serde::{Serialize, Deserialize};

use crate::layers::lstm::LstmLayer;
use crate::layers::param::Param;
use crate::math::matrix::Matrix;

/// Two independent LSTMs, one reading the sequence forwards and one reading
/// it backwards. Their hidden states are concatenated per time step, so the
/// output is `T x 2·n_out` with the forward half first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BidirectionalLstm {
    pub forward: LstmLayer,
    pub backward: LstmLayer,
}

impl BidirectionalLstm {
    pub fn new(forward: LstmLayer, backward: LstmLayer) -> BidirectionalLstm {
        assert_eq!(forward.n_in, backward.n_in);
        assert_eq!(forward.n_out, backward.n_out);
        BidirectionalLstm { forward, backward }
    }

    pub fn n_in(&self) -> usize {
        self.forward.n_in
    }

    pub fn n_out(&self) -> usize {
        self.forward.n_out * 2
    }

    pub fn feed(&mut self, input: &Matrix, mut rng: Option<&mut StdRng>) -> Matrix {
        let fwd = self.forward.forward(input, rng.as_deref_mut());
        let bwd = self.backward.forward(&input.reversed_rows(), rng);
        fwd.hstack(&bwd.reversed_rows())
    }

    pub fn backprop(&mut self, grad_output: &Matrix) -> Matrix {
        let h = self.forward.n_out;
        let grad_fwd = grad_output.columns(0, h);
        let grad_bwd = grad_output.columns(h, 2 * h).reversed_rows();

        let dx_fwd = self.forward.backward(&grad_fwd);
        let dx_bwd = self.backward.backward(&grad_bwd).reversed_rows();
        dx_fwd + dx_bwd
    }

    pub fn params(&self) -> Vec<&Param> {
        let mut p = self.forward.params();
        p.extend(self.backward.params());
        p
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        let mut p = self.forward.params_mut();
        p.extend(self.backward.params_mut());
        p
    }
}

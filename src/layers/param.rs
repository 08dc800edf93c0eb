use serde::{Serialize, Deserialize};

use crate::math::matrix::Matrix;

/// A trainable tensor together with its accumulated gradient.
///
/// Gradients are not persisted; call `zero_grad()` before accumulating into
/// a freshly loaded parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Param {
    pub value: Matrix,
    #[serde(skip)]
    pub grad: Matrix,
    /// Whether L2 regularisation applies (weights yes, biases no).
    pub regularize: bool,
}

impl Param {
    pub fn weight(value: Matrix) -> Param {
        let grad = Matrix::zeros(value.rows, value.cols);
        Param { value, grad, regularize: true }
    }

    pub fn bias(value: Matrix) -> Param {
        let grad = Matrix::zeros(value.rows, value.cols);
        Param { value, grad, regularize: false }
    }

    pub fn zero_grad(&mut self) {
        if self.grad.same_shape(&self.value) {
            self.grad.fill(0.0);
        } else {
            self.grad = Matrix::zeros(self.value.rows, self.value.cols);
        }
    }

    pub fn len(&self) -> usize {
        self.value.rows * self.value.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use serde::{Serialize, Deserialize};

use crate::layers::param::Param;
use crate::math::matrix::Matrix;
use crate::optim::adam::Adam;
use crate::optim::rmsprop::RmsProp;
use crate::optim::schedule::LearningRate;
use crate::optim::sgd::Sgd;

/// Applies one update to every trainable parameter from its accumulated
/// gradient. Parameters arrive in the same order on every call, so stateful
/// updaters index their moments by position.
pub trait Optimizer {
    fn step(&mut self, params: &mut [&mut Param], iteration: usize, epoch: usize);

    /// Learning rate in effect at the given counters.
    fn learning_rate(&self, iteration: usize, epoch: usize) -> f64;
}

/// Serializable choice of updater, stored in a network configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Updater {
    Sgd { learning_rate: LearningRate },
    Adam { learning_rate: LearningRate },
    RmsProp { learning_rate: LearningRate },
}

impl Updater {
    pub fn sgd(learning_rate: impl Into<LearningRate>) -> Updater {
        Updater::Sgd { learning_rate: learning_rate.into() }
    }

    pub fn adam(learning_rate: impl Into<LearningRate>) -> Updater {
        Updater::Adam { learning_rate: learning_rate.into() }
    }

    pub fn rms_prop(learning_rate: impl Into<LearningRate>) -> Updater {
        Updater::RmsProp { learning_rate: learning_rate.into() }
    }

    pub fn build(&self) -> Box<dyn Optimizer> {
        match self {
            Updater::Sgd { learning_rate } => Box::new(Sgd::new(learning_rate.clone())),
            Updater::Adam { learning_rate } => Box::new(Adam::new(learning_rate.clone())),
            Updater::RmsProp { learning_rate } => Box::new(RmsProp::new(learning_rate.clone())),
        }
    }
}

/// Sizes per-parameter state to match `params` on first use.
pub(crate) fn ensure_state(state: &mut Vec<Matrix>, params: &[&mut Param]) {
    let matches = state.len() == params.len()
        && state.iter().zip(params.iter()).all(|(s, p)| s.same_shape(&p.value));
    if !matches {
        *state = params.iter().map(|p| Matrix::zeros(p.value.rows, p.value.cols)).collect();
    }
}

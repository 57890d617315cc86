use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::Dense;
use crate::{Result, arch::activations::ActFn};

/// A layer of a `Sequential` model.
#[derive(Clone, Debug)]
pub enum Layer {
    Dense(Dense),
}

impl Layer {
    pub fn dense(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self::Dense(Dense::new(dim, act_fn))
    }

    pub fn size(&self) -> usize {
        match self {
            Self::Dense(l) => l.size(),
        }
    }

    pub fn init_params<R: Rng + ?Sized>(&self, rng: &mut R, params: &mut [f32]) -> Result<()> {
        match self {
            Self::Dense(l) => l.init_params(rng, params),
        }
    }

    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Self::Dense(l) => l.forward(params, x),
        }
    }

    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        d: Array2<f32>,
        index: usize,
    ) -> Result<Array2<f32>> {
        match self {
            Self::Dense(l) => l.backward(params, grad, d, index),
        }
    }

    pub fn is_regularized(&self) -> bool {
        match self {
            Self::Dense(l) => l.l2().is_some(),
        }
    }

    pub fn penalty(&self, params: &[f32]) -> Option<f32> {
        match self {
            Self::Dense(l) => l.penalty(params),
        }
    }

    pub fn accumulate_penalty_grad(&self, params: &[f32], grad: &mut [f32]) {
        match self {
            Self::Dense(l) => l.accumulate_penalty_grad(params, grad),
        }
    }
}

impl From<Dense> for Layer {
    fn from(value: Dense) -> Self {
        Self::Dense(value)
    }
}

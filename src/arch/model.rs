use ndarray::{Array2, ArrayView2};

use crate::Result;

/// The output of a model's forward pass.
///
/// Models with a single head produce `Single`, models with several heads produce `Multiple`
/// with one output per head, in head order.
#[derive(Debug, Clone, PartialEq)]
pub enum Prediction {
    Single(Array2<f32>),
    Multiple(Vec<Array2<f32>>),
}

impl Prediction {
    /// Views every output in the model's output order.
    pub fn outputs(&self) -> Vec<ArrayView2<'_, f32>> {
        match self {
            Prediction::Single(y) => vec![y.view()],
            Prediction::Multiple(ys) => ys.iter().map(|y| y.view()).collect(),
        }
    }

    /// The first output, the one metrics are computed over.
    pub fn primary(&self) -> Option<ArrayView2<'_, f32>> {
        match self {
            Prediction::Single(y) => Some(y.view()),
            Prediction::Multiple(ys) => ys.first().map(|y| y.view()),
        }
    }

    /// The amount of outputs.
    pub fn len(&self) -> usize {
        match self {
            Prediction::Single(_) => 1,
            Prediction::Multiple(ys) => ys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Extra loss terms a model contributes on its own (e.g. weight regularization), summed into
/// the optimized loss.
pub trait AuxiliaryLosses {
    /// Returns every auxiliary loss for the given parameters.
    fn losses(&self, params: &[f32]) -> Vec<f32>;

    /// Adds the gradient of the sum of `losses` to `grad`.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - The model's gradient, same length as `params`.
    fn accumulate_grad(&self, params: &[f32], grad: &mut [f32]) -> Result<()>;
}

pub trait Model {
    /// Returns the amount of parameters in the model.
    fn size(&self) -> usize;

    /// Makes a forward pass through the network, recording what `backward` needs.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input batch.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Prediction>;

    /// Computes the gradient of the loss with respect to the parameters of the model for the
    /// last forward pass. **`grad` gets overwritten**.
    ///
    /// # Arguments
    /// * `params` - The model's parameters, the same ones used on `forward`.
    /// * `grad` - A buffer for writing the computed gradient.
    /// * `d` - The derivative of the loss with respect to each output, in output order.
    fn backward(&mut self, params: &[f32], grad: &mut [f32], d: Vec<Array2<f32>>) -> Result<()>;

    /// The model's auxiliary losses, if it has any.
    fn auxiliary_losses(&self) -> Option<&dyn AuxiliaryLosses> {
        None
    }
}

impl<M: Model + ?Sized> Model for Box<M> {
    fn size(&self) -> usize {
        (**self).size()
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Prediction> {
        (**self).forward(params, x)
    }

    fn backward(&mut self, params: &[f32], grad: &mut [f32], d: Vec<Array2<f32>>) -> Result<()> {
        (**self).backward(params, grad, d)
    }

    fn auxiliary_losses(&self) -> Option<&dyn AuxiliaryLosses> {
        (**self).auxiliary_losses()
    }
}

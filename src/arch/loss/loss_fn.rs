use ndarray::{Array1, Array2, ArrayView2};

use crate::Result;

pub trait LossFn {
    /// Optional keyword arguments forwarded by the trainer on every call.
    type Args;

    /// Computes the loss of every example in the batch.
    ///
    /// # Arguments
    /// * `y` - The ground truth.
    /// * `outputs` - Every output of the model, in the model's output order.
    /// * `args` - The optional keyword arguments.
    ///
    /// # Returns
    /// One loss value per row of `y`.
    fn loss(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        args: Option<&Self::Args>,
    ) -> Result<Array1<f32>>;

    /// Computes the derivative of the batch loss (the mean of `loss`) with respect to each
    /// output.
    ///
    /// # Returns
    /// One derivative per output, each shaped as its output.
    fn loss_prime(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        args: Option<&Self::Args>,
    ) -> Result<Vec<Array2<f32>>>;
}

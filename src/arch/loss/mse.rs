use ndarray::{Array1, Array2, ArrayView2, Axis};

use super::{LossFn, single_output};
use crate::Result;

/// Mean squared error loss function.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    type Args = ();

    fn loss(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        _args: Option<&()>,
    ) -> Result<Array1<f32>> {
        let y_pred = single_output(y, outputs)?;

        let squared = (&y_pred - &y).mapv(|e| e.powi(2));
        Ok(squared
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(y.nrows())))
    }

    fn loss_prime(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        _args: Option<&()>,
    ) -> Result<Vec<Array2<f32>>> {
        let y_pred = single_output(y, outputs)?;

        let n = y_pred.len().max(1) as f32;
        Ok(vec![(&y_pred - &y) * (2.0 / n)])
    }
}

use ndarray::ArrayView2;

use crate::{Result, arch::Prediction};

/// A stateful metric, aggregated over every `update_state` call until `reset_state`.
pub trait Metric {
    /// Accumulates a batch.
    ///
    /// # Arguments
    /// * `y` - The ground truth.
    /// * `prediction` - The model's prediction, multi-output predictions are scored on their
    ///   first output.
    fn update_state(&mut self, y: ArrayView2<f32>, prediction: &Prediction) -> Result<()>;

    /// The aggregated value so far.
    fn result(&self) -> f32;

    fn reset_state(&mut self);
}

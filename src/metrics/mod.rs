mod accuracy;
mod metric;
mod regression;

pub use accuracy::BinaryAccuracy;
pub use metric::Metric;
pub use regression::{MeanAbsoluteError, MeanSquaredError};

use ndarray::ArrayView2;

use crate::{Result, TrainErr, arch::Prediction};

/// Picks the output a metric is computed over and checks it matches the ground truth.
fn scored_output<'p>(
    y: ArrayView2<f32>,
    prediction: &'p Prediction,
) -> Result<ArrayView2<'p, f32>> {
    let y_pred = prediction.primary().ok_or(TrainErr::SizeMismatch {
        what: "metric outputs",
        got: 0,
        expected: 1,
    })?;

    if y_pred.dim() != y.dim() {
        return Err(TrainErr::ShapeMismatch {
            what: "metric prediction",
            got: y_pred.dim(),
            expected: y.dim(),
        });
    }

    Ok(y_pred)
}

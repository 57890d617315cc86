mod huber;
mod loss_fn;
mod mse;
mod multi_output;

pub use huber::{Huber, HuberArgs};
pub use loss_fn::LossFn;
pub use mse::Mse;
pub use multi_output::{MultiOutput, MultiOutputArgs};

use ndarray::ArrayView2;

use crate::{Result, TrainErr};

/// Checks the loss got exactly one output and that it has the ground truth's shape.
pub(crate) fn single_output<'a>(
    y: ArrayView2<f32>,
    outputs: &[ArrayView2<'a, f32>],
) -> Result<ArrayView2<'a, f32>> {
    let [y_pred] = outputs else {
        return Err(TrainErr::SizeMismatch {
            what: "loss outputs",
            got: outputs.len(),
            expected: 1,
        });
    };

    if y_pred.dim() != y.dim() {
        return Err(TrainErr::ShapeMismatch {
            what: "prediction",
            got: y_pred.dim(),
            expected: y.dim(),
        });
    }

    Ok(y_pred.clone())
}

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::{LossFn, single_output};
use crate::{Result, TrainErr};

/// Keyword arguments of the `Huber` loss.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HuberArgs {
    /// Where the loss switches from quadratic to linear.
    pub delta: f32,
}

impl Default for HuberArgs {
    fn default() -> Self {
        Self { delta: 1.0 }
    }
}

/// Huber loss: quadratic for errors up to `delta`, linear past it.
#[derive(Debug, Default, Clone, Copy)]
pub struct Huber;

impl Huber {
    fn delta(args: Option<&HuberArgs>) -> Result<f32> {
        let delta = args.copied().unwrap_or_default().delta;
        if !(delta > 0.) {
            return Err(TrainErr::InvalidConfig(format!(
                "huber delta must be positive, got {delta}"
            )));
        }

        Ok(delta)
    }
}

impl LossFn for Huber {
    type Args = HuberArgs;

    fn loss(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        args: Option<&HuberArgs>,
    ) -> Result<Array1<f32>> {
        let y_pred = single_output(y, outputs)?;
        let delta = Self::delta(args)?;

        let losses = (&y_pred - &y).mapv(|e| {
            let abs = e.abs();
            if abs <= delta {
                0.5 * e * e
            } else {
                delta * (abs - 0.5 * delta)
            }
        });

        Ok(losses
            .mean_axis(Axis(1))
            .unwrap_or_else(|| Array1::zeros(y.nrows())))
    }

    fn loss_prime(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        args: Option<&HuberArgs>,
    ) -> Result<Vec<Array2<f32>>> {
        let y_pred = single_output(y, outputs)?;
        let delta = Self::delta(args)?;

        let n = y_pred.len().max(1) as f32;
        Ok(vec![(&y_pred - &y).mapv(|e| e.clamp(-delta, delta) / n)])
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn default_delta_is_one() {
        let y = array![[0.], [0.]];
        let y_pred = array![[0.5], [3.]];

        let loss = Huber.loss(y.view(), &[y_pred.view()], None).unwrap();

        assert_eq!(loss, array![0.125, 2.5]);
    }

    #[test]
    fn delta_is_forwarded() {
        let y = array![[0.], [0.]];
        let y_pred = array![[0.5], [3.]];
        let args = HuberArgs { delta: 4. };

        let loss = Huber.loss(y.view(), &[y_pred.view()], Some(&args)).unwrap();
        let d = Huber
            .loss_prime(y.view(), &[y_pred.view()], Some(&args))
            .unwrap();

        assert_eq!(loss, array![0.125, 4.5]);
        assert_eq!(d, vec![array![[0.25], [1.5]]]);
    }

    #[test]
    fn non_positive_delta_fails() {
        let y = array![[0.]];
        let args = HuberArgs { delta: 0. };

        let res = Huber.loss(y.view(), &[y.view()], Some(&args));

        assert!(matches!(res, Err(TrainErr::InvalidConfig(_))));
    }
}

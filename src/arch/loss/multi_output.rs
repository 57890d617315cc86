use ndarray::{Array1, Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use super::LossFn;
use crate::{Result, TrainErr};

/// Keyword arguments of the `MultiOutput` loss.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiOutputArgs<A> {
    /// One weight per output, every output weighs `1.0` when empty.
    #[serde(default)]
    pub weights: Vec<f32>,
    /// The arguments forwarded to the base loss for every output.
    #[serde(default)]
    pub base: Option<A>,
}

impl<A> Default for MultiOutputArgs<A> {
    fn default() -> Self {
        Self {
            weights: Vec::new(),
            base: None,
        }
    }
}

/// Compares the ground truth against every output of a multi-output model with a base loss
/// and adds up the weighted results.
#[derive(Debug, Default, Clone, Copy)]
pub struct MultiOutput<L: LossFn> {
    base: L,
}

impl<L: LossFn> MultiOutput<L> {
    /// Creates a new `MultiOutput` loss function.
    ///
    /// # Arguments
    /// * `base` - The loss applied between the ground truth and each output.
    pub fn new(base: L) -> Self {
        Self { base }
    }

    fn weights(&self, n: usize, args: Option<&MultiOutputArgs<L::Args>>) -> Result<Vec<f32>> {
        let weights = args.map_or(&[][..], |args| &args.weights[..]);

        match weights.len() {
            0 => Ok(vec![1.; n]),
            len if len == n => Ok(weights.to_vec()),
            len => Err(TrainErr::SizeMismatch {
                what: "loss weights",
                got: len,
                expected: n,
            }),
        }
    }
}

impl<L: LossFn> LossFn for MultiOutput<L> {
    type Args = MultiOutputArgs<L::Args>;

    fn loss(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        args: Option<&Self::Args>,
    ) -> Result<Array1<f32>> {
        let weights = self.weights(outputs.len(), args)?;
        let base_args = args.and_then(|args| args.base.as_ref());
        let mut total = Array1::zeros(y.nrows());

        for (output, w) in outputs.iter().zip(weights) {
            let loss = self.base.loss(y, std::slice::from_ref(output), base_args)?;
            total.scaled_add(w, &loss);
        }

        Ok(total)
    }

    fn loss_prime(
        &self,
        y: ArrayView2<f32>,
        outputs: &[ArrayView2<f32>],
        args: Option<&Self::Args>,
    ) -> Result<Vec<Array2<f32>>> {
        let weights = self.weights(outputs.len(), args)?;
        let base_args = args.and_then(|args| args.base.as_ref());

        outputs
            .iter()
            .zip(weights)
            .map(|(output, w)| {
                let mut d = self.base.loss_prime(y, std::slice::from_ref(output), base_args)?;
                let d = d.pop().ok_or(TrainErr::SizeMismatch {
                    what: "output deltas",
                    got: 0,
                    expected: 1,
                })?;
                Ok(d * w)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;
    use crate::arch::loss::{Huber, HuberArgs, Mse};

    #[test]
    fn outputs_are_weighted_and_summed() {
        let loss_fn = MultiOutput::new(Mse);
        let y = array![[0.], [0.]];
        let a = array![[1.], [2.]];
        let b = array![[3.], [0.]];
        let args = MultiOutputArgs {
            weights: vec![1., 0.5],
            base: None,
        };

        let loss = loss_fn.loss(y.view(), &[a.view(), b.view()], Some(&args)).unwrap();
        let d = loss_fn
            .loss_prime(y.view(), &[a.view(), b.view()], Some(&args))
            .unwrap();

        assert_eq!(loss, array![5.5, 4.]);
        assert_eq!(d, vec![array![[1.], [2.]], array![[1.5], [0.]]]);
    }

    #[test]
    fn wrong_weight_count_fails() {
        let loss_fn = MultiOutput::new(Mse);
        let y = array![[0.]];
        let args = MultiOutputArgs {
            weights: vec![1.],
            base: None,
        };

        let res = loss_fn.loss(y.view(), &[y.view(), y.view()], Some(&args));

        assert!(matches!(res, Err(TrainErr::SizeMismatch { what: "loss weights", .. })));
    }

    #[test]
    fn base_arguments_reach_every_output() {
        let loss_fn = MultiOutput::new(Huber);
        let y = array![[0.]];
        let a = array![[3.]];
        let b = array![[-0.5]];
        let args = MultiOutputArgs {
            weights: Vec::new(),
            base: Some(HuberArgs { delta: 2. }),
        };

        let loss = loss_fn.loss(y.view(), &[a.view(), b.view()], Some(&args)).unwrap();
        let d = loss_fn
            .loss_prime(y.view(), &[a.view(), b.view()], Some(&args))
            .unwrap();

        // 2 * (3 - 1) past delta plus 0.5 * 0.25 below it
        assert_eq!(loss, array![4.125]);
        assert_eq!(d, vec![array![[2.]], array![[-0.5]]]);
    }

    #[test]
    fn invalid_base_arguments_are_reported() {
        let loss_fn = MultiOutput::new(Huber);
        let y = array![[0.]];
        let args = MultiOutputArgs {
            weights: Vec::new(),
            base: Some(HuberArgs { delta: 0. }),
        };

        let res = loss_fn.loss(y.view(), &[y.view()], Some(&args));

        assert!(matches!(res, Err(TrainErr::InvalidConfig(_))));
    }
}

use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{AuxiliaryLosses, Model, Prediction, layers::Layer};
use crate::{Result, TrainErr};

/// A sequential model: information flows forward when computing an output and backward when
/// computing the *deltas* of its layers.
#[derive(Clone, Debug)]
pub struct Sequential {
    layers: Vec<Layer>,
}

impl Sequential {
    /// Creates a new `Sequential`.
    ///
    /// # Arguments
    /// * `layers` - The layers the sequential is composed of.
    ///
    /// # Returns
    /// A new `Sequential` instance.
    pub fn new<I>(layers: I) -> Self
    where
        I: IntoIterator<Item = Layer>,
    {
        Self {
            layers: layers.into_iter().collect(),
        }
    }

    /// Samples a fresh set of parameters following each layer's initializer.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    ///
    /// # Returns
    /// The model's parameters or an error if an initializer is invalid.
    pub fn init_params<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<f32>> {
        let mut params = vec![0.; self.size()];
        let mut rest = &mut params[..];

        for layer in &self.layers {
            let (chunk, tail) = std::mem::take(&mut rest).split_at_mut(layer.size());
            layer.init_params(rng, chunk)?;
            rest = tail;
        }

        Ok(params)
    }

    /// Makes a forward pass through the network.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `x` - The input data.
    ///
    /// # Returns
    /// The prediction for the given input or an error if occurred.
    pub fn predict(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        self.check_len("params", params.len())?;

        let mut a = x.to_owned();
        let mut rest = params;

        for layer in self.layers.iter_mut() {
            let (chunk, tail) = rest.split_at(layer.size());
            a = layer.forward(chunk, a.view())?;
            rest = tail;
        }

        Ok(a)
    }

    /// Backpropagates `d` through every layer, last to first.
    ///
    /// # Arguments
    /// * `params` - The model's parameters.
    /// * `grad` - The model's gradient, gets overwritten.
    /// * `d` - The derivative of the loss with respect to the model's output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to the model's input.
    pub(crate) fn backward_delta(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
    ) -> Result<Array2<f32>> {
        self.check_len("params", params.len())?;
        self.check_len("grad", grad.len())?;

        let mut params_rest = params;
        let mut grad_rest = grad;

        for (i, layer) in self.layers.iter_mut().enumerate().rev() {
            let at = params_rest.len() - layer.size();
            let (params_head, chunk) = params_rest.split_at(at);
            let (grad_head, grad_chunk) = std::mem::take(&mut grad_rest).split_at_mut(at);

            d = layer.backward(chunk, grad_chunk, d, i)?;

            params_rest = params_head;
            grad_rest = grad_head;
        }

        Ok(d)
    }

    fn check_len(&self, what: &'static str, got: usize) -> Result<()> {
        let expected = self.size();
        if got != expected {
            return Err(TrainErr::SizeMismatch {
                what,
                got,
                expected,
            });
        }

        Ok(())
    }
}

impl Model for Sequential {
    fn size(&self) -> usize {
        self.layers.iter().map(|layer| layer.size()).sum()
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Prediction> {
        self.predict(params, x).map(Prediction::Single)
    }

    fn backward(&mut self, params: &[f32], grad: &mut [f32], d: Vec<Array2<f32>>) -> Result<()> {
        let got = d.len();
        let Ok([d]) = <[Array2<f32>; 1]>::try_from(d) else {
            return Err(TrainErr::SizeMismatch {
                what: "output deltas",
                got,
                expected: 1,
            });
        };

        self.backward_delta(params, grad, d)?;
        Ok(())
    }

    fn auxiliary_losses(&self) -> Option<&dyn AuxiliaryLosses> {
        if self.layers.iter().any(|layer| layer.is_regularized()) {
            return Some(self);
        }

        None
    }
}

impl AuxiliaryLosses for Sequential {
    fn losses(&self, params: &[f32]) -> Vec<f32> {
        let mut rest = params;
        let mut losses = Vec::new();

        for layer in &self.layers {
            let (chunk, tail) = rest.split_at(layer.size().min(rest.len()));
            losses.extend(layer.penalty(chunk));
            rest = tail;
        }

        losses
    }

    fn accumulate_grad(&self, params: &[f32], grad: &mut [f32]) -> Result<()> {
        self.check_len("params", params.len())?;
        self.check_len("grad", grad.len())?;

        let mut params_rest = params;
        let mut grad_rest = grad;

        for layer in &self.layers {
            let (chunk, tail) = params_rest.split_at(layer.size());
            let (grad_chunk, grad_tail) = std::mem::take(&mut grad_rest).split_at_mut(layer.size());

            layer.accumulate_penalty_grad(chunk, grad_chunk);

            params_rest = tail;
            grad_rest = grad_tail;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::{activations::ActFn, layers::Dense};

    fn two_layers() -> Sequential {
        Sequential::new([
            Layer::dense((2, 3), Some(ActFn::sigmoid(1.))),
            Layer::dense((3, 1), None),
        ])
    }

    #[test]
    fn size_is_the_sum_of_the_layers() {
        assert_eq!(two_layers().size(), 9 + 4);
    }

    #[test]
    fn wrong_param_count_fails() {
        let mut model = two_layers();

        let res = model.forward(&[0.; 3], array![[1., 2.]].view());

        assert!(matches!(
            res,
            Err(TrainErr::SizeMismatch {
                what: "params",
                got: 3,
                expected: 13
            })
        ));
    }

    #[test]
    fn backward_gradient_matches_finite_differences() {
        let mut model = two_layers();
        let mut rng = StdRng::seed_from_u64(7);
        let params = model.init_params(&mut rng).unwrap();
        let x = array![[0.3, -0.2], [1.0, 0.5]];

        // loss = sum(y_pred), so d = ones
        let y = model.predict(&params, x.view()).unwrap();
        let mut grad = vec![0.; model.size()];
        model
            .backward(&params, &mut grad, vec![Array2::ones(y.dim())])
            .unwrap();

        let eps = 1e-3;
        for i in 0..params.len() {
            let mut plus = params.clone();
            plus[i] += eps;
            let mut minus = params.clone();
            minus[i] -= eps;

            let lp = model.predict(&plus, x.view()).unwrap().sum();
            let lm = model.predict(&minus, x.view()).unwrap().sum();
            let numeric = (lp - lm) / (2. * eps);

            assert!(
                (numeric - grad[i]).abs() < 1e-2,
                "param {i}: numeric {numeric} vs analytic {}",
                grad[i]
            );
        }
    }

    #[test]
    fn multiple_output_deltas_are_rejected() {
        let mut model = two_layers();
        let params = vec![0.; model.size()];
        let mut grad = vec![0.; model.size()];
        model.forward(&params, array![[1., 2.]].view()).unwrap();

        let d = vec![Array2::zeros((1, 1)), Array2::zeros((1, 1))];
        let res = model.backward(&params, &mut grad, d);

        assert!(matches!(res, Err(TrainErr::SizeMismatch { got: 2, .. })));
    }

    #[test]
    fn only_regularized_models_expose_auxiliary_losses() {
        assert!(two_layers().auxiliary_losses().is_none());

        let model = Sequential::new([
            Layer::from(Dense::new((1, 1), None).with_l2(0.1)),
            Layer::dense((1, 1), None),
        ]);
        let aux = model.auxiliary_losses().unwrap();
        let params = [2., 5., 3., 7.];

        let losses = aux.losses(&params);
        assert_eq!(losses.len(), 1);
        assert!((losses[0] - 0.4).abs() < 1e-6);

        let mut grad = [1.; 4];
        aux.accumulate_grad(&params, &mut grad).unwrap();
        assert!((grad[0] - 1.4).abs() < 1e-6);
        assert_eq!(&grad[1..], &[1., 1., 1.]);
    }
}

use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, linalg};
use rand::Rng;

use crate::{
    Result, TrainErr,
    arch::{activations::ActFn, init::ParamInit},
};

/// A fully connected layer, `a = act_fn(x · w + b)`.
///
/// Its parameters are laid out as the row-major `(in, out)` weights followed by the `out`
/// biases.
#[derive(Clone, Debug)]
pub struct Dense {
    dim: (usize, usize),
    act_fn: Option<ActFn>,
    init: ParamInit,
    l2: Option<f32>,
    size: usize,

    // Forward metadata
    x: Option<Array2<f32>>,
    z: Option<Array2<f32>>,
}

impl Dense {
    /// Creates a new `Dense` layer.
    ///
    /// # Arguments
    /// * `dim` - The input and output dimensions of the layer.
    /// * `act_fn` - An optional activation function.
    ///
    /// # Returns
    /// A new `Dense` instance.
    pub fn new(dim: (usize, usize), act_fn: Option<ActFn>) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
            act_fn,
            init: ParamInit::default(),
            l2: None,
            x: None,
            z: None,
        }
    }

    /// Sets the initializer used by `init_params` for the weights.
    pub fn with_init(mut self, init: ParamInit) -> Self {
        self.init = init;
        self
    }

    /// Adds an L2 penalty `l2 * sum(w^2)` over the weights (not the biases) to the model's
    /// auxiliary losses.
    pub fn with_l2(mut self, l2: f32) -> Self {
        self.l2 = Some(l2);
        self
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn l2(&self) -> Option<f32> {
        self.l2
    }

    /// Writes this layer's initial parameters into `params`.
    pub fn init_params<R: Rng + ?Sized>(&self, rng: &mut R, params: &mut [f32]) -> Result<()> {
        let (w, b) = params.split_at_mut(self.w_size());
        self.init.fill(rng, w, self.dim.0, self.dim.1)?;
        b.fill(0.);
        Ok(())
    }

    /// Makes a forward pass through the layer, keeping what `backward` needs.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `x` - The input batch, one row per example.
    ///
    /// # Returns
    /// The layer's activations or an error if `x` has the wrong amount of columns.
    pub fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        if x.ncols() != self.dim.0 {
            return Err(TrainErr::ShapeMismatch {
                what: "dense input",
                got: x.dim(),
                expected: (x.nrows(), self.dim.0),
            });
        }

        let (w, b) = self.view_params(params);
        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;

        let a = match &self.act_fn {
            Some(act_fn) => z.mapv(|z| act_fn.f(z)),
            None => z.clone(),
        };

        self.x = Some(x.to_owned());
        self.z = Some(z);
        Ok(a)
    }

    /// Makes a backward pass through the layer, overwriting its gradient.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `grad` - This layer's gradient slice.
    /// * `d` - The derivative of the loss with respect to this layer's activations.
    /// * `layer` - The index of this layer in its model, used for error reporting.
    ///
    /// # Returns
    /// The derivative of the loss with respect to this layer's input.
    pub fn backward(
        &mut self,
        params: &[f32],
        grad: &mut [f32],
        mut d: Array2<f32>,
        layer: usize,
    ) -> Result<Array2<f32>> {
        let (Some(x), Some(z)) = (self.x.take(), self.z.take()) else {
            return Err(TrainErr::MissingForward { layer });
        };

        if d.dim() != z.dim() {
            return Err(TrainErr::ShapeMismatch {
                what: "dense output delta",
                got: d.dim(),
                expected: z.dim(),
            });
        }

        if let Some(act_fn) = &self.act_fn {
            d.zip_mut_with(&z, |d, &z| *d *= act_fn.df(z));
        }

        let (mut dw, mut db) = self.view_grad(grad);
        linalg::general_mat_mul(1.0, &x.t(), &d, 0.0, &mut dw);
        db.assign(&d.sum_axis(Axis(0)));

        let (w, _) = self.view_params(params);
        Ok(d.dot(&w.t()))
    }

    /// The L2 penalty of this layer's weights, if it is regularized.
    pub fn penalty(&self, params: &[f32]) -> Option<f32> {
        let l2 = self.l2?;
        let (w, _) = self.view_params(params);
        Some(l2 * w.mapv(|w| w.powi(2)).sum())
    }

    /// Adds the gradient of this layer's L2 penalty to `grad`.
    pub fn accumulate_penalty_grad(&self, params: &[f32], grad: &mut [f32]) {
        let Some(l2) = self.l2 else {
            return;
        };

        let w_size = self.w_size();
        for (g, w) in grad[..w_size].iter_mut().zip(&params[..w_size]) {
            *g += 2. * l2 * w;
        }
    }

    fn w_size(&self) -> usize {
        self.size - self.dim.1
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    ///
    /// # Arguments
    /// * `grad` - A gradient slice.
    ///
    /// # Returns
    /// A tuple containing the delta weights and delta biases.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> (ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>) {
        let (dw_raw, db_raw) = grad.split_at_mut(self.w_size());
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw).unwrap();
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw).unwrap();
        (dw, db)
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    ///
    /// # Arguments
    /// * `params` - A slice of parameters.
    ///
    /// # Returns
    /// A tuple containing the weights and biases.
    fn view_params<'a>(&self, params: &'a [f32]) -> (ArrayView2<'a, f32>, ArrayView1<'a, f32>) {
        let (w_raw, b_raw) = params.split_at(self.w_size());
        let weights = ArrayView2::from_shape(self.dim, w_raw).unwrap();
        let biases = ArrayView1::from_shape(self.dim.1, b_raw).unwrap();
        (weights, biases)
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn forward_is_affine_without_activation() {
        let mut dense = Dense::new((2, 1), None);
        let params = [2., 3., 1.];

        let a = dense.forward(&params, array![[1., 1.], [0., 2.]].view()).unwrap();

        assert_eq!(a, array![[6.], [7.]]);
    }

    #[test]
    fn backward_matches_hand_computed_gradient() {
        let mut dense = Dense::new((2, 1), None);
        let params = [2., 3., 1.];
        let mut grad = [0.; 3];

        dense.forward(&params, array![[1., 2.]].view()).unwrap();
        let dx = dense
            .backward(&params, &mut grad, array![[0.5]], 0)
            .unwrap();

        assert_eq!(grad, [0.5, 1.0, 0.5]);
        assert_eq!(dx, array![[1.0, 1.5]]);
    }

    #[test]
    fn backward_without_forward_fails() {
        let mut dense = Dense::new((2, 1), None);
        let mut grad = [0.; 3];

        let res = dense.backward(&[0.; 3], &mut grad, array![[1.]], 3);

        assert!(matches!(res, Err(TrainErr::MissingForward { layer: 3 })));
    }

    #[test]
    fn wrong_input_width_fails() {
        let mut dense = Dense::new((3, 1), None);

        let res = dense.forward(&[0.; 4], array![[1., 2.]].view());

        assert!(matches!(res, Err(TrainErr::ShapeMismatch { .. })));
    }

    #[test]
    fn penalty_only_covers_weights() {
        let dense = Dense::new((2, 1), None).with_l2(0.5);
        let params = [1., 2., 10.];
        let mut grad = [0.; 3];

        dense.accumulate_penalty_grad(&params, &mut grad);

        assert_eq!(dense.penalty(&params), Some(2.5));
        assert_eq!(grad, [1., 2., 0.]);
    }
}

use super::{Optimizer, check_sizes};
use crate::Result;

/// Adam, with the moment estimates bias corrected through the step count.
#[derive(Debug)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    steps: i32,
    first_moment: Box<[f32]>,
    second_moment: Box<[f32]>,
}

impl Adam {
    pub const DEFAULT_LEARNING_RATE: f32 = 1e-3;
    pub const DEFAULT_BETA1: f32 = 0.9;
    pub const DEFAULT_BETA2: f32 = 0.999;
    pub const DEFAULT_EPSILON: f32 = 1e-7;

    /// Creates a new `Adam` optimizer.
    ///
    /// # Arguments
    /// * `len` - The amount of parameters this instance should hold.
    /// * `learning_rate` - The small coefficient that modulates the amount of training per update.
    /// * `beta1`, `beta2` - The decay rates of the first and second moment estimates.
    /// * `epsilon` - Keeps the update finite where the second moment is zero.
    ///
    /// # Returns
    /// A new `Adam` instance.
    pub fn new(len: usize, learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            steps: 0,
            first_moment: vec![0.; len].into_boxed_slice(),
            second_moment: vec![0.; len].into_boxed_slice(),
        }
    }

    /// Creates a new `Adam` optimizer with the default hyperparameters, a learning rate of
    /// `1e-3`, `beta1 = 0.9`, `beta2 = 0.999` and `epsilon = 1e-7`.
    pub fn with_defaults(len: usize) -> Self {
        Self::new(
            len,
            Self::DEFAULT_LEARNING_RATE,
            Self::DEFAULT_BETA1,
            Self::DEFAULT_BETA2,
            Self::DEFAULT_EPSILON,
        )
    }

    /// The amount of updates applied so far.
    pub fn steps(&self) -> usize {
        self.steps as usize
    }
}

impl Optimizer for Adam {
    fn update_params(&mut self, grad: &[f32], params: &mut [f32]) -> Result<()> {
        check_sizes(grad, params)?;
        check_sizes(&self.first_moment, params)?;

        self.steps += 1;
        let t = self.steps;
        let (beta1, beta2, eps) = (self.beta1, self.beta2, self.epsilon);
        let lr_t = self.learning_rate * (1. - beta2.powi(t)).sqrt() / (1. - beta1.powi(t));

        for (i, p) in params.iter_mut().enumerate() {
            let g = grad[i];
            let m = &mut self.first_moment[i];
            let v = &mut self.second_moment[i];

            *m += (1. - beta1) * (g - *m);
            *v += (1. - beta2) * (g * g - *v);
            *p -= lr_t * *m / (v.sqrt() + eps);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_step_moves_by_the_learning_rate() {
        let mut optimizer = Adam::with_defaults(2);
        let mut params = [1., 1.];

        optimizer.update_params(&[0.5, -3.], &mut params).unwrap();

        assert!((params[0] - (1. - 1e-3)).abs() < 1e-5);
        assert!((params[1] - (1. + 1e-3)).abs() < 1e-5);
    }

    #[test]
    fn counts_every_applied_step() {
        let mut optimizer = Adam::with_defaults(1);
        let mut params = [0.];

        for _ in 0..3 {
            optimizer.update_params(&[1.], &mut params).unwrap();
        }
        assert!(optimizer.update_params(&[1., 1.], &mut params).is_err());

        // a constant gradient keeps every bias corrected step at the learning rate
        assert_eq!(optimizer.steps(), 3);
        assert!((params[0] + 3e-3).abs() < 1e-5);
    }
}

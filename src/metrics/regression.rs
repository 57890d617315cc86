use ndarray::ArrayView2;

use super::{Metric, scored_output};
use crate::{Result, arch::Prediction};

/// Running mean of the squared error over every element seen.
#[derive(Debug, Default, Clone)]
pub struct MeanSquaredError {
    total: f64,
    count: usize,
}

impl MeanSquaredError {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Metric for MeanSquaredError {
    fn update_state(&mut self, y: ArrayView2<f32>, prediction: &Prediction) -> Result<()> {
        let y_pred = scored_output(y, prediction)?;

        self.total += (&y_pred - &y).mapv(|e| (e as f64).powi(2)).sum();
        self.count += y.len();
        Ok(())
    }

    fn result(&self) -> f32 {
        if self.count == 0 {
            return 0.;
        }

        (self.total / self.count as f64) as f32
    }

    fn reset_state(&mut self) {
        *self = Self::default();
    }
}

/// Running mean of the absolute error over every element seen.
#[derive(Debug, Default, Clone)]
pub struct MeanAbsoluteError {
    total: f64,
    count: usize,
}

impl MeanAbsoluteError {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Metric for MeanAbsoluteError {
    fn update_state(&mut self, y: ArrayView2<f32>, prediction: &Prediction) -> Result<()> {
        let y_pred = scored_output(y, prediction)?;

        self.total += (&y_pred - &y).mapv(|e| e.abs() as f64).sum();
        self.count += y.len();
        Ok(())
    }

    fn result(&self) -> f32 {
        if self.count == 0 {
            return 0.;
        }

        (self.total / self.count as f64) as f32
    }

    fn reset_state(&mut self) {
        *self = Self::default();
    }
}

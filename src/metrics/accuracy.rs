use ndarray::{ArrayView2, Zip};

use super::{Metric, scored_output};
use crate::{Result, arch::Prediction};

/// Fraction of predictions that land on the same side of `threshold` as the ground truth.
#[derive(Debug, Clone)]
pub struct BinaryAccuracy {
    threshold: f32,
    correct: usize,
    count: usize,
}

impl BinaryAccuracy {
    pub fn new(threshold: f32) -> Self {
        Self {
            threshold,
            correct: 0,
            count: 0,
        }
    }
}

impl Default for BinaryAccuracy {
    fn default() -> Self {
        Self::new(0.5)
    }
}

impl Metric for BinaryAccuracy {
    fn update_state(&mut self, y: ArrayView2<f32>, prediction: &Prediction) -> Result<()> {
        let y_pred = scored_output(y, prediction)?;
        let t = self.threshold;

        self.correct += Zip::from(&y_pred)
            .and(&y)
            .fold(0, |acc, &p, &truth| acc + usize::from((p > t) == (truth > t)));
        self.count += y.len();
        Ok(())
    }

    fn result(&self) -> f32 {
        if self.count == 0 {
            return 0.;
        }

        self.correct as f32 / self.count as f32
    }

    fn reset_state(&mut self) {
        self.correct = 0;
        self.count = 0;
    }
}

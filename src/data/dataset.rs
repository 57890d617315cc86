use std::num::NonZeroUsize;

use ndarray::ArrayView2;

use super::Batches;
use crate::{Result, TrainErr};

/// The training set: a feature matrix and, for supervised models, a label matrix, one row per
/// sample.
#[derive(Debug, Clone, Copy)]
pub struct Dataset<'a> {
    x: ArrayView2<'a, f32>,
    y: Option<ArrayView2<'a, f32>>,
}

impl<'a> Dataset<'a> {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `x` - The features.
    /// * `y` - The labels, `None` for unsupervised models.
    ///
    /// # Returns
    /// A new `Dataset` or an error if `x` and `y` have a different amount of rows.
    pub fn new(x: ArrayView2<'a, f32>, y: Option<ArrayView2<'a, f32>>) -> Result<Self> {
        let labels = y.map_or(x.nrows(), |y| y.nrows());
        if labels != x.nrows() {
            return Err(TrainErr::SizeMismatch {
                what: "label rows",
                got: labels,
                expected: x.nrows(),
            });
        }

        Ok(Self { x, y })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn is_supervised(&self) -> bool {
        self.y.is_some()
    }

    /// The amount of batches an epoch is split into, `ceil(len / batch_size)`.
    pub fn num_batches(&self, batch_size: NonZeroUsize) -> usize {
        self.len().div_ceil(batch_size.get())
    }

    #[inline]
    pub fn x(&self) -> ArrayView2<'a, f32> {
        self.x
    }

    #[inline]
    pub fn y(&self) -> Option<ArrayView2<'a, f32>> {
        self.y
    }

    /// Iterates the samples in `order` in batches of `batch_size`, the last one may be shorter.
    pub fn batches(&self, order: Vec<usize>, batch_size: NonZeroUsize) -> Batches<'a> {
        Batches::new(*self, order, batch_size)
    }
}

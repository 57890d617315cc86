use std::num::NonZeroUsize;

use ndarray::{Array2, ArrayView2, Axis};

use super::Dataset;

/// An owned mini-batch, the rows of `x` and `y` share the same ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub x: Array2<f32>,
    pub y: Option<Array2<f32>>,
}

impl Batch {
    /// The target the loss compares the prediction against: the labels for supervised
    /// datasets, the input itself otherwise.
    pub fn ground_truth(&self) -> ArrayView2<'_, f32> {
        self.y.as_ref().unwrap_or(&self.x).view()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Iterator over the batches of one epoch.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    dataset: Dataset<'a>,
    order: Vec<usize>,
    batch_size: usize,
    cursor: usize,
}

impl<'a> Batches<'a> {
    pub(super) fn new(dataset: Dataset<'a>, order: Vec<usize>, batch_size: NonZeroUsize) -> Self {
        Self {
            dataset,
            order,
            batch_size: batch_size.get(),
            cursor: 0,
        }
    }
}

impl Iterator for Batches<'_> {
    type Item = Batch;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.order.len() {
            return None;
        }

        let end = (self.cursor + self.batch_size).min(self.order.len());
        let rows = &self.order[self.cursor..end];
        self.cursor = end;

        Some(Batch {
            x: self.dataset.x().select(Axis(0), rows),
            y: self.dataset.y().map(|y| y.select(Axis(0), rows)),
        })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.order.len() - self.cursor).div_ceil(self.batch_size);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Batches<'_> {}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;

    fn batch_size(size: usize) -> NonZeroUsize {
        NonZeroUsize::new(size).unwrap()
    }

    #[test]
    fn batches_respect_order_and_size() {
        let x = array![[0.], [1.], [2.], [3.], [4.]];
        let y = array![[10.], [11.], [12.], [13.], [14.]];
        let dataset = Dataset::new(x.view(), Some(y.view())).unwrap();

        let mut batches = dataset.batches(vec![4, 0, 3, 1, 2], batch_size(2));
        assert_eq!(batches.len(), 3);

        let b1 = batches.next().unwrap();
        assert_eq!(b1.x, array![[4.], [0.]]);
        assert_eq!(b1.y, Some(array![[14.], [10.]]));

        let b2 = batches.next().unwrap();
        assert_eq!(b2.x, array![[3.], [1.]]);

        let b3 = batches.next().unwrap();
        assert_eq!(b3.len(), 1);
        assert_eq!(b3.ground_truth(), array![[12.]]);

        assert!(batches.next().is_none());
    }

    #[test]
    fn unsupervised_ground_truth_is_the_input() {
        let x = Array2::from_shape_fn((3, 2), |(i, j)| (i * 2 + j) as f32);
        let dataset = Dataset::new(x.view(), None).unwrap();

        for batch in dataset.batches(vec![2, 1, 0], batch_size(2)) {
            assert_eq!(batch.ground_truth(), batch.x.view());
        }
    }
}

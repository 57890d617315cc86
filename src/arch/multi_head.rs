use ndarray::{Array2, ArrayView2};
use rand::Rng;

use super::{AuxiliaryLosses, Model, Prediction, Sequential};
use crate::{Result, TrainErr};

/// A model with a shared trunk and several heads fed by the trunk's output.
///
/// Its prediction is always `Prediction::Multiple`, one output per head, in head order. The
/// parameters are laid out as the trunk's followed by each head's.
#[derive(Clone, Debug)]
pub struct MultiHead {
    trunk: Sequential,
    heads: Vec<Sequential>,
}

impl MultiHead {
    /// Creates a new `MultiHead`.
    ///
    /// # Arguments
    /// * `trunk` - The shared part of the network.
    /// * `heads` - The output heads.
    ///
    /// # Returns
    /// A new `MultiHead` instance.
    pub fn new<I>(trunk: Sequential, heads: I) -> Self
    where
        I: IntoIterator<Item = Sequential>,
    {
        Self {
            trunk,
            heads: heads.into_iter().collect(),
        }
    }

    pub fn init_params<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<f32>> {
        let mut params = self.trunk.init_params(rng)?;
        for head in &self.heads {
            params.extend(head.init_params(rng)?);
        }

        Ok(params)
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

    /// The `(start, end)` offsets of every part: trunk first, then each head.
    fn offsets(&self) -> Vec<(usize, usize)> {
        let sizes = std::iter::once(self.trunk.size()).chain(self.heads.iter().map(|h| h.size()));

        let mut start = 0;
        sizes
            .map(|size| {
                let range = (start, start + size);
                start += size;
                range
            })
            .collect()
    }
}

impl Model for MultiHead {
    fn size(&self) -> usize {
        self.trunk.size() + self.heads.iter().map(|h| h.size()).sum::<usize>()
    }

    fn forward(&mut self, params: &[f32], x: ArrayView2<f32>) -> Result<Prediction> {
        self.check_len("params", params.len())?;

        let offsets = self.offsets();
        let (start, end) = offsets[0];
        let h = self.trunk.predict(&params[start..end], x)?;

        let outputs = self
            .heads
            .iter_mut()
            .zip(&offsets[1..])
            .map(|(head, &(start, end))| head.predict(&params[start..end], h.view()))
            .collect::<Result<Vec<_>>>()?;

        Ok(Prediction::Multiple(outputs))
    }

    fn backward(&mut self, params: &[f32], grad: &mut [f32], d: Vec<Array2<f32>>) -> Result<()> {
        self.check_len("params", params.len())?;
        self.check_len("grad", grad.len())?;

        if d.len() != self.heads.len() {
            return Err(TrainErr::SizeMismatch {
                what: "output deltas",
                got: d.len(),
                expected: self.heads.len(),
            });
        }

        let offsets = self.offsets();
        let mut d_trunk: Option<Array2<f32>> = None;

        for ((head, &(start, end)), d) in self.heads.iter_mut().zip(&offsets[1..]).zip(d) {
            let dh = head.backward_delta(&params[start..end], &mut grad[start..end], d)?;
            match d_trunk.as_mut() {
                Some(acc) => *acc += &dh,
                None => d_trunk = Some(dh),
            }
        }

        let (start, end) = offsets[0];
        match d_trunk {
            Some(d) => {
                self.trunk
                    .backward_delta(&params[start..end], &mut grad[start..end], d)?;
            }
            None => grad[start..end].fill(0.),
        }

        Ok(())
    }

    fn auxiliary_losses(&self) -> Option<&dyn AuxiliaryLosses> {
        let regularized = std::iter::once(&self.trunk)
            .chain(&self.heads)
            .any(|part| part.auxiliary_losses().is_some());

        if regularized {
            return Some(self);
        }

        None
    }
}

impl AuxiliaryLosses for MultiHead {
    fn losses(&self, params: &[f32]) -> Vec<f32> {
        let parts = std::iter::once(&self.trunk).chain(&self.heads);

        parts
            .zip(self.offsets())
            .filter_map(|(part, (start, end))| {
                let aux = part.auxiliary_losses()?;
                Some(aux.losses(params.get(start..end)?))
            })
            .flatten()
            .collect()
    }

    fn accumulate_grad(&self, params: &[f32], grad: &mut [f32]) -> Result<()> {
        self.check_len("params", params.len())?;
        self.check_len("grad", grad.len())?;

        let parts = std::iter::once(&self.trunk).chain(&self.heads);
        for (part, (start, end)) in parts.zip(self.offsets()) {
            if let Some(aux) = part.auxiliary_losses() {
                aux.accumulate_grad(&params[start..end], &mut grad[start..end])?;
            }
        }

        Ok(())
    }
}

use ndarray::{Array1, ArrayView2};

use crate::arch::Prediction;

/// What an observer gets to see after every optimizer step.
#[derive(Debug)]
pub struct BatchLogs<'a> {
    pub epoch: usize,
    pub step: usize,
    /// The amount of samples in the batch, the last batch of an epoch may be short.
    pub batch_len: usize,
    /// The optimized loss of the batch: mean per-example loss plus the auxiliary losses.
    pub loss: f32,
    /// The per-example losses, padded up to the configured batch size with their mean. Only
    /// meant for display.
    pub loss_values: &'a Array1<f32>,
    /// Named extra values, the logged metric's current result.
    pub values: &'a [(String, f32)],
    pub ground_truth: ArrayView2<'a, f32>,
    pub prediction: &'a Prediction,
}

/// What an observer gets to see after the last batch of an epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct EpochLogs {
    pub epoch: usize,
    pub batches: usize,
    /// The mean of the batch losses, zero when the epoch had no batches.
    pub loss: f32,
    pub values: Vec<(String, f32)>,
}

/// Hooks into the training loop. Every method defaults to doing nothing.
pub trait TrainObserver {
    fn on_epoch_start(&mut self, _epoch: usize, _num_batches: usize) {}

    fn on_batch_end(&mut self, _logs: &BatchLogs<'_>) {}

    fn on_epoch_end(&mut self, _logs: &EpochLogs) {}
}

/// Keeps the logs of every finished epoch.
#[derive(Debug, Default, Clone)]
pub struct History {
    epochs: Vec<EpochLogs>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epochs(&self) -> &[EpochLogs] {
        &self.epochs
    }

    /// The loss of every epoch, in order.
    pub fn losses(&self) -> Vec<f32> {
        self.epochs.iter().map(|logs| logs.loss).collect()
    }
}

impl TrainObserver for History {
    fn on_epoch_end(&mut self, logs: &EpochLogs) {
        self.epochs.push(logs.clone());
    }
}

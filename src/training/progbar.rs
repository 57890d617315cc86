use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use ndarray::{Array1, s};

use super::observer::{BatchLogs, EpochLogs, TrainObserver};

const TEMPLATE: &str = "{prefix} [{bar:30}] {pos}/{len} - {elapsed_precise} - {msg}";

/// Running means of named values, in first seen order.
#[derive(Debug, Default, Clone)]
struct RunningMeans {
    values: Vec<(String, f64, usize)>,
}

impl RunningMeans {
    fn add(&mut self, name: &str, value: f32) {
        match self.values.iter_mut().find(|(n, ..)| n == name) {
            Some((_, sum, count)) => {
                *sum += value as f64;
                *count += 1;
            }
            None => self.values.push((name.to_string(), value as f64, 1)),
        }
    }

    fn means(&self) -> Vec<(String, f32)> {
        self.values
            .iter()
            .map(|(name, sum, count)| (name.clone(), (*sum / (*count).max(1) as f64) as f32))
            .collect()
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// A per-epoch progress bar advanced once per batch, showing the running mean of the loss and
/// of every logged value over the epoch.
#[derive(Debug)]
pub struct Progbar {
    hidden: bool,
    bar: Option<ProgressBar>,
    means: RunningMeans,
}

impl Progbar {
    /// Creates a new `Progbar` drawing to stderr.
    pub fn new() -> Self {
        Self {
            hidden: false,
            bar: None,
            means: RunningMeans::default(),
        }
    }

    /// Creates a new `Progbar` that keeps track of the values without drawing anything.
    #[cfg(test)]
    pub(crate) fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::new()
        }
    }

    /// The displayed `(name, running mean)` pairs, loss first.
    #[cfg(test)]
    pub(crate) fn means(&self) -> Vec<(String, f32)> {
        self.means.means()
    }

    /// The amount of batches the bar advanced this epoch.
    #[cfg(test)]
    pub(crate) fn position(&self) -> u64 {
        self.bar.as_ref().map_or(0, |bar| bar.position())
    }

    fn message(&self) -> String {
        self.means
            .means()
            .iter()
            .map(|(name, value)| format!("{name}: {value:.4}"))
            .collect::<Vec<_>>()
            .join(" - ")
    }
}

impl Default for Progbar {
    fn default() -> Self {
        Self::new()
    }
}

impl TrainObserver for Progbar {
    fn on_epoch_start(&mut self, epoch: usize, num_batches: usize) {
        let target = if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        };

        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>.");

        let bar = ProgressBar::with_draw_target(Some(num_batches as u64), target);
        bar.set_style(style);
        bar.set_prefix(format!("epoch {}", epoch + 1));

        self.means.clear();
        self.bar = Some(bar);
    }

    fn on_batch_end(&mut self, logs: &BatchLogs<'_>) {
        let loss = logs.loss_values.mean().unwrap_or(logs.loss);
        self.means.add("loss", loss);
        for (name, value) in logs.values {
            self.means.add(name, *value);
        }

        let message = self.message();
        if let Some(bar) = &self.bar {
            bar.set_message(message);
            bar.inc(1);
        }
    }

    fn on_epoch_end(&mut self, _logs: &EpochLogs) {
        if let Some(bar) = &self.bar {
            bar.finish();
        }
    }
}

/// Pads the per-example losses of a short batch up to `batch_size` by repeating their mean, so
/// every displayed loss vector has the same length. The padded vector has the same mean.
pub(crate) fn pad_loss_values(losses: &Array1<f32>, batch_size: usize) -> Array1<f32> {
    let len = losses.len();
    if len == 0 || len >= batch_size {
        return losses.clone();
    }

    let mean = losses.mean().unwrap_or_default();
    let mut padded = Array1::from_elem(batch_size, mean);
    padded.slice_mut(s![..len]).assign(losses);
    padded
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, array};

    use super::*;
    use crate::arch::Prediction;

    #[test]
    fn short_batches_are_padded_with_their_mean() {
        let padded = pad_loss_values(&array![1., 2., 6.], 5);

        assert_eq!(padded, array![1., 2., 6., 3., 3.]);
    }

    #[test]
    fn full_batches_are_untouched() {
        let losses = array![1., 2.];

        assert_eq!(pad_loss_values(&losses, 2), losses);
    }

    #[test]
    fn displays_running_means_over_the_epoch() {
        let mut bar = Progbar::hidden();
        let y = Array2::<f32>::zeros((1, 1));
        let prediction = Prediction::Single(y.clone());

        bar.on_epoch_start(0, 2);
        for (loss, mae) in [(4., 1.), (2., 3.)] {
            let losses = array![loss, loss];
            let values = [("mae".to_string(), mae)];
            bar.on_batch_end(&BatchLogs {
                epoch: 0,
                step: 0,
                batch_len: 2,
                loss,
                loss_values: &losses,
                values: &values,
                ground_truth: y.view(),
                prediction: &prediction,
            });
        }

        assert_eq!(bar.position(), 2);
        assert_eq!(
            bar.means(),
            vec![("loss".to_string(), 3.), ("mae".to_string(), 2.)]
        );

        bar.on_epoch_start(1, 2);
        assert!(bar.means().is_empty());
    }
}

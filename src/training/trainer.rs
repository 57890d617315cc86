use log::{debug, info, trace};
use ndarray::{Array1, ArrayView2};
use rand::rngs::StdRng;

use super::{
    config::TrainConfig,
    observer::{BatchLogs, EpochLogs, TrainObserver},
    progbar::{Progbar, pad_loss_values},
};
use crate::{
    Result, TrainErr,
    arch::{Model, Prediction, loss::LossFn},
    data::{Batch, Dataset, shuffle_indices},
    metrics::Metric,
    optimization::Optimizer,
};

/// What a single optimizer step leaves behind for reporting.
struct Step {
    loss: f32,
    losses: Array1<f32>,
    prediction: Prediction,
}

/// Mini-batch gradient descent over a model's flat parameters.
///
/// A `Trainer` owns the shuffling rng and borrows the logged metric and the observers for its
/// lifetime, so their state can be read back once training returns.
pub struct Trainer<'a> {
    config: TrainConfig,
    rng: StdRng,
    log_metric: Option<(&'a str, &'a mut dyn Metric)>,
    observers: Vec<&'a mut dyn TrainObserver>,
}

impl<'a> Trainer<'a> {
    /// Creates a new `Trainer`.
    ///
    /// # Arguments
    /// * `config` - The hyperparameters of the run.
    ///
    /// # Returns
    /// A new `Trainer` with no metric and no observers.
    pub fn new(config: TrainConfig) -> Self {
        Self {
            rng: config.rng(),
            config,
            log_metric: None,
            observers: Vec::new(),
        }
    }

    /// Updates `metric` with every batch of a verbose run and reports its result under `name`.
    /// Silent runs leave it untouched.
    pub fn with_metric(mut self, name: &'a str, metric: &'a mut dyn Metric) -> Self {
        self.log_metric = Some((name, metric));
        self
    }

    /// Attaches an observer, notified after the progress bar in attach order.
    pub fn with_observer(mut self, observer: &'a mut dyn TrainObserver) -> Self {
        self.observers.push(observer);
        self
    }

    /// Trains `model` for the configured amount of epochs, updating `params` in place.
    ///
    /// # Arguments
    /// * `model` - The model being trained.
    /// * `params` - The model's parameters.
    /// * `loss_fn` - The loss to minimize.
    /// * `loss_fn_args` - Extra arguments forwarded to every `loss_fn` call.
    /// * `optimizer` - Applies the gradient of every batch to `params`.
    /// * `x_train` - The training samples, one per row.
    /// * `y_train` - The labels, one row per sample. Without them the samples are their own
    ///   ground truth.
    ///
    /// # Returns
    /// An error if any of the model, loss, metric or optimizer fails, in which case `params`
    /// keep the updates of every finished step.
    #[allow(clippy::too_many_arguments)]
    pub fn train<M, L, O>(
        &mut self,
        model: &mut M,
        params: &mut [f32],
        loss_fn: &L,
        loss_fn_args: Option<&L::Args>,
        optimizer: &mut O,
        x_train: ArrayView2<f32>,
        y_train: Option<ArrayView2<f32>>,
    ) -> Result<()>
    where
        M: Model + ?Sized,
        L: LossFn,
        O: Optimizer + ?Sized,
    {
        let size = model.size();
        if params.len() != size {
            return Err(TrainErr::SizeMismatch {
                what: "params",
                got: params.len(),
                expected: size,
            });
        }

        let dataset = Dataset::new(x_train, y_train)?;
        let batch_size = self.config.batch_size;
        let num_batches = dataset.num_batches(batch_size);
        let mut grad = vec![0.; size];
        let verbose = self.config.verbose;
        let mut progbar = verbose.then(Progbar::new);

        info!(
            samples = dataset.len(),
            supervised = dataset.is_supervised(),
            epochs = self.config.epochs,
            batches = num_batches;
            "training started"
        );

        for epoch in 0..self.config.epochs {
            notify(&mut progbar, &mut self.observers, |o| {
                o.on_epoch_start(epoch, num_batches)
            });

            let order = shuffle_indices(dataset.len(), self.config.buffer_size, &mut self.rng);
            let mut loss_sum = 0.;
            let mut values = Vec::new();

            for (step, batch) in dataset.batches(order, batch_size).enumerate() {
                let Step {
                    loss,
                    losses,
                    prediction,
                } = optimize_batch(
                    model,
                    params,
                    &mut grad,
                    loss_fn,
                    loss_fn_args,
                    optimizer,
                    &batch,
                )?;

                let ground_truth = batch.ground_truth();
                loss_sum += loss;
                values.clear();

                // the metric only follows the run while progress is displayed
                if let Some((name, metric)) = self.log_metric.as_mut().filter(|_| verbose) {
                    metric.update_state(ground_truth, &prediction)?;
                    values.push((name.to_string(), metric.result()));
                }

                trace!(epoch = epoch, step = step, loss = loss; "batch finished");

                let loss_values = pad_loss_values(&losses, batch_size.get());
                let logs = BatchLogs {
                    epoch,
                    step,
                    batch_len: batch.len(),
                    loss,
                    loss_values: &loss_values,
                    values: &values,
                    ground_truth,
                    prediction: &prediction,
                };
                notify(&mut progbar, &mut self.observers, |o| o.on_batch_end(&logs));
            }

            let loss = if num_batches == 0 {
                0.
            } else {
                loss_sum / num_batches as f32
            };

            debug!(epoch = epoch, batches = num_batches, loss = loss; "epoch finished");

            let logs = EpochLogs {
                epoch,
                batches: num_batches,
                loss,
                values,
            };
            notify(&mut progbar, &mut self.observers, |o| o.on_epoch_end(&logs));
        }

        info!(epochs = self.config.epochs; "training finished");
        Ok(())
    }
}

/// Runs one forward pass, backward pass and optimizer step over `batch`.
fn optimize_batch<M, L, O>(
    model: &mut M,
    params: &mut [f32],
    grad: &mut [f32],
    loss_fn: &L,
    loss_fn_args: Option<&L::Args>,
    optimizer: &mut O,
    batch: &Batch,
) -> Result<Step>
where
    M: Model + ?Sized,
    L: LossFn,
    O: Optimizer + ?Sized,
{
    let ground_truth = batch.ground_truth();
    let prediction = model.forward(params, batch.x.view())?;

    let (mut losses, d) = {
        let outputs = prediction.outputs();
        let losses = loss_fn.loss(ground_truth, &outputs, loss_fn_args)?;
        (losses, loss_fn.loss_prime(ground_truth, &outputs, loss_fn_args)?)
    };
    model.backward(params, grad, d)?;

    if let Some(aux) = model.auxiliary_losses() {
        let extra: f32 = aux.losses(params).iter().sum();
        losses += extra;
        aux.accumulate_grad(params, grad)?;
    }

    optimizer.update_params(grad, params)?;

    Ok(Step {
        loss: losses.mean().unwrap_or_default(),
        losses,
        prediction,
    })
}

/// Sends an event to the progress bar first and then to every observer.
fn notify<F>(progbar: &mut Option<Progbar>, observers: &mut [&mut dyn TrainObserver], mut event: F)
where
    F: FnMut(&mut dyn TrainObserver),
{
    if let Some(progbar) = progbar {
        event(progbar);
    }

    for observer in observers.iter_mut() {
        event(&mut **observer);
    }
}

/// Trains `model` once with `config`, without any observers beyond the progress bar.
///
/// # Arguments
/// * `model` - The model being trained.
/// * `params` - The model's parameters, updated in place.
/// * `loss_fn` - The loss to minimize.
/// * `x_train` - The training samples, one per row.
/// * `y_train` - The labels. Without them the samples are their own ground truth.
/// * `optimizer` - Applies the gradient of every batch to `params`.
/// * `loss_fn_args` - Extra arguments forwarded to every `loss_fn` call.
/// * `config` - The hyperparameters of the run.
/// * `log_metric` - A named metric updated with every batch of a verbose run and shown next to
///   the loss.
#[allow(clippy::too_many_arguments)]
pub fn train<'a, M, L, O>(
    model: &mut M,
    params: &mut [f32],
    loss_fn: &L,
    x_train: ArrayView2<f32>,
    y_train: Option<ArrayView2<f32>>,
    optimizer: &mut O,
    loss_fn_args: Option<&L::Args>,
    config: &TrainConfig,
    log_metric: Option<(&'a str, &'a mut dyn Metric)>,
) -> Result<()>
where
    M: Model + ?Sized,
    L: LossFn,
    O: Optimizer + ?Sized,
{
    let mut trainer = Trainer::new(config.clone());
    if let Some((name, metric)) = log_metric {
        trainer = trainer.with_metric(name, metric);
    }

    trainer.train(model, params, loss_fn, loss_fn_args, optimizer, x_train, y_train)
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use ndarray::{Array2, array};

    use super::*;
    use crate::{
        arch::{Sequential, layers::Layer, loss::Mse},
        metrics::MeanAbsoluteError,
        optimization::GradientDescent,
        training::History,
    };

    fn config(epochs: usize, batch_size: usize) -> TrainConfig {
        TrainConfig {
            epochs,
            batch_size: NonZeroUsize::new(batch_size).unwrap(),
            verbose: false,
            seed: Some(42),
            ..Default::default()
        }
    }

    #[test]
    fn linear_fit_decreases_loss() {
        let mut model = Sequential::new([Layer::dense((1, 1), None)]);
        let mut params = vec![0., 0.];
        let x = array![[0.], [1.], [2.], [3.]];
        let y = x.mapv(|v| 2. * v + 1.);
        let mut history = History::new();

        Trainer::new(config(50, 2))
            .with_observer(&mut history)
            .train(
                &mut model,
                &mut params,
                &Mse,
                None,
                &mut GradientDescent::new(0.05),
                x.view(),
                Some(y.view()),
            )
            .unwrap();

        let losses = history.losses();
        assert_eq!(losses.len(), 50);
        assert!(losses[49] < losses[0] * 0.1);
        assert!((params[0] - 2.).abs() < 0.3);
    }

    #[test]
    fn metric_is_reported_to_observers() {
        let mut model = Sequential::new([Layer::dense((1, 1), None)]);
        let mut params = vec![1., 0.];
        let x = array![[1.], [2.]];
        let mut mae = MeanAbsoluteError::new();
        let mut history = History::new();

        let config = TrainConfig {
            verbose: true,
            ..config(1, 2)
        };

        Trainer::new(config)
            .with_metric("mae", &mut mae)
            .with_observer(&mut history)
            .train(
                &mut model,
                &mut params,
                &Mse,
                None,
                &mut GradientDescent::new(0.1),
                x.view(),
                None,
            )
            .unwrap();

        // the identity reconstructs its input exactly
        let logs = &history.epochs()[0];
        assert_eq!(logs.values, vec![("mae".to_string(), 0.)]);
        assert_eq!(logs.loss, 0.);
        assert_eq!(params, vec![1., 0.]);
    }

    #[test]
    fn wrong_param_count_fails_before_training() {
        let mut model = Sequential::new([Layer::dense((1, 1), None)]);
        let mut params = vec![0.; 3];
        let x = Array2::zeros((2, 1));

        let res = train(
            &mut model,
            &mut params,
            &Mse,
            x.view(),
            None,
            &mut GradientDescent::new(0.1),
            None,
            &config(1, 1),
            None,
        );

        assert!(matches!(res, Err(TrainErr::SizeMismatch { what: "params", .. })));
    }

    #[test]
    fn empty_dataset_runs_empty_epochs() {
        let mut model = Sequential::new([Layer::dense((1, 1), None)]);
        let mut params = vec![0.5, 0.5];
        let x = Array2::zeros((0, 1));
        let mut history = History::new();

        Trainer::new(config(3, 4))
            .with_observer(&mut history)
            .train(
                &mut model,
                &mut params,
                &Mse,
                None,
                &mut GradientDescent::new(0.1),
                x.view(),
                None,
            )
            .unwrap();

        assert_eq!(history.losses(), vec![0.; 3]);
        assert!(history.epochs().iter().all(|logs| logs.batches == 0));
        assert_eq!(params, vec![0.5, 0.5]);
    }
}

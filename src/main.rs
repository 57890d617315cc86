use std::{env, num::NonZeroUsize};

use anyhow::Context;
use log::info;
use ndarray::{Array2, Axis, array, concatenate};
use ndarray_rand::{RandomExt, rand_distr::Uniform};
use rand::{SeedableRng, rngs::StdRng};

use trainer::{
    arch::{Prediction, init::ParamInit, loss::Mse},
    metrics::{BinaryAccuracy, Metric},
    training::{
        ActFnSpec, History, LayerSpec, ModelSpec, OptimizerSpec, TrainConfig, Trainer,
        TrainerBuilder, TrainerSpec,
    },
};

/// Times the xor table is repeated in the training set.
const COPIES: usize = 16;
const JITTER: f32 = 0.05;

fn default_spec() -> TrainerSpec {
    TrainerSpec {
        model: ModelSpec::Sequential {
            layers: vec![
                LayerSpec::Dense {
                    dim: (2, 8),
                    act_fn: Some(ActFnSpec::Tanh),
                    init: ParamInit::XavierUniform,
                    l2: None,
                },
                LayerSpec::Dense {
                    dim: (8, 1),
                    act_fn: Some(ActFnSpec::Sigmoid { amp: 1. }),
                    init: ParamInit::XavierUniform,
                    l2: None,
                },
            ],
        },
        optimizer: OptimizerSpec::Adam {
            learning_rate: 0.05,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
        },
        training: TrainConfig {
            epochs: 300,
            batch_size: NonZeroUsize::new(8).unwrap_or(TrainConfig::DEFAULT_BATCH_SIZE),
            verbose: false,
            seed: Some(7),
            ..Default::default()
        },
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let spec = match env::args().nth(1) {
        Some(path) => TrainerSpec::from_path(&path)
            .with_context(|| format!("failed to load trainer spec from {path}"))?,
        None => default_spec(),
    };
    info!("training with {spec:?}");

    let mut rng = match spec.training.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let table_x = array![[0., 0.], [0., 1.], [1., 0.], [1., 1.]];
    let table_y = array![[0.], [1.], [1.], [0.]];

    let x = concatenate(Axis(0), &vec![table_x.view(); COPIES])?;
    let y = concatenate(Axis(0), &vec![table_y.view(); COPIES])?;
    let x = x + Array2::random_using((4 * COPIES, 2), Uniform::new(-JITTER, JITTER)?, &mut rng);

    let (mut model, mut optimizer) = TrainerBuilder::new().build(&spec)?;
    let mut params = model.init_params(&mut rng)?;
    let mut accuracy = BinaryAccuracy::default();
    let mut history = History::new();

    Trainer::new(spec.training.clone())
        .with_metric("accuracy", &mut accuracy)
        .with_observer(&mut history)
        .train(
            &mut model,
            &mut params,
            &Mse,
            None,
            &mut optimizer,
            x.view(),
            Some(y.view()),
        )?;

    // the training accuracy only follows verbose runs, so score the clean table afresh
    let y_pred = model.predict(&params, table_x.view())?;
    accuracy.reset_state();
    accuracy.update_state(table_y.view(), &Prediction::Single(y_pred.clone()))?;

    if let Some(last) = history.epochs().last() {
        println!("loss: {:.4} - accuracy: {:.4}", last.loss, accuracy.result());
    }

    for (input, output) in table_x.rows().into_iter().zip(y_pred.iter()) {
        println!("{input} -> {output:.3}");
    }

    Ok(())
}

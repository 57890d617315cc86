use super::spec::{ActFnSpec, LayerSpec, ModelSpec, OptimizerSpec, TrainerSpec};
use crate::{
    Result, TrainErr,
    arch::{
        Model, Sequential,
        activations::ActFn,
        layers::{Dense, Layer},
    },
    optimization::{Adam, GradientDescent, GradientDescentWithMomentum, Optimizer},
};

/// Builds models and optimizers given a `TrainerSpec`.
#[derive(Debug, Default)]
pub struct TrainerBuilder;

impl TrainerBuilder {
    /// Creates a new `TrainerBuilder`.
    pub fn new() -> Self {
        Self
    }

    /// Builds the model and its optimizer following a spec.
    ///
    /// # Arguments
    /// * `spec` - The description of the run.
    ///
    /// # Returns
    /// The model and an optimizer sized for its parameters, or an error if the layers don't
    /// chain.
    pub fn build(&self, spec: &TrainerSpec) -> Result<(Sequential, Box<dyn Optimizer>)> {
        let model = self.resolve_model(&spec.model)?;
        let optimizer = self.resolve_optimizer(spec.optimizer, model.size());
        Ok((model, optimizer))
    }

    pub fn resolve_model(&self, spec: &ModelSpec) -> Result<Sequential> {
        match spec {
            ModelSpec::Sequential { layers } => {
                check_chain(layers)?;
                let layers = layers.iter().map(|&spec| self.resolve_layer(spec));
                Ok(Sequential::new(layers))
            }
        }
    }

    fn resolve_layer(&self, spec: LayerSpec) -> Layer {
        match spec {
            LayerSpec::Dense {
                dim,
                act_fn,
                init,
                l2,
            } => {
                let dense = Dense::new(dim, act_fn.map(|spec| self.resolve_act_fn(spec)));
                let dense = dense.with_init(init);
                match l2 {
                    Some(l2) => dense.with_l2(l2).into(),
                    None => dense.into(),
                }
            }
        }
    }

    fn resolve_act_fn(&self, spec: ActFnSpec) -> ActFn {
        match spec {
            ActFnSpec::Sigmoid { amp } => ActFn::sigmoid(amp),
            ActFnSpec::Relu => ActFn::relu(),
            ActFnSpec::Tanh => ActFn::tanh(),
        }
    }

    pub fn resolve_optimizer(&self, spec: OptimizerSpec, len: usize) -> Box<dyn Optimizer> {
        match spec {
            OptimizerSpec::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => Box::new(Adam::new(len, learning_rate, beta1, beta2, epsilon)),
            OptimizerSpec::GradientDescent { learning_rate } => {
                Box::new(GradientDescent::new(learning_rate))
            }
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate,
                momentum,
            } => Box::new(GradientDescentWithMomentum::new(
                len,
                learning_rate,
                momentum,
            )),
        }
    }
}

/// Checks every layer takes as many inputs as the previous one outputs.
fn check_chain(layers: &[LayerSpec]) -> Result<()> {
    if layers.is_empty() {
        return Err(TrainErr::InvalidConfig(
            "a sequential model needs at least one layer".into(),
        ));
    }

    for (i, pair) in layers.windows(2).enumerate() {
        let (LayerSpec::Dense { dim: (_, out), .. }, LayerSpec::Dense { dim: (inp, _), .. }) =
            (pair[0], pair[1]);

        if out != inp {
            return Err(TrainErr::InvalidConfig(format!(
                "layer {} outputs {out} values but layer {} takes {inp}",
                i,
                i + 1
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::arch::init::ParamInit;

    fn dense(dim: (usize, usize), act_fn: Option<ActFnSpec>) -> LayerSpec {
        LayerSpec::Dense {
            dim,
            act_fn,
            init: ParamInit::XavierUniform,
            l2: None,
        }
    }

    #[test]
    fn builds_a_runnable_model() {
        let spec = ModelSpec::Sequential {
            layers: vec![
                dense((2, 3), Some(ActFnSpec::Tanh)),
                dense((3, 1), Some(ActFnSpec::Sigmoid { amp: 1. })),
            ],
        };

        let mut model = TrainerBuilder::new().resolve_model(&spec).unwrap();
        let params = model.init_params(&mut StdRng::seed_from_u64(0)).unwrap();
        let pred = model.forward(&params, array![[0., 1.]].view()).unwrap();

        assert_eq!(model.size(), 13);
        assert_eq!(pred.primary().unwrap().dim(), (1, 1));
    }

    #[test]
    fn regularized_layers_expose_auxiliary_losses() {
        let spec = ModelSpec::Sequential {
            layers: vec![LayerSpec::Dense {
                dim: (1, 1),
                act_fn: None,
                init: ParamInit::Const { value: 1. },
                l2: Some(0.5),
            }],
        };

        let model = TrainerBuilder::new().resolve_model(&spec).unwrap();

        assert!(model.auxiliary_losses().is_some());
    }

    #[test]
    fn mismatched_layers_are_rejected() {
        let spec = ModelSpec::Sequential {
            layers: vec![dense((2, 3), None), dense((2, 1), None)],
        };

        let res = TrainerBuilder::new().resolve_model(&spec);

        assert!(matches!(res, Err(TrainErr::InvalidConfig(_))));
    }

    #[test]
    fn optimizer_is_sized_for_the_model() {
        let mut optimizer = TrainerBuilder::new().resolve_optimizer(OptimizerSpec::default(), 2);
        let mut params = [1., 1.];

        optimizer.update_params(&[1., -1.], &mut params).unwrap();

        assert!(params[0] < 1. && params[1] > 1.);
        assert!(optimizer.update_params(&[1.; 3], &mut [0.; 3]).is_err());
    }
}

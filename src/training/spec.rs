use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use super::TrainConfig;
use crate::{Result, arch::init::ParamInit, optimization::Adam};

/// The json description of the `ActFn` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActFnSpec {
    Sigmoid { amp: f32 },
    Relu,
    Tanh,
}

/// The json description of the `Layer` enum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerSpec {
    Dense {
        dim: (usize, usize),
        act_fn: Option<ActFnSpec>,
        #[serde(default)]
        init: ParamInit,
        #[serde(default)]
        l2: Option<f32>,
    },
}

/// The json description of the `Model` trait.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelSpec {
    Sequential { layers: Vec<LayerSpec> },
}

/// The json description of the `Optimizer` trait.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerSpec {
    Adam {
        learning_rate: f32,
        beta1: f32,
        beta2: f32,
        epsilon: f32,
    },
    GradientDescent {
        learning_rate: f32,
    },
    GradientDescentWithMomentum {
        learning_rate: f32,
        momentum: f32,
    },
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self::Adam {
            learning_rate: Adam::DEFAULT_LEARNING_RATE,
            beta1: Adam::DEFAULT_BETA1,
            beta2: Adam::DEFAULT_BETA2,
            epsilon: Adam::DEFAULT_EPSILON,
        }
    }
}

/// The json description of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainerSpec {
    pub model: ModelSpec,
    #[serde(default)]
    pub optimizer: OptimizerSpec,
    #[serde(default)]
    pub training: TrainConfig,
}

impl TrainerSpec {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_sections_take_defaults() {
        let json = r#"{
            "model": { "sequential": { "layers": [
                { "dense": { "dim": [2, 3], "act_fn": { "sigmoid": { "amp": 1.0 } } } },
                { "dense": { "dim": [3, 1], "act_fn": null, "l2": 0.01 } }
            ] } }
        }"#;

        let spec = TrainerSpec::from_json(json).unwrap();

        let ModelSpec::Sequential { layers } = &spec.model;
        assert_eq!(
            layers[1],
            LayerSpec::Dense {
                dim: (3, 1),
                act_fn: None,
                init: ParamInit::XavierUniform,
                l2: Some(0.01),
            }
        );
        assert_eq!(spec.optimizer, OptimizerSpec::default());
        assert_eq!(spec.training, TrainConfig::default());
    }

    #[test]
    fn optimizer_tags_are_snake_case() {
        let json = r#"{ "gradient_descent_with_momentum": { "learning_rate": 0.1, "momentum": 0.9 } }"#;

        let spec: OptimizerSpec = serde_json::from_str(json).unwrap();

        assert_eq!(
            spec,
            OptimizerSpec::GradientDescentWithMomentum {
                learning_rate: 0.1,
                momentum: 0.9
            }
        );
    }
}

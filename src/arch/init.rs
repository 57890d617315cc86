use rand::Rng;
use rand_distr::{Distribution, Normal, Uniform};
use serde::{Deserialize, Serialize};

use crate::{Result, TrainErr};

/// How the weights of a layer are sampled before training. Biases always start at zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamInit {
    Const { value: f32 },
    Uniform { low: f32, high: f32 },
    XavierUniform,
    LecunUniform,
    Normal { mean: f32, std_dev: f32 },
    Kaiming,
    Xavier,
    Lecun,
}

impl Default for ParamInit {
    fn default() -> Self {
        Self::XavierUniform
    }
}

impl ParamInit {
    /// Fills `weights` following this initializer.
    ///
    /// # Arguments
    /// * `rng` - A random number generator.
    /// * `weights` - The buffer to write the sampled weights to.
    /// * `fan_in` - The number of input units in the weight tensor.
    /// * `fan_out` - The number of output units in the weight tensor.
    ///
    /// # Returns
    /// An error if the resulting distribution is invalid (empty range, non finite deviation).
    pub fn fill<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        weights: &mut [f32],
        fan_in: usize,
        fan_out: usize,
    ) -> Result<()> {
        match *self {
            ParamInit::Const { value } => {
                weights.fill(value);
                Ok(())
            }
            ParamInit::Uniform { low, high } => sample_uniform(rng, weights, low, high),
            ParamInit::XavierUniform => {
                let range = (6. / (fan_in + fan_out) as f32).sqrt();
                sample_uniform(rng, weights, -range, range)
            }
            ParamInit::LecunUniform => {
                let range = (3. / fan_in as f32).sqrt();
                sample_uniform(rng, weights, -range, range)
            }
            ParamInit::Normal { mean, std_dev } => sample_normal(rng, weights, mean, std_dev),
            ParamInit::Kaiming => {
                let std_dev = (2. / fan_in as f32).sqrt();
                sample_normal(rng, weights, 0., std_dev)
            }
            ParamInit::Xavier => {
                let std_dev = (2. / (fan_in + fan_out) as f32).sqrt();
                sample_normal(rng, weights, 0., std_dev)
            }
            ParamInit::Lecun => {
                let std_dev = (1. / fan_in as f32).sqrt();
                sample_normal(rng, weights, 0., std_dev)
            }
        }
    }
}

fn sample_uniform<R>(rng: &mut R, weights: &mut [f32], low: f32, high: f32) -> Result<()>
where
    R: Rng + ?Sized,
{
    let distribution =
        Uniform::new(low, high).map_err(|e| TrainErr::InvalidInit(e.to_string()))?;
    sample_into(rng, weights, distribution);
    Ok(())
}

fn sample_normal<R>(rng: &mut R, weights: &mut [f32], mean: f32, std_dev: f32) -> Result<()>
where
    R: Rng + ?Sized,
{
    let distribution =
        Normal::new(mean, std_dev).map_err(|e| TrainErr::InvalidInit(e.to_string()))?;
    sample_into(rng, weights, distribution);
    Ok(())
}

fn sample_into<R, D>(rng: &mut R, weights: &mut [f32], distribution: D)
where
    R: Rng + ?Sized,
    D: Distribution<f32>,
{
    for w in weights.iter_mut() {
        *w = distribution.sample(rng);
    }
}

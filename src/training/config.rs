use std::{fs, num::NonZeroUsize, path::Path};

use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::Result;

/// The hyperparameters of a training run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    /// The amount of full passes over the data.
    pub epochs: usize,
    /// The amount of samples per gradient step, the last batch of an epoch may be shorter.
    pub batch_size: NonZeroUsize,
    /// The size of the shuffle buffer the epoch order is drawn through.
    pub buffer_size: NonZeroUsize,
    /// Whether to display a progress bar.
    pub verbose: bool,
    /// The seed of the shuffling rng, drawn from the OS when absent.
    pub seed: Option<u64>,
}

impl TrainConfig {
    pub const DEFAULT_EPOCHS: usize = 20;
    pub const DEFAULT_BATCH_SIZE: NonZeroUsize = NonZeroUsize::new(64).unwrap();
    pub const DEFAULT_BUFFER_SIZE: NonZeroUsize = NonZeroUsize::new(1024).unwrap();

    /// Parses a `TrainConfig` from json, missing fields take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a json `TrainConfig` file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            epochs: Self::DEFAULT_EPOCHS,
            batch_size: Self::DEFAULT_BATCH_SIZE,
            buffer_size: Self::DEFAULT_BUFFER_SIZE,
            verbose: true,
            seed: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TrainErr;

    #[test]
    fn missing_fields_take_defaults() {
        let config = TrainConfig::from_json(r#"{ "epochs": 3, "seed": 7 }"#).unwrap();

        assert_eq!(config.epochs, 3);
        assert_eq!(config.batch_size.get(), 64);
        assert_eq!(config.buffer_size.get(), 1024);
        assert!(config.verbose);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let res = TrainConfig::from_json(r#"{ "batch_size": 0 }"#);

        assert!(matches!(res, Err(TrainErr::Json(_))));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let res = TrainConfig::from_path("/definitely/not/here.json");

        assert!(matches!(res, Err(TrainErr::Io(_))));
    }
}

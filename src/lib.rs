pub mod arch;
pub mod data;
pub mod error;
pub mod metrics;
pub mod optimization;
pub mod training;

pub use error::{Result, TrainErr};
pub use training::{TrainConfig, Trainer, train};

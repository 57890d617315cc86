mod builder;
mod config;
mod observer;
mod progbar;
mod spec;
mod trainer;

pub use builder::TrainerBuilder;
pub use config::TrainConfig;
pub use observer::{BatchLogs, EpochLogs, History, TrainObserver};
pub use progbar::Progbar;
pub use spec::{ActFnSpec, LayerSpec, ModelSpec, OptimizerSpec, TrainerSpec};
pub use trainer::{Trainer, train};

mod batches;
mod dataset;
mod shuffle;

pub use batches::{Batch, Batches};
pub use dataset::Dataset;
pub use shuffle::shuffle_indices;

pub mod activations;
pub mod init;
pub mod layers;
pub mod loss;
mod model;
mod multi_head;
mod sequential;

pub use model::{AuxiliaryLosses, Model, Prediction};
pub use multi_head::MultiHead;
pub use sequential::Sequential;

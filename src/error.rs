use std::{
    error::Error,
    fmt::{self, Display},
    io,
};

/// The result type used in the entire trainer crate.
pub type Result<T> = std::result::Result<T, TrainErr>;

/// The trainer crate's error type.
#[derive(Debug)]
pub enum TrainErr {
    SizeMismatch {
        what: &'static str,
        got: usize,
        expected: usize,
    },
    ShapeMismatch {
        what: &'static str,
        got: (usize, usize),
        expected: (usize, usize),
    },
    MissingForward {
        layer: usize,
    },
    InvalidInit(String),
    InvalidConfig(String),
    Json(serde_json::Error),
    Io(io::Error),
}

impl Display for TrainErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainErr::SizeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a size mismatch in {what}, got {got} and expected {expected}"
            ),
            TrainErr::ShapeMismatch {
                what,
                got,
                expected,
            } => write!(
                f,
                "There's a shape mismatch in {what}, got {got:?} and expected {expected:?}"
            ),
            TrainErr::MissingForward { layer } => write!(
                f,
                "Tried to backpropagate through layer {layer} without a previous forward pass"
            ),
            TrainErr::InvalidInit(msg) => write!(f, "invalid parameter initializer: {msg}"),
            TrainErr::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            TrainErr::Json(e) => write!(f, "json error: {e}"),
            TrainErr::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl Error for TrainErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrainErr::Json(e) => Some(e),
            TrainErr::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for TrainErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for TrainErr {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

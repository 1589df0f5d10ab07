use thiserror::Error;

pub type PulseResult<T> = Result<T, PulseError>;

/// Engine-level failures. Malformed input rows are not errors: they are
/// counted by the normalizer and the pipeline keeps going.
#[derive(Error, Debug)]
pub enum PulseError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Computation superseded by a newer run")]
    Cancelled,

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

use thiserror::Error;

/// Errors raised by training and evaluation collaborators.
#[derive(Debug, Error)]
pub enum Error {
    /// Minibatch construction failed.
    #[error("minibatch construction: {0}")]
    Core(#[from] synergraph_core::Error),

    /// IO error (checkpoints, CSV dumps, dataset files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Dataset JSON could not be parsed.
    #[error("dataset parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Checkpoint (de)serialization failed.
    #[error("checkpoint codec error: {0}")]
    Checkpoint(#[from] bincode::Error),

    /// The dataset violates an integrity constraint.
    #[error("dataset integrity: {0}")]
    Dataset(String),

    /// A model rejected its input or parameter table.
    #[error("model error: {0}")]
    Model(String),
}

/// Result type alias for the train crate.
pub type Result<T> = std::result::Result<T, Error>;

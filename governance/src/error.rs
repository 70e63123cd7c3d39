use tally_chain::{ChainError, DecodeError};
use tally_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GovernanceError {
    /// Reading chain state failed. Retried on the next trigger.
    #[error("chain read failed: {0}")]
    Chain(#[from] ChainError),

    /// The stream was never initialized. No progress is made until it is.
    #[error("cursor '{0}' is not initialized")]
    CursorNotFound(String),

    /// A vote payload or proposal content could not be decoded.
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),

    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),
}

impl GovernanceError {
    /// Short label used for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            GovernanceError::Chain(_) => "chain",
            GovernanceError::CursorNotFound(_) => "cursor_not_found",
            GovernanceError::Decode(_) => "decode",
            GovernanceError::Persistence(_) => "persistence",
        }
    }
}

use thiserror::Error;

/// Failure reading contract state. Always treated as transient by the syncers.
#[derive(Debug, Error)]
pub enum ChainError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("abi decode error: {0}")]
    Abi(String),
}

/// Failure turning off-chain content or a vote payload into typed values.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("failed to fetch content {cid}: {reason}")]
    Fetch { cid: String, reason: String },

    #[error("malformed content: {0}")]
    Malformed(String),

    #[error("vote percentage {0} is outside 0..=100")]
    InvalidPercentage(u64),

    #[error("unknown vote payload encoding: {0}")]
    UnknownEncoding(String),
}

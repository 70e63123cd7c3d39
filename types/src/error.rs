//! Parse and validation errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("vote percentage {0} is outside 0..=100")]
    InvalidPercentage(u64),
}

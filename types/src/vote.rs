//! Decoded vote entries.

use serde::{Deserialize, Serialize};

use crate::{Address, TypesError};

/// One decision decoded from a stored vote payload.
///
/// A single payload may decode into several entries when a voter splits their
/// weight across options. Entries are ephemeral: they exist only while a
/// proposal is being tallied.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedVote {
    pub voter: Address,
    pub option_id: u32,
    /// Share of the voter's balance assigned to this option, 0..=100.
    pub percent: u8,
}

impl DecodedVote {
    pub fn new(voter: Address, option_id: u32, percent: u64) -> Result<Self, TypesError> {
        if percent > 100 {
            return Err(TypesError::InvalidPercentage(percent));
        }
        Ok(Self {
            voter,
            option_id,
            percent: percent as u8,
        })
    }
}

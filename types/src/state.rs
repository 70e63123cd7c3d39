//! Proposal lifecycle state.

use serde::{Deserialize, Serialize};

/// Status of a mirrored proposal.
///
/// `Open --[expiry reached AND tally committed]--> Closed`. `Closed` is
/// terminal: a closed proposal is never tallied again.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    #[default]
    Open,
    Closed,
}

impl ProposalStatus {
    /// Numeric code exposed to API readers (open = 0, closed = 1).
    pub fn code(&self) -> u8 {
        match self {
            Self::Open => 0,
            Self::Closed => 1,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

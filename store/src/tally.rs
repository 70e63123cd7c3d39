//! Tally result storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{Address, NetworkId, Weight};

/// Audit row: one decoded decision, weighted at tally time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteHistoryRecord {
    pub network: NetworkId,
    pub proposal_index: u64,
    pub option_id: u32,
    pub voter: Address,
    pub votes: Weight,
}

/// Aggregated weighted total for one option of a proposal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteResultRecord {
    pub network: NetworkId,
    pub proposal_index: u64,
    pub option_id: u32,
    pub votes: Weight,
}

/// Everything a tally writes, applied as one unit together with closing the
/// proposal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TallyCommit {
    pub network: NetworkId,
    pub proposal_index: u64,
    pub history: Vec<VoteHistoryRecord>,
    pub results: Vec<VoteResultRecord>,
}

/// Trait for tally persistence.
pub trait TallyStore {
    /// Write history rows, upsert result rows and mark the proposal closed,
    /// all or nothing.
    ///
    /// Fails with [`StoreError::NotFound`] if the proposal is not mirrored and
    /// with [`StoreError::Duplicate`] if it is already closed.
    fn commit_tally(&self, commit: &TallyCommit) -> Result<(), StoreError>;

    /// Result rows of a proposal, ordered by option id.
    fn get_results(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteResultRecord>, StoreError>;

    /// History rows of a proposal, ordered by option id then voter.
    fn get_history(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteHistoryRecord>, StoreError>;
}

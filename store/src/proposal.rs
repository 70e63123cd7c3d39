//! Proposal storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{Address, NetworkId, ProposalStatus, Timestamp};

/// One on-chain proposal mirrored into the store.
///
/// `content_id` is globally unique; `(network, proposal_index)` is unique per
/// network. Rows are never deleted; only `status` changes, and only through a
/// tally commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalRecord {
    pub network: NetworkId,
    pub proposal_index: u64,
    pub content_id: String,
    pub proposal_type: u64,
    pub creator: Address,
    pub expiry: Timestamp,
    /// Vote count reported by the chain when the proposal was first mirrored.
    pub vote_count: u64,
    pub status: ProposalStatus,
}

/// Trait for proposal storage operations.
pub trait ProposalStore {
    /// Persist a new proposal and seed its vote cursor in one atomic write.
    ///
    /// Fails with [`StoreError::Duplicate`] if the content identifier or the
    /// `(network, proposal_index)` pair is already present.
    fn insert_proposal(
        &self,
        proposal: &ProposalRecord,
        vote_cursor: &str,
        vote_cursor_start: u64,
    ) -> Result<(), StoreError>;

    /// Whether a proposal with this content identifier is already mirrored.
    fn proposal_exists(&self, content_id: &str) -> Result<bool, StoreError>;

    fn get_proposal(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<ProposalRecord, StoreError>;

    /// All proposals of a network, ordered by proposal index.
    fn list_proposals(&self, network: NetworkId) -> Result<Vec<ProposalRecord>, StoreError>;

    /// Open proposals of a network, ordered by proposal index.
    fn open_proposals(&self, network: NetworkId) -> Result<Vec<ProposalRecord>, StoreError> {
        Ok(self
            .list_proposals(network)?
            .into_iter()
            .filter(|p| p.status.is_open())
            .collect())
    }

    /// Open proposals whose expiry has been reached at `now` (closing candidates).
    fn due_proposals(
        &self,
        network: NetworkId,
        now: Timestamp,
    ) -> Result<Vec<ProposalRecord>, StoreError> {
        Ok(self
            .open_proposals(network)?
            .into_iter()
            .filter(|p| p.expiry.has_passed(now))
            .collect())
    }

    fn proposal_count(&self, network: NetworkId) -> Result<u64, StoreError> {
        self.list_proposals(network).map(|v| v.len() as u64)
    }
}

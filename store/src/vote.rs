//! Vote storage trait.

use crate::StoreError;
use serde::{Deserialize, Serialize};
use tally_types::{Address, NetworkId};

/// One on-chain vote mirrored into the store.
///
/// Unique per `(network, proposal_index, voter)`: a repeat sighting from the
/// same voter overwrites `payload` in place.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub network: NetworkId,
    pub proposal_index: u64,
    pub voter: Address,
    /// Chain-encoded vote content, opaque to the store.
    pub payload: String,
}

/// What an upsert did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VoteUpsert {
    Inserted,
    /// An existing row's payload was replaced.
    Updated,
    /// An existing row already held this exact payload.
    Unchanged,
}

/// Trait for vote storage operations.
pub trait VoteStore {
    /// Insert a vote, or overwrite the payload of the voter's existing row.
    fn upsert_vote(&self, vote: &VoteRecord) -> Result<VoteUpsert, StoreError>;

    /// All votes on a proposal, ordered by voter address.
    fn get_votes(
        &self,
        network: NetworkId,
        proposal_index: u64,
    ) -> Result<Vec<VoteRecord>, StoreError>;

    fn vote_count(&self, network: NetworkId, proposal_index: u64) -> Result<u64, StoreError> {
        self.get_votes(network, proposal_index).map(|v| v.len() as u64)
    }
}

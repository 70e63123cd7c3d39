//! The chain read seam.

use async_trait::async_trait;
use tally_types::{Address, Timestamp, TokenAmount};

use crate::ChainError;

/// A proposal slot as the voting contract reports it.
///
/// An empty `content_id` means the slot is not populated yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainProposal {
    pub content_id: String,
    pub proposal_type: u64,
    pub creator: Address,
    pub expiry: Timestamp,
    pub vote_count: u64,
}

/// A vote slot as the voting contract reports it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainVote {
    pub voter: Address,
    pub payload: String,
}

/// Typed read access to one network's voting and token contracts.
#[async_trait]
pub trait ChainReader: Send + Sync {
    async fn latest_proposal_index(&self) -> Result<u64, ChainError>;

    async fn proposal(&self, index: u64) -> Result<ChainProposal, ChainError>;

    async fn vote(&self, proposal_index: u64, vote_index: u64) -> Result<ChainVote, ChainError>;

    /// Current balance in the token's smallest unit.
    async fn balance_of(&self, account: &Address) -> Result<TokenAmount, ChainError>;

    /// Timestamp of the latest block.
    async fn current_timestamp(&self) -> Result<Timestamp, ChainError>;
}

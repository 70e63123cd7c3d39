//! Abstract storage traits for the governance tally indexer.
//!
//! Every storage backend (LMDB, in-memory for testing) implements these
//! traits. The syncers and the tally engine depend only on the traits.

pub mod cursor;
pub mod error;
pub mod meta;
pub mod proposal;
pub mod tally;
pub mod vote;

pub use cursor::CursorStore;
pub use error::StoreError;
pub use meta::MetaStore;
pub use proposal::{ProposalRecord, ProposalStore};
pub use tally::{TallyCommit, TallyStore, VoteHistoryRecord, VoteResultRecord};
pub use vote::{VoteRecord, VoteStore, VoteUpsert};

/// Everything the sync pipeline needs from a backend, as one object-safe
/// handle that can be shared across network tasks.
pub trait GovernanceStore:
    CursorStore + ProposalStore + VoteStore + TallyStore + Send + Sync
{
}

impl<T> GovernanceStore for T where
    T: CursorStore + ProposalStore + VoteStore + TallyStore + Send + Sync
{
}

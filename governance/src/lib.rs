//! Governance mirror and tally pipeline.
//!
//! Three passes run per configured network:
//!
//! - **Proposal sync** walks proposal slots from the network's proposal
//!   cursor up to the chain's latest index and mirrors new proposals.
//! - **Vote sync** walks vote slots of one proposal from its vote cursor up
//!   to the live vote count and upserts votes (last write wins per voter).
//! - **Tally** closes open proposals whose expiry has passed: it re-syncs
//!   votes, decodes them, weights each decision by the voter's current token
//!   balance and commits history, results and the status change atomically.
//!
//! Every pass is driven through a [`NetworkContext`] so the chain, the store,
//! the content resolver and the clock can be swapped for test doubles.

pub mod context;
pub mod cursor;
pub mod error;
pub mod policy;
pub mod proposal_sync;
pub mod tally;
pub mod vote_sync;

pub use context::NetworkContext;
pub use cursor::{CursorKey, Cursors, VOTE_CURSOR_SEED};
pub use error::GovernanceError;
pub use policy::{FailureAction, FetchPolicy};
pub use proposal_sync::{sync_proposals, ProposalSyncReport};
pub use tally::{tally_due, ClosedTally, DeferredTally, TallyReport};
pub use vote_sync::{sync_open_proposals, sync_votes, VoteSweepReport, VoteSyncReport};

#[cfg(test)]
mod testkit;

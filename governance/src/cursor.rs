//! Named progress markers for the proposal and vote streams.

use std::fmt;
use std::sync::Arc;

use tally_store::{GovernanceStore, StoreError};
use tally_types::NetworkId;

use crate::GovernanceError;

/// Value a fresh vote cursor starts at: vote slots are numbered from 1.
pub const VOTE_CURSOR_SEED: u64 = 1;

/// Identifies one cursor row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CursorKey {
    /// Next unsynced proposal index of a network.
    ProposalStart { network: NetworkId },
    /// Next unsynced vote index of one proposal.
    VoteStart { network: NetworkId, proposal: u64 },
}

impl CursorKey {
    pub fn proposal_start(network: NetworkId) -> Self {
        CursorKey::ProposalStart { network }
    }

    pub fn vote_start(network: NetworkId, proposal: u64) -> Self {
        CursorKey::VoteStart { network, proposal }
    }

    pub fn name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for CursorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CursorKey::ProposalStart { network } => write!(f, "proposal_start:{network}"),
            CursorKey::VoteStart { network, proposal } => {
                write!(f, "vote_start:{network}:{proposal}")
            }
        }
    }
}

/// Typed access to cursor rows over any [`GovernanceStore`].
#[derive(Clone)]
pub struct Cursors {
    store: Arc<dyn GovernanceStore>,
}

impl Cursors {
    pub fn new(store: Arc<dyn GovernanceStore>) -> Self {
        Self { store }
    }

    /// Read a cursor. A missing row is [`GovernanceError::CursorNotFound`].
    pub fn get(&self, key: CursorKey) -> Result<u64, GovernanceError> {
        let name = key.name();
        self.store.get_cursor(&name).map_err(|e| match e {
            StoreError::NotFound(_) => GovernanceError::CursorNotFound(name),
            other => GovernanceError::Persistence(other),
        })
    }

    /// Unconditional overwrite. Callers only move a cursor forward after
    /// processing the range it skips.
    pub fn set(&self, key: CursorKey, value: u64) -> Result<(), GovernanceError> {
        self.store.put_cursor(&key.name(), value)?;
        Ok(())
    }

    /// Create the cursor at `value` if it has no row yet. Returns whether a
    /// row was written.
    pub fn seed_if_absent(&self, key: CursorKey, value: u64) -> Result<bool, GovernanceError> {
        let name = key.name();
        if self.store.has_cursor(&name)? {
            return Ok(false);
        }
        self.store.put_cursor(&name, value)?;
        Ok(true)
    }
}

//! Per-network handles passed into every pass.

use std::sync::Arc;

use tally_chain::{ChainReader, ContentResolver};
use tally_store::GovernanceStore;
use tally_types::{Clock, NetworkId};
use tokio::sync::Mutex;

use crate::cursor::Cursors;
use crate::policy::FetchPolicy;

/// Everything a pass needs for one network.
///
/// Networks never share a context. Within a network, vote syncs are
/// serialized through `vote_sync_lock` so the periodic sweep and the tally
/// pre-sync cannot move the same vote cursor concurrently.
pub struct NetworkContext {
    pub network: NetworkId,
    pub chain: Arc<dyn ChainReader>,
    pub store: Arc<dyn GovernanceStore>,
    pub resolver: Arc<dyn ContentResolver>,
    pub clock: Arc<dyn Clock>,
    pub policy: FetchPolicy,
    pub(crate) vote_sync_lock: Mutex<()>,
}

impl NetworkContext {
    pub fn new(
        network: NetworkId,
        chain: Arc<dyn ChainReader>,
        store: Arc<dyn GovernanceStore>,
        resolver: Arc<dyn ContentResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            network,
            chain,
            store,
            resolver,
            clock,
            policy: FetchPolicy::default(),
            vote_sync_lock: Mutex::new(()),
        }
    }

    pub fn with_policy(mut self, policy: FetchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cursors(&self) -> Cursors {
        Cursors::new(Arc::clone(&self.store))
    }
}

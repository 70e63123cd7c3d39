use std::sync::Arc;

use tally_nullables::{NullChain, NullClock, NullResolver, NullStore};
use tally_store::CursorStore;
use tally_types::NetworkId;

use crate::{CursorKey, FetchPolicy, NetworkContext};

pub const NET: NetworkId = NetworkId::new(314);

pub struct Harness {
    pub chain: Arc<NullChain>,
    pub store: Arc<NullStore>,
    pub resolver: Arc<NullResolver>,
    pub clock: Arc<NullClock>,
    pub ctx: NetworkContext,
}

/// A context over nullables with the proposal cursor seeded at 1.
pub fn harness() -> Harness {
    harness_with(FetchPolicy::default())
}

pub fn harness_with(policy: FetchPolicy) -> Harness {
    let chain = Arc::new(NullChain::new());
    let store = Arc::new(NullStore::new());
    let resolver = Arc::new(NullResolver::new());
    let clock = Arc::new(NullClock::new(0));
    store
        .put_cursor(&CursorKey::proposal_start(NET).name(), 1)
        .unwrap();
    let ctx = NetworkContext::new(
        NET,
        chain.clone(),
        store.clone(),
        resolver.clone(),
        clock.clone(),
    )
    .with_policy(policy);
    Harness {
        chain,
        store,
        resolver,
        clock,
        ctx,
    }
}

//! Start a node over scripted networks, let the pass loops run, stop it.

use std::sync::Arc;
use std::time::Duration;

use tally_governance::NetworkContext;
use tally_node::{NetworkConfig, NodeConfig, NodeError, ScheduleConfig, TallyNode};
use tally_nullables::{NullChain, NullClock, NullResolver, NullStore};
use tally_store::{GovernanceStore, ProposalStore, TallyStore};
use tally_types::{Address, NetworkId, ProposalStatus};

const VOTER: Address = Address::new([0x0a; 20]);

fn fast_config(networks: &[u32]) -> NodeConfig {
    NodeConfig {
        enable_rpc: false,
        enable_metrics: true,
        schedule: ScheduleConfig {
            proposal_sync_secs: 1,
            vote_sync_secs: 1,
            tally_secs: 1,
        },
        networks: networks
            .iter()
            .map(|&id| NetworkConfig {
                id: NetworkId::new(id),
                name: format!("net-{id}"),
                rpc_url: "http://127.0.0.1:1".into(),
                voting_contract: Address::new([1; 20]),
                token_contract: Address::new([2; 20]),
                initial_proposal_index: Some(1),
            })
            .collect(),
        ..Default::default()
    }
}

fn context(
    id: u32,
    chain: &Arc<NullChain>,
    resolver: &Arc<NullResolver>,
    store: &Arc<NullStore>,
) -> Arc<NetworkContext> {
    Arc::new(NetworkContext::new(
        NetworkId::new(id),
        chain.clone(),
        store.clone(),
        resolver.clone(),
        Arc::new(NullClock::new(0)),
    ))
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(10), async {
        while !done() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn status(store: &NullStore, network: u32, index: u64) -> Option<ProposalStatus> {
    store
        .get_proposal(NetworkId::new(network), index)
        .ok()
        .map(|p| p.status)
}

#[tokio::test]
async fn pass_loops_sync_and_close_proposals() {
    let store = Arc::new(NullStore::new());
    let chain = Arc::new(NullChain::new());
    let resolver = Arc::new(NullResolver::new());

    chain.put_proposal(1, NullChain::proposal_with("bafy-a", 100, 0));
    chain.put_vote(1, 1, VOTER, "[[1,100]]");
    chain.set_balance(VOTER, 3_000_000_000);
    chain.set_timestamp(Some(500));
    resolver.set_options("bafy-a", &["yes", "no"]);

    let contexts = vec![context(314, &chain, &resolver, &store)];
    let mut node = TallyNode::with_contexts(fast_config(&[314]), store.clone(), contexts).unwrap();
    node.start().unwrap();

    wait_until(|| status(&store, 314, 1) == Some(ProposalStatus::Closed)).await;
    node.stop().await.unwrap();

    let results = store.get_results(NetworkId::new(314), 1).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[1].votes.units(), 30);
    assert_eq!(results[0].votes.units(), 0);

    let metrics = node.metrics().unwrap();
    assert_eq!(metrics.proposals_created.get(), 1);
    assert_eq!(metrics.tallies_committed.get(), 1);
}

#[tokio::test]
async fn broken_network_does_not_hold_back_the_others() {
    let store = Arc::new(NullStore::new());
    let resolver = Arc::new(NullResolver::new());
    let healthy = Arc::new(NullChain::new());
    let broken = Arc::new(NullChain::new());

    healthy.put_proposal(1, NullChain::proposal_with("bafy-ok", 10_000, 0));
    broken.fail_latest(true);

    let contexts = vec![
        context(1, &healthy, &resolver, &store),
        context(2, &broken, &resolver, &store),
    ];
    let mut node = TallyNode::with_contexts(fast_config(&[1, 2]), store.clone(), contexts).unwrap();
    node.start().unwrap();

    wait_until(|| status(&store, 1, 1) == Some(ProposalStatus::Open)).await;
    wait_until(|| {
        node.metrics()
            .unwrap()
            .sync_errors
            .with_label_values(&["proposal_sync", "chain"])
            .get()
            > 0
    })
    .await;
    node.stop().await.unwrap();

    assert_eq!(store.list_proposals(NetworkId::new(2)).unwrap().len(), 0);
}

#[tokio::test]
async fn start_twice_is_refused() {
    let store = Arc::new(NullStore::new());
    let store_dyn: Arc<dyn GovernanceStore> = store;
    let mut node = TallyNode::with_contexts(fast_config(&[]), store_dyn, vec![]).unwrap();
    node.start().unwrap();
    assert!(matches!(node.start(), Err(NodeError::AlreadyStarted)));
    node.stop().await.unwrap();
}

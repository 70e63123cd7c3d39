//! Node wiring: store, per-network contexts, pass loops and the read API.

use std::sync::Arc;
use std::time::Duration;

use tally_chain::{ContentResolver, ContractAddresses, HttpContentResolver, JsonRpcChainReader};
use tally_governance::{CursorKey, NetworkContext};
use tally_rpc::{RpcServer, RpcState};
use tally_store::{CursorStore, GovernanceStore};
use tally_store_lmdb::environment::MAX_DBS;
use tally_store_lmdb::LmdbStore;
use tally_types::{Clock, SystemClock};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::config::NodeConfig;
use crate::metrics::IndexerMetrics;
use crate::scheduler::{report_outcomes, NetworkOutcome, Pass, PassDispatcher};
use crate::shutdown::ShutdownController;
use crate::NodeError;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Outcomes buffered between the pass tasks and the reporter.
const OUTCOME_CHANNEL_CAPACITY: usize = 256;

/// A running indexer: one context per configured network sharing one store.
pub struct TallyNode {
    config: NodeConfig,
    store: Arc<dyn GovernanceStore>,
    /// Set when the node owns an LMDB environment, so it can flush on stop.
    lmdb: Option<Arc<LmdbStore>>,
    contexts: Vec<Arc<NetworkContext>>,
    metrics: Option<Arc<IndexerMetrics>>,
    shutdown: ShutdownController,
    task_handles: Vec<JoinHandle<()>>,
}

impl TallyNode {
    /// Open the LMDB store under `data_dir` and build a JSON-RPC chain reader
    /// per configured network.
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let lmdb = Arc::new(LmdbStore::open(
            &config.data_dir,
            MAX_DBS,
            config.map_size_bytes(),
        )?);
        let store: Arc<dyn GovernanceStore> = lmdb.clone();
        let resolver: Arc<dyn ContentResolver> = Arc::new(HttpContentResolver::with_timeout(
            config.ipfs_gateway.clone(),
            config.request_timeout(),
        ));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let policy = config.fetch_policy.to_policy();

        let contexts = config
            .networks
            .iter()
            .map(|network| {
                let chain = JsonRpcChainReader::new(
                    network.rpc_url.clone(),
                    ContractAddresses {
                        voting: network.voting_contract,
                        token: network.token_contract,
                    },
                    config.request_timeout(),
                );
                let ctx = NetworkContext::new(
                    network.id,
                    Arc::new(chain),
                    Arc::clone(&store),
                    Arc::clone(&resolver),
                    Arc::clone(&clock),
                )
                .with_policy(policy);
                Arc::new(ctx)
            })
            .collect();

        let mut node = Self::with_contexts(config, store, contexts)?;
        node.lmdb = Some(lmdb);
        Ok(node)
    }

    /// Build a node over prepared contexts. Seeds proposal cursors from
    /// `initial_proposal_index` where a network has none yet.
    pub fn with_contexts(
        config: NodeConfig,
        store: Arc<dyn GovernanceStore>,
        contexts: Vec<Arc<NetworkContext>>,
    ) -> Result<Self, NodeError> {
        seed_proposal_cursors(&config, &contexts)?;

        let metrics = if config.enable_metrics {
            Some(Arc::new(IndexerMetrics::new()?))
        } else {
            None
        };

        Ok(Self {
            config,
            store,
            lmdb: None,
            contexts,
            metrics,
            shutdown: ShutdownController::new(),
            task_handles: Vec::new(),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn GovernanceStore> {
        &self.store
    }

    pub fn contexts(&self) -> &[Arc<NetworkContext>] {
        &self.contexts
    }

    pub fn metrics(&self) -> Option<&Arc<IndexerMetrics>> {
        self.metrics.as_ref()
    }

    /// Spawn the reporter, the three pass loops and, if enabled, the read
    /// API. Returns once everything is running.
    pub fn start(&mut self) -> Result<(), NodeError> {
        if !self.task_handles.is_empty() {
            return Err(NodeError::AlreadyStarted);
        }

        let (outcome_tx, outcome_rx) = mpsc::channel(OUTCOME_CHANNEL_CAPACITY);
        self.task_handles
            .push(tokio::spawn(report_outcomes(outcome_rx, self.metrics.clone())));

        let schedule = self.config.schedule.clone();
        self.spawn_pass_loop(
            Pass::ProposalSync,
            schedule.proposal_sync_interval(),
            outcome_tx.clone(),
        );
        self.spawn_pass_loop(
            Pass::VoteSync,
            schedule.vote_sync_interval(),
            outcome_tx.clone(),
        );
        self.spawn_pass_loop(Pass::Tally, schedule.tally_interval(), outcome_tx);

        // ── Read API (optional) ───────────────────────────────────────────
        if self.config.enable_rpc {
            let state = RpcState {
                store: Arc::clone(&self.store),
                registry: self.metrics.as_ref().map(|m| m.registry.clone()),
            };
            let server = RpcServer::new(self.config.rpc_port, state);
            let mut shutdown_rx_rpc = self.shutdown.subscribe();

            let rpc_handle = tokio::spawn(async move {
                let shutdown = async move {
                    let _ = shutdown_rx_rpc.recv().await;
                    tracing::info!("RPC server shutting down");
                };
                match server.start(shutdown).await {
                    Ok(()) => tracing::info!("RPC server exited"),
                    Err(e) => tracing::error!("RPC server error: {e}"),
                }
            });
            self.task_handles.push(rpc_handle);
        }

        tracing::info!(
            networks = self.contexts.len(),
            proposal_sync_secs = schedule.proposal_sync_secs,
            vote_sync_secs = schedule.vote_sync_secs,
            tally_secs = schedule.tally_secs,
            rpc = self.config.enable_rpc,
            "tally node started"
        );
        Ok(())
    }

    /// Start, then block until SIGINT/SIGTERM.
    pub async fn run_until_signal(&mut self) -> Result<(), NodeError> {
        self.start()?;
        self.shutdown.wait_for_signal().await;
        Ok(())
    }

    /// Stop the node gracefully.
    ///
    /// Pass loops stop ticking, let their in-flight passes finish, and the
    /// reporter drains the remaining outcomes. Waits up to a fixed timeout.
    pub async fn stop(&mut self) -> Result<(), NodeError> {
        tracing::info!("tally node stopping");
        self.shutdown.shutdown();

        let handles: Vec<JoinHandle<()>> = self.task_handles.drain(..).collect();
        let wait_all = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::warn!(error = %e, "task ended abnormally");
                }
            }
        };

        if tokio::time::timeout(SHUTDOWN_TIMEOUT, wait_all)
            .await
            .is_err()
        {
            tracing::warn!(
                "shutdown timeout ({:?}), some tasks may still be running",
                SHUTDOWN_TIMEOUT
            );
        }

        if let Some(lmdb) = &self.lmdb {
            match lmdb.env().force_sync() {
                Ok(()) => tracing::info!("LMDB flushed to disk"),
                Err(e) => tracing::warn!("LMDB force_sync failed: {e}"),
            }
        }

        tracing::info!("tally node stopped");
        Ok(())
    }

    fn spawn_pass_loop(
        &mut self,
        pass: Pass,
        period: Duration,
        outcomes: mpsc::Sender<NetworkOutcome>,
    ) {
        let mut dispatcher = PassDispatcher::new(pass, self.contexts.clone(), outcomes);
        let mut shutdown_rx = self.shutdown.subscribe();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    biased;
                    _ = shutdown_rx.recv() => break,
                    _ = interval.tick() => {
                        dispatcher.trigger();
                    }
                }
            }
            tracing::debug!(%pass, in_flight = dispatcher.in_flight(), "pass loop stopping");
            dispatcher.drain().await;
        });
        self.task_handles.push(handle);
    }
}

fn seed_proposal_cursors(
    config: &NodeConfig,
    contexts: &[Arc<NetworkContext>],
) -> Result<(), NodeError> {
    for ctx in contexts {
        let network = ctx.network;
        let key = CursorKey::proposal_start(network);
        let initial = config
            .networks
            .iter()
            .find(|n| n.id == network)
            .and_then(|n| n.initial_proposal_index);

        match initial {
            Some(index) => {
                if ctx.cursors().seed_if_absent(key, index)? {
                    tracing::info!(%network, cursor = index, "proposal cursor seeded");
                }
            }
            None => {
                if !ctx.store.has_cursor(&key.name())? {
                    tracing::warn!(
                        %network,
                        cursor = %key,
                        "no proposal cursor and no initial_proposal_index; proposal sync will fail until one is set"
                    );
                }
            }
        }
    }
    Ok(())
}

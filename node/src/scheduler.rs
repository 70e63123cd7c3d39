//! Fan-out of the periodic passes across networks.
//!
//! Each trigger starts one task per network in a [`JoinSet`]. A network
//! whose previous run of the same pass is still going is skipped for that
//! tick, so a slow chain never stacks passes on itself and never delays the
//! other networks. Every finished task reports a [`NetworkOutcome`] over an
//! `mpsc` channel; [`report_outcomes`] logs them and feeds the metrics.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tally_governance::{
    sync_open_proposals, sync_proposals, tally_due, GovernanceError, NetworkContext,
    ProposalSyncReport, TallyReport, VoteSweepReport,
};
use tally_types::NetworkId;
use tokio::sync::mpsc;
use tokio::task::{self, JoinError, JoinSet};
use tracing::Instrument;

use crate::metrics::IndexerMetrics;
use crate::tracing_spans;

/// The three periodic passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pass {
    ProposalSync,
    VoteSync,
    Tally,
}

impl Pass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pass::ProposalSync => "proposal_sync",
            Pass::VoteSync => "vote_sync",
            Pass::Tally => "tally",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum PassSummary {
    ProposalSync(ProposalSyncReport),
    VoteSync(VoteSweepReport),
    Tally(TallyReport),
}

/// Result of one pass over one network.
#[derive(Debug)]
pub struct NetworkOutcome {
    pub network: NetworkId,
    pub pass: Pass,
    pub elapsed: Duration,
    pub result: Result<PassSummary, GovernanceError>,
}

/// Run `pass` once over `ctx` inside its span.
pub async fn run_pass(ctx: &NetworkContext, pass: Pass) -> Result<PassSummary, GovernanceError> {
    match pass {
        Pass::ProposalSync => sync_proposals(ctx)
            .instrument(tracing_spans::proposal_sync_span(ctx.network))
            .await
            .map(PassSummary::ProposalSync),
        Pass::VoteSync => sync_open_proposals(ctx)
            .instrument(tracing_spans::vote_sync_span(ctx.network))
            .await
            .map(PassSummary::VoteSync),
        Pass::Tally => tally_due(ctx)
            .instrument(tracing_spans::tally_span(ctx.network))
            .await
            .map(PassSummary::Tally),
    }
}

/// Starts one pass kind across every network and tracks what is in flight.
pub struct PassDispatcher {
    pass: Pass,
    contexts: Vec<Arc<NetworkContext>>,
    outcomes: mpsc::Sender<NetworkOutcome>,
    tasks: JoinSet<()>,
    in_flight: HashMap<task::Id, NetworkId>,
}

impl PassDispatcher {
    pub fn new(
        pass: Pass,
        contexts: Vec<Arc<NetworkContext>>,
        outcomes: mpsc::Sender<NetworkOutcome>,
    ) -> Self {
        Self {
            pass,
            contexts,
            outcomes,
            tasks: JoinSet::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn pass(&self) -> Pass {
        self.pass
    }

    /// Number of networks currently running this pass.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Start the pass on every network that is not still running it.
    /// Returns the networks that were started.
    pub fn trigger(&mut self) -> Vec<NetworkId> {
        self.reap();
        let busy: HashSet<NetworkId> = self.in_flight.values().copied().collect();

        let mut started = Vec::with_capacity(self.contexts.len());
        for ctx in &self.contexts {
            let network = ctx.network;
            if busy.contains(&network) {
                tracing::debug!(
                    %network,
                    pass = %self.pass,
                    "previous pass still running, skipping tick"
                );
                continue;
            }

            let ctx = Arc::clone(ctx);
            let outcomes = self.outcomes.clone();
            let pass = self.pass;
            let handle = self.tasks.spawn(async move {
                let started_at = Instant::now();
                let result = run_pass(&ctx, pass).await;
                let outcome = NetworkOutcome {
                    network: ctx.network,
                    pass,
                    elapsed: started_at.elapsed(),
                    result,
                };
                if outcomes.send(outcome).await.is_err() {
                    tracing::debug!(network = %ctx.network, %pass, "outcome receiver closed");
                }
            });
            self.in_flight.insert(handle.id(), network);
            started.push(network);
        }
        started
    }

    /// Wait for every in-flight task to finish.
    pub async fn drain(&mut self) {
        while let Some(joined) = self.tasks.join_next_with_id().await {
            self.finish(joined);
        }
    }

    fn reap(&mut self) {
        while let Some(joined) = self.tasks.try_join_next_with_id() {
            self.finish(joined);
        }
    }

    fn finish(&mut self, joined: Result<(task::Id, ()), JoinError>) {
        match joined {
            Ok((id, ())) => {
                self.in_flight.remove(&id);
            }
            Err(e) => {
                let network = self.in_flight.remove(&e.id());
                tracing::error!(?network, pass = %self.pass, error = %e, "pass task died");
            }
        }
    }
}

/// Log every outcome and record it in `metrics` until all senders are gone.
pub async fn report_outcomes(
    mut outcomes: mpsc::Receiver<NetworkOutcome>,
    metrics: Option<Arc<IndexerMetrics>>,
) {
    while let Some(outcome) = outcomes.recv().await {
        log_outcome(&outcome);
        if let Some(metrics) = &metrics {
            metrics.record(&outcome);
        }
    }
    tracing::debug!("outcome channel closed, reporter exiting");
}

fn log_outcome(outcome: &NetworkOutcome) {
    let network = outcome.network;
    let elapsed_ms = outcome.elapsed.as_millis() as u64;
    match &outcome.result {
        Ok(PassSummary::ProposalSync(report)) => {
            if report.created.is_empty() && report.aborted_at.is_none() {
                tracing::debug!(%network, cursor = report.cursor, elapsed_ms, "proposal sync idle");
            } else {
                tracing::info!(
                    %network,
                    created = report.created.len(),
                    cursor = report.cursor,
                    aborted_at = ?report.aborted_at,
                    elapsed_ms,
                    "proposal sync pass finished"
                );
            }
        }
        Ok(PassSummary::VoteSync(sweep)) => {
            tracing::info!(
                %network,
                proposals = sweep.synced.len(),
                inserted = sweep.inserted(),
                updated = sweep.updated(),
                failed = sweep.failed.len(),
                elapsed_ms,
                "vote sync pass finished"
            );
        }
        Ok(PassSummary::Tally(report)) => {
            tracing::info!(
                %network,
                now = %report.now,
                closed = report.closed.len(),
                deferred = report.deferred.len(),
                elapsed_ms,
                "tally pass finished"
            );
        }
        Err(e) => {
            tracing::warn!(
                %network,
                pass = %outcome.pass,
                kind = e.kind(),
                error = %e,
                elapsed_ms,
                "pass failed"
            );
        }
    }
}

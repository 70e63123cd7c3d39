//! Prometheus metrics for the indexer.
//!
//! The [`IndexerMetrics`] struct owns a dedicated [`Registry`] that the
//! read API's `/metrics` endpoint encodes into the Prometheus text
//! exposition format.

use prometheus::{
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, HistogramOpts, HistogramVec, IntCounter, IntCounterVec,
    Opts, Registry,
};

use crate::scheduler::{NetworkOutcome, PassSummary};

pub struct IndexerMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Proposals mirrored from chain.
    pub proposals_created: IntCounter,
    /// Vote rows inserted for the first time.
    pub votes_inserted: IntCounter,
    /// Vote rows whose payload changed on chain.
    pub votes_updated: IntCounter,
    /// Proposals closed by a committed tally.
    pub tallies_committed: IntCounter,
    /// Due proposals whose tally failed and was left for the next pass.
    pub tallies_deferred: IntCounter,
    /// Pass or per-proposal failures, labelled by pass and error kind.
    pub sync_errors: IntCounterVec,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Wall time of one pass over one network, in seconds.
    pub pass_duration_seconds: HistogramVec,
}

impl IndexerMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let proposals_created = register_int_counter_with_registry!(
            Opts::new(
                "tally_proposals_created_total",
                "Proposals mirrored from chain"
            ),
            registry
        )?;

        let votes_inserted = register_int_counter_with_registry!(
            Opts::new("tally_votes_inserted_total", "Vote rows inserted"),
            registry
        )?;

        let votes_updated = register_int_counter_with_registry!(
            Opts::new(
                "tally_votes_updated_total",
                "Vote rows rewritten with a changed payload"
            ),
            registry
        )?;

        let tallies_committed = register_int_counter_with_registry!(
            Opts::new(
                "tally_tallies_committed_total",
                "Proposals closed by a committed tally"
            ),
            registry
        )?;

        let tallies_deferred = register_int_counter_with_registry!(
            Opts::new(
                "tally_tallies_deferred_total",
                "Tallies that failed and were left for the next pass"
            ),
            registry
        )?;

        let sync_errors = register_int_counter_vec_with_registry!(
            Opts::new("tally_sync_errors_total", "Pass failures by pass and kind"),
            &["pass", "kind"],
            registry
        )?;

        // 10 ms → ~80 s
        let pass_duration_seconds = register_histogram_vec_with_registry!(
            HistogramOpts::new(
                "tally_pass_duration_seconds",
                "Duration of one pass over one network"
            )
            .buckets(prometheus::exponential_buckets(0.01, 2.0, 14)?),
            &["pass"],
            registry
        )?;

        Ok(Self {
            registry,
            proposals_created,
            votes_inserted,
            votes_updated,
            tallies_committed,
            tallies_deferred,
            sync_errors,
            pass_duration_seconds,
        })
    }

    /// Fold one network's pass outcome into the counters.
    pub fn record(&self, outcome: &NetworkOutcome) {
        let pass = outcome.pass.as_str();
        self.pass_duration_seconds
            .with_label_values(&[pass])
            .observe(outcome.elapsed.as_secs_f64());

        match &outcome.result {
            Ok(PassSummary::ProposalSync(report)) => {
                self.proposals_created.inc_by(report.created.len() as u64);
                if report.aborted_at.is_some() {
                    self.sync_errors.with_label_values(&[pass, "chain"]).inc();
                }
            }
            Ok(PassSummary::VoteSync(sweep)) => {
                self.votes_inserted.inc_by(sweep.inserted());
                self.votes_updated.inc_by(sweep.updated());
                for (_, error) in &sweep.failed {
                    self.sync_errors.with_label_values(&[pass, error.kind()]).inc();
                }
            }
            Ok(PassSummary::Tally(report)) => {
                self.tallies_committed.inc_by(report.closed.len() as u64);
                self.tallies_deferred.inc_by(report.deferred.len() as u64);
                for deferred in &report.deferred {
                    self.sync_errors
                        .with_label_values(&[pass, deferred.error.kind()])
                        .inc();
                }
            }
            Err(error) => {
                self.sync_errors.with_label_values(&[pass, error.kind()]).inc();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use tally_governance::{GovernanceError, ProposalSyncReport, TallyReport};
    use tally_types::NetworkId;

    use crate::scheduler::Pass;

    fn outcome(pass: Pass, result: Result<PassSummary, GovernanceError>) -> NetworkOutcome {
        NetworkOutcome {
            network: NetworkId::new(1),
            pass,
            elapsed: Duration::from_millis(20),
            result,
        }
    }

    #[test]
    fn records_created_proposals_and_duration() {
        let metrics = IndexerMetrics::new().unwrap();
        let report = ProposalSyncReport {
            start: 1,
            cursor: 4,
            created: vec![1, 3],
            ..Default::default()
        };
        metrics.record(&outcome(
            Pass::ProposalSync,
            Ok(PassSummary::ProposalSync(report)),
        ));
        assert_eq!(metrics.proposals_created.get(), 2);
        assert_eq!(
            metrics
                .pass_duration_seconds
                .with_label_values(&["proposal_sync"])
                .get_sample_count(),
            1
        );
    }

    #[test]
    fn failed_pass_counts_by_kind() {
        let metrics = IndexerMetrics::new().unwrap();
        metrics.record(&outcome(
            Pass::Tally,
            Err(GovernanceError::CursorNotFound("proposal_start:1".into())),
        ));
        metrics.record(&outcome(Pass::Tally, Ok(PassSummary::Tally(TallyReport::default()))));
        assert_eq!(
            metrics
                .sync_errors
                .with_label_values(&["tally", "cursor_not_found"])
                .get(),
            1
        );
        assert_eq!(metrics.tallies_committed.get(), 0);
    }

    #[test]
    fn registry_exports_every_family() {
        let metrics = IndexerMetrics::new().unwrap();
        metrics.sync_errors.with_label_values(&["vote_sync", "chain"]).inc();
        metrics
            .pass_duration_seconds
            .with_label_values(&["vote_sync"])
            .observe(0.5);
        let names: Vec<String> = metrics
            .registry
            .gather()
            .iter()
            .map(|family| family.get_name().to_string())
            .collect();
        for expected in [
            "tally_proposals_created_total",
            "tally_votes_inserted_total",
            "tally_tallies_committed_total",
            "tally_sync_errors_total",
            "tally_pass_duration_seconds",
        ] {
            assert!(names.iter().any(|n| n == expected), "missing {expected}");
        }
    }
}

//! Closing expired proposals with a balance-weighted tally.
//!
//! Each decoded decision contributes `floor(balance * percent / 100 / 1e8)`
//! whole units to its option (see [`TokenAmount::weighted`]). Balances are
//! read live at tally time. A proposal's history rows, result rows and its
//! transition to closed are committed as one unit, so a failed tally leaves
//! the proposal open and nothing from the attempt visible.

use std::collections::{BTreeMap, HashMap};

use tally_store::{ProposalRecord, TallyCommit, VoteHistoryRecord, VoteResultRecord};
use tally_types::{Address, DecodedVote, Timestamp, TokenAmount, Weight};

use crate::context::NetworkContext;
use crate::vote_sync::sync_votes;
use crate::GovernanceError;

/// A proposal closed by this pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosedTally {
    pub proposal_index: u64,
    pub results: Vec<VoteResultRecord>,
    pub history_rows: usize,
}

/// A candidate left open for the next pass.
#[derive(Debug)]
pub struct DeferredTally {
    pub proposal_index: u64,
    pub error: GovernanceError,
}

#[derive(Debug, Default)]
pub struct TallyReport {
    /// Time the candidates were selected against.
    pub now: Timestamp,
    pub closed: Vec<ClosedTally>,
    pub deferred: Vec<DeferredTally>,
}

/// Tally every open proposal of the network whose expiry has passed.
///
/// `now` is the chain's latest block time, or local time if that read
/// fails. Candidates are processed one at a time; a failure defers only that
/// candidate. Failing to list the candidates fails the pass.
pub async fn tally_due(ctx: &NetworkContext) -> Result<TallyReport, GovernanceError> {
    let now = match ctx.chain.current_timestamp().await {
        Ok(t) => t,
        Err(e) => {
            let local = ctx.clock.now();
            tracing::warn!(
                network = %ctx.network,
                error = %e,
                fallback = %local,
                "chain timestamp unavailable, using local clock"
            );
            local
        }
    };

    let candidates = ctx.store.due_proposals(ctx.network, now)?;
    let mut report = TallyReport {
        now,
        ..Default::default()
    };

    for proposal in candidates {
        let index = proposal.proposal_index;
        match tally_proposal(ctx, &proposal).await {
            Ok(closed) => {
                tracing::info!(
                    network = %ctx.network,
                    proposal = index,
                    options = closed.results.len(),
                    history = closed.history_rows,
                    "proposal closed"
                );
                report.closed.push(closed);
            }
            Err(e) => {
                tracing::warn!(
                    network = %ctx.network,
                    proposal = index,
                    kind = e.kind(),
                    error = %e,
                    "tally deferred"
                );
                report.deferred.push(DeferredTally {
                    proposal_index: index,
                    error: e,
                });
            }
        }
    }
    Ok(report)
}

async fn tally_proposal(
    ctx: &NetworkContext,
    proposal: &ProposalRecord,
) -> Result<ClosedTally, GovernanceError> {
    let index = proposal.proposal_index;

    if let Err(e) = sync_votes(ctx, index).await {
        tracing::warn!(
            network = %ctx.network,
            proposal = index,
            error = %e,
            "pre-tally vote sync failed, tallying stored votes"
        );
    }

    let votes = ctx.store.get_votes(ctx.network, index)?;

    let mut decoded: Vec<DecodedVote> = Vec::new();
    for vote in &votes {
        decoded.extend(ctx.resolver.decode_vote(&vote.voter, &vote.payload).await?);
    }

    let mut balances: HashMap<Address, TokenAmount> = HashMap::new();
    let mut per_voter: BTreeMap<(u32, Address), Weight> = BTreeMap::new();
    let mut totals: BTreeMap<u32, Weight> = BTreeMap::new();

    for entry in &decoded {
        let balance = match balances.get(&entry.voter) {
            Some(b) => *b,
            None => {
                let b = ctx.chain.balance_of(&entry.voter).await?;
                balances.insert(entry.voter, b);
                b
            }
        };
        let weight = balance.weighted(entry.percent);

        let row = per_voter
            .entry((entry.option_id, entry.voter))
            .or_insert(Weight::ZERO);
        *row = row.saturating_add(weight);
        let total = totals.entry(entry.option_id).or_insert(Weight::ZERO);
        *total = total.saturating_add(weight);
    }

    let options = ctx.resolver.proposal_options(&proposal.content_id).await?;

    let history: Vec<VoteHistoryRecord> = per_voter
        .into_iter()
        .map(|((option_id, voter), votes)| VoteHistoryRecord {
            network: ctx.network,
            proposal_index: index,
            option_id,
            voter,
            votes,
        })
        .collect();

    let results: Vec<VoteResultRecord> = (0..options.len())
        .map(|i| {
            let option_id = i as u32;
            VoteResultRecord {
                network: ctx.network,
                proposal_index: index,
                option_id,
                votes: totals.get(&option_id).copied().unwrap_or(Weight::ZERO),
            }
        })
        .collect();

    for option_id in totals.keys().filter(|id| **id as usize >= options.len()) {
        tracing::warn!(
            network = %ctx.network,
            proposal = index,
            option = option_id,
            defined = options.len(),
            "votes cast for an undefined option"
        );
    }

    let commit = TallyCommit {
        network: ctx.network,
        proposal_index: index,
        history,
        results,
    };
    ctx.store.commit_tally(&commit)?;

    Ok(ClosedTally {
        proposal_index: index,
        history_rows: commit.history.len(),
        results: commit.results,
    })
}

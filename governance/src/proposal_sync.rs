//! Mirrors on-chain proposals into the store.

use tally_store::ProposalRecord;
use tally_types::ProposalStatus;

use crate::context::NetworkContext;
use crate::cursor::{CursorKey, VOTE_CURSOR_SEED};
use crate::GovernanceError;

/// What one proposal sync pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProposalSyncReport {
    /// Cursor value the pass started from.
    pub start: u64,
    /// Cursor value written at the end of the pass.
    pub cursor: u64,
    /// Indices of newly mirrored proposals.
    pub created: Vec<u64>,
    /// Slots skipped because the chain has no content id there yet.
    pub skipped_empty: u64,
    /// Slots skipped because their content id is already mirrored.
    pub skipped_existing: u64,
    /// Slot whose fetch failed and ended the pass early.
    pub aborted_at: Option<u64>,
}

/// Walk proposal slots `[cursor, latest]` and mirror every new proposal.
///
/// Each new proposal is persisted together with its seeded vote cursor. The
/// proposal cursor is written once, after the loop, to where iteration
/// stopped. A failed slot fetch ends the pass early and the cursor lands
/// where [`FetchPolicy`](crate::FetchPolicy) says. A store failure aborts
/// the pass without touching the cursor; re-running is idempotent.
pub async fn sync_proposals(ctx: &NetworkContext) -> Result<ProposalSyncReport, GovernanceError> {
    let cursors = ctx.cursors();
    let cursor_key = CursorKey::proposal_start(ctx.network);

    let start = cursors.get(cursor_key)?;
    let end = ctx.chain.latest_proposal_index().await?;

    let mut report = ProposalSyncReport {
        start,
        ..Default::default()
    };

    let mut next = start;
    for index in start..=end {
        let fetched = ctx.policy.fetch(|| ctx.chain.proposal(index)).await;
        let proposal = match fetched {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(
                    network = %ctx.network,
                    index,
                    error = %e,
                    "proposal fetch failed, ending pass"
                );
                report.aborted_at = Some(index);
                next = ctx.policy.cursor_after_failure(index);
                break;
            }
        };
        next = index.saturating_add(1);

        if proposal.content_id.is_empty() {
            tracing::debug!(network = %ctx.network, index, "proposal slot not populated yet");
            report.skipped_empty += 1;
            continue;
        }

        if ctx.store.proposal_exists(&proposal.content_id)? {
            report.skipped_existing += 1;
            continue;
        }

        let record = ProposalRecord {
            network: ctx.network,
            proposal_index: index,
            content_id: proposal.content_id,
            proposal_type: proposal.proposal_type,
            creator: proposal.creator,
            expiry: proposal.expiry,
            vote_count: proposal.vote_count,
            status: ProposalStatus::Open,
        };
        let vote_cursor = CursorKey::vote_start(ctx.network, index).name();
        ctx.store
            .insert_proposal(&record, &vote_cursor, VOTE_CURSOR_SEED)?;

        tracing::info!(
            network = %ctx.network,
            index,
            cid = %record.content_id,
            expiry = %record.expiry,
            "proposal mirrored"
        );
        report.created.push(index);
    }

    cursors.set(cursor_key, next)?;
    report.cursor = next;

    tracing::debug!(
        network = %ctx.network,
        start,
        cursor = next,
        latest = end,
        created = report.created.len(),
        "proposal sync pass finished"
    );
    Ok(report)
}

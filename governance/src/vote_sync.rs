//! Mirrors on-chain votes of a proposal into the store.

use tally_store::{VoteRecord, VoteUpsert};

use crate::context::NetworkContext;
use crate::cursor::CursorKey;
use crate::GovernanceError;

/// What one vote sync pass over a single proposal did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VoteSyncReport {
    pub proposal_index: u64,
    pub start: u64,
    pub cursor: u64,
    pub inserted: u64,
    /// Existing rows whose payload was replaced by a newer vote.
    pub updated: u64,
    /// Empty payloads plus re-sightings of an identical payload.
    pub skipped: u64,
    pub aborted_at: Option<u64>,
}

/// Outcome of sweeping every open proposal of a network.
#[derive(Debug, Default)]
pub struct VoteSweepReport {
    pub synced: Vec<VoteSyncReport>,
    pub failed: Vec<(u64, GovernanceError)>,
}

impl VoteSweepReport {
    pub fn inserted(&self) -> u64 {
        self.synced.iter().map(|r| r.inserted).sum()
    }

    pub fn updated(&self) -> u64 {
        self.synced.iter().map(|r| r.updated).sum()
    }
}

/// Walk vote slots `[cursor, vote_count]` of one proposal.
///
/// `vote_count` is read live from the chain. A repeat vote from the same
/// voter overwrites the stored payload in place. Vote syncs of one network
/// never overlap.
pub async fn sync_votes(
    ctx: &NetworkContext,
    proposal_index: u64,
) -> Result<VoteSyncReport, GovernanceError> {
    let _guard = ctx.vote_sync_lock.lock().await;

    let cursors = ctx.cursors();
    let cursor_key = CursorKey::vote_start(ctx.network, proposal_index);

    let start = cursors.get(cursor_key)?;
    let end = ctx.chain.proposal(proposal_index).await?.vote_count;

    let mut report = VoteSyncReport {
        proposal_index,
        start,
        ..Default::default()
    };

    let mut next = start;
    for index in start..=end {
        let fetched = ctx
            .policy
            .fetch(|| ctx.chain.vote(proposal_index, index))
            .await;
        let vote = match fetched {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(
                    network = %ctx.network,
                    proposal = proposal_index,
                    index,
                    error = %e,
                    "vote fetch failed, ending pass"
                );
                report.aborted_at = Some(index);
                next = ctx.policy.cursor_after_failure(index);
                break;
            }
        };
        next = index.saturating_add(1);

        if vote.payload.is_empty() {
            report.skipped += 1;
            continue;
        }

        let record = VoteRecord {
            network: ctx.network,
            proposal_index,
            voter: vote.voter,
            payload: vote.payload,
        };
        match ctx.store.upsert_vote(&record)? {
            VoteUpsert::Inserted => report.inserted += 1,
            VoteUpsert::Updated => {
                tracing::debug!(
                    network = %ctx.network,
                    proposal = proposal_index,
                    voter = %record.voter,
                    "vote replaced"
                );
                report.updated += 1;
            }
            VoteUpsert::Unchanged => report.skipped += 1,
        }
    }

    cursors.set(cursor_key, next)?;
    report.cursor = next;
    Ok(report)
}

/// Run [`sync_votes`] for every open proposal of the network, in index order.
///
/// A failure on one proposal is logged and recorded; the sweep moves on.
/// Only a failure listing the open proposals fails the whole sweep.
pub async fn sync_open_proposals(ctx: &NetworkContext) -> Result<VoteSweepReport, GovernanceError> {
    let open = ctx.store.open_proposals(ctx.network)?;
    let mut sweep = VoteSweepReport::default();

    for proposal in open {
        match sync_votes(ctx, proposal.proposal_index).await {
            Ok(report) => sweep.synced.push(report),
            Err(e) => {
                tracing::warn!(
                    network = %ctx.network,
                    proposal = proposal.proposal_index,
                    error = %e,
                    "vote sync failed"
                );
                sweep.failed.push((proposal.proposal_index, e));
            }
        }
    }
    Ok(sweep)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposal_sync::sync_proposals;
    use crate::policy::FetchPolicy;
    use crate::tally::tally_due;
    use crate::testkit::{harness, harness_with, Harness, NET};
    use tally_nullables::NullChain;
    use tally_store::{CursorStore, VoteStore};
    use tally_types::Address;

    const X: Address = Address::new([0xaa; 20]);
    const Y: Address = Address::new([0xbb; 20]);

    async fn with_proposal() -> Harness {
        let h = harness();
        h.chain.put_proposal(1, NullChain::proposal_with("cid-1", 100, 0));
        sync_proposals(&h.ctx).await.unwrap();
        h
    }

    fn vote_cursor(h: &Harness) -> u64 {
        h.store
            .get_cursor(&CursorKey::vote_start(NET, 1).name())
            .unwrap()
    }

    #[tokio::test]
    async fn inserts_votes_up_to_live_count() {
        let h = with_proposal().await;
        h.chain.put_vote(1, 1, X, "[[0,100]]");
        h.chain.put_vote(1, 2, Y, "[[1,50]]");

        let report = sync_votes(&h.ctx, 1).await.unwrap();
        assert_eq!(report.inserted, 2);
        assert_eq!(report.cursor, 3);
        assert_eq!(vote_cursor(&h), 3);
        assert_eq!(h.store.vote_count(NET, 1).unwrap(), 2);
    }

    #[tokio::test]
    async fn second_vote_from_same_voter_overwrites() {
        let h = with_proposal().await;
        h.chain.put_vote(1, 1, X, "[[0,100]]");
        sync_votes(&h.ctx, 1).await.unwrap();

        h.chain.put_vote(1, 2, X, "[[1,100]]");
        let report = sync_votes(&h.ctx, 1).await.unwrap();
        assert_eq!(report.updated, 1);
        assert_eq!(report.inserted, 0);

        let votes = h.store.get_votes(NET, 1).unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].payload, "[[1,100]]");
    }

    #[tokio::test]
    async fn empty_payload_is_skipped() {
        let h = with_proposal().await;
        h.chain.put_vote(1, 1, X, "");
        h.chain.put_vote(1, 2, Y, "[[0,10]]");

        let report = sync_votes(&h.ctx, 1).await.unwrap();
        assert_eq!(report.skipped, 1);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.cursor, 3);
    }

    #[tokio::test]
    async fn fetch_failure_skips_slot_and_stops() {
        let h = with_proposal().await;
        h.chain.put_vote(1, 1, X, "[[0,100]]");
        h.chain.put_vote(1, 2, Y, "[[1,50]]");
        h.chain.fail_vote(1, 1, 1);

        let report = sync_votes(&h.ctx, 1).await.unwrap();
        assert_eq!(report.aborted_at, Some(1));
        assert_eq!(report.inserted, 0);
        assert_eq!(vote_cursor(&h), 2);

        let next = sync_votes(&h.ctx, 1).await.unwrap();
        assert_eq!(next.inserted, 1);
        assert_eq!(h.store.get_votes(NET, 1).unwrap()[0].voter, Y);
    }

    #[tokio::test]
    async fn store_failure_leaves_cursor() {
        let h = with_proposal().await;
        h.chain.put_vote(1, 1, X, "[[0,100]]");
        h.store.fail_vote_writes(true);

        assert!(matches!(
            sync_votes(&h.ctx, 1).await,
            Err(GovernanceError::Persistence(_))
        ));
        assert_eq!(vote_cursor(&h), 1);
    }

    #[tokio::test]
    async fn unknown_proposal_has_no_cursor() {
        let h = harness();
        assert!(matches!(
            sync_votes(&h.ctx, 42).await,
            Err(GovernanceError::CursorNotFound(_))
        ));
    }

    #[tokio::test]
    async fn sweep_covers_open_proposals_and_isolates_failures() {
        let h = harness();
        h.chain.put_proposal(1, NullChain::proposal_with("cid-1", 100, 0));
        h.chain.put_proposal(2, NullChain::proposal_with("cid-2", 100, 0));
        sync_proposals(&h.ctx).await.unwrap();
        h.chain.put_vote(1, 1, X, "[[0,100]]");
        h.chain.put_vote(2, 1, Y, "[[0,100]]");
        h.chain.fail_proposal(1, 1);

        let sweep = sync_open_proposals(&h.ctx).await.unwrap();
        assert_eq!(sweep.failed.len(), 1);
        assert_eq!(sweep.failed[0].0, 1);
        assert_eq!(sweep.synced.len(), 1);
        assert_eq!(sweep.inserted(), 1);
    }

    #[tokio::test]
    async fn vote_cursor_never_decreases() {
        let h = harness_with(FetchPolicy::HoldAtFailure);
        h.chain.put_proposal(1, NullChain::proposal_with("cid-1", 100, 0));
        sync_proposals(&h.ctx).await.unwrap();

        let mut last = vote_cursor(&h);
        for round in 1..=6u64 {
            h.chain
                .put_vote(1, round, Address::new([round as u8; 20]), "[[0,100]]");
            if round % 2 == 0 {
                h.chain.fail_vote(1, round, 1);
            }
            // Periodic sweep racing the tally's synchronous pre-sync.
            let (sweep, single) = tokio::join!(sync_open_proposals(&h.ctx), sync_votes(&h.ctx, 1));
            sweep.unwrap();
            single.unwrap();

            let now = vote_cursor(&h);
            assert!(now >= last, "vote cursor moved back from {last} to {now}");
            last = now;
        }

        h.chain.fail_vote(1, 7, 1);
        h.chain.put_vote(1, 7, Address::new([7; 20]), "[[1,100]]");
        h.chain.set_timestamp(Some(1_000));
        let (sweep, tally) = tokio::join!(sync_open_proposals(&h.ctx), tally_due(&h.ctx));
        sweep.unwrap();
        tally.unwrap();
        // One of the two syncs holds at slot 7, the other moves past it.
        assert!(vote_cursor(&h) >= last);
        assert_eq!(vote_cursor(&h), 8);
        assert_eq!(h.store.vote_count(NET, 1).unwrap(), 7);
    }
}

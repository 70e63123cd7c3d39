//! What a syncer does when fetching one slot from the chain fails.

use std::future::Future;
use std::time::Duration;

use tally_chain::ChainError;

/// Where the cursor lands after a slot fetch has failed for good.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FailureAction {
    /// Move past the failed slot. It will not be retried.
    AdvancePast,
    /// Leave the cursor on the failed slot so the next pass retries it.
    HoldAt,
}

/// Slot fetch failure policy. Whatever the policy, the rest of the range is
/// abandoned for the current pass once a fetch has failed for good.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    /// Give up on the slot after one failure and move past it.
    #[default]
    SkipAndAdvance,
    /// Retry the slot up to `max_retries` more times, sleeping `backoff`
    /// between attempts, then move past it.
    RetryThenAdvance { max_retries: u32, backoff: Duration },
    /// Stop on the slot and retry it on the next pass.
    HoldAtFailure,
}

impl FetchPolicy {
    pub fn failure_action(&self) -> FailureAction {
        match self {
            FetchPolicy::SkipAndAdvance | FetchPolicy::RetryThenAdvance { .. } => {
                FailureAction::AdvancePast
            }
            FetchPolicy::HoldAtFailure => FailureAction::HoldAt,
        }
    }

    /// Cursor value to persist when slot `index` could not be fetched.
    pub fn cursor_after_failure(&self, index: u64) -> u64 {
        match self.failure_action() {
            FailureAction::AdvancePast => index.saturating_add(1),
            FailureAction::HoldAt => index,
        }
    }

    /// Run `fetch`, retrying as the policy allows. Returns the last error if
    /// every attempt failed.
    pub async fn fetch<T, F, Fut>(&self, mut fetch: F) -> Result<T, ChainError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ChainError>>,
    {
        let (retries, backoff) = match *self {
            FetchPolicy::RetryThenAdvance {
                max_retries,
                backoff,
            } => (max_retries, backoff),
            _ => (0, Duration::ZERO),
        };

        let mut attempt = 0;
        loop {
            match fetch().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < retries => {
                    attempt += 1;
                    tracing::debug!(attempt, error = %e, "slot fetch failed, retrying");
                    if !backoff.is_zero() {
                        tokio::time::sleep(backoff).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn cursor_after_failure() {
        assert_eq!(FetchPolicy::SkipAndAdvance.cursor_after_failure(4), 5);
        assert_eq!(FetchPolicy::HoldAtFailure.cursor_after_failure(4), 4);
        let retry = FetchPolicy::RetryThenAdvance {
            max_retries: 2,
            backoff: Duration::ZERO,
        };
        assert_eq!(retry.cursor_after_failure(4), 5);
    }

    #[tokio::test]
    async fn skip_policy_tries_once() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = FetchPolicy::SkipAndAdvance
            .fetch(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ChainError::Transport("down".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retry_policy_recovers() {
        let calls = AtomicU32::new(0);
        let policy = FetchPolicy::RetryThenAdvance {
            max_retries: 3,
            backoff: Duration::from_millis(1),
        };
        let result = policy
            .fetch(|| async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ChainError::Transport("flaky".into()))
                } else {
                    Ok(7u64)
                }
            })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_policy_gives_up() {
        let calls = AtomicU32::new(0);
        let policy = FetchPolicy::RetryThenAdvance {
            max_retries: 2,
            backoff: Duration::ZERO,
        };
        let result: Result<(), _> = policy
            .fetch(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ChainError::Transport("down".into()))
            })
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}

//! Off-chain content resolution.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tally_types::{Address, DecodedVote};

use crate::payload::{self, VotePayload};
use crate::DecodeError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolves a proposal's option list and decodes stored vote payloads.
#[async_trait]
pub trait ContentResolver: Send + Sync {
    /// Option labels of the proposal whose content lives at `content_id`.
    async fn proposal_options(&self, content_id: &str) -> Result<Vec<String>, DecodeError>;

    /// Decode one stored vote payload into zero or more decisions.
    async fn decode_vote(
        &self,
        voter: &Address,
        payload: &str,
    ) -> Result<Vec<DecodedVote>, DecodeError>;
}

#[derive(Deserialize)]
struct ProposalContent {
    option: Vec<String>,
}

/// [`ContentResolver`] backed by an IPFS HTTP gateway.
///
/// `GET {gateway}/ipfs/{cid}`. Sealed payloads are not decrypted.
pub struct HttpContentResolver {
    http_client: reqwest::Client,
    gateway: String,
}

impl HttpContentResolver {
    pub fn new(gateway: impl Into<String>) -> Self {
        Self::with_timeout(gateway, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(gateway: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            gateway: gateway.into(),
        }
    }

    fn content_url(&self, cid: &str) -> String {
        format!("{}/ipfs/{}", self.gateway.trim_end_matches('/'), cid)
    }

    async fn fetch(&self, cid: &str) -> Result<String, DecodeError> {
        let fetch_err = |reason: String| DecodeError::Fetch {
            cid: cid.to_string(),
            reason,
        };
        let response = self
            .http_client
            .get(self.content_url(cid))
            .send()
            .await
            .map_err(|e| fetch_err(e.to_string()))?;
        if !response.status().is_success() {
            return Err(fetch_err(format!("HTTP status {}", response.status())));
        }
        response.text().await.map_err(|e| fetch_err(e.to_string()))
    }
}

#[async_trait]
impl ContentResolver for HttpContentResolver {
    async fn proposal_options(&self, content_id: &str) -> Result<Vec<String>, DecodeError> {
        let body = self.fetch(content_id).await?;
        let content: ProposalContent = serde_json::from_str(&body)
            .map_err(|e| DecodeError::Malformed(format!("proposal content {content_id}: {e}")))?;
        Ok(content.option)
    }

    async fn decode_vote(
        &self,
        voter: &Address,
        payload: &str,
    ) -> Result<Vec<DecodedVote>, DecodeError> {
        let pairs = match VotePayload::parse(payload)? {
            VotePayload::Inline(pairs) => pairs,
            VotePayload::ContentRef(cid) => {
                let body = self.fetch(&cid).await?;
                payload::parse_pairs(&body)?
            }
        };
        payload::to_decoded(*voter, &pairs)
    }
}

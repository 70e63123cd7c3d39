//! Nullable content resolver: scripted option lists and vote contents.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use tally_chain::payload::{self, VotePayload};
use tally_chain::{ContentResolver, DecodeError};
use tally_types::{Address, DecodedVote};

#[derive(Default)]
struct ResolverState {
    options: HashMap<String, Vec<String>>,
    contents: HashMap<String, String>,
    unreachable: HashSet<String>,
}

/// A scripted [`ContentResolver`].
///
/// Inline payloads decode exactly like the HTTP resolver. Content
/// references and proposal options resolve from scripted bodies; anything
/// unscripted or marked unreachable is a [`DecodeError::Fetch`].
#[derive(Default)]
pub struct NullResolver {
    state: Mutex<ResolverState>,
}

impl NullResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_options(&self, content_id: &str, options: &[&str]) {
        self.state.lock().unwrap().options.insert(
            content_id.to_string(),
            options.iter().map(|o| o.to_string()).collect(),
        );
    }

    /// Script the body behind a content reference.
    pub fn set_content(&self, content_id: &str, body: &str) {
        self.state
            .lock()
            .unwrap()
            .contents
            .insert(content_id.to_string(), body.to_string());
    }

    pub fn set_unreachable(&self, content_id: &str, unreachable: bool) {
        let mut state = self.state.lock().unwrap();
        if unreachable {
            state.unreachable.insert(content_id.to_string());
        } else {
            state.unreachable.remove(content_id);
        }
    }

    fn unreachable(cid: &str) -> DecodeError {
        DecodeError::Fetch {
            cid: cid.to_string(),
            reason: "unreachable".to_string(),
        }
    }
}

#[async_trait]
impl ContentResolver for NullResolver {
    async fn proposal_options(&self, content_id: &str) -> Result<Vec<String>, DecodeError> {
        let state = self.state.lock().unwrap();
        if state.unreachable.contains(content_id) {
            return Err(Self::unreachable(content_id));
        }
        state
            .options
            .get(content_id)
            .cloned()
            .ok_or_else(|| Self::unreachable(content_id))
    }

    async fn decode_vote(
        &self,
        voter: &Address,
        payload: &str,
    ) -> Result<Vec<DecodedVote>, DecodeError> {
        let pairs = match VotePayload::parse(payload)? {
            VotePayload::Inline(pairs) => pairs,
            VotePayload::ContentRef(cid) => {
                let body = {
                    let state = self.state.lock().unwrap();
                    if state.unreachable.contains(&cid) {
                        return Err(Self::unreachable(&cid));
                    }
                    state
                        .contents
                        .get(&cid)
                        .cloned()
                        .ok_or_else(|| Self::unreachable(&cid))?
                };
                payload::parse_pairs(&body)?
            }
        };
        payload::to_decoded(*voter, &pairs)
    }
}

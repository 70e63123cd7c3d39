//! JSON-RPC 2.0 `eth_call` client for the voting and token contracts.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tally_types::{Address, Timestamp, TokenAmount};

use crate::abi::{self, AbiDecoder};
use crate::reader::{ChainProposal, ChainReader, ChainVote};
use crate::ChainError;

/// Default timeout for a single RPC request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const PROPOSAL_ID: &str = "proposalId()";
const ID_TO_PROPOSAL: &str = "idToProposal(uint256)";
const PROPOSAL_TO_VOTE: &str = "proposalToVote(uint256,uint256)";
const BALANCE_OF: &str = "balanceOf(address)";

/// The two contracts a network reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContractAddresses {
    pub voting: Address,
    /// Token whose balance weights a vote.
    pub token: Address,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct BlockHeader {
    timestamp: String,
}

/// [`ChainReader`] over an EVM JSON-RPC endpoint.
pub struct JsonRpcChainReader {
    http_client: reqwest::Client,
    rpc_url: String,
    contracts: ContractAddresses,
    next_id: AtomicU64,
}

impl JsonRpcChainReader {
    pub fn new(rpc_url: impl Into<String>, contracts: ContractAddresses, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http_client,
            rpc_url: rpc_url.into(),
            contracts,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn contracts(&self) -> &ContractAddresses {
        &self.contracts
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ChainError> {
        let body = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http_client
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ChainError::Transport(format!("request timed out: {e}"))
                } else if e.is_connect() {
                    ChainError::Transport(format!("connection failed: {e}"))
                } else {
                    ChainError::Transport(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ChainError::Transport(format!(
                "HTTP status {}",
                response.status()
            )));
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| ChainError::Transport(format!("invalid JSON-RPC response: {e}")))?;

        if let Some(err) = parsed.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        parsed
            .result
            .ok_or_else(|| ChainError::Abi(format!("{method} returned no result")))
    }

    async fn eth_call(&self, to: &Address, data: String) -> Result<Vec<u8>, ChainError> {
        let params = json!([{ "to": to.to_string(), "data": data }, "latest"]);
        let result = self.request("eth_call", params).await?;
        let raw = result
            .as_str()
            .ok_or_else(|| ChainError::Abi("eth_call result is not a string".to_string()))?;
        abi::decode_hex(raw)
    }
}

#[async_trait]
impl ChainReader for JsonRpcChainReader {
    async fn latest_proposal_index(&self) -> Result<u64, ChainError> {
        let data = self
            .eth_call(&self.contracts.voting, abi::encode_call(PROPOSAL_ID, &[]))
            .await?;
        AbiDecoder::new(&data).uint_u64(0)
    }

    async fn proposal(&self, index: u64) -> Result<ChainProposal, ChainError> {
        let call = abi::encode_call(ID_TO_PROPOSAL, &[abi::uint_word(index.into())]);
        let data = self.eth_call(&self.contracts.voting, call).await?;
        let dec = AbiDecoder::new(&data);
        Ok(ChainProposal {
            content_id: dec.string(0)?,
            proposal_type: dec.uint_u64(1)?,
            creator: dec.address(2)?,
            expiry: Timestamp::new(dec.uint_u64(3)?),
            vote_count: dec.uint_u64(4)?,
        })
    }

    async fn vote(&self, proposal_index: u64, vote_index: u64) -> Result<ChainVote, ChainError> {
        let call = abi::encode_call(
            PROPOSAL_TO_VOTE,
            &[
                abi::uint_word(proposal_index.into()),
                abi::uint_word(vote_index.into()),
            ],
        );
        let data = self.eth_call(&self.contracts.voting, call).await?;
        let dec = AbiDecoder::new(&data);
        Ok(ChainVote {
            voter: dec.address(0)?,
            payload: dec.string(1)?,
        })
    }

    async fn balance_of(&self, account: &Address) -> Result<TokenAmount, ChainError> {
        let call = abi::encode_call(BALANCE_OF, &[abi::address_word(account)]);
        let data = self.eth_call(&self.contracts.token, call).await?;
        Ok(TokenAmount::new(AbiDecoder::new(&data).uint_u128(0)?))
    }

    async fn current_timestamp(&self) -> Result<Timestamp, ChainError> {
        let result = self
            .request("eth_getBlockByNumber", json!(["latest", false]))
            .await?;
        let header: BlockHeader = serde_json::from_value(result)
            .map_err(|e| ChainError::Abi(format!("invalid block header: {e}")))?;
        Ok(Timestamp::new(abi::decode_quantity(&header.timestamp)?))
    }
}

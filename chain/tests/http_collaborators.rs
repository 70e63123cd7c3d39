//! Drives the HTTP chain reader and content resolver against an in-process
//! axum server that fakes a JSON-RPC node and an IPFS gateway.

use std::str::FromStr;
use std::time::Duration;

use axum::extract::Path;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tally_chain::abi::{self, uint_word};
use tally_chain::{
    ChainError, ChainReader, ContentResolver, ContractAddresses, DecodeError,
    HttpContentResolver, JsonRpcChainReader,
};
use tally_types::{Address, Timestamp};

const VOTING: &str = "0x00000000000000000000000000000000000000aa";
const TOKEN: &str = "0x2868d708e442a6a940670d26100036d426f1e16b";
const CREATOR: [u8; 20] = [0x42; 20];

fn string_tail(s: &str) -> Vec<u8> {
    let mut out = uint_word(s.len() as u128).to_vec();
    let mut padded = s.as_bytes().to_vec();
    padded.resize(s.len().div_ceil(32).max(1) * 32, 0);
    out.extend_from_slice(&padded);
    out
}

fn hex_result(bytes: Vec<u8>) -> Value {
    json!(format!("0x{}", hex::encode(bytes)))
}

async fn fake_node(Json(req): Json<Value>) -> Json<Value> {
    let id = req["id"].clone();
    let method = req["method"].as_str().unwrap_or_default();

    let result = match method {
        "eth_getBlockByNumber" => json!({ "number": "0x10", "timestamp": "0x6553f100" }),
        "eth_call" => {
            let to = req["params"][0]["to"].as_str().unwrap_or_default().to_string();
            let data = req["params"][0]["data"].as_str().unwrap_or_default().to_string();
            let sel = &data[2..10];
            if sel == hex::encode(abi::selector("proposalId()")) {
                hex_result(uint_word(3).to_vec())
            } else if sel == hex::encode(abi::selector("idToProposal(uint256)")) {
                let mut out = Vec::new();
                out.extend_from_slice(&uint_word(5 * 32));
                out.extend_from_slice(&uint_word(1));
                out.extend_from_slice(&abi::address_word(&Address::new(CREATOR)));
                out.extend_from_slice(&uint_word(1_700_000_000));
                out.extend_from_slice(&uint_word(2));
                out.extend_from_slice(&string_tail("bafyproposal"));
                hex_result(out)
            } else if sel == hex::encode(abi::selector("proposalToVote(uint256,uint256)")) {
                let mut out = Vec::new();
                out.extend_from_slice(&abi::address_word(&Address::new([7; 20])));
                out.extend_from_slice(&uint_word(2 * 32));
                out.extend_from_slice(&string_tail("[[0,100]]"));
                hex_result(out)
            } else if sel == hex::encode(abi::selector("balanceOf(address)")) {
                assert_eq!(to, TOKEN);
                hex_result(uint_word(5_000_000_000).to_vec())
            } else {
                return Json(json!({
                    "jsonrpc": "2.0", "id": id,
                    "error": { "code": -32000, "message": "execution reverted" }
                }));
            }
        }
        _ => {
            return Json(json!({
                "jsonrpc": "2.0", "id": id,
                "error": { "code": -32601, "message": "method not found" }
            }))
        }
    };
    Json(json!({ "jsonrpc": "2.0", "id": id, "result": result }))
}

async fn fake_gateway(Path(cid): Path<String>) -> Result<String, axum::http::StatusCode> {
    match cid.as_str() {
        "bafyproposal" => Ok(r#"{"name":"p","option":["A","B"]}"#.to_string()),
        "bafyvote" => Ok(r#"[["1","50"]]"#.to_string()),
        _ => Err(axum::http::StatusCode::NOT_FOUND),
    }
}

async fn spawn_server() -> String {
    let app = Router::new()
        .route("/rpc", post(fake_node))
        .route("/ipfs/:cid", get(fake_gateway));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn reader(base: &str) -> JsonRpcChainReader {
    JsonRpcChainReader::new(
        format!("{base}/rpc"),
        ContractAddresses {
            voting: Address::from_str(VOTING).unwrap(),
            token: Address::from_str(TOKEN).unwrap(),
        },
        Duration::from_secs(5),
    )
}

#[tokio::test]
async fn reads_contract_state() {
    let base = spawn_server().await;
    let chain = reader(&base);

    assert_eq!(chain.latest_proposal_index().await.unwrap(), 3);

    let proposal = chain.proposal(1).await.unwrap();
    assert_eq!(proposal.content_id, "bafyproposal");
    assert_eq!(proposal.proposal_type, 1);
    assert_eq!(proposal.creator, Address::new(CREATOR));
    assert_eq!(proposal.expiry, Timestamp::new(1_700_000_000));
    assert_eq!(proposal.vote_count, 2);

    let vote = chain.vote(1, 1).await.unwrap();
    assert_eq!(vote.voter, Address::new([7; 20]));
    assert_eq!(vote.payload, "[[0,100]]");

    let balance = chain.balance_of(&vote.voter).await.unwrap();
    assert_eq!(balance.raw(), 5_000_000_000);

    assert_eq!(
        chain.current_timestamp().await.unwrap(),
        Timestamp::new(0x6553f100)
    );
}

#[tokio::test]
async fn unreachable_node_is_transport_error() {
    let chain = reader("http://127.0.0.1:9");
    assert!(matches!(
        chain.latest_proposal_index().await,
        Err(ChainError::Transport(_))
    ));
}

#[tokio::test]
async fn resolves_options_and_votes() {
    let base = spawn_server().await;
    let resolver = HttpContentResolver::new(format!("{base}/"));
    let voter = Address::new([9; 20]);

    assert_eq!(
        resolver.proposal_options("bafyproposal").await.unwrap(),
        vec!["A".to_string(), "B".to_string()]
    );

    let inline = resolver.decode_vote(&voter, "[[0, 100]]").await.unwrap();
    assert_eq!(inline.len(), 1);
    assert_eq!(inline[0].percent, 100);

    let referenced = resolver.decode_vote(&voter, "bafyvote").await.unwrap();
    assert_eq!(referenced[0].option_id, 1);
    assert_eq!(referenced[0].percent, 50);

    assert!(matches!(
        resolver.decode_vote(&voter, "bafymissing").await,
        Err(DecodeError::Fetch { .. })
    ));
    assert!(matches!(
        resolver.decode_vote(&voter, "bafy-missing-ref").await,
        Err(DecodeError::Fetch { .. })
    ));
}

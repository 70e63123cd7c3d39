//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tally_governance::FetchPolicy;
use tally_types::{Address, NetworkId};

use crate::logging::LogFormat;
use crate::NodeError;

/// Configuration for a tally indexer node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Directory holding the LMDB environment.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// LMDB map size in MiB.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to enable the read API.
    #[serde(default = "default_true")]
    pub enable_rpc: bool,

    /// Read API port (if enabled).
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Whether to expose Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// IPFS HTTP gateway used to resolve proposal content and vote payloads.
    #[serde(default = "default_ipfs_gateway")]
    pub ipfs_gateway: String,

    /// Client-side timeout for chain and gateway requests, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub fetch_policy: FetchPolicyConfig,

    /// Networks to index. Each one gets its own cursors and tasks.
    #[serde(default)]
    pub networks: Vec<NetworkConfig>,
}

/// Independent cadences of the three periodic passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_proposal_sync_secs")]
    pub proposal_sync_secs: u64,
    #[serde(default = "default_vote_sync_secs")]
    pub vote_sync_secs: u64,
    #[serde(default = "default_tally_secs")]
    pub tally_secs: u64,
}

impl ScheduleConfig {
    pub fn proposal_sync_interval(&self) -> Duration {
        Duration::from_secs(self.proposal_sync_secs)
    }

    pub fn vote_sync_interval(&self) -> Duration {
        Duration::from_secs(self.vote_sync_secs)
    }

    pub fn tally_interval(&self) -> Duration {
        Duration::from_secs(self.tally_secs)
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            proposal_sync_secs: default_proposal_sync_secs(),
            vote_sync_secs: default_vote_sync_secs(),
            tally_secs: default_tally_secs(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicyKind {
    #[default]
    SkipAndAdvance,
    RetryThenAdvance,
    HoldAtFailure,
}

/// What a sync pass does with a slot it could not fetch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchPolicyConfig {
    #[serde(default)]
    pub kind: FetchPolicyKind,
    /// Extra attempts for `retry_then_advance`.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl FetchPolicyConfig {
    pub fn to_policy(&self) -> FetchPolicy {
        match self.kind {
            FetchPolicyKind::SkipAndAdvance => FetchPolicy::SkipAndAdvance,
            FetchPolicyKind::RetryThenAdvance => FetchPolicy::RetryThenAdvance {
                max_retries: self.max_retries,
                backoff: Duration::from_millis(self.backoff_ms),
            },
            FetchPolicyKind::HoldAtFailure => FetchPolicy::HoldAtFailure,
        }
    }
}

impl Default for FetchPolicyConfig {
    fn default() -> Self {
        Self {
            kind: FetchPolicyKind::default(),
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

/// One indexed chain and its contracts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub id: NetworkId,
    #[serde(default)]
    pub name: String,
    pub rpc_url: String,
    pub voting_contract: Address,
    /// ERC-20 token whose balances weight the votes.
    pub token_contract: Address,
    /// Seeds the proposal cursor on first boot. Ignored once a cursor exists.
    #[serde(default)]
    pub initial_proposal_index: Option<u64>,
}

impl NetworkConfig {
    /// Name for log lines, falling back to the numeric id.
    pub fn label(&self) -> String {
        if self.name.is_empty() {
            self.id.to_string()
        } else {
            self.name.clone()
        }
    }
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./tally_data")
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_rpc_port() -> u16 {
    9999
}

fn default_ipfs_gateway() -> String {
    "https://ipfs.io".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

fn default_proposal_sync_secs() -> u64 {
    30
}

fn default_vote_sync_secs() -> u64 {
    30
}

fn default_tally_secs() -> u64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    500
}

// ── Impl ───────────────────────────────────────────────────────────────

impl NodeConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &str) -> Result<Self, NodeError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| NodeError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, NodeError> {
        toml::from_str(s).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, NodeError> {
        toml::to_string_pretty(self).map_err(|e| NodeError::Config(e.to_string()))
    }

    /// Reject configurations the node cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        if self.networks.is_empty() {
            return Err(NodeError::Config("no [[networks]] configured".into()));
        }
        let mut seen = HashSet::new();
        for network in &self.networks {
            if !seen.insert(network.id) {
                return Err(NodeError::Config(format!(
                    "network {} configured twice",
                    network.id
                )));
            }
            if network.rpc_url.is_empty() {
                return Err(NodeError::Config(format!(
                    "network {} has no rpc_url",
                    network.label()
                )));
            }
        }
        let schedule = &self.schedule;
        if schedule.proposal_sync_secs == 0 || schedule.vote_sync_secs == 0 || schedule.tally_secs == 0
        {
            return Err(NodeError::Config("schedule intervals must be non-zero".into()));
        }
        self.log_format()?;
        Ok(())
    }

    pub fn log_format(&self) -> Result<LogFormat, NodeError> {
        self.log_format.parse()
    }

    pub fn map_size_bytes(&self) -> usize {
        self.map_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            map_size_mb: default_map_size_mb(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_rpc: default_true(),
            rpc_port: default_rpc_port(),
            enable_metrics: false,
            ipfs_gateway: default_ipfs_gateway(),
            request_timeout_secs: default_request_timeout_secs(),
            schedule: ScheduleConfig::default(),
            fetch_policy: FetchPolicyConfig::default(),
            networks: Vec::new(),
        }
    }
}

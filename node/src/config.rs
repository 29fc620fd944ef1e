//! Node configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use cleanchain_types::EngineParams;

use crate::NodeError;

/// Which storage backend holds locations and users.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// In-process maps. Everything is lost on exit.
    Memory,
    /// LMDB environment under `data_dir`.
    Lmdb,
}

/// Token ledger gateway settings.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Base URL of the ledger gateway. When unset, transfers are simulated.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bearer token sent to the gateway.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Webhook receiving claim/reward events. When unset, events are only logged.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// Configuration for a CleanChain node.
///
/// Can be loaded from a TOML file via [`NodeConfig::from_toml_file`] or
/// built programmatically (e.g. for tests).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Data directory for LMDB storage.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_store")]
    pub store: StoreBackend,

    /// LMDB map size in megabytes.
    #[serde(default = "default_map_size_mb")]
    pub map_size_mb: usize,

    /// Address the HTTP API binds to.
    #[serde(default = "default_rpc_host")]
    pub rpc_host: String,

    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,

    /// Log format: "human" or "json".
    #[serde(default = "default_log_format")]
    pub log_format: String,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whether to expose Prometheus metrics at `/metrics`.
    #[serde(default)]
    pub enable_metrics: bool,

    /// TOML file of `[[locations]]` inserted at startup when missing.
    #[serde(default)]
    pub seed_file: Option<PathBuf>,

    #[serde(default)]
    pub ledger: LedgerConfig,

    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Claim radius, consensus policy, reward amounts and timeouts.
    #[serde(default)]
    pub params: EngineParams,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_data_dir() -> PathBuf {
    PathBuf::from("./cleanchain_data")
}

fn default_store() -> StoreBackend {
    StoreBackend::Lmdb
}

fn default_map_size_mb() -> usize {
    1024
}

fn default_rpc_host() -> String {
    "0.0.0.0".to_string()
}

fn default_rpc_port() -> u16 {
    5000
}

fn default_log_format() -> String {
    "human".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
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

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), NodeError> {
        let p = &self.params;
        if !(p.claim_radius_m.is_finite() && p.claim_radius_m > 0.0) {
            return Err(NodeError::Config(format!(
                "claim_radius_m must be a positive distance, got {}",
                p.claim_radius_m
            )));
        }
        if p.consensus.required_up_votes() == 0 {
            return Err(NodeError::Config("consensus needs at least one up-vote".into()));
        }
        if p.fallback_reward_tokens.is_zero() {
            return Err(NodeError::Config("fallback_reward_tokens must be positive".into()));
        }
        if p.ledger_timeout_secs == 0 || p.notify_timeout_secs == 0 {
            return Err(NodeError::Config("timeouts must be at least one second".into()));
        }
        Ok(())
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            store: default_store(),
            map_size_mb: default_map_size_mb(),
            rpc_host: default_rpc_host(),
            rpc_port: default_rpc_port(),
            log_format: default_log_format(),
            log_level: default_log_level(),
            enable_metrics: false,
            seed_file: None,
            ledger: LedgerConfig::default(),
            notifier: NotifierConfig::default(),
            params: EngineParams::default(),
        }
    }
}

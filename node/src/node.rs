//! The node: opens storage, wires the collaborators and builds the engine.

use std::sync::Arc;

use cleanchain_notify::{LogNotifier, Notifier, WebhookNotifier};
use cleanchain_nullables::{NullLedger, NullStore};
use cleanchain_store::{LocationStore, UserStore};
use cleanchain_store_lmdb::{check_integrity, LmdbEnvironment};
use cleanchain_token_ledger::{HttpLedgerClient, TokenLedger};
use cleanchain_types::SystemClock;
use tracing::{error, info, warn};

use crate::config::{NodeConfig, StoreBackend};
use crate::engine::{Collaborators, LifecycleEngine};
use crate::error::NodeError;
use crate::metrics::EngineMetrics;
use crate::seed::seed_locations;

/// Number of named LMDB databases.
const MAX_DBS: u32 = 4;

pub struct CleanChainNode {
    config: NodeConfig,
    engine: Arc<LifecycleEngine>,
}

impl CleanChainNode {
    pub fn new(config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;

        let (locations, users) = open_stores(&config)?;
        if let Some(path) = &config.seed_file {
            seed_locations(locations.as_ref(), path)?;
        }

        let deps = Collaborators {
            locations,
            users,
            ledger: build_ledger(&config),
            notifier: build_notifier(&config),
            clock: Arc::new(SystemClock),
        };
        let metrics = EngineMetrics::new()
            .map_err(|e| NodeError::Other(format!("failed to register metrics: {e}")))?;
        let engine = LifecycleEngine::new(deps, config.params.clone(), Arc::new(metrics));

        info!(
            store = ?config.store,
            ledger = engine.ledger_name(),
            claim_radius_m = config.params.claim_radius_m,
            min_up_votes = config.params.consensus.required_up_votes(),
            "lifecycle engine ready"
        );

        Ok(Self {
            config,
            engine: Arc::new(engine),
        })
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn engine(&self) -> Arc<LifecycleEngine> {
        Arc::clone(&self.engine)
    }
}

fn open_stores(
    config: &NodeConfig,
) -> Result<(Arc<dyn LocationStore>, Arc<dyn UserStore>), NodeError> {
    match config.store {
        StoreBackend::Memory => {
            warn!("using in-memory store, state is lost on exit");
            let store = Arc::new(NullStore::new());
            Ok((store.clone(), store))
        }
        StoreBackend::Lmdb => {
            let env = LmdbEnvironment::open(
                &config.data_dir,
                MAX_DBS,
                config.map_size_mb.saturating_mul(1024 * 1024),
            )?;
            let report = check_integrity(env.env())?;
            if report.is_healthy() {
                info!(entries = report.total_entries, "LMDB integrity check passed");
            } else {
                for problem in &report.errors {
                    error!(%problem, "LMDB integrity problem");
                }
                return Err(NodeError::Other(format!(
                    "LMDB integrity check failed with {} error(s)",
                    report.errors.len()
                )));
            }
            Ok((Arc::new(env.location_store()), Arc::new(env.user_store())))
        }
    }
}

fn build_ledger(config: &NodeConfig) -> Arc<dyn TokenLedger> {
    match &config.ledger.endpoint {
        Some(endpoint) => Arc::new(HttpLedgerClient::with_timeout(
            endpoint.clone(),
            config.ledger.api_key.clone(),
            config.params.ledger_timeout(),
        )),
        None => {
            warn!("no ledger endpoint configured, reward transfers are simulated");
            Arc::new(NullLedger::new())
        }
    }
}

fn build_notifier(config: &NodeConfig) -> Arc<dyn Notifier> {
    match &config.notifier.webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogNotifier),
    }
}

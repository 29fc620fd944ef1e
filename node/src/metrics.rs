//! Prometheus metrics for the lifecycle engine.
//!
//! [`EngineMetrics`] owns a dedicated [`Registry`] that the HTTP `/metrics`
//! endpoint encodes into the Prometheus text exposition format.

use prometheus::{
    register_histogram_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry, Encoder, Histogram,
    HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

use crate::NodeError;

pub struct EngineMetrics {
    /// The Prometheus registry that owns every metric below.
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Claim attempts, labelled by outcome (`claimed`, `too_far`, ...).
    pub claims: IntCounterVec,
    /// Vote attempts, labelled by outcome (`recorded`, `duplicate`, `self_vote`).
    pub votes: IntCounterVec,
    /// Rewards transferred and finalized.
    pub rewards_issued: IntCounter,
    /// Rewards needing reconciliation, including transfers that landed twice.
    pub reward_failures: IntCounter,
    /// Completed upload markers.
    pub uploads_completed: IntCounter,
    /// Notifications that errored or timed out, labelled by kind.
    pub notification_failures: IntCounterVec,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Locations holding an unconfirmed reward reservation.
    pub rewards_in_flight: IntGauge,

    // ── Histograms ──────────────────────────────────────────────────────
    /// Time from accepting the deciding vote to a finalized reward, in ms.
    pub reward_latency_ms: Histogram,
}

impl EngineMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let claims = register_int_counter_vec_with_registry!(
            Opts::new("cleanchain_claims_total", "Claim attempts by outcome"),
            &["result"],
            registry
        )?;

        let votes = register_int_counter_vec_with_registry!(
            Opts::new("cleanchain_votes_total", "Vote attempts by outcome"),
            &["result"],
            registry
        )?;

        let rewards_issued = register_int_counter_with_registry!(
            Opts::new(
                "cleanchain_rewards_issued_total",
                "Rewards transferred on the ledger and recorded"
            ),
            registry
        )?;

        let reward_failures = register_int_counter_with_registry!(
            Opts::new(
                "cleanchain_reward_failures_total",
                "Reward transfers needing reconciliation: failed, timed out, unfinalized or landed twice"
            ),
            registry
        )?;

        let uploads_completed = register_int_counter_with_registry!(
            Opts::new("cleanchain_uploads_completed_total", "After-photo uploads recorded"),
            registry
        )?;

        let notification_failures = register_int_counter_vec_with_registry!(
            Opts::new(
                "cleanchain_notification_failures_total",
                "Notifications not delivered, by kind"
            ),
            &["kind"],
            registry
        )?;

        let rewards_in_flight = register_int_gauge_with_registry!(
            Opts::new(
                "cleanchain_rewards_in_flight",
                "Locations with an unconfirmed reward reservation"
            ),
            registry
        )?;

        // 1 ms → ~65 s; ledger confirmations are slow.
        let reward_latency_ms = register_histogram_with_registry!(
            HistogramOpts::new(
                "cleanchain_reward_latency_ms",
                "Reward issuance latency in milliseconds"
            )
            .buckets(prometheus::exponential_buckets(1.0, 2.0, 17)?),
            registry
        )?;

        Ok(Self {
            registry,
            claims,
            votes,
            rewards_issued,
            reward_failures,
            uploads_completed,
            notification_failures,
            rewards_in_flight,
            reward_latency_ms,
        })
    }

    /// Encode every metric in the text exposition format.
    pub fn encode(&self) -> Result<String, NodeError> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| NodeError::Other(format!("metrics encoding failed: {e}")))?;
        String::from_utf8(buffer).map_err(|e| NodeError::Other(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_registered_metrics() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.claims.with_label_values(&["claimed"]).inc();
        metrics.rewards_issued.inc();
        metrics.rewards_in_flight.set(2);

        let text = metrics.encode().unwrap();
        assert!(text.contains("cleanchain_claims_total{result=\"claimed\"} 1"));
        assert!(text.contains("cleanchain_rewards_issued_total 1"));
        assert!(text.contains("cleanchain_rewards_in_flight 2"));
    }

    #[test]
    fn registries_are_independent() {
        let a = EngineMetrics::new().unwrap();
        let b = EngineMetrics::new().unwrap();
        a.rewards_issued.inc();
        assert_eq!(b.rewards_issued.get(), 0);
    }
}

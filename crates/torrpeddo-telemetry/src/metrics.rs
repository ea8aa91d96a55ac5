//! Prometheus-backed metrics registry and snapshot helpers.
//!
//! # Design
//! - Encapsulates collector registration to keep the public API small.
//! - Collectors cover HTTP traffic, transfer admission, deferred deletion and domain events.

use std::sync::Arc;

use prometheus::{IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use serde::Serialize;

use crate::error::{Result, TelemetryError};

/// Prometheus-backed metrics registry shared across services.
#[derive(Clone)]
pub struct Metrics {
    inner: Arc<MetricsInner>,
}

struct MetricsInner {
    registry: Registry,
    http_requests_total: IntCounterVec,
    transfers_added_total: IntCounterVec,
    registration_failures_total: IntCounter,
    deletions_total: IntCounterVec,
    events_emitted_total: IntCounterVec,
    tracked_transfers: IntGauge,
}

/// Snapshot of selected gauges and counters for health reporting.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Transfers currently held in the registry.
    pub tracked_transfers: i64,
    /// Registrations the engine refused.
    pub registration_failures_total: u64,
}

impl Metrics {
    /// Construct a new metrics registry with the standard collectors registered.
    ///
    /// # Errors
    ///
    /// Returns an error if any of the Prometheus collectors cannot be built or registered.
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let http_requests_total = counter_vec(
            "http_requests_total",
            "Total HTTP requests received",
            &["route", "code"],
        )?;
        let transfers_added_total = counter_vec(
            "transfers_added_total",
            "Transfers admitted by descriptor source",
            &["source"],
        )?;
        let registration_failures_total = IntCounter::with_opts(Opts::new(
            "registration_failures_total",
            "Engine registrations that failed",
        ))
        .map_err(|source| TelemetryError::built("registration_failures_total", source))?;
        let deletions_total = counter_vec(
            "deletions_total",
            "Deferred payload deletions by outcome",
            &["outcome"],
        )?;
        let events_emitted_total = counter_vec(
            "events_emitted_total",
            "Domain events emitted by type",
            &["type"],
        )?;
        let tracked_transfers = IntGauge::with_opts(Opts::new(
            "tracked_transfers",
            "Transfers held in the registry",
        ))
        .map_err(|source| TelemetryError::built("tracked_transfers", source))?;

        register(&registry, "http_requests_total", &http_requests_total)?;
        register(&registry, "transfers_added_total", &transfers_added_total)?;
        register(
            &registry,
            "registration_failures_total",
            &registration_failures_total,
        )?;
        register(&registry, "deletions_total", &deletions_total)?;
        register(&registry, "events_emitted_total", &events_emitted_total)?;
        register(&registry, "tracked_transfers", &tracked_transfers)?;

        Ok(Self {
            inner: Arc::new(MetricsInner {
                registry,
                http_requests_total,
                transfers_added_total,
                registration_failures_total,
                deletions_total,
                events_emitted_total,
                tracked_transfers,
            }),
        })
    }

    /// Increment the HTTP request counter for the given route and status code.
    pub fn inc_http_request(&self, route: &str, status: u16) {
        self.inner
            .http_requests_total
            .with_label_values(&[route, &status.to_string()])
            .inc();
    }

    /// Count an admitted transfer by descriptor source (`magnet` or `metainfo`).
    pub fn inc_transfer_added(&self, source: &str) {
        self.inner
            .transfers_added_total
            .with_label_values(&[source])
            .inc();
    }

    /// Count a failed engine registration.
    pub fn inc_registration_failure(&self) {
        self.inner.registration_failures_total.inc();
    }

    /// Count a deferred deletion outcome (`removed`, `absent`, `failed`, `skipped`).
    pub fn inc_deletion(&self, outcome: &str) {
        self.inner
            .deletions_total
            .with_label_values(&[outcome])
            .inc();
    }

    /// Increment the emitted event counter for the specific event type.
    pub fn inc_event(&self, event_type: &str) {
        self.inner
            .events_emitted_total
            .with_label_values(&[event_type])
            .inc();
    }

    /// Set the tracked transfer gauge.
    pub fn set_tracked_transfers(&self, count: usize) {
        self.inner
            .tracked_transfers
            .set(i64::try_from(count).unwrap_or(i64::MAX));
    }

    /// Render the metrics registry using the Prometheus text exposition format.
    ///
    /// # Errors
    ///
    /// Returns [`TelemetryError::Render`] when the text encoder fails.
    pub fn render(&self) -> Result<String> {
        TextEncoder::new()
            .encode_to_string(&self.inner.registry.gather())
            .map_err(|source| TelemetryError::Render { source })
    }

    /// Take a point-in-time snapshot of the most relevant gauges and counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tracked_transfers: self.inner.tracked_transfers.get(),
            registration_failures_total: self.inner.registration_failures_total.get(),
        }
    }
}

fn counter_vec(name: &'static str, help: &str, labels: &[&str]) -> Result<IntCounterVec> {
    IntCounterVec::new(Opts::new(name, help), labels)
        .map_err(|source| TelemetryError::built(name, source))
}

fn register<C>(registry: &Registry, name: &'static str, collector: &C) -> Result<()>
where
    C: prometheus::core::Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|source| TelemetryError::registered(name, source))
}

// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metrics collaborator backing the `STATUS`/`RESET` control requests and
//! the metrics listener group. The metrics schema itself is out of scope;
//! this wraps a `prometheus` registry with the handful of counters the
//! supervisor updates as it runs and exposes text encoding for the scrape
//! endpoint.

use std::sync::Arc;

use prometheus::{IntCounter, IntGauge, Registry, TextEncoder};

pub struct MetricsExporter {
    registry: Registry,
    pub backups_started: IntCounter,
    pub backups_failed: IntCounter,
    pub active_receivers: IntGauge,
    pub compression_sweeps: IntCounter,
    pub retention_sweeps: IntCounter,
}

impl MetricsExporter {
    #[allow(clippy::expect_used)]
    pub fn new() -> Arc<Self> {
        let registry = Registry::new();

        let backups_started =
            IntCounter::new("pgmoneta_backups_started_total", "backups started").expect("constant metric name is valid");
        let backups_failed =
            IntCounter::new("pgmoneta_backups_failed_total", "backups failed").expect("constant metric name is valid");
        let active_receivers = IntGauge::new("pgmoneta_active_receivers", "registered WAL receivers")
            .expect("constant metric name is valid");
        let compression_sweeps = IntCounter::new("pgmoneta_compression_sweeps_total", "compression sweeps run")
            .expect("constant metric name is valid");
        let retention_sweeps = IntCounter::new("pgmoneta_retention_sweeps_total", "retention sweeps run")
            .expect("constant metric name is valid");

        registry
            .register(Box::new(backups_started.clone()))
            .expect("metric registered once per exporter");
        registry
            .register(Box::new(backups_failed.clone()))
            .expect("metric registered once per exporter");
        registry
            .register(Box::new(active_receivers.clone()))
            .expect("metric registered once per exporter");
        registry
            .register(Box::new(compression_sweeps.clone()))
            .expect("metric registered once per exporter");
        registry
            .register(Box::new(retention_sweeps.clone()))
            .expect("metric registered once per exporter");

        Arc::new(MetricsExporter {
            registry,
            backups_started,
            backups_failed,
            active_receivers,
            compression_sweeps,
            retention_sweeps,
        })
    }

    /// Render the current values in Prometheus text exposition format, for
    /// the metrics listener group's scrape handler.
    pub fn encode(&self) -> String {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        encoder.encode_to_string(&families).unwrap_or_default()
    }

    /// `RESET` control request: zero every counter. Gauges are left alone
    /// since they reflect current state, not an accumulated count.
    pub fn reset(&self) {
        self.backups_started.reset();
        self.backups_failed.reset();
        self.compression_sweeps.reset();
        self.retention_sweeps.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_includes_counter_names() {
        let exporter = MetricsExporter::new();
        exporter.backups_started.inc();
        let text = exporter.encode();
        assert!(text.contains("pgmoneta_backups_started_total"));
    }

    #[test]
    fn reset_zeroes_counters() {
        let exporter = MetricsExporter::new();
        exporter.backups_started.inc_by(5);
        exporter.reset();
        assert_eq!(exporter.backups_started.get(), 0);
    }
}

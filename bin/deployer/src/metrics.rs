//! Prometheus metrics for the deployer.
//!
//! All metrics are aggregated in the [`Metrics`] struct for easy tracking and management.

use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Aggregated metrics for the deployer.
///
/// Metrics are registered with the global metrics registry on creation. Without
/// an installed recorder every call is a no-op.
#[derive(Debug, Clone)]
pub struct Metrics {
    _private: (),
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    /// Create a new metrics instance and register all metric descriptions.
    pub fn new() -> Self {
        Self::register_descriptions();
        Self { _private: () }
    }

    /// Register metric descriptions with the global registry.
    fn register_descriptions() {
        // Deployment metrics
        describe_counter!(
            "deployer_deployments_total",
            "Total number of module deployments by outcome"
        );
        describe_counter!(
            "deployer_deployments_skipped_total",
            "Total number of module runs skipped because the journal already had them"
        );
        describe_histogram!(
            "deployer_deployment_duration_seconds",
            "Duration of each module deployment in seconds"
        );

        // Verification metrics
        describe_counter!(
            "deployer_verifications_total",
            "Total number of verification attempts by outcome"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Deployment metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a completed (or failed) module deployment.
    pub fn record_deployment(&self, network: &str, success: bool, duration: Duration) {
        let outcome = if success { "success" } else { "failure" };
        counter!(
            "deployer_deployments_total",
            "network" => network.to_string(),
            "outcome" => outcome
        )
        .increment(1);
        histogram!("deployer_deployment_duration_seconds", "network" => network.to_string())
            .record(duration.as_secs_f64());
    }

    /// Record a module run skipped by the journal.
    pub fn record_skipped(&self, network: &str) {
        counter!("deployer_deployments_skipped_total", "network" => network.to_string())
            .increment(1);
    }

    // ─────────────────────────────────────────────────────────────────────────────
    // Verification metrics
    // ─────────────────────────────────────────────────────────────────────────────

    /// Record a verification attempt.
    pub fn record_verification(&self, network: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        counter!(
            "deployer_verifications_total",
            "network" => network.to_string(),
            "outcome" => outcome
        )
        .increment(1);
    }
}

/// Install the Prometheus metrics exporter and start the HTTP server.
///
/// Returns an error if the server fails to bind to the specified port.
pub fn install_prometheus_exporter(port: u16) -> eyre::Result<()> {
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::net::SocketAddr;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| eyre::eyre!("Failed to install Prometheus exporter: {}", e))?;

    Ok(())
}

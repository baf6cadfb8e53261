use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the Prometheus recorder once per process. Later calls (tests
/// building several applications) reuse the first handle.
pub fn init_metrics() {
    METRICS_HANDLE.get_or_init(|| match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => handle,
        Err(e) => {
            tracing::warn!(error = %e, "Prometheus recorder already installed, metrics detached");
            PrometheusBuilder::new().build_recorder().handle()
        }
    });
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Catalog plans are labelled by id; free-form product ids collapse into
/// `custom` to keep label cardinality bounded.
fn product_label(product_id: &str) -> String {
    if super::catalog::is_plan(product_id) {
        product_id.to_string()
    } else {
        "custom".to_string()
    }
}

pub fn record_preference_created(product_id: &str, provider: &'static str) {
    counter!(
        "checkout_preferences_created_total",
        "product" => product_label(product_id),
        "provider" => provider
    )
    .increment(1);
}

pub fn record_preference_failure(product_id: &str, provider: &'static str, reason: &'static str) {
    counter!(
        "checkout_preference_failures_total",
        "product" => product_label(product_id),
        "provider" => provider,
        "reason" => reason
    )
    .increment(1);
}

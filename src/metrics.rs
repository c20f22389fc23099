use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub const CACHE_HITS: &str = "verifier_cache_hits_total";
pub const CACHE_MISSES: &str = "verifier_cache_misses_total";
pub const CACHE_ERRORS: &str = "verifier_cache_errors_total";
pub const ORACLE_FAILURES: &str = "verifier_oracle_failures_total";
pub const RATE_LIMITED: &str = "verifier_rate_limited_total";
pub const ANALYSES: &str = "verifier_analyses_total";
pub const ANALYSIS_DURATION_MS: &str = "verifier_analysis_duration_ms";

/// One-time metric descriptions (so series show up with help text on /metrics).
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(CACHE_HITS, "Text analyses answered from the cache.");
        describe_counter!(CACHE_MISSES, "Text analyses computed fresh.");
        describe_counter!(CACHE_ERRORS, "Cache lookups or writes that failed.");
        describe_counter!(ORACLE_FAILURES, "Oracle calls that ended in an error.");
        describe_counter!(RATE_LIMITED, "Analysis requests rejected by the per-client limit.");
        describe_counter!(ANALYSES, "Completed analyses by kind.");
        describe_histogram!(ANALYSIS_DURATION_MS, "Analysis wall time in milliseconds.");
    });
}

/// Process-wide Prometheus recorder. The global recorder can only be installed
/// once, so every caller shares the first handle.
pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    pub fn install() -> anyhow::Result<&'static Metrics> {
        static INSTANCE: OnceCell<Metrics> = OnceCell::new();
        INSTANCE.get_or_try_init(|| {
            let handle = PrometheusBuilder::new()
                .install_recorder()
                .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;
            ensure_described();
            Ok(Metrics { handle })
        })
    }

    /// Router exposing `/metrics` in the Prometheus exposition format.
    pub fn router<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}

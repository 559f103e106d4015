use axum::{routing::get, Router};
use metrics::{describe_counter, describe_gauge, describe_histogram, Unit};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

static HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

pub struct Metrics {
    pub handle: PrometheusHandle,
}

impl Metrics {
    /// Install the Prometheus recorder. Safe to call more than once per process;
    /// later calls reuse the first handle.
    pub fn init() -> anyhow::Result<Self> {
        let handle = HANDLE
            .get_or_try_init(|| -> anyhow::Result<PrometheusHandle> {
                let handle = PrometheusBuilder::new().install_recorder()?;
                describe();
                Ok(handle)
            })?
            .clone();
        Ok(Self { handle })
    }

    /// `/metrics` in the Prometheus exposition format.
    pub fn router(&self) -> Router {
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

fn describe() {
    describe_counter!(
        "gateway_requests_total",
        "Gateway calls by outcome (ok, network_error, status_error, decode_error, short_circuit)"
    );
    describe_counter!("fallback_served_total", "Responses served from fallback data, by domain");
    describe_counter!("news_cache_hits_total", "News reads answered from a fresh cache entry");
    describe_counter!("news_cache_misses_total", "News reads that ran a fetch cycle");
    describe_counter!("ai_requests_total", "LLM completions by outcome");
    describe_gauge!("gateway_available", "1 when the gateway is believed reachable");
    describe_histogram!(
        "gateway_request_ms",
        Unit::Milliseconds,
        "Gateway call latency"
    );
}

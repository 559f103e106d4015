//! Market-data gateway: the HTTP boundary to the upstream data platform.
//!
//! [`Upstream`] is the seam every data service talks to. [`HttpGateway`] is the
//! production implementation; [`ScriptedUpstream`] answers from a closure and counts
//! calls, for tests and local runs without a platform.

pub mod availability;
pub mod error;
pub mod params;
pub mod scripted;

use std::time::{Duration, Instant};

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::clock::{SharedClock, SystemClock};
use crate::config::providers::ProviderCredentials;
use crate::config::GatewayConfig;

pub use availability::ProviderAvailability;
pub use error::GatewayError;
pub use params::Params;
pub use scripted::ScriptedUpstream;

pub type SharedUpstream = std::sync::Arc<dyn Upstream>;

#[async_trait]
pub trait Upstream: Send + Sync {
    /// One GET against the platform, without availability gating.
    async fn request(&self, endpoint: &str, params: &Params) -> Result<Value, GatewayError>;

    /// Raw `/health` check.
    async fn probe(&self) -> bool;

    fn availability(&self) -> &ProviderAvailability;

    /// How long a probe result stays authoritative; `None` means until reset.
    fn probe_ttl(&self) -> Option<chrono::Duration> {
        None
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// Probe now and record the result.
    async fn check_connection(&self) -> bool {
        let ok = self.probe().await;
        self.availability().record_probe(ok, self.now());
        info!(target: "gateway", available = ok, "health probe finished");
        ok
    }

    /// Probe only if nothing has been recorded yet (or the probe TTL ran out).
    /// Concurrent callers wait for a single in-flight health check.
    async fn ensure_checked(&self) -> bool {
        let availability = self.availability();
        if !availability.needs_probe(self.now(), self.probe_ttl()) {
            return availability.is_available();
        }

        let _gate = availability.probe_gate().lock().await;
        // another caller may have checked while we waited
        if availability.needs_probe(self.now(), self.probe_ttl()) {
            self.check_connection().await
        } else {
            availability.is_available()
        }
    }

    fn reset_probe(&self) {
        self.availability().reset();
    }

    /// Gated GET: short-circuits when the gateway is known to be down and keeps the
    /// availability flag in step with what the call proved.
    async fn get_json(&self, endpoint: &str, params: &Params) -> Result<Value, GatewayError> {
        if !self.ensure_checked().await {
            counter!("gateway_requests_total", "outcome" => "short_circuit").increment(1);
            return Err(GatewayError::Unavailable);
        }

        let t0 = Instant::now();
        let res = self.request(endpoint, params).await;
        histogram!("gateway_request_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);

        let outcome = match &res {
            Ok(_) => "ok",
            Err(e) if e.is_network() => "network_error",
            Err(GatewayError::UpstreamStatus { .. }) => "status_error",
            Err(_) => "decode_error",
        };
        match &res {
            Err(e) if e.is_network() => self.availability().mark_down(),
            _ => self.availability().mark_up(),
        }
        counter!("gateway_requests_total", "outcome" => outcome).increment(1);

        if let Err(e) = &res {
            warn!(target: "gateway", endpoint, error = %e, "gateway request failed");
        } else {
            debug!(target: "gateway", endpoint, "gateway request ok");
        }
        res
    }
}

/// reqwest-backed gateway to an OpenBB-style platform.
pub struct HttpGateway {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    request_timeout: Duration,
    health_timeout: Duration,
    probe_ttl: Option<chrono::Duration>,
    availability: ProviderAvailability,
    clock: SharedClock,
}

impl HttpGateway {
    pub fn new(cfg: &GatewayConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kaizen-markets/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .build()
            .context("building gateway http client")?;

        info!(
            target: "gateway",
            base_url = %cfg.base_url,
            has_api_key = cfg.api_key.is_some(),
            timeout_secs = cfg.timeout_secs,
            "gateway configured"
        );

        Ok(Self {
            http,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone().filter(|k| !k.trim().is_empty()),
            request_timeout: Duration::from_secs(cfg.timeout_secs),
            health_timeout: Duration::from_secs(cfg.health_timeout_secs),
            probe_ttl: cfg
                .probe_ttl_secs
                .map(|s| chrono::Duration::seconds(s as i64)),
            availability: ProviderAvailability::new(),
            clock: std::sync::Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: SharedClock) -> Self {
        self.clock = clock;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Register vendor credentials with the platform (`POST /user/credentials`).
    pub async fn push_credentials(&self, creds: &ProviderCredentials) -> Result<(), GatewayError> {
        let body = serde_json::json!({ "credentials": creds.as_credentials_map() });
        let mut req = self
            .http
            .post(self.url("/user/credentials"))
            .timeout(self.request_timeout)
            .json(&body);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| GatewayError::from_reqwest(e, self.request_timeout))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                message: status_message(status, &text),
            });
        }
        info!(target: "gateway", configured = creds.configured_count(), "credentials pushed to gateway");
        Ok(())
    }
}

#[async_trait]
impl Upstream for HttpGateway {
    async fn request(&self, endpoint: &str, params: &Params) -> Result<Value, GatewayError> {
        let timeout = self.request_timeout;
        let mut req = self
            .http
            .get(self.url(endpoint))
            .query(params.pairs())
            .header(CONTENT_TYPE, "application/json");
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let call = async {
            let resp = req
                .send()
                .await
                .map_err(|e| GatewayError::from_reqwest(e, timeout))?;
            let status = resp.status();
            if !status.is_success() {
                let text = resp.text().await.unwrap_or_default();
                return Err(GatewayError::UpstreamStatus {
                    status: status.as_u16(),
                    message: status_message(status, &text),
                });
            }
            resp.json::<Value>()
                .await
                .map_err(|e| GatewayError::from_reqwest(e, timeout))
        };

        match tokio::time::timeout(timeout, call).await {
            Ok(res) => res,
            Err(_) => Err(GatewayError::Timeout(timeout)),
        }
    }

    async fn probe(&self) -> bool {
        let mut req = self.http.get(self.url("/health"));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let call = req.send();
        match tokio::time::timeout(self.health_timeout, call).await {
            Ok(Ok(resp)) => resp.status().is_success(),
            Ok(Err(e)) => {
                warn!(target: "gateway", error = %e, "health probe failed");
                false
            }
            Err(_) => {
                warn!(target: "gateway", timeout = ?self.health_timeout, "health probe timed out");
                false
            }
        }
    }

    fn availability(&self) -> &ProviderAvailability {
        &self.availability
    }

    fn probe_ttl(&self) -> Option<chrono::Duration> {
        self.probe_ttl
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }
}

/// Status line plus the start of the body, capped so logs stay readable.
fn status_message(status: reqwest::StatusCode, body: &str) -> String {
    let reason = status.canonical_reason().unwrap_or("Unknown");
    let body = body.trim();
    if body.is_empty() {
        reason.to_string()
    } else {
        let snippet: String = body.chars().take(200).collect();
        format!("{reason}: {snippet}")
    }
}

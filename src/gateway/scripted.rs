use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{GatewayError, Params, ProviderAvailability, Upstream};

type Responder = Box<dyn Fn(&str, &Params) -> Result<Value, GatewayError> + Send + Sync>;

/// In-process upstream that answers from a closure and records every call.
///
/// Goes through the same availability gating as [`super::HttpGateway`], so a failing
/// probe short-circuits data calls here too.
pub struct ScriptedUpstream {
    responder: Responder,
    probe_ok: AtomicBool,
    probes: AtomicUsize,
    calls: Mutex<Vec<(String, Params)>>,
    availability: ProviderAvailability,
}

impl ScriptedUpstream {
    pub fn new(
        responder: impl Fn(&str, &Params) -> Result<Value, GatewayError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            responder: Box::new(responder),
            probe_ok: AtomicBool::new(true),
            probes: AtomicUsize::new(0),
            calls: Mutex::new(Vec::new()),
            availability: ProviderAvailability::new(),
        }
    }

    /// Every call answers `{ "results": [] }`.
    pub fn empty() -> Self {
        Self::new(|_, _| Ok(serde_json::json!({ "results": [] })))
    }

    /// Health probe fails and any call that slips through is refused.
    pub fn unreachable() -> Self {
        let s = Self::new(|_, _| Err(GatewayError::Connectivity("connection refused".into())));
        s.set_probe_ok(false);
        s
    }

    pub fn set_probe_ok(&self, ok: bool) {
        self.probe_ok.store(ok, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<(String, Params)> {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|p| p.into_inner()).len()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn request(&self, endpoint: &str, params: &Params) -> Result<Value, GatewayError> {
        self.calls
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push((endpoint.to_string(), params.clone()));
        (self.responder)(endpoint, params)
    }

    async fn probe(&self) -> bool {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.probe_ok.load(Ordering::SeqCst)
    }

    fn availability(&self) -> &ProviderAvailability {
        &self.availability
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn probes_once_then_serves_from_the_flag() {
        let up = ScriptedUpstream::new(|ep, _| Ok(json!({ "endpoint": ep })));
        let p = Params::new().with("symbol", "AAPL");

        let a = up.get_json("/a", &p).await.unwrap();
        let b = up.get_json("/b", &p).await.unwrap();
        assert_eq!(a["endpoint"], "/a");
        assert_eq!(b["endpoint"], "/b");
        assert_eq!(up.probe_count(), 1);
        assert_eq!(up.call_count(), 2);
        assert!(up.availability().is_available());
    }

    #[tokio::test]
    async fn failed_probe_short_circuits_without_calls() {
        let up = ScriptedUpstream::unreachable();
        let err = up.get_json("/equity/price/quote", &Params::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::Unavailable));
        assert_eq!(up.call_count(), 0);
        assert!(!up.availability().is_available());

        // sticky until reset
        let _ = up.get_json("/equity/price/quote", &Params::new()).await;
        assert_eq!(up.probe_count(), 1);

        up.set_probe_ok(true);
        up.reset_probe();
        let _ = up.get_json("/equity/price/quote", &Params::new()).await;
        assert_eq!(up.probe_count(), 2);
        assert_eq!(up.call_count(), 1);
    }

    #[tokio::test]
    async fn network_failure_flips_flag_down() {
        let up = ScriptedUpstream::new(|_, _| {
            Err(GatewayError::Timeout(std::time::Duration::from_secs(15)))
        });
        assert!(up.check_connection().await);
        let _ = up.get_json("/news/world", &Params::new()).await;
        assert!(!up.availability().is_available());
    }

    #[tokio::test]
    async fn recovers_after_a_single_timeout() {
        let failures = AtomicUsize::new(0);
        let up = ScriptedUpstream::new(move |_, _| {
            if failures.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(GatewayError::Timeout(std::time::Duration::from_secs(15)))
            } else {
                Ok(json!({ "results": [] }))
            }
        });

        let first = up.get_json("/news/world", &Params::new()).await;
        assert!(matches!(first, Err(GatewayError::Timeout(_))));
        assert!(!up.availability().is_available());

        for _ in 0..50 {
            up.get_json("/news/world", &Params::new())
                .await
                .expect("gateway is back");
        }
        assert_eq!(up.call_count(), 51);
        assert_eq!(up.probe_count(), 2, "one more health check after the timeout");
        assert!(up.availability().is_available());
    }

    #[tokio::test]
    async fn status_error_keeps_flag_up() {
        let up = ScriptedUpstream::new(|_, _| {
            Err(GatewayError::UpstreamStatus {
                status: 500,
                message: "Internal Server Error".into(),
            })
        });
        let err = up.get_json("/news/world", &Params::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::UpstreamStatus { status: 500, .. }));
        assert!(up.availability().is_available());
    }
}

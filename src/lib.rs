// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod ai;
pub mod ai_bootstrap;
pub mod api;
pub mod clock;
pub mod config;
pub mod dataset;
pub mod gateway;
pub mod market;
pub mod metrics;
pub mod news;

pub use crate::api::{create_router, AppState};

use std::sync::Arc;

use axum::Router;
use tracing::{info, warn};

use crate::clock::{SharedClock, SystemClock};
use crate::config::ai::DEFAULT_AI_CONFIG_PATH;
use crate::config::providers::ProviderCredentials;
use crate::config::AppConfig;
use crate::gateway::{HttpGateway, Upstream};

/// `DEBUG_ROUTES=1` mounts `/metrics`.
pub fn debug_routes_enabled() -> bool {
    std::env::var("DEBUG_ROUTES").is_ok_and(|v| v.trim() == "1")
}

fn ai_config_path() -> String {
    std::env::var("AI_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_AI_CONFIG_PATH.to_string())
}

/// Full application router built from the environment.
pub async fn app() -> anyhow::Result<Router> {
    let cfg = AppConfig::from_env()?;
    app_from_config(cfg).await
}

pub async fn app_from_config(cfg: AppConfig) -> anyhow::Result<Router> {
    let clock: SharedClock = Arc::new(SystemClock);
    let gateway = Arc::new(HttpGateway::new(&cfg.gateway)?.with_clock(clock.clone()));
    let credentials = ProviderCredentials::from_env();
    info!(
        configured = credentials.configured_count(),
        best_provider = credentials.best_provider(),
        "provider credentials loaded"
    );

    // Startup side effects are logged, never fatal.
    if cfg.gateway.push_credentials && credentials.configured_count() > 0 {
        if let Err(e) = gateway.push_credentials(&credentials).await {
            warn!(error = %e, "could not push credentials to gateway");
        }
    }
    if cfg.gateway.probe_on_start {
        let available = gateway.check_connection().await;
        info!(available, base_url = gateway.base_url(), "startup gateway probe");
    }

    let ai = ai_bootstrap::AiRuntime::from_path(ai_config_path());
    let state = AppState::new(gateway, &cfg, credentials, ai.client, clock);
    let mut router = create_router(state);

    if debug_routes_enabled() {
        let m = metrics::Metrics::init()?;
        router = router.merge(m.router());
        info!("debug routes enabled: /metrics");
    }
    Ok(router)
}

/// One-off smoke test of the configured LLM client. Logs the outcome, never panics.
pub async fn run_ai_quick_probe() -> anyhow::Result<()> {
    let ai = ai_bootstrap::AiRuntime::from_path(ai_config_path());
    ai.quick_probe().await;
    info!("AI quick probe finished");
    Ok(())
}

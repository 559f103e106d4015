//! Kaizen Markets binary entrypoint.
//! Boots the Axum HTTP server on Shuttle with the dashboard routes and shared services.

use shuttle_axum::ShuttleAxum;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn in_dev_environment() -> bool {
    if cfg!(debug_assertions) {
        return true;
    }
    let env = std::env::var("SHUTTLE_ENV").unwrap_or_default();
    ["local", "development", "dev"]
        .iter()
        .any(|e| env.eq_ignore_ascii_case(e))
}

/// Local log output. Needs a dev build (or a dev `SHUTTLE_ENV`) and `KAIZEN_DEV_LOG=1`;
/// `KAIZEN_LOG_FORMAT=json` switches to JSON lines.
fn enable_dev_tracing() {
    let requested = std::env::var("KAIZEN_DEV_LOG").is_ok_and(|v| v.trim() == "1");
    if !requested || !in_dev_environment() {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("kaizen_markets=info,warn"));

    let json = std::env::var("KAIZEN_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Shuttle may already have installed a subscriber.
    let registry = tracing_subscriber::registry().with(filter);
    let _ = if json {
        registry.with(fmt::layer().json()).try_init()
    } else {
        registry.with(fmt::layer().compact()).try_init()
    };
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // .env is optional; production sets real env vars.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    if std::env::var("AI_QUICK_PROBE").is_ok_and(|v| v == "1") {
        if let Err(e) = kaizen_markets::run_ai_quick_probe().await {
            tracing::warn!(error = ?e, "AI quick probe didn't run");
        }
    }

    let router = kaizen_markets::app().await?;
    Ok(router.into())
}

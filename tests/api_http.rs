// tests/api_http.rs
//
// HTTP-level tests for the dashboard Router without opening sockets.
// The router is built around an in-process upstream and a manual clock and
// exercised via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /health
// - GET /api/news (world, market, company; limits and validation)
// - GET /api/news/search
// - GET /api/openbb/* (quote validation, fallback headers, alternative types)
// - GET /api/openbb/status, POST /api/openbb/status/refresh
// - POST /api/ai/chat, GET /api/ai/market-summary, POST /api/ai/stock-analysis

use std::sync::Arc;

use axum::{
    body::{self, Body},
    Router,
};
use http::{HeaderMap, Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value as Json};
use tower::ServiceExt as _; // for `oneshot`

use kaizen_markets::ai::{DisabledClient, DynAiClient, FailingClient, MockClient};
use kaizen_markets::api::{DATA_SOURCE_HEADER, FALLBACK_REASON_HEADER};
use kaizen_markets::clock::{ManualClock, SharedClock};
use kaizen_markets::config::providers::ProviderCredentials;
use kaizen_markets::config::AppConfig;
use kaizen_markets::gateway::{ScriptedUpstream, SharedUpstream};
use kaizen_markets::{create_router, AppState};

const BODY_LIMIT: usize = 1024 * 1024;

fn clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 6, 14, 30, 0).unwrap())
}

fn router_with(upstream: Arc<ScriptedUpstream>, ai: DynAiClient) -> Router {
    let gateway: SharedUpstream = upstream;
    let clock: SharedClock = Arc::new(clock());
    let state = AppState::new(
        gateway,
        &AppConfig::default(),
        ProviderCredentials::default(),
        ai,
        clock,
    );
    create_router(state)
}

/// News rows for `/news/company`, one per requested symbol, hours apart.
fn company_news_upstream() -> Arc<ScriptedUpstream> {
    Arc::new(ScriptedUpstream::new(|endpoint, params| {
        let symbol = params.get("symbol").unwrap_or("WORLD").to_string();
        let hour = match symbol.as_str() {
            "AAPL" => 9,
            "GOOGL" => 13,
            "MSFT" => 11,
            "AMZN" => 8,
            "TSLA" => 12,
            _ => 10,
        };
        Ok(json!({
            "results": [
                {
                    "date": format!("2025-05-06T{hour:02}:00:00Z"),
                    "title": format!("{symbol} headline from {endpoint}"),
                    "text": "Body.",
                    "symbols": symbol,
                },
                {
                    "date": format!("2025-05-05T{hour:02}:00:00Z"),
                    "title": format!("{symbol} older headline"),
                    "symbols": symbol,
                }
            ]
        }))
    }))
}

async fn get(app: Router, uri: &str) -> (StatusCode, HeaderMap, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    send(app, req).await
}

async fn post(app: Router, uri: &str, body: &str) -> (StatusCode, HeaderMap, Json) {
    let req = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .expect("build POST");
    send(app, req).await
}

async fn send(app: Router, req: Request<Body>) -> (StatusCode, HeaderMap, Json) {
    let resp = app.oneshot(req).await.expect("oneshot");
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT)
        .await
        .expect("read body");
    let json = serde_json::from_slice(&bytes).unwrap_or(Json::Null);
    (status, headers, json)
}

#[tokio::test]
async fn health_returns_200() {
    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(MockClient::default()));
    let req = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .expect("build GET /health");
    let resp = app.oneshot(req).await.expect("oneshot /health");
    assert_eq!(resp.status(), StatusCode::OK);
}

/// Market feed respects `limit` and comes back newest first.
#[tokio::test]
async fn market_news_is_limited_and_sorted_descending() {
    let app = router_with(company_news_upstream(), Arc::new(MockClient::default()));
    let (status, headers, v) = get(app, "/api/news?type=market&limit=5").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[DATA_SOURCE_HEADER], "live");
    let articles = v["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 5);

    let dates: Vec<&str> = articles
        .iter()
        .map(|a| a["date"].as_str().expect("date string"))
        .collect();
    let mut sorted = dates.clone();
    sorted.sort_by(|a, b| b.cmp(a));
    assert_eq!(dates, sorted, "articles must be newest first");
    assert!(articles[0]["title"].as_str().unwrap().starts_with("GOOGL"));
    assert!(v["timestamp"].is_string());
}

/// Unreachable gateway: company news for a ticker without a demo match gets the
/// first three demo articles, flagged as fallback.
#[tokio::test]
async fn company_news_falls_back_when_gateway_is_down() {
    let app = router_with(Arc::new(ScriptedUpstream::unreachable()), Arc::new(MockClient::default()));
    let (status, headers, v) = get(app, "/api/news?type=company&symbol=aapl").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[DATA_SOURCE_HEADER], "fallback");
    assert_eq!(headers[FALLBACK_REASON_HEADER], "unavailable");
    let articles = v["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 3);
    assert_eq!(
        articles[0]["title"],
        "AI Revolution Drives Tech Stocks to New Heights"
    );
}

#[tokio::test]
async fn company_news_without_symbol_is_400() {
    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(MockClient::default()));
    let (status, _, v) = get(app, "/api/news?type=company").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v, json!({ "error": "Symbol required for company news" }));
}

#[tokio::test]
async fn news_search_requires_query_and_filters_fallback_set() {
    let app = router_with(Arc::new(ScriptedUpstream::unreachable()), Arc::new(MockClient::default()));
    let (status, _, v) = get(app.clone(), "/api/news/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Query is required");

    let (status, headers, v) = get(app, "/api/news/search?q=federal%20reserve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[DATA_SOURCE_HEADER], "fallback");
    let articles = v["articles"].as_array().expect("articles array");
    assert_eq!(articles.len(), 1);
    assert_eq!(
        articles[0]["title"],
        "Federal Reserve Signals Potential Rate Changes"
    );
}

#[tokio::test]
async fn quote_requires_symbol() {
    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(MockClient::default()));
    let (status, _, v) = get(app, "/api/openbb/quote").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Symbol is required");
}

/// Upstream rows are normalized and the response says they are live.
#[tokio::test]
async fn quote_serves_live_record() {
    let up = Arc::new(ScriptedUpstream::new(|_, _| {
        Ok(json!({ "results": [{
            "symbol": "MSFT",
            "name": "Microsoft Corporation",
            "last_price": 415.5,
            "change": 2.5,
            "change_percent": 0.61,
            "volume": 21000000,
            "market_cap": 3.1e12
        }]}))
    }));
    let app = router_with(up.clone(), Arc::new(MockClient::default()));
    let (status, headers, v) = get(app, "/api/openbb/quote?symbol=msft").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[DATA_SOURCE_HEADER], "live");
    assert_eq!(v["data"]["symbol"], "MSFT");
    assert_eq!(v["data"]["price"], 415.5);
    let calls = up.calls();
    assert_eq!(calls[0].0, "/equity/price/quote");
    assert_eq!(calls[0].1.get("symbol"), Some("MSFT"));
}

#[tokio::test]
async fn market_routes_never_fail_when_gateway_is_down() {
    let up = Arc::new(ScriptedUpstream::unreachable());
    for uri in [
        "/api/openbb/stocks",
        "/api/openbb/quote?symbol=AAPL",
        "/api/openbb/crypto",
        "/api/openbb/etfs",
        "/api/openbb/forex",
        "/api/openbb/futures",
        "/api/openbb/bonds",
        "/api/openbb/economic",
        "/api/openbb/options",
    ] {
        let app = router_with(up.clone(), Arc::new(MockClient::default()));
        let (status, headers, v) = get(app, uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(headers[DATA_SOURCE_HEADER], "fallback", "{uri}");
        assert!(!v["data"].is_null(), "{uri} should carry data");
    }
    assert_eq!(up.call_count(), 0, "a failed probe short-circuits every fetch");
}

#[tokio::test]
async fn options_default_to_aapl() {
    let app = router_with(Arc::new(ScriptedUpstream::unreachable()), Arc::new(MockClient::default()));
    let (status, _, v) = get(app, "/api/openbb/options").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["symbol"], "AAPL");
    assert_eq!(v["data"].as_array().map(Vec::len), Some(30));
}

#[tokio::test]
async fn alternative_rejects_unknown_type() {
    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(MockClient::default()));
    let (status, _, v) = get(app.clone(), "/api/openbb/alternative?type=astrology").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Invalid alternative data type");

    let (status, _, v) = get(app, "/api/openbb/alternative").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["type"], "insider_trading");
    assert_eq!(v["symbol"], "AAPL");
}

#[tokio::test]
async fn status_reports_probe_and_providers() {
    let up = Arc::new(ScriptedUpstream::unreachable());
    let app = router_with(up.clone(), Arc::new(MockClient::default()));

    let (status, _, v) = get(app.clone(), "/api/openbb/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["available"], false);
    assert_eq!(v["checked"], true);
    assert_eq!(v["bestProvider"], "yfinance");
    assert_eq!(v["providers"], json!(["yfinance"]));
    assert_eq!(up.probe_count(), 1);

    // cached probe result
    let _ = get(app.clone(), "/api/openbb/status").await;
    assert_eq!(up.probe_count(), 1);

    up.set_probe_ok(true);
    let (_, _, v) = post(app, "/api/openbb/status/refresh", "").await;
    assert_eq!(v["available"], true);
    assert_eq!(up.probe_count(), 2);
}

#[tokio::test]
async fn ai_chat_requires_query() {
    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(MockClient::default()));
    let (status, _, v) = post(app.clone(), "/api/ai/chat", "{}").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v, json!({ "error": "Query is required" }));

    let (status, _, v) = post(app, "/api/ai/chat", r#"{"query": "Where are rates heading?"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["response"], "Markets are mixed (mock).");
}

#[tokio::test]
async fn ai_chat_failure_is_500() {
    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(FailingClient));
    let (status, _, v) = post(app, "/api/ai/chat", r#"{"query": "hello"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["error"], "Failed to generate market insight");
}

/// Market summary degrades to a static notice instead of failing.
#[tokio::test]
async fn market_summary_is_always_200() {
    let clients: [DynAiClient; 2] = [Arc::new(DisabledClient), Arc::new(FailingClient)];
    for ai in clients {
        let app = router_with(Arc::new(ScriptedUpstream::empty()), ai);
        let (status, _, v) = get(app, "/api/ai/market-summary").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            v["summary"],
            kaizen_markets::ai::prompts::SUMMARY_UNAVAILABLE
        );
    }
}

#[tokio::test]
async fn stock_analysis_validation_and_errors() {
    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(FailingClient));
    let (status, _, v) = post(app.clone(), "/api/ai/stock-analysis", "not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "Stock symbol is required");

    let (status, _, v) = post(app, "/api/ai/stock-analysis", r#"{"symbol": "nvda"}"#).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(v["error"], "Failed to analyze stock");

    let app = router_with(Arc::new(ScriptedUpstream::empty()), Arc::new(MockClient::default()));
    let (status, _, v) = post(app, "/api/ai/stock-analysis", r#"{"symbol": "nvda"}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["symbol"], "NVDA");
    assert!(v["analysis"].is_string());
}

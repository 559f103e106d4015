use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::ai::{self, prompts, DynAiClient};
use crate::clock::SharedClock;
use crate::config::providers::ProviderCredentials;
use crate::config::AppConfig;
use crate::dataset::{DataSet, Origin};
use crate::gateway::{SharedUpstream, Upstream};
use crate::market::types::AlternativeKind;
use crate::market::{defaults, MarketService};
use crate::news::NewsService;

pub const DATA_SOURCE_HEADER: &str = "x-data-source";
pub const FALLBACK_REASON_HEADER: &str = "x-fallback-reason";

const DEFAULT_NEWS_LIMIT: usize = 20;
const DEFAULT_SEARCH_LIMIT: usize = 10;
const DEFAULT_SYMBOL: &str = "AAPL";

#[derive(Clone)]
pub struct AppState {
    pub gateway: SharedUpstream,
    pub market: Arc<MarketService>,
    pub news: Arc<NewsService>,
    pub ai: DynAiClient,
    pub credentials: Arc<ProviderCredentials>,
    pub clock: SharedClock,
}

impl AppState {
    /// Wire services around one gateway and one clock.
    pub fn new(
        gateway: SharedUpstream,
        cfg: &AppConfig,
        credentials: ProviderCredentials,
        ai: DynAiClient,
        clock: SharedClock,
    ) -> Self {
        let market = MarketService::new(gateway.clone(), clock.clone());
        let news = NewsService::new(
            gateway.clone(),
            clock.clone(),
            cfg.news.clone(),
            credentials.best_provider(),
        );
        Self {
            gateway,
            market: Arc::new(market),
            news: Arc::new(news),
            ai,
            credentials: Arc::new(credentials),
            clock,
        }
    }

    fn timestamp(&self) -> String {
        self.clock.now().to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/news", get(news))
        .route("/api/news/search", get(news_search))
        .route("/api/news/status", get(news_status))
        .route("/api/openbb/stocks", get(stocks))
        .route("/api/openbb/quote", get(quote))
        .route("/api/openbb/historical", get(historical))
        .route("/api/openbb/crypto", get(crypto))
        .route("/api/openbb/etfs", get(etfs))
        .route("/api/openbb/forex", get(forex))
        .route("/api/openbb/futures", get(futures))
        .route("/api/openbb/bonds", get(bonds))
        .route("/api/openbb/economic", get(economic))
        .route("/api/openbb/options", get(options))
        .route("/api/openbb/alternative", get(alternative))
        .route("/api/openbb/status", get(gateway_status))
        .route("/api/openbb/status/refresh", post(gateway_refresh))
        .route("/api/ai/chat", post(ai_chat))
        .route("/api/ai/market-summary", get(ai_market_summary))
        .route("/api/ai/stock-analysis", post(ai_stock_analysis))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/* ----------------------------
Errors and envelopes
---------------------------- */

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// JSON body tagged with where its data came from.
fn sourced(origin: &Origin, body: Value) -> Response {
    let mut resp = Json(body).into_response();
    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static(DATA_SOURCE_HEADER),
        HeaderValue::from_static(origin.label()),
    );
    if let Origin::Fallback(reason) = origin {
        if let Ok(v) = HeaderValue::from_str(&reason.label()) {
            headers.insert(HeaderName::from_static(FALLBACK_REASON_HEADER), v);
        }
    }
    resp
}

fn data_response<T: Serialize>(state: &AppState, set: DataSet<T>) -> Response {
    let body = json!({ "data": set.data, "timestamp": state.timestamp() });
    sourced(&set.origin, body)
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// Missing or unparseable limits fall back to the route default.
fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<usize>().ok())
        .unwrap_or(default)
}

/// POST bodies are read leniently so a missing or malformed body still gets the
/// route's own 400 message.
fn body_field(body: &Bytes, field: &str) -> Option<String> {
    let v: Value = serde_json::from_slice(body).ok()?;
    match v.get(field)? {
        Value::String(s) => non_empty(Some(s)).map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/* ----------------------------
News
---------------------------- */

#[derive(Debug, Default, Deserialize)]
pub struct NewsQuery {
    #[serde(rename = "type")]
    kind: Option<String>,
    symbol: Option<String>,
    limit: Option<String>,
    refresh: Option<String>,
}

async fn news(State(state): State<AppState>, Query(q): Query<NewsQuery>) -> ApiResult<Response> {
    let limit = parse_limit(q.limit.as_deref(), DEFAULT_NEWS_LIMIT);
    let refresh = q.refresh.as_deref() == Some("true");

    let set = match q.kind.as_deref().map(str::trim) {
        Some("company") => {
            let symbol = non_empty(q.symbol.as_deref()).ok_or_else(|| {
                ApiError::BadRequest("Symbol required for company news".into())
            })?;
            state.news.company_news(symbol, refresh).await
        }
        Some("market") => state.news.market_news(refresh).await,
        _ => state.news.world_news(refresh).await,
    };

    let mut articles = set.data;
    articles.truncate(limit);
    Ok(sourced(
        &set.origin,
        json!({ "articles": articles, "timestamp": state.timestamp() }),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    limit: Option<String>,
}

async fn news_search(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> ApiResult<Response> {
    let query = non_empty(q.q.as_deref()).ok_or_else(|| ApiError::BadRequest("Query is required".into()))?;
    let limit = parse_limit(q.limit.as_deref(), DEFAULT_SEARCH_LIMIT);
    let set = state.news.search_news(query, limit).await;
    Ok(sourced(
        &set.origin,
        json!({ "articles": set.data, "timestamp": state.timestamp() }),
    ))
}

async fn news_status(State(state): State<AppState>) -> Json<Value> {
    let status = state.news.connection_status().await;
    Json(json!(status))
}

/* ----------------------------
Market data
---------------------------- */

#[derive(Debug, Default, Deserialize)]
pub struct SymbolQuery {
    symbol: Option<String>,
    period: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl SymbolQuery {
    fn symbol_or_default(&self) -> String {
        non_empty(self.symbol.as_deref())
            .unwrap_or(DEFAULT_SYMBOL)
            .to_ascii_uppercase()
    }

    fn required_symbol(&self) -> ApiResult<String> {
        non_empty(self.symbol.as_deref())
            .map(str::to_ascii_uppercase)
            .ok_or_else(|| ApiError::BadRequest("Symbol is required".into()))
    }
}

async fn stocks(State(state): State<AppState>) -> Response {
    let set = state
        .market
        .stock_screener(defaults::SCREENER_MIN_MARKET_CAP, defaults::SCREENER_LIMIT)
        .await;
    data_response(&state, set)
}

async fn quote(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> ApiResult<Response> {
    let symbol = q.required_symbol()?;
    let set = state.market.stock_quote(&symbol).await;
    Ok(data_response(&state, set))
}

async fn historical(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> ApiResult<Response> {
    let symbol = q.required_symbol()?;
    let period = non_empty(q.period.as_deref()).unwrap_or(defaults::HISTORICAL_PERIOD);
    let set = state.market.stock_historical(&symbol, period).await;
    let body = json!({ "data": set.data, "symbol": symbol, "period": period, "timestamp": state.timestamp() });
    Ok(sourced(&set.origin, body))
}

async fn crypto(State(state): State<AppState>) -> Response {
    let set = state
        .market
        .crypto_quotes(&defaults::owned(&defaults::CRYPTO))
        .await;
    data_response(&state, set)
}

async fn etfs(State(state): State<AppState>) -> Response {
    let set = state.market.etf_data(&defaults::owned(&defaults::ETFS)).await;
    data_response(&state, set)
}

async fn forex(State(state): State<AppState>) -> Response {
    let set = state
        .market
        .forex_rates(&defaults::owned(&defaults::FOREX))
        .await;
    data_response(&state, set)
}

async fn futures(State(state): State<AppState>) -> Response {
    let set = state
        .market
        .futures_data(&defaults::owned(&defaults::FUTURES))
        .await;
    data_response(&state, set)
}

async fn bonds(State(state): State<AppState>) -> Response {
    let set = state.market.bonds_data().await;
    data_response(&state, set)
}

async fn economic(State(state): State<AppState>) -> Response {
    let set = state
        .market
        .economic_indicators(&defaults::owned(&defaults::ECONOMIC))
        .await;
    data_response(&state, set)
}

async fn options(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> Response {
    let symbol = q.symbol_or_default();
    let set = state.market.options_chain(&symbol).await;
    let body = json!({ "data": set.data, "symbol": symbol, "timestamp": state.timestamp() });
    sourced(&set.origin, body)
}

async fn alternative(State(state): State<AppState>, Query(q): Query<SymbolQuery>) -> ApiResult<Response> {
    let symbol = q.symbol_or_default();
    let raw_kind = non_empty(q.kind.as_deref()).unwrap_or(AlternativeKind::InsiderTrading.as_str());
    let kind = AlternativeKind::parse(raw_kind)
        .ok_or_else(|| ApiError::BadRequest("Invalid alternative data type".into()))?;

    let set = state.market.alternative(kind, &symbol).await;
    let body = json!({
        "data": set.data,
        "symbol": symbol,
        "type": kind.as_str(),
        "timestamp": state.timestamp(),
    });
    Ok(sourced(&set.origin, body))
}

/* ----------------------------
Gateway status
---------------------------- */

fn status_body(state: &AppState) -> Value {
    let availability = state.gateway.availability();
    json!({
        "available": availability.is_available(),
        "checked": availability.is_checked(),
        "lastProbe": availability
            .last_probe()
            .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true)),
        "providers": state.credentials.available_providers(),
        "bestProvider": state.credentials.best_provider(),
        "credentials": state.credentials.credential_status(),
        "timestamp": state.timestamp(),
    })
}

async fn gateway_status(State(state): State<AppState>) -> Json<Value> {
    state.gateway.ensure_checked().await;
    Json(status_body(&state))
}

async fn gateway_refresh(State(state): State<AppState>) -> Json<Value> {
    state.gateway.reset_probe();
    let available = state.gateway.check_connection().await;
    info!(target: "api", available, "gateway status refreshed on request");
    Json(status_body(&state))
}

/* ----------------------------
AI
---------------------------- */

async fn ai_chat(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let query = body_field(&body, "query").ok_or_else(|| ApiError::BadRequest("Query is required".into()))?;
    let text = ai::complete(state.ai.as_ref(), &prompts::chat(&query))
        .await
        .map_err(|_| ApiError::Internal("Failed to generate market insight".into()))?;
    Ok(Json(json!({ "response": text, "timestamp": state.timestamp() })))
}

/// Always 200; a failed completion is replaced by a static notice.
async fn ai_market_summary(State(state): State<AppState>) -> Json<Value> {
    let summary = ai::complete(state.ai.as_ref(), &prompts::market_summary())
        .await
        .unwrap_or_else(|_| prompts::SUMMARY_UNAVAILABLE.to_string());
    Json(json!({ "summary": summary, "timestamp": state.timestamp() }))
}

async fn ai_stock_analysis(State(state): State<AppState>, body: Bytes) -> ApiResult<Json<Value>> {
    let symbol =
        body_field(&body, "symbol").ok_or_else(|| ApiError::BadRequest("Stock symbol is required".into()))?;
    let text = ai::complete(state.ai.as_ref(), &prompts::stock_analysis(&symbol))
        .await
        .map_err(|_| ApiError::Internal("Failed to analyze stock".into()))?;
    Ok(Json(json!({
        "analysis": text,
        "symbol": symbol.to_ascii_uppercase(),
        "timestamp": state.timestamp(),
    })))
}

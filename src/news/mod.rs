//! News aggregation with a per-key TTL cache.
//!
//! A fetch cycle queries every source concurrently, merges results in source order,
//! drops repeated titles (first seen wins), sorts newest first and truncates. An empty
//! cycle never reaches the cache: the static set for that key is stored instead.

pub mod cache;
pub mod fallback;
pub mod types;

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use tracing::{debug, info};

use crate::clock::SharedClock;
use crate::config::NewsConfig;
use crate::dataset::{resolve, DataSet, FallbackReason};
use crate::gateway::{Params, SharedUpstream};
use crate::market::normalize::results;
use cache::TtlCache;
pub use types::{ArticleImage, NewsArticle};

pub const WORLD_KEY: &str = "world-news";
pub const MARKET_KEY: &str = "market-news";

const WORLD_ENDPOINT: &str = "/news/world";
const COMPANY_ENDPOINT: &str = "/news/company";
/// World and single-company feeds always ask this vendor.
const NEWS_PROVIDER: &str = "fmp";
const MAX_TEXT_CHARS: usize = 5_000;

pub const CONNECTED_MESSAGE: &str = "Connected to OpenBB API - Live data available";
pub const DISCONNECTED_MESSAGE: &str = "OpenBB API unavailable - Using demo data";

pub fn company_key(symbol: &str) -> String {
    format!("company-news-{symbol}")
}

/// Decode entities, strip tags, straighten quotes, collapse whitespace.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    out = out
        .replace(['\u{201C}', '\u{201D}', '\u{00AB}', '\u{00BB}'], "\"")
        .replace(['\u{2018}', '\u{2019}'], "'");

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > MAX_TEXT_CHARS {
        out = out.chars().take(MAX_TEXT_CHARS).collect();
    }
    out
}

/// Stable newest-first sort, then dedup by exact title (the newest copy survives), truncate.
pub fn aggregate(mut articles: Vec<NewsArticle>, limit: usize) -> Vec<NewsArticle> {
    articles.sort_by(|a, b| b.date.cmp(&a.date));
    let mut seen = HashSet::new();
    let mut out: Vec<NewsArticle> = articles
        .into_iter()
        .filter(|a| seen.insert(a.title.clone()))
        .collect();
    out.truncate(limit);
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionStatus {
    pub connected: bool,
    pub message: String,
}

/// One upstream query taking part in a fetch cycle.
#[derive(Debug, Clone)]
struct Source {
    endpoint: &'static str,
    params: Params,
}

pub type Articles = DataSet<Vec<NewsArticle>>;

pub struct NewsService {
    upstream: SharedUpstream,
    cache: TtlCache<Articles>,
    clock: SharedClock,
    cfg: NewsConfig,
    /// Vendor for the multi-ticker market feed.
    market_provider: String,
}

impl NewsService {
    pub fn new(
        upstream: SharedUpstream,
        clock: SharedClock,
        cfg: NewsConfig,
        market_provider: impl Into<String>,
    ) -> Self {
        let ttl = Duration::seconds(cfg.cache_ttl_secs as i64);
        Self {
            upstream,
            cache: TtlCache::new(ttl, clock.clone()),
            clock,
            cfg,
            market_provider: market_provider.into(),
        }
    }

    pub async fn world_news(&self, force_refresh: bool) -> Articles {
        let sources = vec![Source {
            endpoint: WORLD_ENDPOINT,
            params: Params::new()
                .with("limit", self.cfg.world_limit)
                .with("provider", NEWS_PROVIDER),
        }];
        self.cached_cycle(WORLD_KEY, force_refresh, sources, self.cfg.world_limit, fallback::articles)
            .await
    }

    pub async fn market_news(&self, force_refresh: bool) -> Articles {
        let sources = self
            .cfg
            .market_symbols
            .iter()
            .map(|sym| Source {
                endpoint: COMPANY_ENDPOINT,
                params: Params::new()
                    .with("symbol", sym)
                    .with("limit", self.cfg.market_per_symbol_limit)
                    .with("provider", &self.market_provider),
            })
            .collect();
        self.cached_cycle(MARKET_KEY, force_refresh, sources, self.cfg.market_limit, fallback::market)
            .await
    }

    pub async fn company_news(&self, symbol: &str, force_refresh: bool) -> Articles {
        let symbol = symbol.trim().to_ascii_uppercase();
        let sources = vec![Source {
            endpoint: COMPANY_ENDPOINT,
            params: Params::new()
                .with("symbol", &symbol)
                .with("limit", self.cfg.company_limit)
                .with("provider", NEWS_PROVIDER),
        }];
        let fb_symbol = symbol.clone();
        self.cached_cycle(
            &company_key(&symbol),
            force_refresh,
            sources,
            self.cfg.company_limit,
            move |now| fallback::company(&fb_symbol, now),
        )
        .await
    }

    /// Searches the (cached) world feed, which itself falls back to the static set.
    pub async fn search_news(&self, query: &str, limit: usize) -> Articles {
        self.world_news(false).await.map(|articles| {
            articles
                .into_iter()
                .filter(|a| a.matches_query(query))
                .take(limit)
                .collect()
        })
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
        info!(target: "news", "news cache cleared");
    }

    pub async fn connection_status(&self) -> ConnectionStatus {
        let connected = self.upstream.check_connection().await;
        ConnectionStatus {
            connected,
            message: if connected {
                CONNECTED_MESSAGE
            } else {
                DISCONNECTED_MESSAGE
            }
            .to_string(),
        }
    }

    async fn cached_cycle(
        &self,
        key: &str,
        force_refresh: bool,
        sources: Vec<Source>,
        limit: usize,
        fallback: impl FnOnce(DateTime<Utc>) -> Vec<NewsArticle>,
    ) -> Articles {
        if !force_refresh {
            if let Some(hit) = self.cache.get(key) {
                counter!("news_cache_hits_total").increment(1);
                debug!(target: "news", key, "cache hit");
                return hit.into_cached();
            }
        }
        counter!("news_cache_misses_total").increment(1);

        let res = self.fetch_cycle(&sources, limit).await;
        let now = self.clock.now();
        let set = resolve("news", res, || fallback(now));
        debug!(
            target: "news",
            key,
            origin = set.origin.label(),
            articles = set.data.len(),
            "news cycle finished"
        );
        self.cache.put(key, set.clone());
        set
    }

    async fn fetch_cycle(&self, sources: &[Source], limit: usize) -> Result<Vec<NewsArticle>, FallbackReason> {
        let calls = sources
            .iter()
            .map(|s| self.upstream.get_json(s.endpoint, &s.params));
        let responses = join_all(calls).await;

        let mut merged = Vec::new();
        let mut first_err = None;
        for res in responses {
            match res {
                Ok(body) => {
                    let rows = results(&body);
                    let before = merged.len();
                    merged.extend(rows.iter().filter_map(NewsArticle::from_upstream));
                    if !rows.is_empty() && merged.len() == before {
                        first_err.get_or_insert(FallbackReason::UnrecognizedShape);
                    }
                }
                Err(e) => {
                    first_err.get_or_insert(FallbackReason::from(&e));
                }
            }
        }

        let out = aggregate(merged, limit);
        if out.is_empty() {
            Err(first_err.unwrap_or(FallbackReason::EmptyResult))
        } else {
            Ok(out)
        }
    }
}

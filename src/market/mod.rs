//! Market data: gateway call → normalizer → fallback.
//!
//! [`MarketService`] is what the HTTP layer holds. Each operation resolves to a
//! [`DataSet`] so the caller always gets data plus its origin.

pub mod client;
pub mod fallback;
pub mod normalize;
pub mod types;

use serde_json::{Map, Value};

use crate::clock::SharedClock;
use crate::dataset::{resolve, DataSet};
use crate::gateway::SharedUpstream;
use client::{providers, MarketClient};
use types::{
    AlternativeData, AlternativeKind, BondData, CryptoData, EconomicObservation, EtfData,
    ForexData, FuturesData, OptionContract, StockData,
};

/// Symbol sets the dashboard panels ask for.
pub mod defaults {
    pub const CRYPTO: [&str; 10] = [
        "BTC", "ETH", "BNB", "XRP", "ADA", "SOL", "DOGE", "DOT", "MATIC", "AVAX",
    ];
    pub const ETFS: [&str; 10] = [
        "SPY", "QQQ", "IWM", "VTI", "VEA", "VWO", "AGG", "LQD", "HYG", "TLT",
    ];
    pub const FOREX: [&str; 8] = [
        "EURUSD", "GBPUSD", "USDJPY", "USDCAD", "AUDUSD", "NZDUSD", "USDCHF", "EURGBP",
    ];
    pub const FUTURES: [&str; 10] = ["ES", "NQ", "YM", "RTY", "CL", "NG", "GC", "SI", "ZN", "ZB"];
    pub const ECONOMIC: [&str; 6] = [
        "GDP",
        "CPI",
        "UNEMPLOYMENT",
        "INFLATION",
        "INTEREST_RATE",
        "RETAIL_SALES",
    ];
    pub const SCREENER_MIN_MARKET_CAP: f64 = 1_000_000_000.0;
    pub const SCREENER_LIMIT: usize = 20;
    pub const HISTORICAL_PERIOD: &str = "1y";
    pub const FED_SERIES: &str = "FEDFUNDS";

    pub fn owned(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }
}

#[derive(Clone)]
pub struct MarketService {
    client: MarketClient,
    clock: SharedClock,
}

impl MarketService {
    pub fn new(upstream: SharedUpstream, clock: SharedClock) -> Self {
        Self {
            client: MarketClient::new(upstream),
            clock,
        }
    }

    pub async fn stock_quote(&self, symbol: &str) -> DataSet<StockData> {
        let res = self.client.stock_quote(symbol, providers::QUOTE).await;
        resolve("stock_quote", res, || fallback::stock(symbol, &mut rand::rng()))
    }

    /// No synthetic history: failure yields an empty series.
    pub async fn stock_historical(&self, symbol: &str, period: &str) -> DataSet<Vec<Value>> {
        let res = self
            .client
            .stock_historical(symbol, period, providers::HISTORICAL)
            .await;
        resolve("stock_historical", res, Vec::new)
    }

    /// No synthetic fundamentals: failure yields an empty object.
    pub async fn stock_fundamentals(&self, symbol: &str) -> DataSet<Value> {
        let res = self
            .client
            .stock_fundamentals(symbol, providers::FUNDAMENTALS)
            .await;
        resolve("stock_fundamentals", res, || Value::Object(Map::new()))
    }

    /// Unusual options activity; no synthetic flow, failure yields an empty list.
    pub async fn options_flow(&self) -> DataSet<Vec<Value>> {
        let res = self.client.options_flow(providers::OPTIONS_FLOW).await;
        resolve("options_flow", res, Vec::new)
    }

    /// Raw FRED series rows; failure yields an empty list.
    pub async fn fed_data(&self, series: &str) -> DataSet<Vec<Value>> {
        let res = self.client.fed_data(series, providers::FED).await;
        resolve("fed_data", res, Vec::new)
    }

    pub async fn stock_screener(&self, market_cap_more_than: f64, limit: usize) -> DataSet<Vec<StockData>> {
        let res = self
            .client
            .stock_screener(market_cap_more_than, limit, providers::SCREENER)
            .await;
        resolve("stock_screener", res, || fallback::stock_screener(&mut rand::rng()))
    }

    pub async fn options_chain(&self, symbol: &str) -> DataSet<Vec<OptionContract>> {
        let res = self.client.options_chain(symbol, providers::OPTIONS).await;
        let today = self.clock.now().date_naive();
        resolve("options", res, || {
            fallback::options_chain(symbol, today, &mut rand::rng())
        })
    }

    pub async fn economic_indicators(&self, indicators: &[String]) -> DataSet<Vec<EconomicObservation>> {
        let res = self
            .client
            .economic_indicators(indicators, providers::ECONOMY)
            .await;
        let now = self.clock.now();
        resolve("economic", res, || fallback::economic(now))
    }

    pub async fn crypto_quotes(&self, symbols: &[String]) -> DataSet<Vec<CryptoData>> {
        let res = self.client.crypto_quotes(symbols, providers::CRYPTO).await;
        resolve("crypto", res, fallback::crypto)
    }

    pub async fn etf_data(&self, symbols: &[String]) -> DataSet<Vec<EtfData>> {
        let res = self.client.etf_data(symbols, providers::ETF).await;
        resolve("etfs", res, fallback::etfs)
    }

    pub async fn forex_rates(&self, pairs: &[String]) -> DataSet<Vec<ForexData>> {
        let res = self.client.forex_rates(pairs, providers::FOREX).await;
        resolve("forex", res, fallback::forex)
    }

    pub async fn futures_data(&self, symbols: &[String]) -> DataSet<Vec<FuturesData>> {
        let res = self.client.futures_data(symbols, providers::FUTURES).await;
        let today = self.clock.now().date_naive();
        resolve("futures", res, || fallback::futures(today))
    }

    pub async fn bonds_data(&self) -> DataSet<Vec<BondData>> {
        let res = self.client.bonds_data(providers::BONDS).await;
        resolve("bonds", res, fallback::bonds)
    }

    /// Rows pass through untouched; failure yields an empty `data` list.
    pub async fn alternative(&self, kind: AlternativeKind, symbol: &str) -> DataSet<AlternativeData> {
        let res = self.client.alternative(kind, symbol).await;
        let timestamp = self.clock.now();
        resolve(kind.as_str(), res, Vec::new).map(|data| AlternativeData {
            kind,
            symbol: symbol.to_string(),
            data,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dataset::{FallbackReason, Origin};
    use crate::gateway::ScriptedUpstream;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::sync::Arc;

    fn service(up: ScriptedUpstream) -> (MarketService, Arc<ScriptedUpstream>) {
        let up = Arc::new(up);
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2025, 5, 6, 12, 0, 0).unwrap());
        (MarketService::new(up.clone(), Arc::new(clock)), up)
    }

    #[tokio::test]
    async fn unreachable_gateway_serves_fallback_for_every_domain() {
        let (svc, up) = service(ScriptedUpstream::unreachable());

        let q = svc.stock_quote("AAPL").await;
        assert_eq!(q.origin, Origin::Fallback(FallbackReason::Unavailable));
        assert_eq!(q.data.price, 175.43);

        assert_eq!(svc.crypto_quotes(&defaults::owned(&defaults::CRYPTO)).await.data.len(), 2);
        assert_eq!(svc.etf_data(&defaults::owned(&defaults::ETFS)).await.data.len(), 2);
        assert_eq!(svc.forex_rates(&defaults::owned(&defaults::FOREX)).await.data.len(), 2);
        assert_eq!(svc.bonds_data().await.data.len(), 2);
        assert_eq!(svc.stock_screener(1e9, 20).await.data.len(), 8);

        let fut = svc.futures_data(&defaults::owned(&defaults::FUTURES)).await;
        assert_eq!(fut.data[0].expiration, "2025-06-15");

        let opts = svc.options_chain("TSLA").await;
        assert_eq!(opts.data.len(), 30);
        assert_eq!(opts.data[0].expiration, "2025-06-05");

        let hist = svc.stock_historical("AAPL", "1y").await;
        assert!(hist.is_fallback());
        assert!(hist.data.is_empty());

        let fundamentals = svc.stock_fundamentals("AAPL").await;
        assert_eq!(fundamentals.data, json!({}));

        let flow = svc.options_flow().await;
        assert_eq!(flow.origin, Origin::Fallback(FallbackReason::Unavailable));
        assert!(flow.data.is_empty());

        let fed = svc.fed_data(defaults::FED_SERIES).await;
        assert!(fed.is_fallback());
        assert!(fed.data.is_empty());

        let alt = svc.alternative(AlternativeKind::InsiderTrading, "AAPL").await;
        assert!(alt.data.data.is_empty());
        assert_eq!(alt.data.symbol, "AAPL");

        assert_eq!(up.call_count(), 0);
        assert_eq!(up.probe_count(), 1);
    }

    #[tokio::test]
    async fn live_quote_is_labelled_live() {
        let (svc, _) = service(ScriptedUpstream::new(|_, _| {
            Ok(json!({ "results": [{ "regularMarketPrice": 201.5, "shortName": "Apple" }] }))
        }));
        let q = svc.stock_quote("AAPL").await;
        assert_eq!(q.origin, Origin::Live);
        assert_eq!(q.data.price, 201.5);
    }

    #[tokio::test]
    async fn empty_bond_envelope_falls_back() {
        let (svc, _) = service(ScriptedUpstream::empty());
        let bonds = svc.bonds_data().await;
        assert_eq!(bonds.fallback_reason(), Some(&FallbackReason::EmptyResult));
        assert_eq!(bonds.data[0].symbol, "US10Y");
    }

    #[tokio::test]
    async fn fed_series_is_live_when_rows_arrive() {
        let (svc, up) = service(ScriptedUpstream::new(|_, _| {
            Ok(json!({ "results": [{ "date": "2025-04-01", "value": 4.33 }] }))
        }));
        let fed = svc.fed_data(defaults::FED_SERIES).await;
        assert_eq!(fed.origin, Origin::Live);
        assert_eq!(fed.data[0]["value"], 4.33);
        assert_eq!(up.calls()[0].1.get("series"), Some("FEDFUNDS"));

        let (svc, _) = service(ScriptedUpstream::empty());
        let flow = svc.options_flow().await;
        assert_eq!(flow.origin, Origin::Fallback(FallbackReason::EmptyResult));
        assert!(flow.data.is_empty());
    }

    #[tokio::test]
    async fn alternative_passes_rows_through() {
        let (svc, up) = service(ScriptedUpstream::new(|_, _| {
            Ok(json!({ "results": [{ "filing_date": "2025-04-01", "shares": 1200 }] }))
        }));
        let alt = svc.alternative(AlternativeKind::SocialSentiment, "TSLA").await;
        assert_eq!(alt.origin, Origin::Live);
        assert_eq!(alt.data.data[0]["shares"], 1200);
        assert_eq!(up.calls()[0].0, "/equity/behavioral/sentiment");
        assert_eq!(up.calls()[0].1.get("provider"), Some("stocktwits"));
    }
}

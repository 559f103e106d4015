//! Per-domain request builders over the gateway.
//!
//! Every call resolves to `Result<_, FallbackReason>`: gateway errors, empty envelopes
//! and unrecognized record shapes all become a reason here and never travel further.

use futures::future::join_all;
use serde_json::Value;
use tracing::debug;

use super::normalize;
use super::types::{
    AlternativeKind, BondData, CryptoData, EconomicObservation, EtfData, ForexData, FuturesData,
    OptionContract, StockData,
};
use crate::dataset::FallbackReason;
use crate::gateway::{Params, SharedUpstream};

/// Preferred vendor per domain when the caller does not pick one.
pub mod providers {
    pub const QUOTE: &str = "polygon";
    pub const HISTORICAL: &str = "polygon";
    pub const FUNDAMENTALS: &str = "fmp";
    pub const SCREENER: &str = "fmp";
    pub const OPTIONS: &str = "intrinio";
    pub const OPTIONS_FLOW: &str = "tradier";
    pub const ECONOMY: &str = "fred";
    pub const CRYPTO: &str = "coinbase";
    pub const ETF: &str = "fmp";
    pub const FOREX: &str = "fmp";
    pub const FUTURES: &str = "yfinance";
    pub const BONDS: &str = "fred";
    pub const FED: &str = "fred";
}

#[derive(Clone)]
pub struct MarketClient {
    upstream: SharedUpstream,
}

impl MarketClient {
    pub fn new(upstream: SharedUpstream) -> Self {
        Self { upstream }
    }

    /// One gateway call reduced to its `results` rows.
    async fn records(&self, endpoint: &str, params: &Params) -> Result<Vec<Value>, FallbackReason> {
        let body = self
            .upstream
            .get_json(endpoint, params)
            .await
            .map_err(|e| FallbackReason::from(&e))?;
        let rows = normalize::results(&body);
        if rows.is_empty() {
            debug!(target: "market", endpoint, "empty result envelope");
            return Err(FallbackReason::EmptyResult);
        }
        Ok(rows.to_vec())
    }

    /// Rows that exist but none adapts: the shape is unknown.
    fn adapt_all<T>(
        rows: &[Value],
        adapt: impl Fn(&Value) -> Option<T>,
    ) -> Result<Vec<T>, FallbackReason> {
        let out: Vec<T> = rows.iter().filter_map(adapt).collect();
        if out.is_empty() {
            Err(FallbackReason::UnrecognizedShape)
        } else {
            Ok(out)
        }
    }

    /// Same endpoint once per symbol, concurrently. Partial successes are kept; if
    /// nothing survives, the first failure explains why.
    async fn per_symbol<T>(
        &self,
        endpoint: &str,
        key: &str,
        symbols: &[String],
        provider: &str,
        adapt: impl Fn(&[Value], &str) -> Vec<T>,
    ) -> Result<Vec<T>, FallbackReason> {
        let calls = symbols.iter().map(|sym| {
            let params = Params::new().with(key, sym).with("provider", provider);
            async move { self.records(endpoint, &params).await }
        });
        let responses = join_all(calls).await;

        let mut out = Vec::new();
        let mut first_err = None;
        for (sym, res) in symbols.iter().zip(responses) {
            match res {
                Ok(rows) => {
                    let adapted = adapt(&rows, sym);
                    if adapted.is_empty() {
                        first_err.get_or_insert(FallbackReason::UnrecognizedShape);
                    }
                    out.extend(adapted);
                }
                Err(reason) => {
                    first_err.get_or_insert(reason);
                }
            }
        }

        if out.is_empty() {
            Err(first_err.unwrap_or(FallbackReason::EmptyResult))
        } else {
            Ok(out)
        }
    }

    pub async fn stock_quote(&self, symbol: &str, provider: &str) -> Result<StockData, FallbackReason> {
        let params = Params::new().with("symbol", symbol).with("provider", provider);
        let rows = self.records("/equity/price/quote", &params).await?;
        rows.first()
            .and_then(|raw| normalize::stock(raw, Some(symbol)))
            .ok_or(FallbackReason::UnrecognizedShape)
    }

    /// Raw OHLCV rows; the dashboard charts them as delivered.
    pub async fn stock_historical(
        &self,
        symbol: &str,
        period: &str,
        provider: &str,
    ) -> Result<Vec<Value>, FallbackReason> {
        let params = Params::new()
            .with("symbol", symbol)
            .with("period", period)
            .with("provider", provider);
        self.records("/equity/price/historical", &params).await
    }

    pub async fn stock_fundamentals(&self, symbol: &str, provider: &str) -> Result<Value, FallbackReason> {
        let params = Params::new().with("symbol", symbol).with("provider", provider);
        let rows = self.records("/equity/fundamental/overview", &params).await?;
        match rows.into_iter().next() {
            Some(v @ Value::Object(_)) => Ok(v),
            _ => Err(FallbackReason::UnrecognizedShape),
        }
    }

    pub async fn stock_screener(
        &self,
        market_cap_more_than: f64,
        limit: usize,
        provider: &str,
    ) -> Result<Vec<StockData>, FallbackReason> {
        let params = Params::new()
            .with("market_cap_more_than", market_cap_more_than)
            .with("limit", limit)
            .with("provider", provider);
        let rows = self.records("/equity/screener", &params).await?;
        Self::adapt_all(&rows, |raw| normalize::stock(raw, None))
    }

    pub async fn options_chain(
        &self,
        symbol: &str,
        provider: &str,
    ) -> Result<Vec<OptionContract>, FallbackReason> {
        let params = Params::new().with("symbol", symbol).with("provider", provider);
        let rows = self.records("/derivatives/options/chains", &params).await?;
        Self::adapt_all(&rows, |raw| normalize::option_contract(raw, symbol))
    }

    pub async fn economic_indicators(
        &self,
        indicators: &[String],
        provider: &str,
    ) -> Result<Vec<EconomicObservation>, FallbackReason> {
        self.per_symbol("/economy/indicators", "indicator", indicators, provider, |rows, ind| {
            rows.iter()
                .filter_map(|raw| normalize::economic(raw, ind, provider))
                .collect()
        })
        .await
    }

    pub async fn crypto_quotes(
        &self,
        symbols: &[String],
        provider: &str,
    ) -> Result<Vec<CryptoData>, FallbackReason> {
        self.per_symbol("/crypto/price/quote", "symbol", symbols, provider, |rows, sym| {
            first_adapted(rows, |raw| normalize::crypto(raw, sym))
        })
        .await
    }

    pub async fn etf_data(&self, symbols: &[String], provider: &str) -> Result<Vec<EtfData>, FallbackReason> {
        self.per_symbol("/etf/info", "symbol", symbols, provider, |rows, sym| {
            first_adapted(rows, |raw| normalize::etf(raw, sym))
        })
        .await
    }

    pub async fn forex_rates(&self, pairs: &[String], provider: &str) -> Result<Vec<ForexData>, FallbackReason> {
        self.per_symbol("/forex/price/quote", "pair", pairs, provider, |rows, pair| {
            first_adapted(rows, |raw| normalize::forex(raw, pair))
        })
        .await
    }

    pub async fn futures_data(
        &self,
        symbols: &[String],
        provider: &str,
    ) -> Result<Vec<FuturesData>, FallbackReason> {
        self.per_symbol("/derivatives/futures/quote", "symbol", symbols, provider, |rows, sym| {
            first_adapted(rows, |raw| normalize::futures(raw, sym))
        })
        .await
    }

    pub async fn bonds_data(&self, provider: &str) -> Result<Vec<BondData>, FallbackReason> {
        let params = Params::new().with("provider", provider);
        let rows = self.records("/fixedincome/government", &params).await?;
        Self::adapt_all(&rows, normalize::bond)
    }

    /// Unusual options activity, passed through as delivered.
    pub async fn options_flow(&self, provider: &str) -> Result<Vec<Value>, FallbackReason> {
        let params = Params::new().with("provider", provider);
        self.records("/derivatives/options/unusual", &params).await
    }

    /// One FRED series (e.g. `FEDFUNDS`), passed through as delivered.
    pub async fn fed_data(&self, series: &str, provider: &str) -> Result<Vec<Value>, FallbackReason> {
        let params = Params::new().with("series", series).with("provider", provider);
        self.records("/economy/fred", &params).await
    }

    /// Alternative datasets pass through row-for-row.
    pub async fn alternative(&self, kind: AlternativeKind, symbol: &str) -> Result<Vec<Value>, FallbackReason> {
        let (endpoint, provider) = kind.endpoint();
        let params = Params::new().with("symbol", symbol).with("provider", provider);
        self.records(endpoint, &params).await
    }
}

/// Quote endpoints answer one row per symbol; only the first is used.
fn first_adapted<T>(rows: &[Value], adapt: impl Fn(&Value) -> Option<T>) -> Vec<T> {
    rows.first().and_then(adapt).into_iter().collect()
}

//! Upstream JSON → canonical records.
//!
//! The platform fronts several vendors that spell the same concept differently.
//! Each domain lists the upstream shapes it recognizes and adapts each one
//! explicitly. Anything that matches no shape fails closed (`None`) and the caller
//! treats it as an empty result; a recognized record with gaps is filled with
//! zeros and sentinels.

use serde_json::{Map, Value};

use super::types::{
    BondData, CryptoData, EconomicObservation, EtfData, EtfHolding, ForexData, FuturesData,
    OptionContract, OptionKind, StockData, NOT_AVAILABLE, UNKNOWN,
};

/// Records under the platform's `{ "results": [...] }` envelope.
pub fn results(body: &Value) -> &[Value] {
    body.get("results")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

/// Read-only view over one upstream object with multi-spelling lookups.
struct Record<'a>(&'a Map<String, Value>);

impl<'a> Record<'a> {
    fn of(raw: &'a Value) -> Option<Self> {
        raw.as_object().map(Record)
    }

    fn has_any(&self, keys: &[&str]) -> bool {
        keys.iter()
            .any(|k| self.0.get(*k).is_some_and(|v| !v.is_null()))
    }

    /// First non-zero finite number among `keys`; numeric strings count.
    fn num(&self, keys: &[&str]) -> f64 {
        keys.iter()
            .filter_map(|k| self.0.get(*k).and_then(as_f64))
            .find(|v| *v != 0.0)
            .unwrap_or(0.0)
    }

    /// Same as [`Self::num`] but clamped to `>= 0` for quantities.
    fn qty(&self, keys: &[&str]) -> f64 {
        self.num(keys).max(0.0)
    }

    fn text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().find_map(|k| match self.0.get(*k)? {
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

fn as_f64(v: &Value) -> Option<f64> {
    let x = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok()?,
        _ => return None,
    };
    x.is_finite().then_some(x)
}

fn or_symbol(requested: Option<&str>, found: Option<String>) -> String {
    requested
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or(found)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/* ----------------------------
Equities
---------------------------- */

/// Equity quote shapes seen from the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockShape {
    /// Provider-neutral fields (`price`, `change_percent`/`changePercent`, `market_cap`, ...).
    Standard,
    /// Yahoo-style `regularMarket*` fields.
    Yahoo,
}

const YAHOO_STOCK_KEYS: &[&str] = &[
    "regularMarketPrice",
    "regularMarketChange",
    "regularMarketChangePercent",
    "regularMarketVolume",
    "shortName",
    "longName",
    "trailingPE",
];

const STANDARD_STOCK_KEYS: &[&str] = &[
    "price",
    "last_price",
    "change",
    "changePercent",
    "change_percent",
    "volume",
    "marketCap",
    "market_cap",
    "name",
    "pe",
    "eps",
];

impl StockShape {
    pub fn detect(raw: &Value) -> Option<Self> {
        let rec = Record::of(raw)?;
        if rec.has_any(YAHOO_STOCK_KEYS) {
            Some(Self::Yahoo)
        } else if rec.has_any(STANDARD_STOCK_KEYS) {
            Some(Self::Standard)
        } else {
            None
        }
    }
}

/// `requested` wins over the record's own symbol; upstream sometimes omits it.
pub fn stock(raw: &Value, requested: Option<&str>) -> Option<StockData> {
    let shape = StockShape::detect(raw)?;
    let rec = Record::of(raw)?;
    Some(match shape {
        StockShape::Standard => stock_from_standard(&rec, requested),
        StockShape::Yahoo => stock_from_yahoo(&rec, requested),
    })
}

fn stock_from_standard(rec: &Record<'_>, requested: Option<&str>) -> StockData {
    StockData {
        symbol: or_symbol(requested, rec.text(&["symbol"])),
        name: rec.text(&["name"]).unwrap_or_else(|| UNKNOWN.to_string()),
        price: rec.num(&["price", "last_price"]),
        change: rec.num(&["change"]),
        change_percent: rec.num(&["changePercent", "change_percent"]),
        volume: rec.qty(&["volume"]),
        market_cap: rec.qty(&["marketCap", "market_cap"]),
        pe: rec.num(&["pe", "pe_ratio"]),
        eps: rec.num(&["eps"]),
        dividend: rec.num(&["dividend", "dividend_yield"]),
        beta: rec.num(&["beta"]),
        high_52w: rec.num(&["high52w", "year_high"]),
        low_52w: rec.num(&["low52w", "year_low"]),
        avg_volume: rec.qty(&["avgVolume", "volume_average"]),
        sector: rec.text(&["sector"]).unwrap_or_else(|| UNKNOWN.to_string()),
        industry: rec.text(&["industry"]).unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

fn stock_from_yahoo(rec: &Record<'_>, requested: Option<&str>) -> StockData {
    StockData {
        symbol: or_symbol(requested, rec.text(&["symbol"])),
        name: rec
            .text(&["shortName", "longName", "name"])
            .unwrap_or_else(|| UNKNOWN.to_string()),
        price: rec.num(&["regularMarketPrice"]),
        change: rec.num(&["regularMarketChange"]),
        change_percent: rec.num(&["regularMarketChangePercent"]),
        volume: rec.qty(&["regularMarketVolume"]),
        market_cap: rec.qty(&["marketCap"]),
        pe: rec.num(&["trailingPE"]),
        eps: rec.num(&["trailingEps"]),
        dividend: rec.num(&["dividendYield"]),
        beta: rec.num(&["beta"]),
        high_52w: rec.num(&["fiftyTwoWeekHigh"]),
        low_52w: rec.num(&["fiftyTwoWeekLow"]),
        avg_volume: rec.qty(&["averageVolume", "averageDailyVolume3Month"]),
        sector: rec.text(&["sector"]).unwrap_or_else(|| UNKNOWN.to_string()),
        industry: rec.text(&["industry"]).unwrap_or_else(|| UNKNOWN.to_string()),
    }
}

/* ----------------------------
Options
---------------------------- */

const OPTION_KEYS: &[&str] = &[
    "strike",
    "bid",
    "ask",
    "expiration",
    "option_type",
    "openInterest",
    "open_interest",
    "impliedVolatility",
    "implied_volatility",
];

pub fn option_contract(raw: &Value, underlying: &str) -> Option<OptionContract> {
    let rec = Record::of(raw)?;
    if !rec.has_any(OPTION_KEYS) {
        return None;
    }
    let kind = match rec.text(&["type", "option_type"]).as_deref() {
        Some(t) if t.eq_ignore_ascii_case("put") => OptionKind::Put,
        _ => OptionKind::Call,
    };
    Some(OptionContract {
        symbol: or_symbol(None, rec.text(&["symbol", "underlying_symbol"]).or_else(|| {
            Some(underlying.trim().to_string()).filter(|s| !s.is_empty())
        })),
        strike: rec.num(&["strike"]),
        expiration: rec
            .text(&["expiration"])
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        kind,
        bid: rec.num(&["bid"]),
        ask: rec.num(&["ask"]),
        volume: rec.qty(&["volume"]),
        open_interest: rec.qty(&["openInterest", "open_interest"]),
        implied_volatility: rec.num(&["impliedVolatility", "implied_volatility"]),
        delta: rec.num(&["delta"]),
        gamma: rec.num(&["gamma"]),
        theta: rec.num(&["theta"]),
        vega: rec.num(&["vega"]),
    })
}

/* ----------------------------
Economics
---------------------------- */

pub fn economic(raw: &Value, indicator: &str, source: &str) -> Option<EconomicObservation> {
    let rec = Record::of(raw)?;
    if !rec.has_any(&["value", "date"]) {
        return None;
    }
    Some(EconomicObservation {
        indicator: indicator.to_string(),
        value: rec.num(&["value"]),
        date: rec.text(&["date"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        unit: rec.text(&["unit"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        frequency: rec
            .text(&["frequency"])
            .unwrap_or_else(|| "monthly".to_string()),
        source: source.to_string(),
    })
}

/* ----------------------------
Crypto / ETF / FX / futures / bonds
---------------------------- */

const CRYPTO_KEYS: &[&str] = &[
    "price",
    "last_price",
    "change24h",
    "changePercent24h",
    "change_percent",
    "volume24h",
    "volume",
    "marketCap",
    "market_cap",
    "rank",
];

pub fn crypto(raw: &Value, requested: &str) -> Option<CryptoData> {
    let rec = Record::of(raw)?;
    if !rec.has_any(CRYPTO_KEYS) {
        return None;
    }
    let symbol = or_symbol(Some(requested), rec.text(&["symbol"]));
    let rank = rec.num(&["rank"]);
    Some(CryptoData {
        name: rec.text(&["name"]).unwrap_or_else(|| symbol.clone()),
        price: rec.num(&["price", "last_price"]),
        change_24h: rec.num(&["change24h", "change"]),
        change_percent_24h: rec.num(&["changePercent24h", "change_percent"]),
        volume_24h: rec.qty(&["volume24h", "volume"]),
        market_cap: rec.qty(&["marketCap", "market_cap"]),
        rank: if rank >= 1.0 { rank as u32 } else { 0 },
        supply: rec.qty(&["supply", "circulating_supply"]),
        max_supply: rec.qty(&["maxSupply", "max_supply"]),
        symbol,
    })
}

const ETF_KEYS: &[&str] = &[
    "price",
    "change",
    "changePercent",
    "aum",
    "total_assets",
    "expenseRatio",
    "expense_ratio",
    "dividend",
    "holdings",
    "name",
];

pub fn etf(raw: &Value, requested: &str) -> Option<EtfData> {
    let rec = Record::of(raw)?;
    if !rec.has_any(ETF_KEYS) {
        return None;
    }
    let symbol = or_symbol(Some(requested), rec.text(&["symbol"]));
    let holdings = rec
        .0
        .get("holdings")
        .and_then(Value::as_array)
        .map(|rows| rows.iter().filter_map(etf_holding).collect())
        .unwrap_or_default();
    Some(EtfData {
        name: rec.text(&["name"]).unwrap_or_else(|| symbol.clone()),
        price: rec.num(&["price", "last_price"]),
        change: rec.num(&["change"]),
        change_percent: rec.num(&["changePercent", "change_percent"]),
        aum: rec.qty(&["aum", "total_assets"]),
        expense_ratio: rec.num(&["expenseRatio", "expense_ratio"]),
        dividend: rec.num(&["dividend", "dividend_yield"]),
        holdings,
        symbol,
    })
}

fn etf_holding(raw: &Value) -> Option<EtfHolding> {
    let rec = Record::of(raw)?;
    Some(EtfHolding {
        symbol: rec.text(&["symbol"])?,
        weight: rec.num(&["weight"]),
        shares: rec.qty(&["shares"]),
    })
}

const FOREX_KEYS: &[&str] = &["rate", "last_rate", "bid", "ask", "high", "low", "change"];

pub fn forex(raw: &Value, requested_pair: &str) -> Option<ForexData> {
    let rec = Record::of(raw)?;
    if !rec.has_any(FOREX_KEYS) {
        return None;
    }
    Some(ForexData {
        pair: or_symbol(Some(requested_pair), rec.text(&["pair", "symbol"])),
        rate: rec.num(&["rate", "last_rate"]),
        change: rec.num(&["change"]),
        change_percent: rec.num(&["changePercent", "change_percent"]),
        bid: rec.num(&["bid"]),
        ask: rec.num(&["ask"]),
        high: rec.num(&["high"]),
        low: rec.num(&["low"]),
    })
}

const FUTURES_KEYS: &[&str] = &[
    "price",
    "last_price",
    "change",
    "volume",
    "openInterest",
    "open_interest",
    "expiration",
];

pub fn futures(raw: &Value, requested: &str) -> Option<FuturesData> {
    let rec = Record::of(raw)?;
    if !rec.has_any(FUTURES_KEYS) {
        return None;
    }
    let symbol = or_symbol(Some(requested), rec.text(&["symbol"]));
    Some(FuturesData {
        name: rec.text(&["name"]).unwrap_or_else(|| symbol.clone()),
        price: rec.num(&["price", "last_price"]),
        change: rec.num(&["change"]),
        change_percent: rec.num(&["changePercent", "change_percent"]),
        volume: rec.qty(&["volume"]),
        open_interest: rec.qty(&["openInterest", "open_interest"]),
        expiration: rec
            .text(&["expiration"])
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        symbol,
    })
}

const BOND_KEYS: &[&str] = &["yield", "rate", "price", "duration", "maturity", "coupon"];

pub fn bond(raw: &Value) -> Option<BondData> {
    let rec = Record::of(raw)?;
    if !rec.has_any(BOND_KEYS) {
        return None;
    }
    Some(BondData {
        symbol: rec.text(&["symbol"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        name: rec.text(&["name"]).unwrap_or_else(|| UNKNOWN.to_string()),
        yield_pct: rec.num(&["yield", "rate"]),
        price: rec.num(&["price"]),
        duration: rec.num(&["duration"]),
        maturity: rec
            .text(&["maturity"])
            .unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        rating: rec.text(&["rating"]).unwrap_or_else(|| NOT_AVAILABLE.to_string()),
        coupon: rec.num(&["coupon"]),
    })
}

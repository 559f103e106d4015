//! Demo datasets served when the gateway cannot deliver.
//!
//! Same record shapes as normalized data. Quotes for well-known tickers start from a
//! fixed base price and get a random perturbation; the other domains are static
//! snapshots. Every generator takes its RNG (and date) from the caller.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rand::Rng;

use super::types::{
    BondData, CryptoData, EconomicObservation, EtfData, ForexData, FuturesData, OptionContract,
    OptionKind, StockData,
};

/// Tickers listed by the screener fallback.
pub const SCREENER_SYMBOLS: [&str; 8] =
    ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA", "META", "NVDA", "NFLX"];

const OPTION_STRIKES: [f64; 5] = [150.0, 160.0, 170.0, 180.0, 190.0];
const OPTION_EXPIRY_DAYS: [i64; 3] = [30, 60, 90];

pub fn base_price(symbol: &str) -> Option<f64> {
    match symbol {
        "AAPL" => Some(175.43),
        "GOOGL" => Some(2847.63),
        "MSFT" => Some(378.85),
        "AMZN" => Some(3467.42),
        "TSLA" => Some(1067.20),
        _ => None,
    }
}

pub fn stock<R: Rng + ?Sized>(symbol: &str, rng: &mut R) -> StockData {
    let price = base_price(symbol).unwrap_or_else(|| 100.0 + rng.random::<f64>() * 200.0);
    StockData {
        symbol: symbol.to_string(),
        name: format!("{symbol} Inc."),
        price,
        change: (rng.random::<f64>() - 0.5) * 10.0,
        change_percent: (rng.random::<f64>() - 0.5) * 5.0,
        volume: (rng.random::<f64>() * 10_000_000.0).floor(),
        market_cap: price * 1_000_000_000.0,
        pe: 15.0 + rng.random::<f64>() * 20.0,
        eps: price / 20.0,
        dividend: rng.random::<f64>() * 3.0,
        beta: 0.8 + rng.random::<f64>() * 0.8,
        high_52w: price * 1.2,
        low_52w: price * 0.8,
        avg_volume: (rng.random::<f64>() * 5_000_000.0).floor(),
        sector: "Technology".to_string(),
        industry: "Software".to_string(),
    }
}

pub fn stock_screener<R: Rng + ?Sized>(rng: &mut R) -> Vec<StockData> {
    SCREENER_SYMBOLS.iter().map(|s| stock(s, rng)).collect()
}

/// Strike grid × three monthly expirations × call/put.
pub fn options_chain<R: Rng + ?Sized>(
    symbol: &str,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<OptionContract> {
    let mut out = Vec::with_capacity(OPTION_STRIKES.len() * OPTION_EXPIRY_DAYS.len() * 2);
    for strike in OPTION_STRIKES {
        for days in OPTION_EXPIRY_DAYS {
            let expiration = (today + Duration::days(days)).format("%Y-%m-%d").to_string();
            for kind in [OptionKind::Call, OptionKind::Put] {
                out.push(OptionContract {
                    symbol: symbol.to_string(),
                    strike,
                    expiration: expiration.clone(),
                    kind,
                    bid: strike * 0.05,
                    ask: strike * 0.06,
                    volume: (rng.random::<f64>() * 1_000.0).floor(),
                    open_interest: (rng.random::<f64>() * 5_000.0).floor(),
                    implied_volatility: 0.2 + rng.random::<f64>() * 0.3,
                    delta: match kind {
                        OptionKind::Call => 0.5,
                        OptionKind::Put => -0.5,
                    },
                    gamma: 0.01,
                    theta: -0.05,
                    vega: 0.1,
                });
            }
        }
    }
    out
}

pub fn economic(now: DateTime<Utc>) -> Vec<EconomicObservation> {
    let date = now.to_rfc3339_opts(chrono::SecondsFormat::Millis, true);
    [
        ("GDP", 26854.6, "Billions USD", "quarterly"),
        ("CPI", 307.026, "Index", "monthly"),
        ("UNEMPLOYMENT", 3.7, "Percent", "monthly"),
    ]
    .into_iter()
    .map(|(indicator, value, unit, frequency)| EconomicObservation {
        indicator: indicator.to_string(),
        value,
        date: date.clone(),
        unit: unit.to_string(),
        frequency: frequency.to_string(),
        source: "fred".to_string(),
    })
    .collect()
}

pub fn crypto() -> Vec<CryptoData> {
    vec![
        CryptoData {
            symbol: "BTC".into(),
            name: "Bitcoin".into(),
            price: 67234.56,
            change_24h: 1234.56,
            change_percent_24h: 1.87,
            volume_24h: 28_500_000_000.0,
            market_cap: 1_320_000_000_000.0,
            rank: 1,
            supply: 19_600_000.0,
            max_supply: 21_000_000.0,
        },
        CryptoData {
            symbol: "ETH".into(),
            name: "Ethereum".into(),
            price: 3456.78,
            change_24h: -45.23,
            change_percent_24h: -1.29,
            volume_24h: 15_200_000_000.0,
            market_cap: 415_000_000_000.0,
            rank: 2,
            supply: 120_000_000.0,
            // uncapped
            max_supply: 0.0,
        },
    ]
}

pub fn etfs() -> Vec<EtfData> {
    vec![
        EtfData {
            symbol: "SPY".into(),
            name: "SPDR S&P 500 ETF Trust".into(),
            price: 456.78,
            change: 2.34,
            change_percent: 0.51,
            aum: 380_000_000_000.0,
            expense_ratio: 0.0945,
            dividend: 1.57,
            holdings: Vec::new(),
        },
        EtfData {
            symbol: "QQQ".into(),
            name: "Invesco QQQ Trust".into(),
            price: 378.90,
            change: 1.23,
            change_percent: 0.33,
            aum: 180_000_000_000.0,
            expense_ratio: 0.20,
            dividend: 0.73,
            holdings: Vec::new(),
        },
    ]
}

pub fn forex() -> Vec<ForexData> {
    vec![
        ForexData {
            pair: "EURUSD".into(),
            rate: 1.0856,
            change: 0.0023,
            change_percent: 0.21,
            bid: 1.0855,
            ask: 1.0857,
            high: 1.0890,
            low: 1.0820,
        },
        ForexData {
            pair: "GBPUSD".into(),
            rate: 1.2634,
            change: -0.0045,
            change_percent: -0.35,
            bid: 1.2633,
            ask: 1.2635,
            high: 1.2678,
            low: 1.2598,
        },
    ]
}

/// Index futures roll quarterly; contracts expire mid-month in Mar/Jun/Sep/Dec.
pub fn next_quarterly_expiration(today: NaiveDate) -> NaiveDate {
    let mut year = today.year();
    let mut month = today.month();
    loop {
        if month % 3 == 0 {
            if let Some(d) = NaiveDate::from_ymd_opt(year, month, 15) {
                if d > today {
                    return d;
                }
            }
        }
        month += 1;
        if month > 12 {
            month = 1;
            year += 1;
        }
    }
}

pub fn futures(today: NaiveDate) -> Vec<FuturesData> {
    let expiration = next_quarterly_expiration(today)
        .format("%Y-%m-%d")
        .to_string();
    vec![
        FuturesData {
            symbol: "ES".into(),
            name: "E-mini S&P 500".into(),
            price: 4567.25,
            change: 12.50,
            change_percent: 0.27,
            volume: 2_500_000.0,
            open_interest: 3_200_000.0,
            expiration: expiration.clone(),
        },
        FuturesData {
            symbol: "NQ".into(),
            name: "E-mini NASDAQ-100".into(),
            price: 15678.75,
            change: -23.25,
            change_percent: -0.15,
            volume: 1_800_000.0,
            open_interest: 2_100_000.0,
            expiration,
        },
    ]
}

pub fn bonds() -> Vec<BondData> {
    vec![
        BondData {
            symbol: "US10Y".into(),
            name: "10-Year Treasury".into(),
            yield_pct: 4.25,
            price: 98.75,
            duration: 8.5,
            maturity: "2034-02-15".into(),
            rating: "AAA".into(),
            coupon: 4.0,
        },
        BondData {
            symbol: "US2Y".into(),
            name: "2-Year Treasury".into(),
            yield_pct: 4.85,
            price: 99.25,
            duration: 1.9,
            maturity: "2026-02-15".into(),
            rating: "AAA".into(),
            coupon: 4.5,
        },
    ]
}

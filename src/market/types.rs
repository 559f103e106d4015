//! Canonical market records served to the dashboard.
//!
//! Every field is always present on the wire (camelCase). Normalizers and fallback
//! generators fill gaps with zeros or sentinels, never with `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Placeholder for absent identifiers, dates and ratings.
pub const NOT_AVAILABLE: &str = "N/A";
/// Placeholder for absent display names.
pub const UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockData {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub market_cap: f64,
    pub pe: f64,
    pub eps: f64,
    pub dividend: f64,
    pub beta: f64,
    #[serde(rename = "high52w")]
    pub high_52w: f64,
    #[serde(rename = "low52w")]
    pub low_52w: f64,
    pub avg_volume: f64,
    pub sector: String,
    pub industry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    Call,
    Put,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionContract {
    pub symbol: String,
    pub strike: f64,
    pub expiration: String,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub bid: f64,
    pub ask: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub implied_volatility: f64,
    pub delta: f64,
    pub gamma: f64,
    pub theta: f64,
    pub vega: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EconomicObservation {
    pub indicator: String,
    pub value: f64,
    pub date: String,
    pub unit: String,
    pub frequency: String,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CryptoData {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change_24h: f64,
    pub change_percent_24h: f64,
    pub volume_24h: f64,
    pub market_cap: f64,
    pub rank: u32,
    pub supply: f64,
    pub max_supply: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtfHolding {
    pub symbol: String,
    pub weight: f64,
    pub shares: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EtfData {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub aum: f64,
    pub expense_ratio: f64,
    pub dividend: f64,
    pub holdings: Vec<EtfHolding>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForexData {
    pub pair: String,
    pub rate: f64,
    pub change: f64,
    pub change_percent: f64,
    pub bid: f64,
    pub ask: f64,
    pub high: f64,
    pub low: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuturesData {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: f64,
    pub open_interest: f64,
    pub expiration: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BondData {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "yield")]
    pub yield_pct: f64,
    pub price: f64,
    pub duration: f64,
    pub maturity: String,
    pub rating: String,
    pub coupon: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlternativeKind {
    InsiderTrading,
    ShortInterest,
    SocialSentiment,
}

impl AlternativeKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "insider_trading" => Some(Self::InsiderTrading),
            "short_interest" => Some(Self::ShortInterest),
            "social_sentiment" => Some(Self::SocialSentiment),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::InsiderTrading => "insider_trading",
            Self::ShortInterest => "short_interest",
            Self::SocialSentiment => "social_sentiment",
        }
    }

    /// Gateway endpoint and preferred provider.
    pub fn endpoint(self) -> (&'static str, &'static str) {
        match self {
            Self::InsiderTrading => ("/equity/ownership/insider_trading", "fmp"),
            Self::ShortInterest => ("/equity/shorts/short_interest", "stockgrid"),
            Self::SocialSentiment => ("/equity/behavioral/sentiment", "stocktwits"),
        }
    }
}

/// Alternative datasets are passed through row-for-row; only the envelope is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlternativeData {
    #[serde(rename = "type")]
    pub kind: AlternativeKind,
    pub symbol: String,
    pub data: Vec<Value>,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_the_dashboard_contract() {
        let bond = BondData {
            symbol: "US10Y".into(),
            name: "10-Year Treasury".into(),
            yield_pct: 4.25,
            price: 98.75,
            duration: 8.5,
            maturity: "2034-02-15".into(),
            rating: "AAA".into(),
            coupon: 4.0,
        };
        let v = serde_json::to_value(&bond).unwrap();
        assert_eq!(v["yield"], 4.25);

        let crypto = CryptoData {
            symbol: "BTC".into(),
            name: "Bitcoin".into(),
            price: 1.0,
            change_24h: 0.0,
            change_percent_24h: 0.0,
            volume_24h: 0.0,
            market_cap: 0.0,
            rank: 1,
            supply: 0.0,
            max_supply: 0.0,
        };
        let v = serde_json::to_value(&crypto).unwrap();
        assert!(v.get("changePercent24h").is_some());
        assert!(v.get("volume24h").is_some());
        assert!(v.get("maxSupply").is_some());
    }

    #[test]
    fn alternative_kind_round_trips_query_values() {
        for k in [
            AlternativeKind::InsiderTrading,
            AlternativeKind::ShortInterest,
            AlternativeKind::SocialSentiment,
        ] {
            assert_eq!(AlternativeKind::parse(k.as_str()), Some(k));
        }
        assert_eq!(AlternativeKind::parse("options_flow"), None);
    }
}

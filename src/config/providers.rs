//! Upstream data-vendor credentials.
//!
//! Keys are only used to report which vendors are configured and to pick a preferred
//! provider; the gateway itself handles vendor auth.

use std::collections::BTreeMap;

/// Preference order when choosing a default provider.
pub const PROVIDER_PRIORITY: [&str; 6] =
    ["polygon", "benzinga", "fmp", "intrinio", "tiingo", "yfinance"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderCredentials {
    pub fmp_api_key: Option<String>,
    pub polygon_api_key: Option<String>,
    pub benzinga_api_key: Option<String>,
    pub fred_api_key: Option<String>,
    pub nasdaq_api_key: Option<String>,
    pub intrinio_api_key: Option<String>,
    pub alpha_vantage_api_key: Option<String>,
    pub tiingo_token: Option<String>,
}

impl ProviderCredentials {
    pub fn from_env() -> Self {
        fn key(name: &str) -> Option<String> {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            fmp_api_key: key("FMP_API_KEY"),
            polygon_api_key: key("POLYGON_API_KEY"),
            benzinga_api_key: key("BENZINGA_API_KEY"),
            fred_api_key: key("FRED_API_KEY"),
            nasdaq_api_key: key("NASDAQ_API_KEY"),
            intrinio_api_key: key("INTRINIO_API_KEY"),
            alpha_vantage_api_key: key("ALPHA_VANTAGE_API_KEY"),
            tiingo_token: key("TIINGO_TOKEN"),
        }
    }

    /// Configured news/equity vendors, always ending with the keyless `yfinance`.
    pub fn available_providers(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if self.fmp_api_key.is_some() {
            out.push("fmp");
        }
        if self.polygon_api_key.is_some() {
            out.push("polygon");
        }
        if self.benzinga_api_key.is_some() {
            out.push("benzinga");
        }
        if self.intrinio_api_key.is_some() {
            out.push("intrinio");
        }
        if self.tiingo_token.is_some() {
            out.push("tiingo");
        }
        out.push("yfinance");
        out
    }

    pub fn best_provider(&self) -> &'static str {
        let available = self.available_providers();
        PROVIDER_PRIORITY
            .iter()
            .copied()
            .find(|p| available.contains(p))
            .unwrap_or("yfinance")
    }

    pub fn credential_status(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("fmp", self.fmp_api_key.is_some()),
            ("polygon", self.polygon_api_key.is_some()),
            ("benzinga", self.benzinga_api_key.is_some()),
            ("intrinio", self.intrinio_api_key.is_some()),
            ("tiingo", self.tiingo_token.is_some()),
            ("fred", self.fred_api_key.is_some()),
            ("nasdaq", self.nasdaq_api_key.is_some()),
            ("alpha_vantage", self.alpha_vantage_api_key.is_some()),
        ])
    }

    pub fn configured_count(&self) -> usize {
        self.credential_status().values().filter(|v| **v).count()
    }

    /// Payload for the platform's credential endpoint; unset keys are left out.
    pub fn as_credentials_map(&self) -> BTreeMap<&'static str, &str> {
        [
            ("fmp_api_key", &self.fmp_api_key),
            ("polygon_api_key", &self.polygon_api_key),
            ("benzinga_api_key", &self.benzinga_api_key),
            ("fred_api_key", &self.fred_api_key),
            ("nasdaq_api_key", &self.nasdaq_api_key),
            ("intrinio_api_key", &self.intrinio_api_key),
            ("alpha_vantage_api_key", &self.alpha_vantage_api_key),
            ("tiingo_token", &self.tiingo_token),
        ]
        .into_iter()
        .filter_map(|(name, v)| v.as_deref().map(|v| (name, v)))
        .collect()
    }
}

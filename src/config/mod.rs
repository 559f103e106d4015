//! Runtime configuration.
//!
//! Layering: built-in defaults → optional TOML file (`config/dashboard.toml`, or
//! `$DASHBOARD_CONFIG_PATH`) → environment variables. `.env` is loaded by the binary
//! before any of this runs.

pub mod ai;
pub mod providers;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;

pub const DEFAULT_DASHBOARD_CONFIG_PATH: &str = "config/dashboard.toml";
pub const ENV_DASHBOARD_CONFIG_PATH: &str = "DASHBOARD_CONFIG_PATH";

pub const DEFAULT_GATEWAY_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub base_url: String,
    /// Bearer token for the platform; never logged.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub health_timeout_secs: u64,
    /// Re-probe after this many seconds; unset means a probe result holds until reset.
    pub probe_ttl_secs: Option<u64>,
    pub probe_on_start: bool,
    pub push_credentials: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_GATEWAY_URL.to_string(),
            api_key: None,
            timeout_secs: 15,
            health_timeout_secs: 5,
            probe_ttl_secs: None,
            probe_on_start: false,
            push_credentials: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct NewsConfig {
    pub cache_ttl_secs: u64,
    pub world_limit: usize,
    pub company_limit: usize,
    /// Tickers whose company news make up the "market" feed.
    pub market_symbols: Vec<String>,
    pub market_per_symbol_limit: usize,
    pub market_limit: usize,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 5 * 60,
            world_limit: 15,
            company_limit: 10,
            market_symbols: ["AAPL", "GOOGL", "MSFT", "AMZN", "TSLA"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            market_per_symbol_limit: 5,
            market_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub news: NewsConfig,
}

impl AppConfig {
    /// Defaults, then the config file if present, then environment overrides.
    pub fn from_env() -> Result<Self> {
        let path = std::env::var(ENV_DASHBOARD_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DASHBOARD_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::load_from_file(&path)?
        } else if std::env::var(ENV_DASHBOARD_CONFIG_PATH).is_ok() {
            return Err(anyhow!(
                "{ENV_DASHBOARD_CONFIG_PATH} points to non-existent path {}",
                path.display()
            ));
        } else {
            Self::default()
        };

        cfg.apply_env()?;
        Ok(cfg)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading dashboard config from {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("parsing dashboard config {}", path.display()))
    }

    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Environment variables win over file values.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Some(url) = env_string("OPENBB_API_URL") {
            self.gateway.base_url = url;
        }
        if let Some(key) = env_string("OPENBB_API_KEY") {
            self.gateway.api_key = Some(key);
        }
        if let Some(v) = env_u64("OPENBB_TIMEOUT_SECS")? {
            self.gateway.timeout_secs = v;
        }
        if let Some(v) = env_u64("OPENBB_HEALTH_TIMEOUT_SECS")? {
            self.gateway.health_timeout_secs = v;
        }
        if let Some(v) = env_u64("OPENBB_PROBE_TTL_SECS")? {
            self.gateway.probe_ttl_secs = (v > 0).then_some(v);
        }
        if let Some(v) = env_flag("OPENBB_PROBE_ON_START") {
            self.gateway.probe_on_start = v;
        }
        if let Some(v) = env_flag("OPENBB_PUSH_CREDENTIALS") {
            self.gateway.push_credentials = v;
        }
        if let Some(v) = env_u64("NEWS_CACHE_TTL_SECS")? {
            self.news.cache_ttl_secs = v;
        }
        self.sanitize();
        Ok(())
    }

    fn sanitize(&mut self) {
        if self.gateway.base_url.trim().is_empty() {
            self.gateway.base_url = DEFAULT_GATEWAY_URL.to_string();
        }
        if self.gateway.timeout_secs == 0 {
            self.gateway.timeout_secs = GatewayConfig::default().timeout_secs;
        }
        if self.gateway.health_timeout_secs == 0 {
            self.gateway.health_timeout_secs = GatewayConfig::default().health_timeout_secs;
        }
        // zero would hit /health before every call
        self.gateway.probe_ttl_secs = self.gateway.probe_ttl_secs.filter(|v| *v > 0);
        self.news.market_symbols = self
            .news
            .market_symbols
            .iter()
            .map(|s| s.trim().to_ascii_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(name: &str) -> Result<Option<u64>> {
    match env_string(name) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .with_context(|| format!("{name} must be a non-negative integer, got {raw:?}")),
        None => Ok(None),
    }
}

fn env_flag(name: &str) -> Option<bool> {
    env_string(name).map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = AppConfig::from_toml_str(
            r#"
            [gateway]
            base_url = "http://openbb.internal:6900"
            probe_ttl_secs = 120

            [news]
            market_symbols = ["nvda", " amd ", ""]
            "#,
        )
        .unwrap();
        assert_eq!(cfg.gateway.base_url, "http://openbb.internal:6900");
        assert_eq!(cfg.gateway.timeout_secs, 15);
        assert_eq!(cfg.gateway.probe_ttl_secs, Some(120));
        assert_eq!(cfg.news.cache_ttl_secs, 300);
        assert_eq!(cfg.news.market_symbols, vec!["nvda", " amd ", ""]);
    }

    #[test]
    fn zero_probe_ttl_from_file_means_no_ttl() {
        let mut cfg = AppConfig::from_toml_str(
            r#"
            [gateway]
            probe_ttl_secs = 0
            "#,
        )
        .unwrap();
        cfg.sanitize();
        assert_eq!(cfg.gateway.probe_ttl_secs, None);
    }

    #[serial_test::serial]
    #[test]
    fn env_overrides_and_sanitizes() {
        env::set_var("OPENBB_API_URL", "http://gw:9000");
        env::set_var("OPENBB_TIMEOUT_SECS", "0");
        env::set_var("OPENBB_PROBE_TTL_SECS", "0");
        env::set_var("NEWS_CACHE_TTL_SECS", "60");

        let mut cfg = AppConfig::from_toml_str(
            r#"
            [news]
            market_symbols = ["nvda", " amd ", ""]
            "#,
        )
        .unwrap();
        cfg.apply_env().unwrap();

        assert_eq!(cfg.gateway.base_url, "http://gw:9000");
        assert_eq!(cfg.gateway.timeout_secs, 15);
        assert_eq!(cfg.gateway.probe_ttl_secs, None);
        assert_eq!(cfg.news.cache_ttl_secs, 60);
        assert_eq!(cfg.news.market_symbols, vec!["NVDA", "AMD"]);

        env::set_var("NEWS_CACHE_TTL_SECS", "five");
        assert!(cfg.apply_env().is_err());

        for k in [
            "OPENBB_API_URL",
            "OPENBB_TIMEOUT_SECS",
            "OPENBB_PROBE_TTL_SECS",
            "NEWS_CACHE_TTL_SECS",
        ] {
            env::remove_var(k);
        }
    }
}

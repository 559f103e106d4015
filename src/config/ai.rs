// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path};

pub const DEFAULT_AI_CONFIG_PATH: &str = "config/ai.json";

fn default_provider() -> String {
    "groq".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    pub enabled: bool,
    /// "groq" | "openai" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model override; each provider has its own default.
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from GROQ_API_KEY / OPENAI_API_KEY (by provider)
    #[serde(default)]
    pub api_key: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            provider: default_provider(),
            model: None,
            api_key: String::new(),
        }
    }
}

impl AiConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let data = fs::read_to_string(path)?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> anyhow::Result<Self> {
        let mut cfg: AiConfig = serde_json::from_str(data)?;

        cfg.provider = cfg.provider.trim().to_lowercase();

        if cfg.api_key.trim().eq_ignore_ascii_case("env") {
            let var = match cfg.provider.as_str() {
                "groq" => "GROQ_API_KEY",
                "openai" => "OPENAI_API_KEY",
                other => anyhow::bail!("Unsupported provider in config: {other}"),
            };
            cfg.api_key = env::var(var).map_err(|_| anyhow::anyhow!("Missing {var} env var"))?;
        }

        if let Some(m) = &cfg.model {
            if m.trim().is_empty() {
                cfg.model = None;
            }
        }

        Ok(cfg)
    }

    /// No config file: enable the provider whose key is present in the environment.
    pub fn from_env() -> Self {
        for (provider, var) in [("groq", "GROQ_API_KEY"), ("openai", "OPENAI_API_KEY")] {
            if let Ok(key) = env::var(var) {
                if !key.trim().is_empty() {
                    return Self {
                        enabled: true,
                        provider: provider.to_string(),
                        model: None,
                        api_key: key,
                    };
                }
            }
        }
        Self::default()
    }
}

// src/ai_bootstrap.rs
use std::path::Path;

use tracing::{info, warn};

use crate::ai::{build_client_from_config, complete, prompts, DynAiClient};
use crate::config::ai::AiConfig;

pub struct AiRuntime {
    pub cfg: AiConfig,
    pub client: DynAiClient,
}

impl AiRuntime {
    /// Config file if present and valid, otherwise whatever key the environment holds.
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let cfg = if path.exists() {
            AiConfig::load_from_file(path).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "AI config unusable; falling back to env");
                AiConfig::from_env()
            })
        } else {
            AiConfig::from_env()
        };
        // key presence only, never the key
        info!(
            provider = %cfg.provider,
            enabled = cfg.enabled,
            key_len = cfg.api_key.len(),
            "AI config loaded"
        );
        let client = build_client_from_config(&cfg);
        Self { cfg, client }
    }

    pub async fn quick_probe(&self) {
        if !self.cfg.enabled {
            warn!("AI quick_probe skipped: AI is disabled in config");
            return;
        }
        match complete(self.client.as_ref(), &prompts::stock_analysis("SPY")).await {
            Ok(text) => info!(provider = self.client.provider_name(), chars = text.len(), "AI quick_probe ok"),
            Err(e) => warn!(provider = self.client.provider_name(), error = %e, "AI quick_probe failed"),
        }
    }
}

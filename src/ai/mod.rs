//! LLM client abstraction.
//!
//! Handlers only see [`AiClient`]. Production talks to an OpenAI-compatible chat
//! completions endpoint (Groq by default); tests and local runs pick a mock or a
//! failing client through `AI_TEST_MODE`.

pub mod prompts;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use metrics::counter;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::ai::AiConfig;

pub const GROQ_ENDPOINT: &str = "https://api.groq.com/openai/v1/chat/completions";
pub const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
pub const GROQ_DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";

const MAX_COMPLETION_CHARS: usize = 2_000;

/// One completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("AI is disabled")]
    Disabled,
    #[error("AI provider request failed: {0}")]
    Http(String),
    #[error("AI provider returned status {0}")]
    Status(u16),
    #[error("AI provider returned an empty completion")]
    EmptyCompletion,
    #[error("AI failure injected by test mode")]
    Injected,
}

pub type AiFuture<'a> = Pin<Box<dyn Future<Output = Result<String, AiError>> + Send + 'a>>;

pub trait AiClient: Send + Sync {
    fn generate<'a>(&'a self, prompt: &'a Prompt) -> AiFuture<'a>;
    /// Provider name for diagnostics.
    fn provider_name(&self) -> &'static str;
}

pub type DynAiClient = Arc<dyn AiClient>;

/// Run a prompt and record the outcome.
pub async fn complete(client: &dyn AiClient, prompt: &Prompt) -> Result<String, AiError> {
    let res = client.generate(prompt).await;
    let outcome = match &res {
        Ok(_) => "ok",
        Err(AiError::Disabled) => "disabled",
        Err(_) => "error",
    };
    counter!("ai_requests_total", "outcome" => outcome).increment(1);
    if let Err(e) = &res {
        warn!(target: "ai", provider = client.provider_name(), error = %e, "completion failed");
    }
    res
}

/// Factory honouring `AI_TEST_MODE` (`mock` | `error`) before the config.
pub fn build_client_from_config(cfg: &AiConfig) -> DynAiClient {
    match std::env::var("AI_TEST_MODE").ok().as_deref() {
        Some("mock") => return Arc::new(MockClient::default()),
        Some("error") => return Arc::new(FailingClient),
        _ => {}
    }

    if !cfg.enabled {
        return Arc::new(DisabledClient);
    }
    if cfg.api_key.trim().is_empty() {
        warn!(target: "ai", provider = %cfg.provider, "AI enabled without an API key; disabling");
        return Arc::new(DisabledClient);
    }

    let built = match cfg.provider.as_str() {
        "groq" => ChatCompletionsClient::new(
            "groq",
            GROQ_ENDPOINT,
            &cfg.api_key,
            cfg.model.as_deref().unwrap_or(GROQ_DEFAULT_MODEL),
        ),
        "openai" => ChatCompletionsClient::new(
            "openai",
            OPENAI_ENDPOINT,
            &cfg.api_key,
            cfg.model.as_deref().unwrap_or(OPENAI_DEFAULT_MODEL),
        ),
        other => {
            warn!(target: "ai", provider = other, "unsupported AI provider; disabling");
            return Arc::new(DisabledClient);
        }
    };

    match built {
        Ok(client) => {
            info!(target: "ai", provider = client.name, model = %client.model, "AI client ready");
            Arc::new(client)
        }
        Err(e) => {
            warn!(target: "ai", error = %e, "could not build AI client; disabling");
            Arc::new(DisabledClient)
        }
    }
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionsClient {
    http: reqwest::Client,
    name: &'static str,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatCompletionsClient {
    pub fn new(name: &'static str, endpoint: &str, api_key: &str, model: &str) -> Result<Self, AiError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("kaizen-markets/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(4))
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|e| AiError::Http(e.to_string()))?;
        Ok(Self {
            http,
            name,
            endpoint: endpoint.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    async fn generate_impl(&self, prompt: &Prompt) -> Result<String, AiError> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
            max_tokens: u32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: &prompt.text,
            }],
            temperature: prompt.temperature,
            max_tokens: prompt.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;
        if !resp.status().is_success() {
            return Err(AiError::Status(resp.status().as_u16()));
        }
        let body: Resp = resp.json().await.map_err(|e| AiError::Http(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let cleaned = clean_completion(&content);
        if cleaned.is_empty() {
            Err(AiError::EmptyCompletion)
        } else {
            Ok(cleaned)
        }
    }
}

impl AiClient for ChatCompletionsClient {
    fn generate<'a>(&'a self, prompt: &'a Prompt) -> AiFuture<'a> {
        Box::pin(self.generate_impl(prompt))
    }
    fn provider_name(&self) -> &'static str {
        self.name
    }
}

/// Always `Err(Disabled)`; used when AI is off.
pub struct DisabledClient;

impl AiClient for DisabledClient {
    fn generate<'a>(&'a self, _prompt: &'a Prompt) -> AiFuture<'a> {
        Box::pin(async { Err(AiError::Disabled) })
    }
    fn provider_name(&self) -> &'static str {
        "disabled"
    }
}

/// Deterministic answer for tests and offline runs.
#[derive(Clone)]
pub struct MockClient {
    pub fixed: String,
}

impl Default for MockClient {
    fn default() -> Self {
        Self {
            fixed: "Markets are mixed (mock).".to_string(),
        }
    }
}

impl AiClient for MockClient {
    fn generate<'a>(&'a self, _prompt: &'a Prompt) -> AiFuture<'a> {
        let out = self.fixed.clone();
        Box::pin(async move { Ok(out) })
    }
    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

pub struct FailingClient;

impl AiClient for FailingClient {
    fn generate<'a>(&'a self, _prompt: &'a Prompt) -> AiFuture<'a> {
        Box::pin(async { Err(AiError::Injected) })
    }
    fn provider_name(&self) -> &'static str {
        "failing"
    }
}

/// Trim, normalize line endings, drop blank-line runs, cap length.
pub fn clean_completion(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_COMPLETION_CHARS));
    let mut blank = false;
    for line in input.replace("\r\n", "\n").lines() {
        let line = line.trim_end();
        if line.trim().is_empty() {
            blank = true;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank { "\n\n" } else { "\n" });
        }
        out.push_str(line);
        blank = false;
    }
    let out = out.trim().to_string();
    if out.chars().count() > MAX_COMPLETION_CHARS {
        out.chars().take(MAX_COMPLETION_CHARS).collect()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn clean_completion_collapses_blank_runs() {
        let raw = "\r\n  Stocks rose.\r\n\r\n\r\n- Tech led  \n- Energy lagged\n\n";
        assert_eq!(clean_completion(raw), "Stocks rose.\n\n- Tech led\n- Energy lagged");
        assert_eq!(clean_completion("   \n "), "");
    }

    #[serial_test::serial]
    #[test]
    fn test_mode_overrides_config() {
        std::env::set_var("AI_TEST_MODE", "mock");
        assert_eq!(build_client_from_config(&AiConfig::default()).provider_name(), "mock");
        std::env::set_var("AI_TEST_MODE", "error");
        assert_eq!(build_client_from_config(&AiConfig::default()).provider_name(), "failing");
        std::env::remove_var("AI_TEST_MODE");

        assert_eq!(build_client_from_config(&AiConfig::default()).provider_name(), "disabled");
        let keyless = AiConfig {
            enabled: true,
            ..AiConfig::default()
        };
        assert_eq!(build_client_from_config(&keyless).provider_name(), "disabled");
        let groq = AiConfig {
            enabled: true,
            api_key: "gsk_x".into(),
            ..AiConfig::default()
        };
        assert_eq!(build_client_from_config(&groq).provider_name(), "groq");
    }

    #[tokio::test]
    async fn chat_completions_sends_prompt_and_reads_first_choice() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path("/openai/v1/chat/completions")
                .header("authorization", "Bearer gsk_test");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "  Risk-on tone today.\n" } }]
                }));
        });

        let client = ChatCompletionsClient::new(
            "groq",
            &server.url("/openai/v1/chat/completions"),
            "gsk_test",
            GROQ_DEFAULT_MODEL,
        )
        .unwrap();
        let out = complete(&client, &prompts::market_summary()).await.unwrap();

        mock.assert();
        assert_eq!(out, "Risk-on tone today.");
    }

    #[tokio::test]
    async fn chat_completions_maps_status_and_empty_content() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/limited");
            then.status(429);
        });
        server.mock(|when, then| {
            when.method(POST).path("/empty");
            then.status(200)
                .header("content-type", "application/json")
                .json_body(json!({ "choices": [] }));
        });

        let limited =
            ChatCompletionsClient::new("groq", &server.url("/limited"), "k", GROQ_DEFAULT_MODEL).unwrap();
        assert!(matches!(
            limited.generate(&prompts::chat("hi")).await,
            Err(AiError::Status(429))
        ));

        let empty =
            ChatCompletionsClient::new("groq", &server.url("/empty"), "k", GROQ_DEFAULT_MODEL).unwrap();
        assert!(matches!(
            empty.generate(&prompts::chat("hi")).await,
            Err(AiError::EmptyCompletion)
        ));
    }
}

//! Text-generation seam and its HTTP implementation.

use crate::token::{TokenCache, TokenIssuer};
use crate::{AiError, AiResult};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, warn};

/// Anything that turns a prompt into text. Implemented by the HTTP client
/// and by test stubs.
pub trait TextGenerator: Send + Sync {
    fn complete(&self, prompt: &str) -> AiResult<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub endpoint: String,
    pub model: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            model: "mistral-large2".to_string(),
            timeout_ms: 30_000,
            user_agent: concat!("bom-configurator/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Chat-completions client over a blocking `ureq` agent.
pub struct HttpCompletionClient<I> {
    agent: ureq::Agent,
    settings: CompletionSettings,
    tokens: Mutex<TokenCache<I>>,
}

impl<I: TokenIssuer> HttpCompletionClient<I> {
    pub fn new(settings: CompletionSettings, tokens: TokenCache<I>) -> AiResult<Self> {
        if settings.endpoint.trim().is_empty() {
            return Err(AiError::Config("completion endpoint is not set".to_string()));
        }
        if settings.timeout_ms == 0 {
            return Err(AiError::Config("timeout must be > 0".to_string()));
        }
        let timeout = Duration::from_millis(settings.timeout_ms.max(100));
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout_read(timeout)
            .timeout_write(timeout)
            .user_agent(&settings.user_agent)
            .build();
        Ok(Self {
            agent,
            settings,
            tokens: Mutex::new(tokens),
        })
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    fn bearer(&self) -> AiResult<String> {
        let mut tokens = self
            .tokens
            .lock()
            .map_err(|_| AiError::Auth("token cache lock poisoned".to_string()))?;
        tokens.bearer(Utc::now())
    }

    fn invalidate(&self) {
        if let Ok(mut tokens) = self.tokens.lock() {
            tokens.invalidate(Utc::now());
        }
    }

    fn post_json(&self, token: &str, payload: &Value) -> AiResult<Value> {
        let response = self
            .agent
            .post(&self.settings.endpoint)
            .set("Content-Type", "application/json")
            .set("Authorization", &format!("Bearer {token}"))
            .set("Accept", "application/json")
            .send_json(payload)
            .map_err(error_from_ureq)?;
        serde_json::from_reader(response.into_reader())
            .map_err(|e| AiError::Parse(format!("response body is not JSON: {e}")))
    }
}

impl<I: TokenIssuer> TextGenerator for HttpCompletionClient<I> {
    fn complete(&self, prompt: &str) -> AiResult<String> {
        let payload = json!({
            "model": self.settings.model,
            "messages": [{ "role": "user", "content": prompt }],
        });
        debug!(model = %self.settings.model, prompt_chars = prompt.len(), "completion request");

        let token = self.bearer()?;
        let body = match self.post_json(&token, &payload) {
            Err(AiError::Http { status: 401 }) => {
                warn!("completion rejected the bearer token; refreshing once");
                self.invalidate();
                let token = self.bearer()?;
                self.post_json(&token, &payload)?
            }
            other => other?,
        };
        completion_text(&body)
    }
}

/// Pulls the generated text out of a chat-completions body. Accepts both
/// `choices[0].message.content` and the flattened `choices[0].messages`.
pub fn completion_text(body: &Value) -> AiResult<String> {
    let choice = body
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| AiError::Parse("response has no choices".to_string()))?;
    choice
        .get("message")
        .and_then(|m| m.get("content"))
        .or_else(|| choice.get("messages"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AiError::Parse("choice has no text content".to_string()))
}

fn error_from_ureq(err: ureq::Error) -> AiError {
    match err {
        ureq::Error::Status(status, _) => AiError::Http { status },
        ureq::Error::Transport(transport) => {
            let detail = format!("{:?} {}", transport.kind(), transport);
            AiError::Transport {
                kind: classify_transport(&detail),
                detail,
            }
        }
    }
}

fn classify_transport(raw: &str) -> &'static str {
    let lower = raw.to_ascii_lowercase();
    if lower.contains("timeout") || lower.contains("timed out") {
        "timeout"
    } else if lower.contains("tls") || lower.contains("ssl") {
        "tls"
    } else if lower.contains("dns") {
        "dns"
    } else if lower.contains("connection") || lower.contains("connect") {
        "connection"
    } else {
        "transport"
    }
}

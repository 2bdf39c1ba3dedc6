//! OpenAI-compatible chat completion client.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, error, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{LlmError, TextGenerator};
use crate::config::LlmConfig;

/// Keys shipped in sample configuration files. Treated the same as no key.
const PLACEHOLDER_KEYS: [&str; 4] = ["", "your_api_key_here", "demo_key_for_testing", "sk-xxx"];

const MAX_ERROR_BODY_LENGTH: usize = 200;

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

pub fn is_placeholder_key(key: &str) -> bool {
    PLACEHOLDER_KEYS.contains(&key.trim())
}

fn truncate_error_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Talks to `{api_base}/chat/completions` with bearer authentication.
///
/// Without a usable key every call returns [`LlmError::NotConfigured`]
/// and no request is made.
#[derive(Debug)]
pub struct OpenAiGenerator {
    client: Client,
    api_base: String,
    model: String,
    temperature: f32,
    max_retries: u32,
    api_key: Option<SecretString>,
}

impl OpenAiGenerator {
    /// Reads the key from the environment variable named by
    /// `config.api_key_env`.
    pub fn from_env(config: &LlmConfig) -> Self {
        let key = std::env::var(&config.api_key_env)
            .ok()
            .map(SecretString::from);
        Self::with_api_key(config, key)
    }

    pub fn with_api_key(config: &LlmConfig, api_key: Option<SecretString>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                error!(
                    "Failed to build HTTP client with custom timeout, using default client: {}",
                    e
                );
                Client::new()
            });

        let api_key = api_key.filter(|key| !is_placeholder_key(key.expose_secret()));
        if api_key.is_none() {
            warn!(
                "No usable API key in {}; summaries and diagrams will use local fallbacks",
                config.api_key_env
            );
        }

        Self {
            client,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model_name.clone(),
            temperature: config.temperature,
            max_retries: config.max_retries,
            api_key,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }

    async fn send_once(
        &self,
        api_key: &SecretString,
        request: &ChatRequest<'_>,
    ) -> Result<String, LlmError> {
        let response = self
            .client
            .post(self.chat_url())
            .bearer_auth(api_key.expose_secret())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Http {
                status: status.as_u16(),
                body: truncate_error_body(&body),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .ok_or_else(|| {
                LlmError::InvalidResponse("Response contained no message content".to_string())
            })
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let Some(api_key) = &self.api_key else {
            return Err(LlmError::NotConfigured);
        };

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.temperature,
        };

        let mut attempt: u32 = 0;
        loop {
            match self.send_once(api_key, &request).await {
                Ok(text) => {
                    debug!(
                        "Text generator returned {} chars from {}",
                        text.len(),
                        self.model
                    );
                    return Ok(text);
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("Text generation attempt {} failed, retrying: {}", attempt, e);
                    tokio::time::sleep(RETRY_BACKOFF * attempt).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

//! Groq chat-completions client (OpenAI-compatible API).

use chrono::NaiveDateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

use super::prompt::{category_prompt, clean_prompt, schedule_prompt};
use super::{parse_schedule_reply, AiError, AiResult, CategoryContext, TaskAnalyzer};
use crate::estimator::ScheduleSuggestion;
use crate::storage::AiConfig;

pub const DEFAULT_ENDPOINT: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

const CATEGORY_MAX_TOKENS: u32 = 10;
const CLEAN_MAX_TOKENS: u32 = 100;
const SCHEDULE_MAX_TOKENS: u32 = 100;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Task analyzer backed by Groq's hosted models.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    endpoint: String,
    model: String,
    temperature: f32,
}

impl GroqClient {
    fn create_client(timeout: Duration) -> Client {
        Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap_or_else(|_| Client::new())
    }

    /// Client with default endpoint and model.
    pub fn new(api_key: impl Into<String>) -> Self {
        let defaults = AiConfig::default();
        Self {
            client: Self::create_client(defaults.timeout()),
            api_key: api_key.into(),
            endpoint: defaults.endpoint,
            model: defaults.model,
            temperature: defaults.temperature,
        }
    }

    /// Build a client from configuration. `None` when no API key is set,
    /// which routes every classification to the local heuristics.
    pub fn from_config(config: &AiConfig) -> Option<Self> {
        let api_key = config.effective_api_key()?;
        Some(Self {
            client: Self::create_client(config.timeout()),
            api_key,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    /// Point the client at another OpenAI-compatible base URL.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Single-turn completion; returns the trimmed reply text.
    async fn complete(&self, prompt: String, max_tokens: u32) -> AiResult<String> {
        if self.api_key.is_empty() {
            return Err(AiError::NoApiKey);
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: Some(prompt),
            }],
            temperature: self.temperature,
            max_tokens,
        };

        debug!(model = %self.model, max_tokens, "sending chat completion request");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!(status = %status, "chat completion request failed");
            return Err(AiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let completion: ChatResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|c| c.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(AiError::EmptyCompletion);
        }
        Ok(text)
    }
}

impl TaskAnalyzer for GroqClient {
    async fn clean_text(&self, text: &str) -> AiResult<String> {
        self.complete(clean_prompt(text), CLEAN_MAX_TOKENS).await
    }

    async fn categorize(&self, text: &str, context: CategoryContext<'_>) -> AiResult<String> {
        self.complete(category_prompt(text, context), CATEGORY_MAX_TOKENS)
            .await
    }

    async fn suggest_schedule(
        &self,
        text: &str,
        now: NaiveDateTime,
    ) -> AiResult<ScheduleSuggestion> {
        let reply = self
            .complete(schedule_prompt(text, now), SCHEDULE_MAX_TOKENS)
            .await?;
        parse_schedule_reply(&reply)
    }
}

//! OpenAI-compatible Tier 2 backend
//!
//! Works with any server that implements the OpenAI chat completions API,
//! hosted or local (vLLM, llama-server, LocalAI). Only the job description is
//! sent; no caller or call metadata leaves the process.

use super::parsing::decode_verdict;
use super::{SemanticClassifier, SemanticVerdict};
use crate::config::SemanticConfig;
use async_trait::async_trait;
use jobtriage_core::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You triage home-repair jobs for a UK home-services company. \
Given one job description, decide how it should be handled and reply with a single JSON object \
and nothing else, using exactly these keys:\n\
- trafficLight: \"green\" (simple, safe to quote from a price list), \"amber\" (needs a photo or \
video assessment) or \"red\" (specialist or high complexity)\n\
- recommendedRoute: \"instant\", \"video\", \"visit\" (needs someone on site) or \"refer\" \
(licensed specialist such as Gas Safe, structural engineer or electrician)\n\
- complexityScore: integer 0-10\n\
- needsSpecialist: true when any licensed trade is required\n\
- reasoning: one short sentence\n\
- confidence: your certainty from 0 to 1\n\
Anything involving gas, structural movement, asbestos or major electrical work needs a specialist.";

/// Chat-completions client that judges job descriptions
#[derive(Clone)]
pub struct OpenAiCompatibleClassifier {
    http_client: Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    name: String,
}

impl OpenAiCompatibleClassifier {
    /// Create a client without authentication
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key: None,
            name: format!("openai-compatible:{}", model),
        }
    }

    /// Create a client that sends a bearer API key
    pub fn with_api_key(base_url: &str, model: &str, api_key: &str) -> Self {
        let mut classifier = Self::new(base_url, model);
        classifier.api_key = Some(api_key.to_string());
        classifier
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable if it is set
    pub fn from_config(config: &SemanticConfig) -> Self {
        let mut classifier = Self::new(&config.base_url, &config.model);
        classifier.api_key = config
            .api_key_env
            .as_deref()
            .and_then(|var| std::env::var(var).ok())
            .filter(|key| !key.is_empty());
        classifier
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    async fn chat_completion(&self, description: &str) -> Result<String> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: description.to_string(),
                },
            ],
            temperature: 0.0,
            response_format: Some(ResponseFormat {
                kind: "json_object".to_string(),
            }),
            stream: false,
        };

        let mut req_builder = self
            .http_client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .json(&request);

        if let Some(ref api_key) = self.api_key {
            req_builder = req_builder.bearer_auth(api_key);
        }

        let response = req_builder
            .send()
            .await
            .map_err(|e| Error::semantic(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::semantic(format!(
                "Completion API error {}: {}",
                status, body
            )));
        }

        let chat_response: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| Error::semantic(format!("Invalid completion response: {}", e)))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Error::semantic("No content in completion response"))
    }
}

#[async_trait]
impl SemanticClassifier for OpenAiCompatibleClassifier {
    async fn judge(&self, description: &str) -> Result<SemanticVerdict> {
        let content = self.chat_completion(description).await?;
        debug!(model = %self.model, bytes = content.len(), "Tier 2 completion received");
        decode_verdict(&content)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for OpenAiCompatibleClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCompatibleClassifier")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

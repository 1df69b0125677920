//! OpenRouter API client for the LLM-backed collaborators
//!
//! Speaks the OpenAI-compatible chat-completions dialect.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::AnalysisError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_MODEL: &str = "mistralai/mistral-7b-instruct";
const BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Low temperature: the collaborators want faithful restatements of
/// document figures, not creativity.
const TEMPERATURE: f32 = 0.2;

/// Reusable OpenRouter client (connection-pooled)
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenRouterClient {
    pub fn new(api_key: String) -> Self {
        Self::with_model(api_key, DEFAULT_MODEL.to_string())
    }

    pub fn with_model(api_key: String, model: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: BASE_URL.to_string(),
            model,
        }
    }

    /// Send a single-turn prompt and return the model's text.
    pub async fn chat(&self, prompt: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(AnalysisError::LlmError(
                "OPENROUTER_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: TEMPERATURE,
        };

        info!(model = %self.model, "Calling OpenRouter API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("OpenRouter request failed: {}", e);
                AnalysisError::LlmError(format!("OpenRouter request error: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("OpenRouter error response: {}", error_text);
            return Err(AnalysisError::LlmError(format!(
                "OpenRouter API error: {}",
                error_text
            )));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse OpenRouter response: {}", e);
            AnalysisError::LlmError(format!("OpenRouter parse error: {}", e))
        })?;

        if let Some(usage) = &chat_response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "OpenRouter usage"
            );
        }

        let answer = chat_response
            .choices
            .first()
            .ok_or_else(|| AnalysisError::LlmError("No choices from OpenRouter".to_string()))?
            .message
            .content
            .clone();

        Ok(answer)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: DEFAULT_MODEL.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "What is the debt position?".to_string(),
            }],
            temperature: TEMPERATURE,
        };

        let json = serde_json::to_string(&request);
        assert!(json.is_ok());
        let json = json.unwrap();
        assert!(json.contains("What is the debt position?"));
        assert!(json.contains("mistral-7b-instruct"));
    }

    #[test]
    fn test_response_deserialization() {
        let raw = r#"{
            "choices": [
                {"message": {"role": "assistant", "content": "- What is total debt?\n- What is equity?"}}
            ],
            "usage": {"prompt_tokens": 40, "completion_tokens": 18}
        }"#;

        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert!(parsed.choices[0].message.content.contains("total debt"));
    }

    #[tokio::test]
    async fn test_missing_api_key_is_an_error() {
        let client = OpenRouterClient::new(String::new());
        let result = client.chat("anything").await;
        assert!(matches!(result, Err(AnalysisError::LlmError(_))));
    }
}

//! Chat-completion client for the ranking model
//!
//! Talks to an OpenAI-compatible `/chat/completions` endpoint.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::RankingError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Reusable chat client (connection-pooled)
pub struct ChatClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ChatClient {
    pub fn new(api_key: String, base_url: String, model: String) -> crate::Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
            model,
        })
    }

    /// Send one system + user exchange and return the assistant text.
    pub async fn complete(&self, system_prompt: &str, user_prompt: &str) -> crate::Result<String> {
        if self.api_key.is_empty() {
            return Err(RankingError::Llm("ranking model API key not configured".to_string()));
        }

        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: user_prompt.to_string(),
                },
            ],
            temperature: 0.2,
            max_tokens: 1500,
        };

        debug!(model = %self.model, "Calling ranking model");

        let response = self
            .client
            .post(&self.base_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Ranking model request failed: {}", e);
                RankingError::Llm(format!("request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!(%status, "Ranking model error response: {}", error_text);
            return Err(RankingError::Llm(format!("{}: {}", status, error_text)));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!("Failed to parse ranking model response: {}", e);
            RankingError::Llm(format!("parse error: {}", e))
        })?;

        let choice = chat_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| RankingError::Llm("no choices in response".to_string()))?;

        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("unknown"),
            "Ranking model responded"
        );

        choice
            .message
            .content
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| RankingError::Llm("empty response content".to_string()))
    }
}

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
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: DEFAULT_MODEL,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: "Rank these clients".to_string(),
            }],
            temperature: 0.2,
            max_tokens: 1500,
        };

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("Rank these clients"));
        assert!(json.contains("\"model\":\"gpt-4o\""));
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = ChatClient::new(
            String::new(),
            DEFAULT_CHAT_URL.to_string(),
            DEFAULT_MODEL.to_string(),
        )
        .unwrap();

        let err = client.complete("system", "user").await.unwrap_err();
        assert!(matches!(err, RankingError::Llm(_)));
    }
}

// src/ai/client.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};

use super::ChatTurn;
use crate::config::RelayConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatTurn],
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

/// Chat-completions client for an OpenAI-style API.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(config: &RelayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            api_key: config.openai_api_key.clone(),
            base_url: config.openai_api_url.clone(),
            model: config.openai_model.clone(),
        })
    }

    /// One-shot completion in `json_object` mode. The prompt must ask
    /// for JSON; the reply is returned as a parsed value.
    pub async fn complete_json(&self, label: &str, prompt: &str) -> Result<Value> {
        let messages = [ChatTurn::user(prompt)];
        let content = self
            .send(label, &messages, Some(ResponseFormat { kind: "json_object" }))
            .await?;
        serde_json::from_str(&content).context("Model reply was not valid JSON")
    }

    /// Free-form completion over a whole conversation.
    pub async fn complete_chat(&self, label: &str, conversation: &[ChatTurn]) -> Result<String> {
        let content = self.send(label, conversation, None).await?;
        Ok(content.trim().to_string())
    }

    async fn send(
        &self,
        label: &str,
        messages: &[ChatTurn],
        response_format: Option<ResponseFormat>,
    ) -> Result<String> {
        let request = CompletionRequest {
            model: &self.model,
            messages,
            response_format,
        };

        info!("Sending completion request: {}", label);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .context("Failed to send request to the model API")?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Model API error {}: {}", status, error_text);
            anyhow::bail!("Model API returned error {}: {}", status, error_text);
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse model API response")?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow::anyhow!("No choices in model API response"))
    }
}

//! Groq provider, speaking Groq's OpenAI-compatible API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{
    CompletionRequest, CompletionStream, Provider, ProviderSettings, error_for_status,
    parse_retry_after, spawn_stream_reader,
};
use crate::error::ProviderError;

pub struct GroqProvider {
    client: Client,
    settings: ProviderSettings,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingItem>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingItem {
    index: usize,
    embedding: Vec<f32>,
}

impl GroqProvider {
    pub fn new(settings: ProviderSettings) -> Result<Self, ProviderError> {
        if settings.api_key.trim().is_empty() {
            return Err(ProviderError::AuthInvalid(
                "no API key configured for groq (set GROQ_API_KEY)".to_string(),
            ));
        }

        let client = Client::builder()
            .connect_timeout(settings.timeout)
            .build()
            .map_err(|e| ProviderError::Unavailable(e.to_string()))?;

        Ok(Self {
            client,
            settings: ProviderSettings {
                base_url: settings.base_url.trim_end_matches('/').to_string(),
                ..settings
            },
        })
    }

    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }
}

#[async_trait]
impl Provider for GroqProvider {
    fn name(&self) -> &str {
        "groq"
    }

    fn model(&self) -> &str {
        &self.settings.model
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        let url = format!("{}/models", self.settings.base_url);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.settings.api_key)
            .timeout(self.settings.timeout)
            .send()
            .await;

        match res {
            Ok(resp) => Ok(resp.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.settings.base_url);
        let request = EmbeddingsRequest {
            model: &self.settings.model,
            input: inputs,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .timeout(self.settings.timeout)
            .json(&request)
            .send()
            .await
            .map_err(ProviderError::from_request)?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body, retry_after));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        if parsed.data.len() != inputs.len() {
            return Err(ProviderError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                inputs.len(),
                parsed.data.len()
            )));
        }

        let mut data = parsed.data;
        data.sort_by_key(|item| item.index);
        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionStream, ProviderError> {
        let url = format!("{}/chat/completions", self.settings.base_url);

        let mut messages = Vec::with_capacity(2);
        if let Some(ref system) = request.system {
            messages.push(WireMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(WireMessage {
            role: "user",
            content: &request.prompt,
        });

        let body = ChatCompletionsRequest {
            model: &self.settings.model,
            messages,
            temperature: self.settings.temperature,
            stream: true,
        };

        let send = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&body)
            .send();

        let response = tokio::time::timeout(self.settings.timeout, send)
            .await
            .map_err(|_| ProviderError::Unavailable("completion request timed out".to_string()))?
            .map_err(ProviderError::from_request)?;

        if !response.status().is_success() {
            let status = response.status();
            let retry_after = parse_retry_after(response.headers());
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &body, retry_after));
        }

        Ok(spawn_stream_reader(response, self.settings.timeout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn settings(api_key: &str, base_url: &str) -> ProviderSettings {
        ProviderSettings {
            api_key: api_key.to_string(),
            base_url: base_url.to_string(),
            model: "llama-3.3-70b-versatile".to_string(),
            temperature: Some(0.7),
            timeout: Duration::from_secs(5),
        }
    }

    #[test]
    fn test_missing_key_rejected() {
        let result = GroqProvider::new(settings("", "https://api.groq.com/openai/v1"));
        assert!(matches!(result, Err(ProviderError::AuthInvalid(_))));
    }

    #[test]
    fn test_base_url_trimming() {
        let provider = GroqProvider::new(settings("key", "https://api.groq.com/openai/v1/")).unwrap();
        assert_eq!(provider.base_url(), "https://api.groq.com/openai/v1");
        assert_eq!(provider.name(), "groq");
    }
}

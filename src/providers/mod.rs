//! Hosted model providers.
//!
//! Each provider implements the [`Provider`] capability trait (embeddings +
//! streamed chat completions) over its OpenAI-compatible HTTP API. Selection
//! happens in configuration; callers only see the trait.

mod groq;
mod openai;

pub use groq::GroqProvider;
pub use openai::OpenAiProvider;

use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::StatusCode;
use reqwest::header::HeaderMap;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::error::ProviderError;
use crate::models::ProviderKind;

/// Everything a provider needs to make requests.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: Option<f64>,
    pub timeout: Duration,
}

/// A single completion request. The prompt is already fully assembled;
/// the optional system text rides in a separate system message.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
}

/// Capability interface over a hosted model provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider name (e.g. "groq", "openai").
    fn name(&self) -> &str;

    /// Model requests are issued against.
    fn model(&self) -> &str;

    /// Check whether the provider endpoint is reachable with the configured key.
    async fn health_check(&self) -> Result<bool, ProviderError>;

    /// Embed a batch of texts. One vector per input, same order, uniform
    /// dimensionality for a given model.
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, ProviderError>;

    /// Start a streamed completion for the request.
    async fn complete(&self, request: CompletionRequest)
    -> Result<CompletionStream, ProviderError>;
}

/// Instantiate the configured provider.
pub fn build_provider(
    kind: ProviderKind,
    settings: ProviderSettings,
) -> Result<Box<dyn Provider>, ProviderError> {
    match kind {
        ProviderKind::Groq => Ok(Box::new(GroqProvider::new(settings)?)),
        ProviderKind::OpenAi => Ok(Box::new(OpenAiProvider::new(settings)?)),
    }
}

/// A finite, non-restartable sequence of answer fragments.
///
/// Fragments are pulled with [`CompletionStream::next`]; the call suspends
/// until the next fragment arrives. Dropping the stream closes the channel,
/// which stops the producer task and releases the underlying connection.
pub struct CompletionStream {
    rx: mpsc::Receiver<Result<String, ProviderError>>,
}

impl CompletionStream {
    pub(crate) fn new(rx: mpsc::Receiver<Result<String, ProviderError>>) -> Self {
        Self { rx }
    }

    /// Next fragment, or `None` once the stream is finished.
    pub async fn next(&mut self) -> Option<Result<String, ProviderError>> {
        self.rx.recv().await
    }

    /// Drain the stream into the full answer text.
    pub async fn collect(mut self) -> Result<String, ProviderError> {
        let mut answer = String::new();
        while let Some(fragment) = self.next().await {
            answer.push_str(&fragment?);
        }
        Ok(answer)
    }
}

// --- shared wire plumbing for OpenAI-compatible APIs ---

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

/// Map an unsuccessful HTTP response to the provider error taxonomy.
pub(crate) fn error_for_status(
    status: StatusCode,
    body: &str,
    retry_after: Option<Duration>,
) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ProviderError::AuthInvalid(format!("status {}: {}", status, body))
        }
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited { retry_after },
        s if s.is_server_error() => {
            ProviderError::Unavailable(format!("status {}: {}", status, body))
        }
        _ => ProviderError::InvalidResponse(format!("status {}: {}", status, body)),
    }
}

/// Parse a Retry-After header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Read an SSE chat-completion body into a fragment channel.
///
/// The producer task ends on `data: [DONE]`, on stream error, when no bytes
/// arrive within `read_timeout`, or when the receiver is dropped.
pub(crate) fn spawn_stream_reader(
    response: reqwest::Response,
    read_timeout: Duration,
) -> CompletionStream {
    let (tx, rx) = mpsc::channel(32);
    let mut body = response.bytes_stream();

    tokio::spawn(async move {
        // SSE events can split across network chunks; buffer until newline.
        let mut pending = String::new();

        loop {
            let item = match tokio::time::timeout(read_timeout, body.next()).await {
                Ok(item) => item,
                Err(_) => {
                    let _ = tx
                        .send(Err(ProviderError::Unavailable(
                            "completion stream timed out".to_string(),
                        )))
                        .await;
                    return;
                }
            };

            let bytes = match item {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => {
                    let _ = tx.send(Err(ProviderError::from_request(e))).await;
                    return;
                }
                None => return,
            };

            pending.push_str(&String::from_utf8_lossy(&bytes));

            while let Some(newline) = pending.find('\n') {
                let line: String = pending.drain(..=newline).collect();
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };
                let data = data.trim();
                if data == "[DONE]" {
                    return;
                }
                if let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) {
                    let content = chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .unwrap_or_default();
                    if !content.is_empty() && tx.send(Ok(content)).await.is_err() {
                        // Receiver dropped: the caller cancelled the stream.
                        return;
                    }
                }
            }
        }
    });

    CompletionStream::new(rx)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_for_status_classes() {
        let auth = error_for_status(StatusCode::UNAUTHORIZED, "bad key", None);
        assert!(matches!(auth, ProviderError::AuthInvalid(_)));

        let throttled = error_for_status(
            StatusCode::TOO_MANY_REQUESTS,
            "slow down",
            Some(Duration::from_secs(2)),
        );
        assert!(matches!(
            throttled,
            ProviderError::RateLimited {
                retry_after: Some(d)
            } if d == Duration::from_secs(2)
        ));

        let down = error_for_status(StatusCode::BAD_GATEWAY, "", None);
        assert!(matches!(down, ProviderError::Unavailable(_)));

        let odd = error_for_status(StatusCode::BAD_REQUEST, "", None);
        assert!(matches!(odd, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn test_parse_retry_after() {
        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::RETRY_AFTER, "3".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(3)));

        headers.insert(reqwest::header::RETRY_AFTER, "soon".parse().unwrap());
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[tokio::test]
    async fn test_stream_yields_fragments_in_order() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok("Hello".to_string())).await.unwrap();
        tx.send(Ok(", world".to_string())).await.unwrap();
        drop(tx);

        let stream = CompletionStream::new(rx);
        assert_eq!(stream.collect().await.unwrap(), "Hello, world");
    }

    #[tokio::test]
    async fn test_dropping_stream_cancels_producer() {
        let (tx, rx) = mpsc::channel::<Result<String, ProviderError>>(1);
        let stream = CompletionStream::new(rx);
        drop(stream);

        // The producer observes the closed channel and stops.
        assert!(tx.is_closed());
        assert!(tx.send(Ok("late".to_string())).await.is_err());
    }

    #[tokio::test]
    async fn test_collect_surfaces_mid_stream_error() {
        let (tx, rx) = mpsc::channel(8);
        tx.send(Ok("partial".to_string())).await.unwrap();
        tx.send(Err(ProviderError::Unavailable("reset".to_string())))
            .await
            .unwrap();
        drop(tx);

        let stream = CompletionStream::new(rx);
        assert!(matches!(
            stream.collect().await,
            Err(ProviderError::Unavailable(_))
        ));
    }
}

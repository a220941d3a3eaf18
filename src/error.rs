//! Error types for the document chat CLI.

use std::time::Duration;

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors surfaced by LLM and embedding providers.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider rate limited")]
    RateLimited { retry_after: Option<Duration> },

    #[error("invalid API key: {0}")]
    AuthInvalid(String),

    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

impl ProviderError {
    /// Classify a request error from the HTTP layer.
    pub fn from_request(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            ProviderError::Unavailable(e.to_string())
        } else if e.is_decode() {
            ProviderError::InvalidResponse(e.to_string())
        } else {
            ProviderError::Unavailable(e.to_string())
        }
    }

    /// One-line recovery hint shown next to the error message.
    pub fn advice(&self) -> &'static str {
        match self {
            ProviderError::Unavailable(_) => "the provider is unreachable, try again later",
            ProviderError::RateLimited { .. } => "the provider is rate limiting, try again later",
            ProviderError::AuthInvalid(_) => "check your API key and provider settings",
            ProviderError::InvalidResponse(_) => {
                "the provider returned an unexpected response, try again later"
            }
        }
    }
}

impl Retryable for ProviderError {
    fn is_retryable(&self) -> bool {
        match self {
            ProviderError::Unavailable(_) | ProviderError::RateLimited { .. } => true,
            ProviderError::AuthInvalid(_) | ProviderError::InvalidResponse(_) => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ProviderError::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }
}

/// Errors related to the in-memory vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Errors related to loading and extracting documents.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("extractor not found: {0}")]
    ExtractorNotFound(String),

    #[error("extraction failed: {0}")]
    ExtractionFailed(String),

    #[error("unsupported document type: {0}")]
    UnsupportedType(String),

    #[error("document contains no extractable text: {0}")]
    EmptyDocument(String),
}

/// Errors related to retrieval (embed question, query index).
#[derive(Debug, Error)]
pub enum RetrieveError {
    #[error("embedding error: {0}")]
    Provider(#[from] ProviderError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

/// Session-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("a question is already being answered")]
    Busy,

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    #[error("retrieval error: {0}")]
    Retrieve(#[from] RetrieveError),
}

impl SessionError {
    /// One-line recovery hint shown next to the error message.
    pub fn advice(&self) -> &'static str {
        match self {
            SessionError::Busy => "wait for the current answer to finish",
            SessionError::Config(_) => "fix the configuration and retry",
            SessionError::Provider(e) => e.advice(),
            SessionError::Index(_) => "reload the document to rebuild its index",
            SessionError::Document(_) => "fix the input file and retry",
            SessionError::Retrieve(RetrieveError::Provider(e)) => e.advice(),
            SessionError::Retrieve(RetrieveError::Index(_)) => {
                "reload the document to rebuild its index"
            }
        }
    }
}

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CHAT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// Hosted provider selection for chat and embedding calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    OpenAi,
}

impl ProviderKind {
    /// Default API base URL for this provider.
    pub fn default_url(&self) -> &'static str {
        match self {
            ProviderKind::Groq => GROQ_API_URL,
            ProviderKind::OpenAi => OPENAI_API_URL,
        }
    }

    /// Environment variable consulted when no API key is configured.
    pub fn env_key(&self) -> &'static str {
        match self {
            ProviderKind::Groq => "GROQ_API_KEY",
            ProviderKind::OpenAi => "OPENAI_API_KEY",
        }
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "groq" => Ok(ProviderKind::Groq),
            "openai" => Ok(ProviderKind::OpenAi),
            _ => Err(format!("unknown provider: {}", s)),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::OpenAi => write!(f, "openai"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub prompt: PromptConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("docchat").join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigError> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            let content = std::fs::read_to_string(&path)?;
            let config: Config = toml::from_str(&content)?;
            config.validate()?;
            return Ok(config);
        }
        Ok(Self::default())
    }

    pub fn save(&self) -> Result<std::path::PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Reject parameter combinations that cannot work before any request is made.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;

        if !(0.0..=2.0).contains(&self.chat.temperature) {
            return Err(ConfigError::InvalidConfig(format!(
                "temperature must be between 0.0 and 2.0, got {}",
                self.chat.temperature
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidConfig(
                "retrieval.top_k must be at least 1".to_string(),
            ));
        }
        if let Some(score) = self.retrieval.min_score
            && !(0.0..=1.0).contains(&score)
        {
            return Err(ConfigError::InvalidConfig(format!(
                "retrieval.min_score must be between 0.0 and 1.0, got {}",
                score
            )));
        }
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "embedding.batch_size must be at least 1".to_string(),
            ));
        }
        if self.prompt.max_chars == 0 {
            return Err(ConfigError::InvalidConfig(
                "prompt.max_chars must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    #[serde(default = "default_chat_provider")]
    pub provider: ProviderKind,

    #[serde(default = "default_chat_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// API key; falls back to the provider's environment variable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL override for OpenAI-compatible servers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_chat_provider() -> ProviderKind {
    ProviderKind::Groq
}

fn default_chat_model() -> String {
    DEFAULT_CHAT_MODEL.to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout() -> u64 {
    120
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: default_chat_provider(),
            model: default_chat_model(),
            temperature: default_temperature(),
            api_key: None,
            url: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ChatConfig {
    /// Configured key, or the provider's environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), self.provider)
    }

    /// Configured URL override, or the provider's default base URL.
    pub fn resolve_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| self.provider.default_url().to_string())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: ProviderKind,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_batch_size")]
    pub batch_size: u32,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_embedding_provider() -> ProviderKind {
    ProviderKind::OpenAi
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_batch_size() -> u32 {
    8
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            api_key: None,
            url: None,
            batch_size: default_batch_size(),
            timeout_secs: default_timeout(),
        }
    }
}

impl EmbeddingConfig {
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key(self.api_key.as_deref(), self.provider)
    }

    pub fn resolve_url(&self) -> String {
        self.url
            .clone()
            .unwrap_or_else(|| self.provider.default_url().to_string())
    }
}

fn resolve_api_key(configured: Option<&str>, provider: ProviderKind) -> Option<String> {
    if let Some(key) = configured
        && !key.trim().is_empty()
    {
        return Some(key.to_string());
    }
    std::env::var(provider.env_key())
        .ok()
        .filter(|k| !k.trim().is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Passage size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Characters shared between consecutive passages.
    #[serde(default = "default_overlap")]
    pub overlap: u32,
}

fn default_chunk_size() -> u32 {
    500
}

fn default_overlap() -> u32 {
    50
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
        }
    }
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "chunking.chunk_size must be at least 1".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(ConfigError::InvalidConfig(format!(
                "chunking.overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of passages fetched per question.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    /// Minimum similarity score (0.0-1.0) for a passage to be used.
    #[serde(default)]
    pub min_score: Option<f32>,
}

fn default_top_k() -> u32 {
    3
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            min_score: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Character budget for the assembled prompt.
    #[serde(default = "default_max_chars")]
    pub max_chars: u32,

    /// Most recent history messages considered for the prompt.
    #[serde(default = "default_history_limit")]
    pub history_limit: u32,

    /// Override for the built-in system instructions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

fn default_max_chars() -> u32 {
    12_000
}

fn default_history_limit() -> u32 {
    16
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_chars(),
            history_limit: default_history_limit(),
            instructions: None,
        }
    }
}

mod answer;
mod chat;
mod config;
mod document;

pub use answer::{AnswerReport, OutputFormat, ScoredPassage};
pub use chat::{ChatHistory, ChatMessage, Role};
pub use config::{
    ChatConfig, ChunkingConfig, Config, DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL,
    EmbeddingConfig, GROQ_API_URL, OPENAI_API_URL, PromptConfig, ProviderKind, RetrievalConfig,
};
pub use document::{Document, Passage};

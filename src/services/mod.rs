mod chunker;
mod controller;
mod embedding;
mod prompt;
mod retriever;
mod session;
mod vector_index;

pub use chunker::{TextChunker, estimate_tokens};
pub use controller::{AnswerStream, IndexReport, SessionController};
pub use embedding::EmbeddingClient;
pub use prompt::PromptAssembler;
pub use retriever::Retriever;
pub use session::{DocumentInfo, Session, SessionManager, SessionState};
pub use vector_index::{SimilarityMetric, VectorIndex};

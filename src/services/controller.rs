//! Session orchestration: document indexing and question answering.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::{DocumentError, ProviderError, SessionError};
use crate::models::{Config, Document, ScoredPassage};
use crate::providers::{CompletionStream, Provider, ProviderSettings, build_provider};
use crate::utils::retry::{RetryConfig, with_retry};

use super::chunker::TextChunker;
use super::embedding::EmbeddingClient;
use super::prompt::PromptAssembler;
use super::retriever::Retriever;
use super::session::{DocumentInfo, Session, SessionState};
use super::vector_index::VectorIndex;

/// Outcome of loading a document into a session.
#[derive(Debug, Clone)]
pub struct IndexReport {
    pub document: DocumentInfo,
    /// True when the session already held this exact content.
    pub reused: bool,
    pub duration_ms: u64,
}

/// A started answer: the fragment stream plus the context it is grounded in.
///
/// Dropping the stream before the final fragment cancels the completion.
pub struct AnswerStream {
    pub fragments: CompletionStream,
    pub context: Vec<ScoredPassage>,
}

/// Drives sessions through their document-load and question cycles.
///
/// Holds the configured collaborators; sessions are explicit handles passed
/// into every operation, so controllers carry no per-user state.
pub struct SessionController {
    chat: Arc<dyn Provider>,
    embedder: EmbeddingClient,
    chunker: TextChunker,
    retriever: Retriever,
    assembler: PromptAssembler,
    top_k: usize,
    min_score: Option<f32>,
    retry: RetryConfig,
}

impl SessionController {
    /// Build providers and collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self, SessionError> {
        let chat_key = config.chat.resolve_api_key().ok_or_else(|| {
            ProviderError::AuthInvalid(format!(
                "no API key for {} (set {} or [chat].api_key)",
                config.chat.provider,
                config.chat.provider.env_key()
            ))
        })?;
        let chat = build_provider(
            config.chat.provider,
            ProviderSettings {
                api_key: chat_key,
                base_url: config.chat.resolve_url(),
                model: config.chat.model.clone(),
                temperature: Some(config.chat.temperature),
                timeout: Duration::from_secs(config.chat.timeout_secs),
            },
        )?;

        let embed_key = config.embedding.resolve_api_key().ok_or_else(|| {
            ProviderError::AuthInvalid(format!(
                "no API key for {} (set {} or [embedding].api_key)",
                config.embedding.provider,
                config.embedding.provider.env_key()
            ))
        })?;
        let embed = build_provider(
            config.embedding.provider,
            ProviderSettings {
                api_key: embed_key,
                base_url: config.embedding.resolve_url(),
                model: config.embedding.model.clone(),
                temperature: None,
                timeout: Duration::from_secs(config.embedding.timeout_secs),
            },
        )?;

        Self::new(
            Arc::from(chat),
            Arc::from(embed),
            config,
            RetryConfig::default(),
        )
    }

    /// Assemble a controller from explicit providers.
    pub fn new(
        chat: Arc<dyn Provider>,
        embed: Arc<dyn Provider>,
        config: &Config,
        retry: RetryConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;

        let chunker = TextChunker::new(&config.chunking)?;
        let embedder = EmbeddingClient::new(
            embed,
            config.embedding.batch_size as usize,
            retry.clone(),
        );
        let retriever = Retriever::new(embedder.clone());
        let assembler = PromptAssembler::new(&config.prompt);

        Ok(Self {
            chat,
            embedder,
            chunker,
            retriever,
            assembler,
            top_k: config.retrieval.top_k as usize,
            min_score: config.retrieval.min_score,
            retry,
        })
    }

    pub fn chat_provider(&self) -> &dyn Provider {
        self.chat.as_ref()
    }

    pub fn embedding_provider(&self) -> &dyn Provider {
        self.embedder.provider()
    }

    /// Chunk, embed and index a document, then install the index into the
    /// session. The index is built completely off to the side and swapped in
    /// with one assignment; a failure leaves the previous document intact.
    pub async fn load_document(
        &self,
        session: &mut Session,
        document: Document,
    ) -> Result<IndexReport, SessionError> {
        if session.state() == SessionState::Querying {
            return Err(SessionError::Busy);
        }
        if document.text.trim().is_empty() {
            return Err(SessionError::Document(DocumentError::EmptyDocument(
                document.name,
            )));
        }

        let start = Instant::now();

        if let Some(current) = session.document()
            && current.checksum == document.checksum
        {
            return Ok(IndexReport {
                document: current.clone(),
                reused: true,
                duration_ms: start.elapsed().as_millis() as u64,
            });
        }

        let passages = self.chunker.chunk(&document);
        let texts: Vec<String> = passages.iter().map(|p| p.text.clone()).collect();
        let vectors = self
            .embedder
            .embed_passages(&texts)
            .await
            .map_err(SessionError::Provider)?;

        let mut index = VectorIndex::new();
        for (passage, vector) in passages.into_iter().zip(vectors) {
            index.insert(passage, vector)?;
        }

        let info = DocumentInfo {
            id: document.id,
            name: document.name,
            checksum: document.checksum,
            passage_count: index.len(),
            page_count: document.page_count,
        };
        session.install_index(info.clone(), index);

        Ok(IndexReport {
            document: info,
            reused: false,
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }

    /// Answer a question. With a document loaded the question goes through
    /// retrieval; otherwise it is plain chat and the retriever is never
    /// touched. The session stays in `Querying` until [`Self::finish_turn`].
    pub async fn ask(
        &self,
        session: &mut Session,
        question: &str,
    ) -> Result<AnswerStream, SessionError> {
        session.begin_query()?;

        match self.run_query(session, question).await {
            Ok(stream) => Ok(stream),
            Err(e) => {
                session.end_query(None);
                Err(e)
            }
        }
    }

    async fn run_query(
        &self,
        session: &mut Session,
        question: &str,
    ) -> Result<AnswerStream, SessionError> {
        let context = match session.index() {
            Some(index) => {
                self.retriever
                    .retrieve(index, question, self.top_k, self.min_score)
                    .await?
            }
            None => Vec::new(),
        };

        let request = self.assembler.assemble(question, &context, session.history());
        let fragments = with_retry(&self.retry, || self.chat.complete(request.clone()))
            .await
            .into_result()
            .map_err(SessionError::Provider)?;

        session.push_user(question);

        Ok(AnswerStream { fragments, context })
    }

    /// Close the turn started by [`Self::ask`]. Pass the (possibly partial)
    /// answer to record it in the history, or `None` when the stream failed.
    pub fn finish_turn(&self, session: &mut Session, answer: Option<&str>) {
        session.end_query(answer);
    }
}

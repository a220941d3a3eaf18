//! Per-user chat sessions and their lifecycle.

use std::collections::HashMap;

use crate::error::SessionError;
use crate::models::{ChatHistory, ChatMessage};

use super::vector_index::VectorIndex;

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No document loaded; only plain chat is available.
    Idle,
    /// A document's index is installed; questions go through retrieval.
    DocumentLoaded,
    /// A retrieval+completion cycle is in flight.
    Querying,
}

/// Summary of the document a session currently holds.
#[derive(Debug, Clone)]
pub struct DocumentInfo {
    pub id: String,
    pub name: String,
    pub checksum: String,
    pub passage_count: usize,
    pub page_count: Option<u32>,
}

/// All mutable state for one user's conversation. Mutated only by the
/// controller call handling the session's current request.
pub struct Session {
    id: String,
    state: SessionState,
    history: ChatHistory,
    index: Option<VectorIndex>,
    document: Option<DocumentInfo>,
}

impl Session {
    pub fn new() -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: SessionState::Idle,
            history: ChatHistory::new(),
            index: None,
            document: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn document(&self) -> Option<&DocumentInfo> {
        self.document.as_ref()
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Replace the session's index with a fully built one. The previous
    /// index is dropped in the same assignment, so no query can observe a
    /// partially built index or a mix of two documents.
    pub(crate) fn install_index(&mut self, info: DocumentInfo, index: VectorIndex) {
        self.index = Some(index);
        self.document = Some(info);
        self.state = SessionState::DocumentLoaded;
    }

    pub(crate) fn begin_query(&mut self) -> Result<(), SessionError> {
        if self.state == SessionState::Querying {
            return Err(SessionError::Busy);
        }
        self.state = SessionState::Querying;
        Ok(())
    }

    pub(crate) fn push_user(&mut self, text: &str) {
        self.history.push(ChatMessage::user(text));
    }

    /// Close the in-flight query. `answer` is recorded when the completion
    /// produced one (possibly partial on cancellation); `None` on failure.
    pub(crate) fn end_query(&mut self, answer: Option<&str>) {
        if let Some(text) = answer {
            self.history.push(ChatMessage::assistant(text));
        }
        self.state = if self.index.is_some() {
            SessionState::DocumentLoaded
        } else {
            SessionState::Idle
        };
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Sessions keyed by opaque id. Each session's state is visible to no other
/// session; a multi-user deployment gets one entry per user.
#[derive(Default)]
pub struct SessionManager {
    sessions: HashMap<String, Session>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// The session for `id`, created on first use.
    pub fn session(&mut self, id: &str) -> &mut Session {
        self.sessions
            .entry(id.to_string())
            .or_insert_with(|| Session::with_id(id))
    }

    /// Tear down a session, dropping its history and index.
    pub fn remove(&mut self, id: &str) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_info() -> DocumentInfo {
        DocumentInfo {
            id: "doc1".to_string(),
            name: "test.txt".to_string(),
            checksum: "abc".to_string(),
            passage_count: 1,
            page_count: None,
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.state(), SessionState::Idle);
        assert!(session.index().is_none());
        assert!(session.document().is_none());
        assert!(!session.id().is_empty());
    }

    #[test]
    fn test_query_cycle_returns_to_idle() {
        let mut session = Session::new();
        session.begin_query().unwrap();
        assert_eq!(session.state(), SessionState::Querying);

        session.end_query(Some("the answer"));
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.history().len(), 1);
    }

    #[test]
    fn test_query_cycle_returns_to_document_loaded() {
        let mut session = Session::new();
        session.install_index(dummy_info(), VectorIndex::new());
        assert_eq!(session.state(), SessionState::DocumentLoaded);

        session.begin_query().unwrap();
        session.end_query(None);
        assert_eq!(session.state(), SessionState::DocumentLoaded);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_reentrant_query_rejected() {
        let mut session = Session::new();
        session.begin_query().unwrap();
        assert!(matches!(session.begin_query(), Err(SessionError::Busy)));
    }

    #[test]
    fn test_failed_query_records_nothing() {
        let mut session = Session::new();
        session.begin_query().unwrap();
        session.end_query(None);
        assert!(session.history().is_empty());
    }

    #[test]
    fn test_manager_isolates_sessions() {
        let mut manager = SessionManager::new();
        manager.session("alice").push_user("alice's question");
        manager.session("bob").push_user("bob's question");

        assert_eq!(manager.len(), 2);
        assert_eq!(manager.session("alice").history().len(), 1);
        assert_eq!(
            manager.session("alice").history().messages()[0].text,
            "alice's question"
        );
        assert_eq!(
            manager.session("bob").history().messages()[0].text,
            "bob's question"
        );
    }

    #[test]
    fn test_manager_remove_tears_down_state() {
        let mut manager = SessionManager::new();
        manager.session("alice").push_user("hello");
        assert!(manager.remove("alice"));
        assert!(!manager.remove("alice"));
        assert!(manager.session("alice").history().is_empty());
    }
}

//! Prompt assembly for chat completions.

use std::fmt::Write as FmtWrite;

use crate::models::{ChatHistory, ChatMessage, PromptConfig, Role, ScoredPassage};
use crate::providers::CompletionRequest;

/// Instructions for plain conversation.
const CHAT_INSTRUCTIONS: &str = "You are an assistant that answers users' questions in English.";

/// Instructions when document excerpts are attached.
const DOCUMENT_INSTRUCTIONS: &str = "You are an assistant that answers based on the provided \
document excerpts. If the excerpts do not contain the answer, say so instead of guessing.";

/// Builds the completion request from the question, retrieved context and
/// recent history. Assembly is deterministic; when the result would exceed
/// the character budget, the oldest history messages are dropped first.
/// Context and the question itself are never dropped.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    max_chars: usize,
    history_limit: usize,
    instructions: Option<String>,
}

impl PromptAssembler {
    pub fn new(config: &PromptConfig) -> Self {
        Self {
            max_chars: config.max_chars as usize,
            history_limit: config.history_limit as usize,
            instructions: config.instructions.clone(),
        }
    }

    pub fn assemble(
        &self,
        question: &str,
        context: &[ScoredPassage],
        history: &ChatHistory,
    ) -> CompletionRequest {
        let system = self.instructions.clone().unwrap_or_else(|| {
            if context.is_empty() {
                CHAT_INSTRUCTIONS.to_string()
            } else {
                DOCUMENT_INSTRUCTIONS.to_string()
            }
        });

        let recent = history.recent(self.history_limit);
        let system_chars = system.chars().count();
        let mut keep = recent.len();

        loop {
            let prompt = render(question, context, &recent[recent.len() - keep..]);
            if keep == 0 || system_chars + prompt.chars().count() <= self.max_chars {
                return CompletionRequest {
                    system: Some(system),
                    prompt,
                };
            }
            keep -= 1;
        }
    }
}

fn render(question: &str, context: &[ScoredPassage], history: &[ChatMessage]) -> String {
    let mut out = String::new();

    if !context.is_empty() {
        out.push_str("Context:\n");
        for (i, scored) in context.iter().enumerate() {
            writeln!(out, "[{}] {}", i + 1, scored.passage.text.trim()).unwrap();
        }
        out.push('\n');
    }

    if !history.is_empty() {
        out.push_str("Conversation so far:\n");
        for message in history {
            let label = match message.role {
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            writeln!(out, "{}: {}", label, message.text).unwrap();
        }
        out.push('\n');
    }

    write!(out, "Question: {}", question).unwrap();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, Passage};

    fn scored(text: &str, score: f32) -> ScoredPassage {
        let doc = Document::new("test.txt", text.to_string(), None);
        ScoredPassage {
            passage: Passage::from_document(&doc, text.to_string(), 0, 0, text.len() as u64),
            score,
        }
    }

    fn assembler(max_chars: u32, history_limit: u32) -> PromptAssembler {
        PromptAssembler::new(&PromptConfig {
            max_chars,
            history_limit,
            instructions: None,
        })
    }

    #[test]
    fn test_simple_chat_has_only_history_and_question() {
        let mut history = ChatHistory::new();
        history.push(ChatMessage::user("hi"));
        history.push(ChatMessage::assistant("hello"));

        let request = assembler(10_000, 16).assemble("how are you?", &[], &history);

        assert!(!request.prompt.contains("Context:"));
        assert!(request.prompt.contains("User: hi"));
        assert!(request.prompt.contains("Assistant: hello"));
        assert!(request.prompt.ends_with("Question: how are you?"));
        assert_eq!(request.system.as_deref(), Some(CHAT_INSTRUCTIONS));
    }

    #[test]
    fn test_context_in_retriever_order() {
        let context = vec![scored("second best passage", 0.8), scored("best passage", 0.9)];
        let request = assembler(10_000, 16).assemble("q", &context, &ChatHistory::new());

        let first = request.prompt.find("[1] second best passage").unwrap();
        let second = request.prompt.find("[2] best passage").unwrap();
        assert!(first < second);
        assert_eq!(request.system.as_deref(), Some(DOCUMENT_INSTRUCTIONS));
    }

    #[test]
    fn test_budget_drops_oldest_history_first() {
        let mut history = ChatHistory::new();
        history.push(ChatMessage::user("ancient message that should disappear"));
        history.push(ChatMessage::user("newest message"));

        // Budget too small for both messages, large enough for the newest.
        let request = assembler(160, 16).assemble("the question", &[], &history);

        assert!(!request.prompt.contains("ancient message"));
        assert!(request.prompt.contains("newest message"));
        assert!(request.prompt.ends_with("Question: the question"));
    }

    #[test]
    fn test_question_and_context_survive_tiny_budget() {
        let mut history = ChatHistory::new();
        history.push(ChatMessage::user("some earlier chatter"));
        let context = vec![scored("vital excerpt", 0.9)];

        let request = assembler(10, 16).assemble("q", &context, &history);

        assert!(!request.prompt.contains("earlier chatter"));
        assert!(request.prompt.contains("vital excerpt"));
        assert!(request.prompt.ends_with("Question: q"));
    }

    #[test]
    fn test_history_window_bounded() {
        let mut history = ChatHistory::new();
        for i in 0..50 {
            history.push(ChatMessage::user(format!("message {}", i)));
        }

        let request = assembler(100_000, 4).assemble("q", &[], &history);

        assert!(!request.prompt.contains("message 45"));
        assert!(request.prompt.contains("message 46"));
        assert!(request.prompt.contains("message 49"));
    }

    #[test]
    fn test_instructions_override() {
        let assembler = PromptAssembler::new(&PromptConfig {
            max_chars: 1000,
            history_limit: 4,
            instructions: Some("Reply in French.".to_string()),
        });

        let request = assembler.assemble("q", &[], &ChatHistory::new());
        assert_eq!(request.system.as_deref(), Some("Reply in French."));
    }

    #[test]
    fn test_assembly_is_deterministic() {
        let context = vec![scored("passage", 0.5)];
        let mut history = ChatHistory::new();
        history.push(ChatMessage::user("hello"));

        let a = assembler(10_000, 16).assemble("q", &context, &history);
        let b = assembler(10_000, 16).assemble("q", &context, &history);
        assert_eq!(a.prompt, b.prompt);
        assert_eq!(a.system, b.system);
    }
}

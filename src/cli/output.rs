use std::fmt::Write as FmtWrite;

use crate::models::{AnswerReport, OutputFormat};
use crate::services::IndexReport;
use crate::utils::preview;

pub trait Formatter {
    fn format_answer(&self, report: &AnswerReport) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_index_report(&self, report: &IndexReport) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str, advice: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub chat_provider: String,
    pub chat_model: String,
    pub chat_reachable: bool,
    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_reachable: bool,
    pub config_path: Option<String>,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, report: &AnswerReport) -> String {
        let mut output = String::new();
        writeln!(output, "{}", report.answer).unwrap();

        if !report.context.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "Sources").unwrap();
            writeln!(output, "-------").unwrap();
            for (i, scored) in report.context.iter().enumerate() {
                writeln!(
                    output,
                    "{}. [Score: {:.3}] passage {} ({}..{})",
                    i + 1,
                    scored.score,
                    scored.passage.index,
                    scored.passage.start_offset,
                    scored.passage.end_offset
                )
                .unwrap();
                for line in preview(&scored.passage.text, 200).lines() {
                    writeln!(output, "   {}", line).unwrap();
                }
            }
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let chat_state = if status.chat_reachable {
            "[REACHABLE]"
        } else {
            "[UNREACHABLE]"
        };
        writeln!(output, "Chat:       {} {}", status.chat_provider, chat_state).unwrap();
        writeln!(output, "  Model:    {}", status.chat_model).unwrap();

        let embed_state = if status.embedding_reachable {
            "[REACHABLE]"
        } else {
            "[UNREACHABLE]"
        };
        writeln!(
            output,
            "Embedding:  {} {}",
            status.embedding_provider, embed_state
        )
        .unwrap();
        writeln!(output, "  Model:    {}", status.embedding_model).unwrap();

        match status.config_path {
            Some(ref path) => writeln!(output, "Config:     {}", path).unwrap(),
            None => writeln!(output, "Config:     (defaults)").unwrap(),
        }

        output
    }

    fn format_index_report(&self, report: &IndexReport) -> String {
        if report.reused {
            return format!("Document already indexed: {}\n", report.document.name);
        }

        let mut output = String::new();
        writeln!(output, "Document indexed").unwrap();
        writeln!(output, "----------------").unwrap();
        writeln!(output, "Name:     {}", report.document.name).unwrap();
        writeln!(output, "Passages: {}", report.document.passage_count).unwrap();
        if let Some(pages) = report.document.page_count {
            writeln!(output, "Pages:    {}", pages).unwrap();
        }
        writeln!(output, "Duration: {}ms", report.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_error(&self, error: &str, advice: &str) -> String {
        format!("Error: {}\n  {}", error, advice)
    }
}

pub struct JsonFormatter;

impl Formatter for JsonFormatter {
    fn format_answer(&self, report: &AnswerReport) -> String {
        serde_json::to_string_pretty(report).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let value = serde_json::json!({
            "chat": {
                "provider": status.chat_provider,
                "model": status.chat_model,
                "reachable": status.chat_reachable,
            },
            "embedding": {
                "provider": status.embedding_provider,
                "model": status.embedding_model,
                "reachable": status.embedding_reachable,
            },
            "config_path": status.config_path,
        });
        serde_json::to_string_pretty(&value).unwrap()
    }

    fn format_index_report(&self, report: &IndexReport) -> String {
        let value = serde_json::json!({
            "document": {
                "id": report.document.id,
                "name": report.document.name,
                "passages": report.document.passage_count,
                "pages": report.document.page_count,
            },
            "reused": report.reused,
            "duration_ms": report.duration_ms,
        });
        serde_json::to_string_pretty(&value).unwrap()
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({ "message": message }).to_string()
    }

    fn format_error(&self, error: &str, advice: &str) -> String {
        serde_json::json!({ "error": error, "advice": advice }).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_answer(&self, report: &AnswerReport) -> String {
        let mut output = String::new();
        writeln!(output, "## {}", report.question).unwrap();
        writeln!(output).unwrap();
        writeln!(output, "{}", report.answer).unwrap();

        if !report.context.is_empty() {
            writeln!(output).unwrap();
            writeln!(output, "### Sources").unwrap();
            writeln!(output).unwrap();
            for scored in &report.context {
                writeln!(
                    output,
                    "- **passage {}** (score {:.3}): {}",
                    scored.passage.index,
                    scored.score,
                    preview(&scored.passage.text, 120).replace('\n', " ")
                )
                .unwrap();
            }
        }

        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status").unwrap();
        writeln!(output).unwrap();
        writeln!(
            output,
            "- chat: `{}` / `{}` ({})",
            status.chat_provider,
            status.chat_model,
            if status.chat_reachable {
                "reachable"
            } else {
                "unreachable"
            }
        )
        .unwrap();
        writeln!(
            output,
            "- embedding: `{}` / `{}` ({})",
            status.embedding_provider,
            status.embedding_model,
            if status.embedding_reachable {
                "reachable"
            } else {
                "unreachable"
            }
        )
        .unwrap();
        output
    }

    fn format_index_report(&self, report: &IndexReport) -> String {
        format!(
            "**{}**: {} passages indexed in {}ms\n",
            report.document.name, report.document.passage_count, report.duration_ms
        )
    }

    fn format_message(&self, message: &str) -> String {
        message.to_string()
    }

    fn format_error(&self, error: &str, advice: &str) -> String {
        format!("**Error:** {} ({})", error, advice)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Document, Passage, ScoredPassage};
    use crate::services::DocumentInfo;

    fn sample_report() -> AnswerReport {
        let doc = Document::new("test.txt", "relevant excerpt text".to_string(), None);
        let passage = Passage::from_document(&doc, "relevant excerpt text".to_string(), 0, 0, 21);
        AnswerReport {
            question: "what is relevant?".to_string(),
            answer: "The excerpt.".to_string(),
            context: vec![ScoredPassage {
                passage,
                score: 0.91,
            }],
            model: "test-model".to_string(),
            duration_ms: 42,
        }
    }

    #[test]
    fn test_text_answer_includes_sources() {
        let output = TextFormatter.format_answer(&sample_report());
        assert!(output.contains("The excerpt."));
        assert!(output.contains("Sources"));
        assert!(output.contains("0.910"));
    }

    #[test]
    fn test_json_answer_round_trips() {
        let output = JsonFormatter.format_answer(&sample_report());
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["answer"], "The excerpt.");
        assert_eq!(parsed["context"][0]["score"].as_f64().unwrap(), 0.91f32 as f64);
    }

    #[test]
    fn test_markdown_answer_lists_sources() {
        let output = MarkdownFormatter.format_answer(&sample_report());
        assert!(output.starts_with("## what is relevant?"));
        assert!(output.contains("- **passage 0**"));
    }

    #[test]
    fn test_index_report_reused() {
        let report = IndexReport {
            document: DocumentInfo {
                id: "d".to_string(),
                name: "test.txt".to_string(),
                checksum: "c".to_string(),
                passage_count: 3,
                page_count: Some(2),
            },
            reused: true,
            duration_ms: 1,
        };
        let output = TextFormatter.format_index_report(&report);
        assert!(output.contains("already indexed"));
    }

    #[test]
    fn test_error_carries_advice() {
        let output = TextFormatter.format_error("rate limited", "try again later");
        assert!(output.contains("rate limited"));
        assert!(output.contains("try again later"));

        let json = JsonFormatter.format_error("rate limited", "try again later");
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["advice"], "try again later");
    }
}

//! Plain-text document loader.

use std::path::Path;

use crate::error::DocumentError;
use crate::models::Document;

use super::DocumentLoader;

/// Reads UTF-8 text files as-is. No external tooling required.
#[derive(Debug, Default)]
pub struct TextLoader;

impl TextLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for TextLoader {
    fn name(&self) -> &str {
        "plain text"
    }

    fn supports(&self, extension: &str) -> bool {
        matches!(extension, "txt" | "text" | "md" | "markdown")
    }

    fn check_available(&self) -> Result<bool, DocumentError> {
        Ok(true)
    }

    fn install_instructions(&self) -> &str {
        ""
    }

    fn load(&self, path: &Path) -> Result<Document, DocumentError> {
        let text = std::fs::read_to_string(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        if text.trim().is_empty() {
            return Err(DocumentError::EmptyDocument(name));
        }

        Ok(Document::new(name, text, None))
    }
}

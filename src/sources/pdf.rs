//! PDF document loader via the poppler `pdftotext` CLI.

use std::path::Path;
use std::process::Command;

use crate::error::DocumentError;
use crate::models::Document;

use super::DocumentLoader;

/// Extracts PDF text with `pdftotext -layout <file> -`. The extractor is an
/// external collaborator; this loader never parses PDF structure itself.
#[derive(Debug, Default)]
pub struct PdfLoader;

impl PdfLoader {
    pub fn new() -> Self {
        Self
    }
}

impl DocumentLoader for PdfLoader {
    fn name(&self) -> &str {
        "pdftotext"
    }

    fn supports(&self, extension: &str) -> bool {
        extension == "pdf"
    }

    fn check_available(&self) -> Result<bool, DocumentError> {
        let output = Command::new("which")
            .arg("pdftotext")
            .output()
            .map_err(|e| DocumentError::ExtractionFailed(e.to_string()))?;

        Ok(output.status.success())
    }

    fn install_instructions(&self) -> &str {
        "Install poppler: 'apt install poppler-utils' or 'brew install poppler'"
    }

    fn load(&self, path: &Path) -> Result<Document, DocumentError> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let output = Command::new("pdftotext")
            .arg("-layout")
            .arg(path)
            .arg("-")
            .output()
            .map_err(|e| DocumentError::ExtractionFailed(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocumentError::ExtractionFailed(format!(
                "pdftotext failed for {}: {}",
                name,
                stderr.trim()
            )));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        if text.trim().is_empty() {
            // Scanned or image-only PDFs extract to nothing.
            return Err(DocumentError::EmptyDocument(name));
        }

        let pages = count_pages(&text);
        Ok(Document::new(name, text, Some(pages)))
    }
}

/// pdftotext terminates every page with a form feed.
fn count_pages(text: &str) -> u32 {
    let breaks = text.matches('\u{0c}').count() as u32;
    breaks.max(1)
}

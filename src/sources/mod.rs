//! Document loading.
//!
//! Extraction is delegated to external collaborators: plain text files are
//! read directly, PDFs go through the `pdftotext` CLI. The rest of the crate
//! only ever sees the extracted text.

mod pdf;
mod text;

pub use pdf::PdfLoader;
pub use text::TextLoader;

use std::path::Path;

use crate::error::DocumentError;
use crate::models::Document;

/// A way of turning a file into a [`Document`].
pub trait DocumentLoader {
    /// Human-readable name.
    fn name(&self) -> &str;

    /// Whether this loader handles the given lowercase file extension.
    fn supports(&self, extension: &str) -> bool;

    /// Check if the required external tooling is available.
    fn check_available(&self) -> Result<bool, DocumentError>;

    /// Installation instructions for the required tooling.
    fn install_instructions(&self) -> &str;

    /// Extract the file into a document.
    fn load(&self, path: &Path) -> Result<Document, DocumentError>;
}

/// Pick a loader by file extension.
pub fn loader_for(path: &Path) -> Result<Box<dyn DocumentLoader>, DocumentError> {
    let extension = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    let loaders: Vec<Box<dyn DocumentLoader>> =
        vec![Box::new(PdfLoader::new()), Box::new(TextLoader::new())];

    loaders
        .into_iter()
        .find(|loader| loader.supports(&extension))
        .ok_or_else(|| {
            DocumentError::UnsupportedType(format!(
                "no loader for '.{}' files (supported: pdf, txt, md)",
                extension
            ))
        })
}

/// Load a document from disk, surfacing missing extractors with their
/// installation instructions.
pub fn load_document(path: &Path) -> Result<Document, DocumentError> {
    let loader = loader_for(path)?;

    if !loader.check_available()? {
        return Err(DocumentError::ExtractorNotFound(format!(
            "{} is not available. {}",
            loader.name(),
            loader.install_instructions()
        )));
    }

    loader.load(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_loader_dispatch_by_extension() {
        assert_eq!(loader_for(Path::new("report.pdf")).unwrap().name(), "pdftotext");
        assert_eq!(loader_for(Path::new("notes.txt")).unwrap().name(), "plain text");
        assert_eq!(loader_for(Path::new("README.md")).unwrap().name(), "plain text");
    }

    #[test]
    fn test_unsupported_extension_rejected() {
        let result = loader_for(Path::new("image.png"));
        assert!(matches!(result, Err(DocumentError::UnsupportedType(_))));

        let result = loader_for(Path::new("no_extension"));
        assert!(matches!(result, Err(DocumentError::UnsupportedType(_))));
    }

    #[test]
    fn test_load_text_document_end_to_end() {
        let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        writeln!(file, "a few words of content").unwrap();

        let document = load_document(file.path()).unwrap();
        assert!(document.text.contains("a few words"));
        assert!(!document.id.is_empty());
        assert_eq!(document.page_count, None);
    }
}

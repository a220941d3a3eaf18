use serde::{Deserialize, Serialize};

/// A loaded document with its extracted text. Lives only as long as the
/// session that loaded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    pub text: String,
    pub page_count: Option<u32>,
    pub checksum: String,
    pub created_at: String,
}

/// An immutable slice of a document's text, addressed by character offsets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passage {
    pub id: String,
    pub document_id: String,
    pub index: u32,
    pub text: String,
    pub start_offset: u64,
    pub end_offset: u64,
}

impl Document {
    pub fn generate_id(name: &str, checksum: &str) -> String {
        use sha2::{Digest, Sha256};
        let input = format!("{}:{}", name, checksum);
        let hash = Sha256::digest(input.as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn new(name: impl Into<String>, text: String, page_count: Option<u32>) -> Self {
        let name = name.into();
        let checksum = crate::utils::calculate_checksum(&text);
        let id = Self::generate_id(&name, &checksum);
        Self {
            id,
            name,
            text,
            page_count,
            checksum,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl Passage {
    pub fn generate_id(document_id: &str, index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_id, index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn from_document(
        document: &Document,
        text: String,
        index: u32,
        start_offset: u64,
        end_offset: u64,
    ) -> Self {
        let id = Self::generate_id(&document.id, index);
        Self {
            id,
            document_id: document.id.clone(),
            index,
            text,
            start_offset,
            end_offset,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_generate_id() {
        let id = Document::generate_id("report.pdf", "abc");
        assert_eq!(id.len(), 32);
        assert_eq!(id, Document::generate_id("report.pdf", "abc"));
        assert_ne!(id, Document::generate_id("report.pdf", "def"));
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new("notes.txt", "some text".to_string(), None);
        assert!(!doc.id.is_empty());
        assert!(!doc.checksum.is_empty());
        assert!(!doc.created_at.is_empty());
        assert_eq!(doc.name, "notes.txt");
    }

    #[test]
    fn test_same_content_same_id() {
        let a = Document::new("notes.txt", "some text".to_string(), None);
        let b = Document::new("notes.txt", "some text".to_string(), None);
        assert_eq!(a.id, b.id);
    }

    #[test]
    fn test_passage_generate_id() {
        let id = Passage::generate_id("abc123", 5);
        assert_eq!(id.len(), 36);
        assert_eq!(id.chars().filter(|c| *c == '-').count(), 4);
        let id2 = Passage::generate_id("abc123", 5);
        assert_eq!(id, id2);
        let id3 = Passage::generate_id("abc123", 6);
        assert_ne!(id, id3);
    }
}

//! Text chunking with overlap for embedding and retrieval.

use crate::error::ConfigError;
use crate::models::{ChunkingConfig, Document, Passage};

/// Splits a document's text into overlapping fixed-size passages.
///
/// Windows are exact: consecutive passages share exactly `overlap`
/// characters, so the passage sequence tiles the full text.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Passage size in characters
    chunk_size: usize,
    /// Characters shared between consecutive passages
    overlap: usize,
}

impl TextChunker {
    pub fn new(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size as usize,
            overlap: config.overlap as usize,
        })
    }

    /// Split a document into ordered passages covering its whole text.
    pub fn chunk(&self, document: &Document) -> Vec<Passage> {
        let text = &document.text;

        if text.is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();

        if total <= self.chunk_size {
            return vec![Passage::from_document(
                document,
                text.clone(),
                0,
                0,
                total as u64,
            )];
        }

        let step = self.chunk_size - self.overlap;
        let mut passages = Vec::new();
        let mut start = 0;
        let mut index = 0u32;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let content: String = chars[start..end].iter().collect();
            passages.push(Passage::from_document(
                document,
                content,
                index,
                start as u64,
                end as u64,
            ));

            if end >= total {
                break;
            }

            start += step;
            index += 1;
        }

        passages
    }
}

/// Estimate the number of tokens in a text.
/// Uses a simple heuristic: ~4 characters per token on average.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: u32, overlap: u32) -> TextChunker {
        TextChunker::new(&ChunkingConfig {
            chunk_size,
            overlap,
        })
        .unwrap()
    }

    fn test_document(text: &str) -> Document {
        Document::new("test.txt", text.to_string(), None)
    }

    #[test]
    fn test_invalid_config_rejected() {
        assert!(matches!(
            TextChunker::new(&ChunkingConfig {
                chunk_size: 0,
                overlap: 0
            }),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(matches!(
            TextChunker::new(&ChunkingConfig {
                chunk_size: 10,
                overlap: 10
            }),
            Err(ConfigError::InvalidConfig(_))
        ));
        assert!(matches!(
            TextChunker::new(&ChunkingConfig {
                chunk_size: 10,
                overlap: 20
            }),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_small_document_single_passage() {
        let doc = test_document("Hello, world!");
        let passages = chunker(100, 10).chunk(&doc);

        assert_eq!(passages.len(), 1);
        assert_eq!(passages[0].text, "Hello, world!");
        assert_eq!(passages[0].index, 0);
        assert_eq!(passages[0].start_offset, 0);
        assert_eq!(passages[0].end_offset, 13);
    }

    #[test]
    fn test_empty_document() {
        let doc = test_document("");
        assert!(chunker(100, 10).chunk(&doc).is_empty());
    }

    #[test]
    fn test_passage_length_bound() {
        let doc = test_document(&"x".repeat(1234));
        for passage in chunker(100, 25).chunk(&doc) {
            assert!(passage.text.chars().count() <= 100);
        }
    }

    #[test]
    fn test_consecutive_passages_share_overlap() {
        let text: String = (0..400).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let doc = test_document(&text);
        let passages = chunker(100, 20).chunk(&doc);

        assert!(passages.len() > 1);
        for pair in passages.windows(2) {
            let prev_tail: String = pair[0].text.chars().skip(pair[0].text.chars().count() - 20).collect();
            let next_head: String = pair[1].text.chars().take(20).collect();
            assert_eq!(prev_tail, next_head);
        }
    }

    #[test]
    fn test_reconstruction_from_passages() {
        let text: String = "The quick brown fox jumps over the lazy dog. ".repeat(20);
        let doc = test_document(&text);
        let overlap = 15usize;
        let passages = chunker(80, overlap as u32).chunk(&doc);

        let mut rebuilt = String::new();
        for (i, passage) in passages.iter().enumerate() {
            if i == 0 {
                rebuilt.push_str(&passage.text);
            } else {
                rebuilt.extend(passage.text.chars().skip(overlap));
            }
        }
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn test_offsets_match_text() {
        let text: String = (0..300).map(|i| char::from(b'0' + (i % 10) as u8)).collect();
        let doc = test_document(&text);
        let chars: Vec<char> = text.chars().collect();

        for passage in chunker(64, 16).chunk(&doc) {
            let span: String = chars[passage.start_offset as usize..passage.end_offset as usize]
                .iter()
                .collect();
            assert_eq!(span, passage.text);
        }
    }

    #[test]
    fn test_zero_overlap_tiles_exactly() {
        let doc = test_document(&"ab".repeat(150));
        let passages = chunker(100, 0).chunk(&doc);

        assert_eq!(passages.len(), 3);
        assert_eq!(passages[0].start_offset, 0);
        assert_eq!(passages[1].start_offset, 100);
        assert_eq!(passages[2].start_offset, 200);
    }

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens("1234"), 1);
        assert_eq!(estimate_tokens("12345678"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }
}

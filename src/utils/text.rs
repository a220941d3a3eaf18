//! Text processing utilities.

/// Truncate a string to at most `max_chars` characters, appending an
/// ellipsis when anything was cut. Character-based, so multi-byte
/// content is never split mid-codepoint.
pub fn preview(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_untouched() {
        assert_eq!(preview("hello", 10), "hello");
        assert_eq!(preview("", 10), "");
    }

    #[test]
    fn test_preview_truncates() {
        assert_eq!(preview("hello world", 5), "hello...");
    }

    #[test]
    fn test_preview_multibyte() {
        let text = "héllo wörld";
        let cut = preview(text, 4);
        assert!(cut.starts_with("héll"));
    }
}

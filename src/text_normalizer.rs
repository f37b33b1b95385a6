//! # Text Normalization Module
//!
//! Normalizes raw OCR output before any comparison takes place. Every
//! comparison in the matching core runs on uppercase, trimmed text, so this
//! module is the single place where casing and outer whitespace are handled.

use std::collections::HashSet;

/// OCR text after normalization, with its word tokens precomputed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    /// Trimmed, uppercased text (embedded newlines are preserved)
    pub text: String,
    /// Whitespace-separated tokens in order of appearance
    pub words: Vec<String>,
    /// Deduplicated tokens
    pub word_set: HashSet<String>,
}

impl NormalizedText {
    /// Normalize raw OCR text and tokenize it
    pub fn new(raw: &str) -> Self {
        let text = normalize(raw);
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();
        let word_set = words.iter().cloned().collect();

        Self {
            text,
            words,
            word_set,
        }
    }

    /// True when the OCR text contained nothing but whitespace
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Trim outer whitespace and uppercase
pub fn normalize(raw: &str) -> String {
    raw.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_trims_and_uppercases() {
        assert_eq!(normalize("  lot ab1234\n"), "LOT AB1234");
    }

    #[test]
    fn test_tokenizes_multiline_text() {
        let normalized = NormalizedText::new("Lot AB1234\n\nexp   03/31/2026\tREF 77");

        assert_eq!(
            normalized.words,
            vec!["LOT", "AB1234", "EXP", "03/31/2026", "REF", "77"]
        );
        assert!(normalized.text.contains('\n'));
        assert!(normalized.word_set.contains("AB1234"));
    }

    #[test]
    fn test_word_set_deduplicates() {
        let normalized = NormalizedText::new("lot LOT Lot 42");
        assert_eq!(normalized.words.len(), 4);
        assert_eq!(normalized.word_set.len(), 2);
    }

    #[test]
    fn test_empty_input() {
        let normalized = NormalizedText::new("   \n ");
        assert!(normalized.is_empty());
        assert!(normalized.words.is_empty());
        assert!(normalized.word_set.is_empty());
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let once = NormalizedText::new("  Use by 2026-03-31 \n batch x9 ");
        let twice = NormalizedText::new(&once.text);
        assert_eq!(once, twice);
    }
}

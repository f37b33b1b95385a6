//! # Expiry Verification
//!
//! Checks generated expiry representations against normalized OCR text, either
//! as a yes/no verification or as a graded score for composite ranking.

use crate::similarity::similarity;
use crate::text_normalizer::NormalizedText;
use tracing::trace;

/// Matches generated expiry formats against OCR text
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpiryMatcher;

impl ExpiryMatcher {
    pub fn new() -> Self {
        Self
    }

    /// True when any format occurs in the OCR text as its own date
    ///
    /// Formats are uppercased before comparison, so month names rendered as
    /// `Mar` still match `MAR` on the label. Compact all-digit forms (`2603`,
    /// `20260331`) must be a whole OCR word; other forms must not run into
    /// neighbouring digits, so `03/2026` inside `01/03/2026` does not count.
    pub fn matches(&self, formats: &[String], text: &NormalizedText) -> bool {
        let found = formats.iter().find(|format| {
            let format = format.to_uppercase();
            if is_compact_numeric(&format) {
                text.word_set.contains(&format)
            } else {
                occurs_delimited(&text.text, &format)
            }
        });

        if let Some(format) = found {
            trace!(format = %format, "Expiry format found in OCR text");
        }
        found.is_some()
    }

    /// Graded expiry similarity in `[0, 1]`
    ///
    /// `1.0` when any format occurs verbatim; otherwise the best similarity
    /// between any format and any single OCR word.
    pub fn score(&self, formats: &[String], text: &NormalizedText) -> f64 {
        if self.matches(formats, text) {
            return 1.0;
        }

        let mut best = 0.0_f64;
        for format in formats {
            let format = format.to_uppercase();
            for word in &text.words {
                best = best.max(similarity(&format, word));
            }
        }
        best
    }
}

/// All-digit renderings such as `2603` or `260331`
fn is_compact_numeric(format: &str) -> bool {
    !format.is_empty() && format.bytes().all(|b| b.is_ascii_digit())
}

/// True when `format` occurs in `text` without continuing a longer number
fn occurs_delimited(text: &str, format: &str) -> bool {
    if format.is_empty() {
        return false;
    }
    let digit_start = format.starts_with(|c: char| c.is_ascii_digit());
    let digit_end = format.ends_with(|c: char| c.is_ascii_digit());

    text.match_indices(format).any(|(start, _)| {
        let mut before = text[..start].chars().rev();
        let mut after = text[start + format.len()..].chars();
        (!digit_start || is_date_boundary(before.next(), before.next()))
            && (!digit_end || is_date_boundary(after.next(), after.next()))
    })
}

/// A digit, or a date separator followed by a digit, extends the date
fn is_date_boundary(neighbour: Option<char>, beyond: Option<char>) -> bool {
    match neighbour {
        Some(c) if c.is_ascii_digit() => false,
        Some('/' | '-' | '.') => !beyond.is_some_and(|c| c.is_ascii_digit()),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date_formats::generate_formats;

    #[test]
    fn test_matches_us_label() {
        let formats = generate_formats("2026-03-31");
        let text = NormalizedText::new("LOT AB1234 EXP 03/31/2026");
        assert!(ExpiryMatcher::new().matches(&formats, &text));
    }

    #[test]
    fn test_matches_month_name_case_insensitively() {
        let formats = generate_formats("2026-03-31");
        let text = NormalizedText::new("lot ab1234 exp mar 2026");
        assert!(ExpiryMatcher::new().matches(&formats, &text));
    }

    #[test]
    fn test_no_match_for_other_date() {
        let formats = generate_formats("2026-03-31");
        let text = NormalizedText::new("LOT AB1234 EXP 04/30/2027");
        assert!(!ExpiryMatcher::new().matches(&formats, &text));
    }

    #[test]
    fn test_unparsed_date_matches_verbatim() {
        let formats = generate_formats("Q3-2026");
        let text = NormalizedText::new("batch 7 q3-2026");
        assert!(ExpiryMatcher::new().matches(&formats, &text));
    }

    #[test]
    fn test_compact_form_must_be_whole_word() {
        let matcher = ExpiryMatcher::new();
        let formats = generate_formats("2026-03-31");

        // `2603` is a rendering of the expiry, but here it is part of the lot code
        let embedded = NormalizedText::new("LOT QX2603 EXP 11/30/2029");
        assert!(!matcher.matches(&formats, &embedded));

        let standalone = NormalizedText::new("LOT QX2603 EXP 2603");
        assert!(matcher.matches(&formats, &standalone));
    }

    #[test]
    fn test_format_inside_longer_date_is_ignored() {
        let matcher = ExpiryMatcher::new();
        let formats = generate_formats("03/2026");

        let longer = NormalizedText::new("LOT AB1234 EXP 01/03/2026");
        assert!(!matcher.matches(&formats, &longer));

        let own = NormalizedText::new("LOT AB1234 EXP 03/2026.");
        assert!(matcher.matches(&formats, &own));
    }

    #[test]
    fn test_date_boundary_rules() {
        assert!(occurs_delimited("EXP 03/31/2026", "03/31/2026"));
        assert!(occurs_delimited("EXP:03/31/2026-LOT", "03/31/2026"));
        assert!(!occurs_delimited("EXP 03/31/2026", "03/31/20"));
        assert!(!occurs_delimited("EXP 01/03/2026", "3/2026"));
        assert!(occurs_delimited("LOT 7 MAR 2026", "MAR 2026"));
        assert!(!occurs_delimited("EXP 2026", ""));
    }

    #[test]
    fn test_score_exact_and_partial() {
        let matcher = ExpiryMatcher::new();
        let formats = generate_formats("2026-03-31");

        let exact = NormalizedText::new("EXP 2026-03-31");
        assert_eq!(matcher.score(&formats, &exact), 1.0);

        // Letter O misread for a zero, so no format occurs verbatim
        let partial = NormalizedText::new("EXP 2026-O3-31");
        let score = matcher.score(&formats, &partial);
        assert!(score > 0.85 && score < 1.0, "score was {}", score);

        let nothing = NormalizedText::new("");
        assert_eq!(matcher.score(&formats, &nothing), 0.0);
    }
}

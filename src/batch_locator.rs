//! # Batch Number Locator
//!
//! Finds how well a candidate batch code appears in normalized OCR text using
//! three tiers, cheapest first:
//!
//! 1. Exact substring: the code appears verbatim.
//! 2. Word scan: fuzzy comparison against OCR words of similar length, stopping
//!    early once a score is good enough.
//! 3. Sliding window: for short codes only, when the word scan found nothing
//!    convincing, compare against fixed-width windows of the raw text (OCR often
//!    glues short codes to neighbouring characters).
//!
//! Results are memoized per `(code, normalized text)`.

use crate::cache::{Cache, CacheStats, SimilarityCache};
use crate::config::{meets_threshold, MatchingConfig};
use crate::similarity::similarity;
use crate::text_normalizer::NormalizedText;
use tracing::trace;

/// Tiered batch code search with a similarity cache
pub struct BatchNumberLocator {
    config: MatchingConfig,
    cache: SimilarityCache,
}

impl BatchNumberLocator {
    pub fn new(config: MatchingConfig) -> Self {
        Self {
            config,
            cache: SimilarityCache::new(),
        }
    }

    /// Best similarity of `code` within the OCR text, in `[0, 1]`
    ///
    /// `code` is normalized (trimmed, uppercased) before searching.
    pub fn locate(&self, code: &str, text: &NormalizedText) -> f64 {
        let code = crate::text_normalizer::normalize(code);
        if code.is_empty() {
            return 0.0;
        }

        let key = (code, text.text.clone());
        if let Some(score) = self.cache.get(&key) {
            return score;
        }

        let score = self.search(&key.0, text);
        self.cache.insert(key, score);
        score
    }

    fn search(&self, code: &str, text: &NormalizedText) -> f64 {
        if text.text.contains(code) {
            trace!(code, "Batch code found verbatim");
            return 1.0;
        }

        let mut best = self.scan_words(code, text);

        let code_len = code.chars().count();
        if code_len <= self.config.sliding_window_max_code_len
            && !meets_threshold(best, self.config.sliding_window_trigger)
        {
            best = best.max(self.scan_windows(code, code_len, &text.text));
        }

        trace!(code, best, "Batch code search finished");
        best
    }

    fn scan_words(&self, code: &str, text: &NormalizedText) -> f64 {
        let code_len = code.chars().count();
        let mut best = 0.0_f64;

        for word in &text.words {
            let word_len = word.chars().count();
            if word_len.abs_diff(code_len) > self.config.fuzzy_length_tolerance {
                continue;
            }

            let score = similarity(code, word);
            if score > best {
                best = score;
                if meets_threshold(best, self.config.early_exit_similarity) {
                    trace!(code, word = %word, best, "Word scan early exit");
                    break;
                }
            }
        }

        best
    }

    fn scan_windows(&self, code: &str, code_len: usize, text: &str) -> f64 {
        let chars: Vec<char> = text.chars().collect();
        if chars.len() < code_len {
            return 0.0;
        }

        let mut best = 0.0_f64;
        let mut window = String::with_capacity(code.len());

        for start in (0..=chars.len() - code_len).step_by(self.config.sliding_window_step) {
            window.clear();
            window.extend(&chars[start..start + code_len]);

            let score = similarity(code, &window);
            if score > best {
                best = score;
                if meets_threshold(best, self.config.early_exit_similarity) {
                    trace!(code, window = %window, best, "Window scan early exit");
                    break;
                }
            }
        }

        best
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for BatchNumberLocator {
    fn default() -> Self {
        Self::new(MatchingConfig::default())
    }
}

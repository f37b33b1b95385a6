//! # Similarity Engine
//!
//! Levenshtein edit distance and the normalized similarity score every
//! matching threshold in this crate is calibrated against. The numeric output
//! of [`similarity`] (including its length quick-reject) is load-bearing:
//! changing it shifts which batches are accepted.

/// Maximum relative length difference before two strings are rejected outright
pub const QUICK_REJECT_RATIO: f64 = 0.5;

/// Calculate the Levenshtein distance between two strings
///
/// Insertions, deletions and substitutions each cost 1. Uses two rolling rows
/// sized to the shorter input, so auxiliary space is O(min(|a|, |b|)).
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    // The inner loop runs over the shorter string
    let (long, short) = if a_chars.len() >= b_chars.len() {
        (&a_chars, &b_chars)
    } else {
        (&b_chars, &a_chars)
    };

    if short.is_empty() {
        return long.len();
    }

    let mut prev: Vec<usize> = (0..=short.len()).collect();
    let mut curr = vec![0; short.len() + 1];

    for (i, lc) in long.iter().enumerate() {
        curr[0] = i + 1;
        for (j, sc) in short.iter().enumerate() {
            let cost = if lc == sc { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[short.len()]
}

/// Normalized similarity score in `[0, 1]`
///
/// - `1.0` when the strings are equal
/// - `0.0` when either string is empty
/// - `0.0` when the relative length difference exceeds [`QUICK_REJECT_RATIO`]
/// - otherwise `1 - distance / max_len`
pub fn similarity(a: &str, b: &str) -> f64 {
    if a == b {
        return 1.0;
    }

    let len_a = a.chars().count();
    let len_b = b.chars().count();
    if len_a == 0 || len_b == 0 {
        return 0.0;
    }

    let max_len = len_a.max(len_b);
    let min_len = len_a.min(len_b);
    if (max_len - min_len) as f64 / max_len as f64 > QUICK_REJECT_RATIO {
        return 0.0;
    }

    1.0 - levenshtein(a, b) as f64 / max_len as f64
}

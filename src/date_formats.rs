//! # Expiry Date Format Expansion
//!
//! Catalog expiry dates arrive in many source formats, and labels print them in
//! many more. This module parses a catalog date once, renders it under every
//! convention commonly printed on pharmaceutical and medical-device labels, and
//! adds keyword-prefixed variants (`EXP 03/31/2026`, `USE BY 2026-03-31`, ...).
//!
//! ## Output catalog
//!
//! - FDA / ISO 8601 forms (`2026-03-31`)
//! - US and EU hospital conventions, padded and unpadded
//! - NDC / GS1 barcode-compact forms (`260331`, `20260331`)
//! - Month-name forms (`31 Mar 2026`, `MAR 2026`)
//! - Short two-digit-year forms (`03/26`)
//!
//! Expansion never fails: unparsable input yields the input itself as the only
//! representation.

use crate::cache::{Cache, CacheStats, DateFormatCache};
use chrono::{Datelike, NaiveDate};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;
use std::fmt::Write;
use tracing::{debug, trace};

/// Input patterns tried in order; the flag marks patterns carrying a day field
const INPUT_PATTERNS: [(&str, bool); 24] = [
    // ISO / FDA
    ("%Y-%m-%d", true),
    ("%Y/%m/%d", true),
    ("%Y.%m.%d", true),
    ("%Y%m%d", true),
    // US before EU when ambiguous
    ("%m/%d/%Y", true),
    ("%d/%m/%Y", true),
    ("%m-%d-%Y", true),
    ("%d-%m-%Y", true),
    ("%d.%m.%Y", true),
    ("%m/%d/%y", true),
    ("%d/%m/%y", true),
    ("%y%m%d", true),
    // Month names
    ("%d %b %Y", true),
    ("%d-%b-%Y", true),
    ("%b %d, %Y", true),
    ("%b %d %Y", true),
    ("%d %B %Y", true),
    ("%d-%b-%y", true),
    // Month precision
    ("%Y-%m", false),
    ("%m/%Y", false),
    ("%m-%Y", false),
    ("%b %Y", false),
    ("%b-%Y", false),
    ("%m/%y", false),
];

/// Output patterns rendered for a parsed date; those carrying a day field are
/// skipped for month-precision dates
const OUTPUT_PATTERNS: [&str; 66] = [
    // FDA / ISO 8601
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%Y %m %d",
    "%Y-%-m-%-d",
    // US hospital
    "%m/%d/%Y",
    "%m-%d-%Y",
    "%m.%d.%Y",
    "%m %d %Y",
    "%-m/%-d/%Y",
    "%m/%d/%y",
    "%m-%d-%y",
    "%m.%d.%y",
    "%-m/%-d/%y",
    // EU hospital
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d %m %Y",
    "%-d/%-m/%Y",
    "%-d.%-m.%Y",
    "%d/%m/%y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%-d/%-m/%y",
    // NDC / GS1 barcode compact
    "%Y%m%d",
    "%y%m%d",
    "%m%d%Y",
    "%m%d%y",
    "%d%m%Y",
    "%d%m%y",
    "%Y%m",
    "%y%m",
    // Month precision, numeric
    "%m/%Y",
    "%m-%Y",
    "%m.%Y",
    "%m %Y",
    "%-m/%Y",
    "%Y-%m",
    "%Y/%m",
    "%Y.%m",
    "%m/%y",
    "%m-%y",
    "%m.%y",
    "%y-%m",
    // Month names
    "%b %Y",
    "%b-%Y",
    "%b.%Y",
    "%b%Y",
    "%b %y",
    "%b-%y",
    "%b%y",
    "%B %Y",
    "%Y %b",
    "%Y-%b",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d%b%Y",
    "%d %b %y",
    "%d-%b-%y",
    "%d%b%y",
    "%b %d %Y",
    "%b %d, %Y",
    "%Y-%b-%d",
    "%d %B %Y",
    "%B %d, %Y",
    "%B %d %Y",
];

/// Label keywords prefixed to the contextual variants
pub const CONTEXT_KEYWORDS: [&str; 13] = [
    "EXP",
    "EXPIRY",
    "EXPIRES",
    "USE BY",
    "BEST BY",
    "DISCARD AFTER",
    "VALID UNTIL",
    "GOOD UNTIL",
    "LOT",
    "BATCH",
    "MFG",
    "STERILE UNTIL",
    "DO NOT USE AFTER",
];

/// Forms used for contextual variants; only `%m/%Y` survives month precision
const CONTEXT_PATTERNS: [&str; 4] = ["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d", "%m/%Y"];

/// Plausible expiry years; rejects `%Y` reading a two-digit year literally
const MIN_YEAR: i32 = 1900;
const MAX_YEAR: i32 = 2199;

lazy_static! {
    /// ISO timestamps as exported by some catalogs (`2026-03-31T00:00:00Z`)
    static ref TIMESTAMP_SUFFIX: Regex =
        Regex::new(r"^(\d{4}-\d{1,2}-\d{1,2})[T ]\d{1,2}:\d{2}").unwrap();
}

/// A parsed catalog expiry date
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedExpiry {
    pub date: NaiveDate,
    /// False for month-precision inputs (`03/2026`), whose day is a placeholder
    pub has_day: bool,
}

/// Parse a catalog expiry date under the recognized input patterns
///
/// First successful pattern wins. Month-precision inputs resolve to the first
/// day of the month with `has_day` unset.
pub fn parse_expiry_date(raw: &str) -> Option<ParsedExpiry> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let candidate = TIMESTAMP_SUFFIX
        .captures(trimmed)
        .and_then(|caps| caps.get(1))
        .map_or(trimmed, |m| m.as_str());

    INPUT_PATTERNS.iter().find_map(|&(pattern, has_day)| {
        let parsed = if has_day {
            NaiveDate::parse_from_str(candidate, pattern)
        } else {
            NaiveDate::parse_from_str(&format!("{}|01", candidate), &format!("{}|%d", pattern))
        };

        match parsed {
            Ok(date) if (MIN_YEAR..=MAX_YEAR).contains(&date.year()) => {
                trace!(raw, pattern, %date, has_day, "Expiry date parsed");
                Some(ParsedExpiry { date, has_day })
            }
            _ => None,
        }
    })
}

/// Whether `pattern` renders a day of month
fn carries_day(pattern: &str) -> bool {
    pattern.contains("%d") || pattern.contains("%-d")
}

/// Render `date` with `pattern`, or `None` if the pattern cannot be rendered
fn render(date: &NaiveDate, pattern: &str) -> Option<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern)).ok()?;
    Some(out)
}

/// Generate every representation of `raw` without caching
///
/// Output is deduplicated and ordered by ascending length, so short exact
/// tokens are tried before long strings during substring search.
pub fn generate_formats(raw: &str) -> Vec<String> {
    let Some(ParsedExpiry { date, has_day }) = parse_expiry_date(raw) else {
        debug!(raw, "Unrecognized expiry date format, matching it verbatim");
        return vec![raw.to_string()];
    };

    // A placeholder day must never be rendered: `01/03/2026` reads as January
    let mut formats: Vec<String> = OUTPUT_PATTERNS
        .iter()
        .filter(|pattern| has_day || !carries_day(pattern))
        .filter_map(|pattern| render(&date, pattern))
        .collect();

    for pattern in CONTEXT_PATTERNS {
        if !has_day && carries_day(pattern) {
            continue;
        }
        if let Some(value) = render(&date, pattern) {
            formats.extend(
                CONTEXT_KEYWORDS
                    .iter()
                    .map(|keyword| format!("{} {}", keyword, value)),
            );
        }
    }

    let mut seen = HashSet::with_capacity(formats.len());
    formats.retain(|f| seen.insert(f.clone()));
    formats.sort_by_key(|f| f.len());

    debug!(raw, %date, has_day, formats = formats.len(), "Expiry date formats generated");
    formats
}

/// Memoizing expiry date expander
#[derive(Default)]
pub struct DateFormatExpander {
    cache: DateFormatCache,
}

impl DateFormatExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Representations of `raw`, memoized by the exact input string
    pub fn expand(&self, raw: &str) -> Vec<String> {
        self.cache.get_or_insert_with(raw, || generate_formats(raw))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(raw: &str) -> Option<NaiveDate> {
        parse_expiry_date(raw).map(|p| p.date)
    }

    #[test]
    fn test_parse_iso_and_regional_inputs() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 31).unwrap();

        assert_eq!(parsed("2026-03-31"), Some(expected));
        assert_eq!(parsed("03/31/2026"), Some(expected));
        assert_eq!(parsed("31/03/2026"), Some(expected));
        assert_eq!(parsed("31.03.2026"), Some(expected));
        assert_eq!(parsed("20260331"), Some(expected));
        assert_eq!(parsed("31 Mar 2026"), Some(expected));
        assert_eq!(parsed("31-MAR-2026"), Some(expected));
        assert_eq!(parsed("  2026-03-31T00:00:00Z "), Some(expected));
    }

    #[test]
    fn test_two_digit_year_is_not_read_literally() {
        let date = parsed("03/31/26").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 3, 31).unwrap());
    }

    #[test]
    fn test_ambiguous_input_prefers_us_order() {
        let date = parsed("04/05/2026").unwrap();
        assert_eq!(date.month(), 4);
        assert_eq!(date.day(), 5);
    }

    #[test]
    fn test_month_precision_inputs() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert_eq!(parsed("2026-03"), Some(expected));
        assert_eq!(parsed("03/2026"), Some(expected));
        assert_eq!(parsed("Mar 2026"), Some(expected));

        assert!(!parse_expiry_date("03/2026").unwrap().has_day);
        assert!(parse_expiry_date("2026-03-01").unwrap().has_day);
    }

    #[test]
    fn test_unparsable_input() {
        assert_eq!(parsed("not-a-date"), None);
        assert_eq!(parsed(""), None);
        assert_eq!(parsed("2026-13-45"), None);
    }

    #[test]
    fn test_generated_formats_are_deduplicated_and_sorted() {
        let formats = generate_formats("2026-03-31");

        let unique: HashSet<&String> = formats.iter().collect();
        assert_eq!(unique.len(), formats.len());
        assert!(formats.windows(2).all(|w| w[0].len() <= w[1].len()));
    }

    #[test]
    fn test_month_precision_renders_no_day() {
        let formats = generate_formats("03/2026");

        assert!(formats.iter().any(|f| f == "03/2026"));
        assert!(formats.iter().any(|f| f == "EXP 03/2026"));
        assert!(formats.iter().any(|f| f == "Mar 2026"));
        for day_form in ["01/03/2026", "03/01/2026", "2026-03-01", "EXP 03/01/2026", "01 Mar 2026"] {
            assert!(!formats.iter().any(|f| f == day_form), "rendered {}", day_form);
        }
    }

    #[test]
    fn test_expander_memoizes() {
        let expander = DateFormatExpander::new();

        let first = expander.expand("2026-03-31");
        let second = expander.expand("2026-03-31");
        assert_eq!(first, second);

        let stats = expander.cache_stats();
        assert_eq!(stats.entries, 1);
        assert_eq!(stats.hits, 1);

        expander.clear_cache();
        assert_eq!(expander.cache_stats().entries, 0);
    }
}

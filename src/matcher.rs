//! # Match Orchestration
//!
//! Turns per-candidate batch and expiry scores into the ranked lists the
//! presentation layer consumes. Two policies are provided:
//!
//! - **Exact / nearest** ([`MatchSession::find_matches`]): candidates whose batch
//!   number meets the hospital-safety threshold *and* whose expiry date is found
//!   in the text are exact matches. When there are none, at most
//!   `nearest_fallback_limit` weaker candidates are surfaced for manual review
//!   instead; the session never auto-picks among ambiguous weak matches.
//! - **Weighted top-N** ([`MatchSession::find_top_ranked`]): a composite of
//!   batch and expiry similarity for the card-based presentation.
//!
//! A session owns both memoization caches. Call [`MatchSession::clear_caches`]
//! when the capture session is reset.

use crate::batch_locator::BatchNumberLocator;
use crate::cache::CacheStats;
use crate::catalog::{BatchRecord, QuantityHints};
use crate::config::{exceeds_threshold, meets_threshold, MatchingConfig};
use crate::date_formats::DateFormatExpander;
use crate::errors::{error_logging, AppError, AppResult};
use crate::expiry::ExpiryMatcher;
use crate::observability::{record_candidate_outcome, record_session_duration};
use crate::text_normalizer::NormalizedText;
use serde::Serialize;
use std::cmp::Ordering;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One scored candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult<'a> {
    pub batch: &'a BatchRecord,
    /// Batch number similarity in `[0, 1]`
    pub similarity: f64,
    /// Whether the expiry date was verified (or absent from the record)
    pub expiry_valid: bool,
}

/// Outcome of the exact / nearest policy
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcome<'a> {
    /// Verified matches, best first
    pub exact_matches: Vec<MatchResult<'a>>,
    /// Review candidates, best first; empty whenever `exact_matches` is not
    pub nearest_matches: Vec<MatchResult<'a>>,
}

impl<'a> MatchOutcome<'a> {
    /// True when at least one batch was verified
    pub fn has_exact_match(&self) -> bool {
        !self.exact_matches.is_empty()
    }

    /// The list to present: exact matches if any, otherwise the fallback
    pub fn primary(&self) -> &[MatchResult<'a>] {
        if self.has_exact_match() {
            &self.exact_matches
        } else {
            &self.nearest_matches
        }
    }
}

/// Where a ranked match's requested quantity came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantitySource {
    /// The record's item code was found in the quantity hints
    Linked,
    /// No link: assigned round-robin across the hints. Heuristic only.
    RoundRobin,
    /// No hints supplied: the record's own quantity
    Catalog,
    /// Nothing known; quantity is zero
    Unknown,
}

/// One entry of the weighted ranking
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedMatch<'a> {
    pub batch: &'a BatchRecord,
    /// Weighted composite in `[0, 100]`
    pub composite_score: f64,
    pub requested_quantity: i64,
    pub item_code: Option<String>,
    pub quantity_source: QuantitySource,
    /// 1-based position
    pub rank: usize,
}

impl RankedMatch<'_> {
    /// True when the quantity was guessed rather than linked to this batch
    pub fn is_quantity_inferred(&self) -> bool {
        self.quantity_source == QuantitySource::RoundRobin
    }
}

/// Matching session owning the similarity and date format caches
pub struct MatchSession {
    config: MatchingConfig,
    locator: BatchNumberLocator,
    expander: DateFormatExpander,
    expiry: ExpiryMatcher,
}

impl MatchSession {
    /// Create a session with validated configuration
    pub fn new(config: MatchingConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self {
            locator: BatchNumberLocator::new(config.clone()),
            expander: DateFormatExpander::new(),
            expiry: ExpiryMatcher::new(),
            config,
        })
    }

    pub fn config(&self) -> &MatchingConfig {
        &self.config
    }

    /// Exact / nearest matching at the configured similarity threshold
    pub fn find_matches<'a>(
        &self,
        extracted_text: &str,
        candidates: &'a [BatchRecord],
    ) -> AppResult<MatchOutcome<'a>> {
        self.find_matches_with_threshold(
            extracted_text,
            candidates,
            self.config.similarity_threshold,
        )
    }

    /// Exact / nearest matching with a caller-supplied similarity threshold
    ///
    /// A threshold outside `[0, 1]` is a caller bug and is rejected.
    pub fn find_matches_with_threshold<'a>(
        &self,
        extracted_text: &str,
        candidates: &'a [BatchRecord],
        similarity_threshold: f64,
    ) -> AppResult<MatchOutcome<'a>> {
        if !(0.0..=1.0).contains(&similarity_threshold) {
            let err = AppError::Validation(format!(
                "similarity threshold must be between 0.0 and 1.0, got {}",
                similarity_threshold
            ));
            error_logging::log_validation_error(
                &err,
                "find_matches",
                "similarity_threshold",
                Some(&similarity_threshold.to_string()),
            );
            return Err(err);
        }

        let started = Instant::now();
        let text = NormalizedText::new(extracted_text);
        let mut exact = Vec::new();
        let mut nearest = Vec::new();

        for batch in candidates {
            let Some(code) = batch.effective_batch_number() else {
                warn!(batch = batch.display_name(), "Skipping candidate without batch number");
                record_candidate_outcome("skipped");
                continue;
            };

            let similarity = self.locator.locate(code, &text);

            if meets_threshold(similarity, similarity_threshold) {
                let expiry_valid = match batch.expiry() {
                    Some(expiry_date) => {
                        let formats = self.expander.expand(expiry_date);
                        self.expiry.matches(&formats, &text)
                    }
                    None => true,
                };

                let result = MatchResult {
                    batch,
                    similarity,
                    expiry_valid,
                };
                if expiry_valid {
                    record_candidate_outcome("exact");
                    exact.push(result);
                } else {
                    debug!(code, similarity, "Batch number matched but expiry did not");
                    record_candidate_outcome("expiry_mismatch");
                    nearest.push(result);
                }
            } else if exceeds_threshold(similarity, self.config.nearest_floor) {
                record_candidate_outcome("nearest");
                nearest.push(MatchResult {
                    batch,
                    similarity,
                    expiry_valid: false,
                });
            } else {
                record_candidate_outcome("discarded");
            }
        }

        let outcome = if exact.is_empty() {
            sort_by_similarity(&mut nearest);
            nearest.truncate(self.config.nearest_fallback_limit);
            MatchOutcome {
                exact_matches: exact,
                nearest_matches: nearest,
            }
        } else {
            sort_by_similarity(&mut exact);
            MatchOutcome {
                exact_matches: exact,
                nearest_matches: Vec::new(),
            }
        };

        record_session_duration("exact_nearest", started.elapsed());
        info!(
            candidates = candidates.len(),
            exact = outcome.exact_matches.len(),
            nearest = outcome.nearest_matches.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Batch matching completed"
        );
        Ok(outcome)
    }

    /// Nearest batch-number matches, ignoring expiry
    ///
    /// Returns up to `max_results` candidates scoring above the configured
    /// expiry-blind floor, best first. Their expiry is reported unverified.
    pub fn find_nearest_matches<'a>(
        &self,
        extracted_text: &str,
        candidates: &'a [BatchRecord],
        max_results: usize,
    ) -> Vec<MatchResult<'a>> {
        let text = NormalizedText::new(extracted_text);

        let mut results: Vec<MatchResult<'a>> = candidates
            .iter()
            .filter_map(|batch| {
                let code = batch.effective_batch_number()?;
                let similarity = self.locator.locate(code, &text);
                exceeds_threshold(similarity, self.config.nearest_only_floor).then_some(
                    MatchResult {
                        batch,
                        similarity,
                        expiry_valid: false,
                    },
                )
            })
            .collect();

        sort_by_similarity(&mut results);
        results.truncate(max_results);

        debug!(
            candidates = candidates.len(),
            returned = results.len(),
            "Nearest batch matches computed"
        );
        results
    }

    /// Weighted composite ranking for the card presentation
    ///
    /// Quantities come from `quantity_hints` when a record's item code links to
    /// one. Otherwise they are assigned round-robin across the hints, indexed by
    /// the number of candidates already admitted; such entries are marked
    /// [`QuantitySource::RoundRobin`] and must not be treated as confident.
    pub fn find_top_ranked<'a>(
        &self,
        extracted_text: &str,
        candidates: &'a [BatchRecord],
        quantity_hints: Option<&QuantityHints>,
    ) -> Vec<RankedMatch<'a>> {
        let started = Instant::now();
        let text = NormalizedText::new(extracted_text);
        let mut ranked: Vec<RankedMatch<'a>> = Vec::new();

        for batch in candidates {
            let Some(code) = batch.effective_batch_number() else {
                warn!(batch = batch.display_name(), "Skipping candidate without batch number");
                record_candidate_outcome("skipped");
                continue;
            };

            let batch_similarity = self.locator.locate(code, &text);
            let expiry_similarity = match batch.expiry() {
                Some(expiry_date) => {
                    let formats = self.expander.expand(expiry_date);
                    self.expiry.score(&formats, &text)
                }
                None => 1.0,
            };

            let composite = batch_similarity * self.config.batch_weight
                + expiry_similarity * self.config.expiry_weight;
            if !self.admits_composite(composite) {
                record_candidate_outcome("below_composite");
                continue;
            }

            let (requested_quantity, item_code, quantity_source) =
                assign_quantity(batch, quantity_hints, ranked.len());
            if quantity_source == QuantitySource::RoundRobin {
                warn!(
                    batch = batch.display_name(),
                    item_code = ?item_code,
                    requested_quantity,
                    "Requested quantity inferred round-robin; no item code links this batch"
                );
            }

            record_candidate_outcome("ranked");
            ranked.push(RankedMatch {
                batch,
                composite_score: composite * 100.0,
                requested_quantity,
                item_code,
                quantity_source,
                rank: 0,
            });
        }

        ranked.sort_by(|a, b| {
            b.composite_score
                .partial_cmp(&a.composite_score)
                .unwrap_or(Ordering::Equal)
        });
        ranked.truncate(self.config.top_ranked_limit);
        for (index, entry) in ranked.iter_mut().enumerate() {
            entry.rank = index + 1;
        }

        record_session_duration("top_ranked", started.elapsed());
        info!(
            candidates = candidates.len(),
            ranked = ranked.len(),
            duration_ms = started.elapsed().as_millis() as u64,
            "Top-ranked matching completed"
        );
        ranked
    }

    /// Whether a composite score in `[0, 1]` is high enough for the ranking
    pub fn admits_composite(&self, composite: f64) -> bool {
        meets_threshold(composite, self.config.composite_threshold)
    }

    /// Empty both caches; call on session reset or dispose
    pub fn clear_caches(&self) {
        self.locator.clear_cache();
        self.expander.clear_cache();
        debug!("Matching caches cleared");
    }

    /// Statistics for the `(similarity, date format)` caches
    pub fn cache_stats(&self) -> (CacheStats, CacheStats) {
        (self.locator.cache_stats(), self.expander.cache_stats())
    }
}

impl Default for MatchSession {
    fn default() -> Self {
        let config = MatchingConfig::default();
        Self {
            locator: BatchNumberLocator::new(config.clone()),
            expander: DateFormatExpander::new(),
            expiry: ExpiryMatcher::new(),
            config,
        }
    }
}

fn sort_by_similarity(results: &mut [MatchResult<'_>]) {
    results.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(Ordering::Equal)
    });
}

fn assign_quantity(
    batch: &BatchRecord,
    hints: Option<&QuantityHints>,
    accepted: usize,
) -> (i64, Option<String>, QuantitySource) {
    let hints = match hints.filter(|h| !h.is_empty()) {
        Some(hints) => hints,
        None => {
            return match batch.quantity {
                Some(quantity) => (quantity, batch.item_code.clone(), QuantitySource::Catalog),
                None => (0, batch.item_code.clone(), QuantitySource::Unknown),
            }
        }
    };

    if let Some(code) = batch.item_code.as_deref() {
        if let Some(quantity) = hints.get(code) {
            return (quantity, Some(code.to_string()), QuantitySource::Linked);
        }
    }

    match hints.round_robin(accepted) {
        Some((code, quantity)) => (quantity, Some(code.to_string()), QuantitySource::RoundRobin),
        None => (0, None, QuantitySource::Unknown),
    }
}

//! # Unified Application Configuration
//!
//! Every threshold and search heuristic used by the matching core lives in
//! [`MatchingConfig`], so that its patient-safety impact can be tuned and tested
//! independently of the algorithms. Values load from defaults, optionally
//! overridden by `BATCH_MATCH_*` environment variables, and are validated
//! before a session is built.

use crate::errors::{AppError, AppResult};
use crate::observability::ObservabilityConfig;
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Tolerance applied to threshold comparisons so boundary scores such as
/// `1 - 3/20` compare equal to the literal `0.85`
pub const SCORE_EPSILON: f64 = 1e-9;

/// Inclusive threshold check (`score >= threshold`)
pub fn meets_threshold(score: f64, threshold: f64) -> bool {
    score + SCORE_EPSILON >= threshold
}

/// Strict threshold check (`score > threshold`)
pub fn exceeds_threshold(score: f64, threshold: f64) -> bool {
    score > threshold + SCORE_EPSILON
}

/// Matching thresholds and search heuristics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum batch similarity for exact-match evaluation (inclusive)
    pub similarity_threshold: f64,
    /// Batch similarity above which a candidate is kept for review (exclusive)
    pub nearest_floor: f64,
    /// Number of nearest matches returned when no exact match exists
    pub nearest_fallback_limit: usize,
    /// Batch similarity floor for the expiry-blind nearest search (exclusive)
    pub nearest_only_floor: f64,
    /// Score at which fuzzy scans stop searching
    pub early_exit_similarity: f64,
    /// Maximum word/code length difference considered by the word scan
    pub fuzzy_length_tolerance: usize,
    /// Longest code eligible for the sliding window scan
    pub sliding_window_max_code_len: usize,
    /// Word-scan score below which the sliding window scan runs
    pub sliding_window_trigger: f64,
    /// Sliding window stride in characters
    pub sliding_window_step: usize,
    /// Weight of batch similarity in the composite score
    pub batch_weight: f64,
    /// Weight of expiry similarity in the composite score
    pub expiry_weight: f64,
    /// Minimum composite score for the ranked view (inclusive)
    pub composite_threshold: f64,
    /// Maximum entries in the ranked view
    pub top_ranked_limit: usize,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: 0.85,
            nearest_floor: 0.60,
            nearest_fallback_limit: 2,
            nearest_only_floor: 0.50,
            early_exit_similarity: 0.95,
            fuzzy_length_tolerance: 3,
            sliding_window_max_code_len: 6,
            sliding_window_trigger: 0.80,
            sliding_window_step: 2,
            batch_weight: 0.7,
            expiry_weight: 0.3,
            composite_threshold: 0.76,
            top_ranked_limit: 5,
        }
    }
}

impl MatchingConfig {
    /// Load configuration from `BATCH_MATCH_*` environment variables
    pub fn from_env() -> AppResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            similarity_threshold: env_or("BATCH_MATCH_SIMILARITY_THRESHOLD", defaults.similarity_threshold)?,
            nearest_floor: env_or("BATCH_MATCH_NEAREST_FLOOR", defaults.nearest_floor)?,
            nearest_fallback_limit: env_or("BATCH_MATCH_NEAREST_FALLBACK_LIMIT", defaults.nearest_fallback_limit)?,
            nearest_only_floor: env_or("BATCH_MATCH_NEAREST_ONLY_FLOOR", defaults.nearest_only_floor)?,
            early_exit_similarity: env_or("BATCH_MATCH_EARLY_EXIT_SIMILARITY", defaults.early_exit_similarity)?,
            fuzzy_length_tolerance: env_or("BATCH_MATCH_FUZZY_LENGTH_TOLERANCE", defaults.fuzzy_length_tolerance)?,
            sliding_window_max_code_len: env_or(
                "BATCH_MATCH_SLIDING_WINDOW_MAX_CODE_LEN",
                defaults.sliding_window_max_code_len,
            )?,
            sliding_window_trigger: env_or("BATCH_MATCH_SLIDING_WINDOW_TRIGGER", defaults.sliding_window_trigger)?,
            sliding_window_step: env_or("BATCH_MATCH_SLIDING_WINDOW_STEP", defaults.sliding_window_step)?,
            batch_weight: env_or("BATCH_MATCH_BATCH_WEIGHT", defaults.batch_weight)?,
            expiry_weight: env_or("BATCH_MATCH_EXPIRY_WEIGHT", defaults.expiry_weight)?,
            composite_threshold: env_or("BATCH_MATCH_COMPOSITE_THRESHOLD", defaults.composite_threshold)?,
            top_ranked_limit: env_or("BATCH_MATCH_TOP_RANKED_LIMIT", defaults.top_ranked_limit)?,
        })
    }

    /// Validate matching configuration
    pub fn validate(&self) -> AppResult<()> {
        let probabilities = [
            ("similarity_threshold", self.similarity_threshold),
            ("nearest_floor", self.nearest_floor),
            ("nearest_only_floor", self.nearest_only_floor),
            ("early_exit_similarity", self.early_exit_similarity),
            ("sliding_window_trigger", self.sliding_window_trigger),
            ("batch_weight", self.batch_weight),
            ("expiry_weight", self.expiry_weight),
            ("composite_threshold", self.composite_threshold),
        ];

        for (name, value) in probabilities {
            if !(0.0..=1.0).contains(&value) {
                return Err(AppError::Config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, value
                )));
            }
        }

        if self.nearest_floor > self.similarity_threshold {
            return Err(AppError::Config(
                "nearest_floor cannot be greater than similarity_threshold".to_string(),
            ));
        }

        if ((self.batch_weight + self.expiry_weight) - 1.0).abs() > 1e-6 {
            return Err(AppError::Config(format!(
                "batch_weight and expiry_weight must sum to 1.0, got {}",
                self.batch_weight + self.expiry_weight
            )));
        }

        if self.sliding_window_step == 0 {
            return Err(AppError::Config(
                "sliding_window_step must be greater than 0".to_string(),
            ));
        }

        if self.nearest_fallback_limit == 0 {
            return Err(AppError::Config(
                "nearest_fallback_limit must be greater than 0".to_string(),
            ));
        }

        if self.top_ranked_limit == 0 {
            return Err(AppError::Config(
                "top_ranked_limit must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> AppResult<T> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a valid number, got '{}'", key, raw))),
        Err(_) => Ok(default),
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Matching thresholds and heuristics
    pub matching: MatchingConfig,
    /// Logging configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Ok(Self {
            matching: MatchingConfig::from_env()?,
            observability: ObservabilityConfig::from_env(),
        })
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.matching.validate()?;
        self.observability
            .validate()
            .map_err(AppError::Config)?;
        Ok(())
    }

    /// Get a summary of the current configuration for logging
    pub fn summary(&self) -> String {
        format!(
            "Configuration: similarity_threshold={}, nearest_floor={}, composite_threshold={}, window_step={}, early_exit={}, log_level={}",
            self.matching.similarity_threshold,
            self.matching.nearest_floor,
            self.matching.composite_threshold,
            self.matching.sliding_window_step,
            self.matching.early_exit_similarity,
            self.observability.log_level
        )
    }
}

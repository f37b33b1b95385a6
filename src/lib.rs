//! # Batch Match
//!
//! Identifies which pre-registered pharmaceutical batch a noisy OCR text blob
//! refers to, and verifies that the batch's expiry date also appears in that
//! text, before a safety-critical inventory submission is allowed.
//!
//! ```rust
//! use batch_match::{BatchRecord, MatchSession};
//!
//! let session = MatchSession::default();
//! let catalog = vec![BatchRecord::new("AB1234", Some("2026-03-31"))];
//!
//! let outcome = session.find_matches("LOT AB1234 EXP 03/31/2026", &catalog).unwrap();
//! assert_eq!(outcome.exact_matches.len(), 1);
//! assert!(outcome.exact_matches[0].expiry_valid);
//! ```

pub mod batch_locator;
pub mod cache;
pub mod catalog;
pub mod config;
pub mod date_formats;
pub mod errors;
pub mod expiry;
pub mod matcher;
pub mod observability;
pub mod observability_config;
pub mod similarity;
pub mod text_normalizer;

// Re-export types for easier access
pub use catalog::{BatchRecord, CatalogEntry, QuantityHints};
pub use config::{AppConfig, MatchingConfig};
pub use errors::{AppError, AppResult};
pub use matcher::{MatchOutcome, MatchResult, MatchSession, QuantitySource, RankedMatch};

//! # Batch Catalog Boundary
//!
//! Catalog providers hand over batch records either in the typed shape or as
//! loose key-value maps using a mix of camelCase and snake_case keys. Everything
//! is converted to the canonical [`BatchRecord`] here, before it reaches the
//! matching core, which only ever sees the canonical type.

use crate::errors::{error_logging, AppError, AppResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

const BATCH_NUMBER_KEYS: [&str; 2] = ["batchNumber", "batch_number"];
const BATCH_ID_KEYS: [&str; 2] = ["batchId", "batch_id"];
const EXPIRY_DATE_KEYS: [&str; 2] = ["expiryDate", "expiry_date"];
const ITEM_NAME_KEYS: [&str; 4] = ["itemName", "item_name", "productName", "product_name"];
const ITEM_CODE_KEYS: [&str; 2] = ["itemCode", "item_code"];
const QUANTITY_KEYS: [&str; 2] = ["quantity", "qty"];

/// Canonical pharmaceutical batch record
///
/// Owned by the catalog provider; the matching core only borrows it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    #[serde(default, alias = "batch_number")]
    pub batch_number: Option<String>,
    /// Internal identifier used when no printed batch number is known
    #[serde(default, alias = "batch_id")]
    pub batch_id: Option<String>,
    /// Expiry date in whatever format the catalog stores it
    #[serde(default, alias = "expiry_date")]
    pub expiry_date: Option<String>,
    #[serde(default, alias = "item_name", alias = "productName", alias = "product_name")]
    pub item_name: Option<String>,
    #[serde(default, alias = "item_code")]
    pub item_code: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl BatchRecord {
    /// Create a record with a batch number and optional expiry date
    pub fn new(batch_number: impl Into<String>, expiry_date: Option<&str>) -> Self {
        Self {
            batch_number: Some(batch_number.into()),
            expiry_date: expiry_date.map(str::to_string),
            ..Default::default()
        }
    }

    /// The code to search for: the printed batch number, falling back to the
    /// internal batch id. `None` when both are missing or blank.
    pub fn effective_batch_number(&self) -> Option<&str> {
        non_blank(self.batch_number.as_deref()).or_else(|| non_blank(self.batch_id.as_deref()))
    }

    /// Expiry date if present and not blank
    pub fn expiry(&self) -> Option<&str> {
        non_blank(self.expiry_date.as_deref())
    }

    /// Human-readable label for logs and presentation
    pub fn display_name(&self) -> &str {
        non_blank(self.item_name.as_deref())
            .or_else(|| self.effective_batch_number())
            .unwrap_or("<unnamed batch>")
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// A catalog entry as received from a provider
///
/// JSON objects always deserialize as `Fields` so that every alias (including
/// numeric ids and string quantities) goes through the same resolution.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum CatalogEntry {
    /// Generic key-value map with aliased keys
    Fields(Map<String, Value>),
    /// Already in the canonical shape
    Typed(BatchRecord),
}

impl CatalogEntry {
    /// Convert into the canonical record
    ///
    /// Missing or oddly-typed fields become `None`; this never fails.
    pub fn into_record(self) -> BatchRecord {
        match self {
            CatalogEntry::Typed(record) => record,
            CatalogEntry::Fields(map) => record_from_map(&map),
        }
    }
}

impl From<BatchRecord> for CatalogEntry {
    fn from(record: BatchRecord) -> Self {
        CatalogEntry::Typed(record)
    }
}

impl From<Map<String, Value>> for CatalogEntry {
    fn from(map: Map<String, Value>) -> Self {
        CatalogEntry::Fields(map)
    }
}

/// Resolve aliased keys of a generic map into a canonical record
pub fn record_from_map(map: &Map<String, Value>) -> BatchRecord {
    BatchRecord {
        batch_number: text_field(map, &BATCH_NUMBER_KEYS),
        batch_id: text_field(map, &BATCH_ID_KEYS),
        expiry_date: text_field(map, &EXPIRY_DATE_KEYS),
        item_name: text_field(map, &ITEM_NAME_KEYS),
        item_code: text_field(map, &ITEM_CODE_KEYS),
        quantity: quantity_field(map),
    }
}

fn text_field(map: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match map.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn quantity_field(map: &Map<String, Value>) -> Option<i64> {
    QUANTITY_KEYS.iter().find_map(|key| match map.get(*key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Normalize a mixed list of entries into canonical records
pub fn normalize_entries<I>(entries: I) -> Vec<BatchRecord>
where
    I: IntoIterator<Item = CatalogEntry>,
{
    entries.into_iter().map(CatalogEntry::into_record).collect()
}

/// Parse a JSON catalog (an array of typed or generic entries)
pub fn parse_catalog(json: &str) -> AppResult<Vec<BatchRecord>> {
    let value: Value = serde_json::from_str(json)?;
    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(AppError::Catalog(format!(
                "catalog must be a JSON array, got {}",
                json_kind(&other)
            )))
        }
    };

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        match item {
            Value::Object(map) => entries.push(CatalogEntry::from(map)),
            other => {
                let err = AppError::Catalog(format!(
                    "catalog entry {} must be an object, got {}",
                    index,
                    json_kind(&other)
                ));
                error_logging::log_catalog_error(&err, "parse_catalog", None, Some(index));
                return Err(err);
            }
        }
    }

    let records = normalize_entries(entries);
    let unsearchable = records
        .iter()
        .filter(|r| r.effective_batch_number().is_none())
        .count();
    if unsearchable > 0 {
        warn!(unsearchable, "Catalog contains records without a batch number");
    }

    debug!(records = records.len(), "Catalog parsed");
    Ok(records)
}

/// Load a JSON catalog from disk
pub fn load_catalog(path: impl AsRef<Path>) -> AppResult<Vec<BatchRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        error_logging::log_catalog_error(&e, "load_catalog", path.to_str(), None);
        AppError::FileSystem(format!("Failed to read {}: {}", path.display(), e))
    })?;
    parse_catalog(&content)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Requested quantities per item code, in catalog order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuantityHints {
    entries: Vec<(String, i64)>,
}

impl QuantityHints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a hint; a repeated item code replaces the earlier quantity in place
    pub fn insert(&mut self, item_code: impl Into<String>, quantity: i64) {
        let item_code = item_code.into();
        match self.entries.iter_mut().find(|(code, _)| *code == item_code) {
            Some(entry) => entry.1 = quantity,
            None => self.entries.push((item_code, quantity)),
        }
    }

    /// Quantity requested for an item code
    pub fn get(&self, item_code: &str) -> Option<i64> {
        self.entries
            .iter()
            .find(|(code, _)| code == item_code)
            .map(|(_, quantity)| *quantity)
    }

    /// Entry at `index mod len`, used when no item code links a match to a hint
    pub fn round_robin(&self, index: usize) -> Option<(&str, i64)> {
        if self.entries.is_empty() {
            return None;
        }
        let (code, quantity) = &self.entries[index % self.entries.len()];
        Some((code.as_str(), *quantity))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse hints from a JSON object of `item code -> quantity`
    pub fn from_json(json: &str) -> AppResult<Self> {
        let value: Value = serde_json::from_str(json)?;
        let map = match value {
            Value::Object(map) => map,
            other => {
                return Err(AppError::Catalog(format!(
                    "quantity hints must be a JSON object, got {}",
                    json_kind(&other)
                )))
            }
        };

        let mut hints = Self::new();
        for (code, quantity) in map {
            let quantity = match &quantity {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.trim().parse().ok(),
                _ => None,
            }
            .ok_or_else(|| {
                AppError::Catalog(format!("quantity for item code '{}' must be an integer", code))
            })?;
            hints.insert(code, quantity);
        }
        Ok(hints)
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for QuantityHints {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        let mut hints = Self::new();
        for (code, quantity) in iter {
            hints.insert(code, quantity);
        }
        hints
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_snake_case_map_is_resolved() {
        let record = record_from_map(&as_map(json!({
            "batch_number": "AB1234",
            "expiry_date": "2026-03-31",
            "product_name": "Amoxicillin 500mg",
            "qty": "12"
        })));

        assert_eq!(record.batch_number.as_deref(), Some("AB1234"));
        assert_eq!(record.expiry_date.as_deref(), Some("2026-03-31"));
        assert_eq!(record.item_name.as_deref(), Some("Amoxicillin 500mg"));
        assert_eq!(record.quantity, Some(12));
    }

    #[test]
    fn test_batch_id_fallback() {
        let record = record_from_map(&as_map(json!({ "batchNumber": "  ", "batchId": 99812 })));
        assert_eq!(record.effective_batch_number(), Some("99812"));

        let empty = record_from_map(&as_map(json!({ "itemName": "Saline" })));
        assert_eq!(empty.effective_batch_number(), None);
        assert_eq!(empty.display_name(), "Saline");
    }

    #[test]
    fn test_untagged_entry_deserialization() {
        let entry: CatalogEntry =
            serde_json::from_value(json!({ "batchNumber": "X1", "expiryDate": "2027-01-01" }))
                .unwrap();
        let record = entry.into_record();
        assert_eq!(record.batch_number.as_deref(), Some("X1"));
        assert_eq!(record.expiry(), Some("2027-01-01"));
    }

    #[test]
    fn test_parse_catalog_rejects_non_array() {
        assert!(matches!(
            parse_catalog(r#"{"batchNumber": "X"}"#),
            Err(AppError::Catalog(_))
        ));
        assert!(matches!(parse_catalog(r#"[1, 2]"#), Err(AppError::Catalog(_))));
    }

    #[test]
    fn test_quantity_hints_round_robin() {
        let hints: QuantityHints = vec![("ITEM-A", 10), ("ITEM-B", 20)].into_iter().collect();

        assert_eq!(hints.get("ITEM-B"), Some(20));
        assert_eq!(hints.round_robin(0), Some(("ITEM-A", 10)));
        assert_eq!(hints.round_robin(3), Some(("ITEM-B", 20)));
        assert_eq!(QuantityHints::new().round_robin(0), None);
    }

    #[test]
    fn test_quantity_hints_from_json_keeps_order() {
        let hints = QuantityHints::from_json(r#"{"Z-1": 3, "A-2": "4"}"#).unwrap();
        assert_eq!(hints.round_robin(0), Some(("Z-1", 3)));
        assert_eq!(hints.round_robin(1), Some(("A-2", 4)));

        assert!(QuantityHints::from_json(r#"{"A": "many"}"#).is_err());
    }
}

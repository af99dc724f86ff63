//! Structural validation helpers for JSON input
//!
//! Validation never fails the caller: every check returns a
//! [`ValidationResult`] and the caller decides whether to log, retry or abort.

use serde_json::Value;

/// Fields missing from one item of an array
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingItem {
    /// Position of the item in the input array
    pub index: usize,
    /// Required fields absent from the item, in required order
    pub missing_fields: Vec<String>,
}

/// Outcome of a structural validation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub missing_items: Vec<MissingItem>,
    pub error_count: usize,
    pub summary: String,
}

impl ValidationResult {
    fn from_missing(missing_items: Vec<MissingItem>, total: usize) -> Self {
        let error_count = missing_items
            .iter()
            .map(|item| item.missing_fields.len())
            .sum();

        let summary = if missing_items.is_empty() {
            format!("All {} item(s) contain the required fields", total)
        } else {
            let details: Vec<String> = missing_items
                .iter()
                .map(|item| format!("item {}: {}", item.index, item.missing_fields.join(", ")))
                .collect();
            format!(
                "{} of {} item(s) missing required fields ({})",
                missing_items.len(),
                total,
                details.join("; ")
            )
        };

        Self {
            is_valid: missing_items.is_empty(),
            missing_items,
            error_count,
            summary,
        }
    }
}

/// Check that every item carries every required field
///
/// A field counts as present when the key exists, whatever its value.
/// Items that are not JSON objects are reported as missing all fields.
pub fn validate_array_properties(items: &[Value], required: &[&str]) -> ValidationResult {
    let missing_items = items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| {
            let missing_fields: Vec<String> = required
                .iter()
                .filter(|field| item.as_object().map_or(true, |obj| !obj.contains_key(**field)))
                .map(|field| field.to_string())
                .collect();

            if missing_fields.is_empty() {
                None
            } else {
                Some(MissingItem {
                    index,
                    missing_fields,
                })
            }
        })
        .collect();

    ValidationResult::from_missing(missing_items, items.len())
}

/// Present fields whose value is not a non-blank string
pub fn find_empty_fields(item: &Value, fields: &[&str]) -> Vec<String> {
    fields
        .iter()
        .filter(|field| match item.get(**field) {
            Some(Value::String(s)) => s.trim().is_empty(),
            Some(_) => true,
            None => false,
        })
        .map(|field| field.to_string())
        .collect()
}

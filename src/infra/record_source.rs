use std::fs;
use std::path::Path;

use serde_json::Value;
use tracing::info;

use crate::error::{PipelineError, Result};
use crate::types::{Record, TextValue};

/// Read a JSON array of review objects and return the `[offset, offset + batch_size)` window.
pub fn load_window(path: &Path, offset: usize, batch_size: Option<usize>) -> Result<Vec<Record>> {
    let content = fs::read_to_string(path)?;
    let document: Value = serde_json::from_str(&content)?;
    let records = records_from_document(&document, offset, batch_size)?;
    info!(
        "Loaded {} records from {} (offset={}, batch_size={:?})",
        records.len(),
        path.display(),
        offset,
        batch_size
    );
    Ok(records)
}

pub fn records_from_document(document: &Value, offset: usize, batch_size: Option<usize>) -> Result<Vec<Record>> {
    let items = document
        .as_array()
        .ok_or_else(|| PipelineError::Input("expected a top-level JSON array of records".to_string()))?;

    let end = match batch_size {
        Some(n) => offset.saturating_add(n).min(items.len()),
        None => items.len(),
    };
    if offset >= end {
        return Ok(Vec::new());
    }

    Ok(items[offset..end]
        .iter()
        .enumerate()
        .map(|(i, item)| record_from_value(item, offset + i))
        .collect())
}

/// Convert one array element. Non-object elements become records with a missing text field.
pub fn record_from_value(item: &Value, index: usize) -> Record {
    let id = item
        .get("review_id")
        .or_else(|| item.get("id"))
        .and_then(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .unwrap_or_else(|| format!("record-{}", index));

    let text = TextValue::from(item.get("text"));
    let stars = item.get("stars").and_then(parse_stars);

    Record::new(id, text, stars)
}

// Integers, or floats with an integral value such as 4.0
fn parse_stars(value: &Value) -> Option<u8> {
    if let Some(n) = value.as_u64() {
        return u8::try_from(n).ok();
    }
    let f = value.as_f64()?;
    if f.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(&f) {
        Some(f as u8)
    } else {
        None
    }
}

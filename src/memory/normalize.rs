//! Document id and metadata normalization
//!
//! Everything dynamic about metadata stops here: incoming JSON is either
//! turned into a typed [`Metadata`] map or rejected with `InvalidMetadata`.

use serde_json::Value;
use uuid::Uuid;

use crate::error::{MemvaultError, Result};
use crate::types::{Metadata, MetadataValue};

/// Fresh random document id
pub fn generate_doc_id() -> String {
    Uuid::new_v4().to_string()
}

/// Keep a supplied id, or generate one when absent or blank
pub fn resolve_doc_id(doc_id: Option<&str>) -> String {
    match doc_id.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => id.to_string(),
        None => generate_doc_id(),
    }
}

/// Convert a JSON metadata argument into scalar-only metadata.
///
/// Absent or `null` means empty. Anything other than an object of strings,
/// numbers and booleans is rejected.
pub fn metadata_from_json(value: Option<&Value>) -> Result<Metadata> {
    let obj = match value {
        None | Some(Value::Null) => return Ok(Metadata::new()),
        Some(Value::Object(obj)) => obj,
        Some(other) => {
            return Err(MemvaultError::InvalidMetadata(format!(
                "Metadata must be an object, got {}",
                json_type_name(other)
            )))
        }
    };

    let mut metadata = Metadata::new();
    for (key, v) in obj {
        if key.is_empty() {
            return Err(MemvaultError::InvalidMetadata(
                "Metadata keys cannot be empty".to_string(),
            ));
        }
        let scalar = MetadataValue::from_json(v).ok_or_else(|| {
            MemvaultError::InvalidMetadata(format!(
                "Metadata value for '{}' must be a string, number or boolean, got {}",
                key,
                json_type_name(v)
            ))
        })?;
        metadata.insert(key.clone(), scalar);
    }
    Ok(metadata)
}

/// Normalize an add request's id and metadata.
///
/// Metadata is validated first so a rejected request never mints an id.
pub fn normalize(doc_id: Option<&str>, metadata: Option<&Value>) -> Result<(String, Metadata)> {
    let metadata = metadata_from_json(metadata)?;
    Ok((resolve_doc_id(doc_id), metadata))
}

/// Overlay `update` on `existing`; supplied keys win, others are preserved
pub fn merge_metadata(existing: &Metadata, update: Metadata) -> Metadata {
    let mut merged = existing.clone();
    merged.extend(update);
    merged
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.as_f64().map_or(false, f64::is_finite) => "number",
        Value::Number(_) => "non-finite number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

use std::sync::LazyLock;

use indexmap::IndexMap;
use jsonschema::{Validator, validator_for};
use schemars::schema_for;
use serde_json::Value;
use tracing::debug;

use crate::error::{EngineError, Result};

use super::schema::{RawFieldMapping, SchemaField, SubField};

type MappingDocument = IndexMap<String, RawFieldMapping>;

static MAPPING_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    serde_json::to_value(schema_for!(MappingDocument)).expect("mapping schema must serialize")
});

static MAPPING_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    validator_for(&MAPPING_SCHEMA).expect("mapping document schema must compile")
});

/// JSON Schema describing a mapping document (`field -> {type, fields, originalFields}`).
pub fn mapping_document_schema() -> Value {
    MAPPING_SCHEMA.clone()
}

/// Validate and normalize a raw mapping document into schema fields, keeping
/// declaration order.
pub fn parse_mappings(document: &Value) -> Result<Vec<SchemaField>> {
    if !document.is_object() {
        return Err(EngineError::InvalidSchema(
            "mapping document must be a JSON object".to_string(),
        ));
    }
    let issues = MAPPING_VALIDATOR
        .iter_errors(document)
        .map(|error| {
            let pointer = error.instance_path.to_string();
            let prefix = if pointer.is_empty() {
                "<root>".to_string()
            } else {
                pointer
            };
            format!("{prefix}: {error}")
        })
        .collect::<Vec<_>>();
    if !issues.is_empty() {
        return Err(EngineError::InvalidSchema(issues.join("; ")));
    }

    let raw: MappingDocument = serde_json::from_value(document.clone())
        .map_err(|err| EngineError::InvalidSchema(err.to_string()))?;
    let fields = raw
        .into_iter()
        .map(|(name, mapping)| normalize_field(name, mapping))
        .collect::<Result<Vec<_>>>()?;
    debug!(fields = fields.len(), "parsed mapping document");
    Ok(fields)
}

fn normalize_field(name: String, mapping: RawFieldMapping) -> Result<SchemaField> {
    let RawFieldMapping {
        field_type,
        fields,
        mut original_fields,
    } = mapping;

    let mut sub_fields = Vec::with_capacity(original_fields.len());
    for local in fields {
        if sub_fields.iter().any(|sub: &SubField| sub.name == local) {
            continue;
        }
        let Some(sub) = original_fields.shift_remove(&local) else {
            return Err(EngineError::InvalidSchema(format!(
                "field '{name}' lists sub-field '{local}' without a type in originalFields"
            )));
        };
        sub_fields.push(SubField {
            name: local,
            field_type: sub.field_type,
        });
    }
    // variants only described in originalFields keep their document order
    sub_fields.extend(original_fields.into_iter().map(|(local, sub)| SubField {
        name: local,
        field_type: sub.field_type,
    }));

    Ok(SchemaField {
        name,
        field_type,
        sub_fields,
    })
}

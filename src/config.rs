use std::collections::HashSet;
use std::sync::LazyLock;

use indexmap::IndexMap;
use jsonschema::{Validator, validator_for};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::constraint::{AuxValue, ConstraintRegistry, TypeConstraint};
use crate::error::{EngineError, Result};
use crate::options::EngineOptions;
use crate::schema::SchemaIndex;

static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    serde_json::to_value(schema_for!(WidgetConfig)).expect("widget config schema must serialize")
});

static CONFIG_VALIDATOR: LazyLock<Validator> = LazyLock::new(|| {
    validator_for(&CONFIG_SCHEMA).expect("widget config schema must compile")
});

/// Stored configuration of one attached widget.
///
/// `field_weights` is kept per root field (parallel to `root_fields`); the
/// expanded weights are derived by [`FieldResolver::resolve`](crate::FieldResolver::resolve).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    pub widget_id: String,
    pub kind: String,
    #[schemars(length(min = 1))]
    pub root_fields: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_weights: Option<Vec<u32>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub aux_values: IndexMap<String, AuxValue>,
}

impl WidgetConfig {
    /// Effective value of an aux property, falling back to its declared default.
    pub fn aux_value(&self, name: &str, constraint: &TypeConstraint) -> Result<AuxValue> {
        let property = constraint.aux_property(name)?;
        Ok(self
            .aux_values
            .get(name)
            .cloned()
            .unwrap_or_else(|| property.default.clone()))
    }

    /// Every declared aux property with its effective value, in declaration order.
    pub fn effective_aux_values(&self, constraint: &TypeConstraint) -> IndexMap<String, AuxValue> {
        constraint
            .aux_properties
            .iter()
            .map(|(name, property)| {
                let value = self
                    .aux_values
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| property.default.clone());
                (name.clone(), value)
            })
            .collect()
    }

    /// Check every invariant a committed configuration must hold.
    pub fn validate(&self, schema: &SchemaIndex, constraint: &TypeConstraint) -> Result<()> {
        if self.kind != constraint.kind {
            return Err(invalid(format!(
                "config is for kind '{}' but was checked against '{}'",
                self.kind, constraint.kind
            )));
        }
        if self.root_fields.is_empty() {
            return Err(invalid("at least one root field is required"));
        }
        if !constraint.multiple && self.root_fields.len() != 1 {
            return Err(invalid(format!(
                "kind '{}' takes exactly one root field, found {}",
                constraint.kind,
                self.root_fields.len()
            )));
        }
        let mut seen = HashSet::new();
        for field in &self.root_fields {
            if !seen.insert(field.as_str()) {
                return Err(invalid(format!("root field '{field}' is selected twice")));
            }
            if !schema.is_eligible(field, &constraint.accepted_types, constraint.eligibility) {
                return Err(EngineError::IneligibleField {
                    field: field.clone(),
                });
            }
        }
        match (&self.field_weights, constraint.weighted) {
            (Some(weights), true) => {
                if weights.len() != self.root_fields.len() {
                    return Err(invalid(format!(
                        "{} root field(s) but {} weight(s)",
                        self.root_fields.len(),
                        weights.len()
                    )));
                }
                if weights.contains(&0) {
                    return Err(invalid("weights must be positive"));
                }
            }
            (Some(_), false) => {
                return Err(invalid(format!(
                    "kind '{}' does not use field weights",
                    constraint.kind
                )));
            }
            (None, _) => {}
        }
        for (name, value) in &self.aux_values {
            constraint.aux_property(name)?.coerce(name, value.clone())?;
        }
        Ok(())
    }

    /// Convert stored aux values to their declared kinds, as edits do.
    /// Number inputs historically stored text such as `"25"`.
    pub fn normalize_aux_values(&mut self, constraint: &TypeConstraint) -> Result<()> {
        for (name, value) in self.aux_values.iter_mut() {
            let coerced = constraint.aux_property(name)?.coerce(name, value.clone())?;
            *value = coerced;
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> EngineError {
    EngineError::InvalidConfig(message.into())
}

/// JSON Schema for stored widget configuration documents.
pub fn config_json_schema() -> Value {
    CONFIG_SCHEMA.clone()
}

/// Validate a stored configuration document and deserialize it.
pub fn parse_widget_config(document: &Value) -> Result<WidgetConfig> {
    let issues = CONFIG_VALIDATOR
        .iter_errors(document)
        .map(|error| {
            let pointer = error.instance_path.to_string();
            if pointer.is_empty() {
                format!("<root>: {error}")
            } else {
                format!("{pointer}: {error}")
            }
        })
        .collect::<Vec<_>>();
    if !issues.is_empty() {
        return Err(invalid(issues.join("; ")));
    }
    serde_json::from_value(document.clone()).map_err(|err| invalid(err.to_string()))
}

/// Computes the initial configuration for a newly attached widget.
#[derive(Debug, Clone, Copy)]
pub struct ConfigFactory<'a> {
    registry: &'a ConstraintRegistry,
    options: EngineOptions,
}

impl<'a> ConfigFactory<'a> {
    pub fn new(registry: &'a ConstraintRegistry) -> Self {
        Self {
            registry,
            options: EngineOptions::default(),
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    /// First eligible field becomes the root; weighted kinds get one default weight.
    pub fn default_config(
        &self,
        widget_id: &str,
        kind: &str,
        schema: &SchemaIndex,
    ) -> Result<WidgetConfig> {
        let constraint = self.registry.constraint_for(kind)?;
        let first = schema
            .fields(&constraint.accepted_types, constraint.eligibility)
            .into_iter()
            .next()
            .ok_or_else(|| EngineError::NoEligibleField {
                kind: kind.to_string(),
            })?;
        debug!(widget_id, kind, field = %first, "default widget config");
        Ok(WidgetConfig {
            widget_id: widget_id.to_string(),
            kind: kind.to_string(),
            root_fields: vec![first],
            field_weights: constraint
                .weighted
                .then(|| vec![self.options.default_weight]),
            aux_values: IndexMap::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaIndex {
        SchemaIndex::from_value(&json!({
            "pages": {"type": "integer"},
            "title": {
                "type": "text",
                "fields": ["keyword"],
                "originalFields": {"keyword": {"type": "keyword"}}
            },
            "genre": {"type": "keyword"}
        }))
        .unwrap()
    }

    #[test]
    fn search_default_seeds_weight() {
        let config = ConfigFactory::new(ConstraintRegistry::builtin())
            .default_config("search", "search", &schema())
            .unwrap();
        assert_eq!(config.root_fields, ["title"]);
        assert_eq!(config.field_weights, Some(vec![2]));
        assert!(config.aux_values.is_empty());
    }

    #[test]
    fn filter_default_has_no_weights() {
        let config = ConfigFactory::new(ConstraintRegistry::builtin())
            .default_config("genres", "filter", &schema())
            .unwrap();
        assert_eq!(config.root_fields, ["title"]);
        assert_eq!(config.field_weights, None);
    }

    #[test]
    fn custom_default_weight_is_used() {
        let config = ConfigFactory::new(ConstraintRegistry::builtin())
            .with_options(EngineOptions::default().with_default_weight(5))
            .default_config("search", "search", &schema())
            .unwrap();
        assert_eq!(config.field_weights, Some(vec![5]));
    }

    #[test]
    fn no_eligible_field_prevents_attachment() {
        let numbers = SchemaIndex::from_value(&json!({"pages": {"type": "integer"}})).unwrap();
        let err = ConfigFactory::new(ConstraintRegistry::builtin())
            .default_config("genres", "filter", &numbers)
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::NoEligibleField {
                kind: "filter".to_string()
            }
        );
    }

    #[test]
    fn unknown_kind_prevents_attachment() {
        let err = ConfigFactory::new(ConstraintRegistry::builtin())
            .default_config("map", "geo", &schema())
            .unwrap_err();
        assert_eq!(err, EngineError::UnknownWidgetKind("geo".to_string()));
    }

    #[test]
    fn validate_rejects_broken_invariants() {
        let schema = schema();
        let search = ConstraintRegistry::builtin().constraint_for("search").unwrap();
        let mut config = WidgetConfig {
            widget_id: "search".to_string(),
            kind: "search".to_string(),
            root_fields: vec!["title".to_string(), "genre".to_string()],
            field_weights: Some(vec![2, 1]),
            aux_values: IndexMap::new(),
        };
        assert!(config.validate(&schema, &search).is_ok());

        config.root_fields[1] = "title".to_string();
        assert!(matches!(
            config.validate(&schema, &search),
            Err(EngineError::InvalidConfig(_))
        ));

        config.root_fields[1] = "pages".to_string();
        assert_eq!(
            config.validate(&schema, &search),
            Err(EngineError::IneligibleField {
                field: "pages".to_string()
            })
        );

        config.root_fields[1] = "genre".to_string();
        config.field_weights = Some(vec![2]);
        assert!(config.validate(&schema, &search).is_err());

        config.field_weights = Some(vec![2, 2]);
        config
            .aux_values
            .insert("colour".to_string(), AuxValue::Text("red".to_string()));
        assert!(matches!(
            config.validate(&schema, &search),
            Err(EngineError::UnknownProperty { .. })
        ));
    }

    #[test]
    fn aux_values_fall_back_to_defaults() {
        let filter = ConstraintRegistry::builtin().constraint_for("filter").unwrap();
        let mut config = WidgetConfig {
            widget_id: "genres".to_string(),
            kind: "filter".to_string(),
            root_fields: vec!["genre".to_string()],
            field_weights: None,
            aux_values: IndexMap::new(),
        };
        config
            .aux_values
            .insert("size".to_string(), AuxValue::Number(20.0));
        assert_eq!(config.aux_value("size", &filter), Ok(AuxValue::Number(20.0)));
        assert_eq!(config.aux_value("showCount", &filter), Ok(AuxValue::Bool(true)));
        let effective = config.effective_aux_values(&filter);
        assert_eq!(effective.len(), filter.aux_properties.len());
        assert_eq!(effective.keys().next().map(String::as_str), Some("title"));
    }

    #[test]
    fn parses_stored_documents() {
        let config = parse_widget_config(&json!({
            "widgetId": "search",
            "kind": "search",
            "rootFields": ["title"],
            "fieldWeights": [3],
            "auxValues": {"highlight": true}
        }))
        .unwrap();
        assert_eq!(config.field_weights, Some(vec![3]));
        assert_eq!(config.aux_values["highlight"], AuxValue::Bool(true));
    }

    #[test]
    fn rejects_documents_without_roots() {
        let err = parse_widget_config(&json!({
            "widgetId": "search",
            "kind": "search",
            "rootFields": []
        }))
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(msg) if msg.contains("/rootFields")));
    }

    #[test]
    fn numeric_text_in_stored_documents_normalizes() {
        let schema = schema();
        let results = ConstraintRegistry::builtin().constraint_for("results").unwrap();
        let mut config = parse_widget_config(&json!({
            "widgetId": "hits",
            "kind": "results",
            "rootFields": ["title"],
            "auxValues": {"size": "25"}
        }))
        .unwrap();
        assert!(config.validate(&schema, &results).is_ok());
        config.normalize_aux_values(&results).unwrap();
        assert_eq!(config.aux_values["size"], AuxValue::Number(25.0));

        config
            .aux_values
            .insert("size".to_string(), AuxValue::Text("many".to_string()));
        assert_eq!(
            config.validate(&schema, &results),
            Err(EngineError::AuxTypeMismatch {
                name: "size".to_string(),
                expected: "number".to_string()
            })
        );
        assert!(config.normalize_aux_values(&results).is_err());
    }
}

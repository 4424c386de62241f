mod registry;

use std::fmt;

use indexmap::{IndexMap, IndexSet};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

pub use registry::ConstraintRegistry;

/// Which types decide whether a schema field may be picked as a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Eligibility {
    /// Only the field's declared type is considered.
    #[default]
    Declared,
    /// The declared type or any sub-field type.
    DeclaredOrSubFields,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuxKind {
    Bool,
    Number,
    Text,
}

impl fmt::Display for AuxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuxKind::Bool => write!(f, "bool"),
            AuxKind::Number => write!(f, "number"),
            AuxKind::Text => write!(f, "text"),
        }
    }
}

/// Value of an auxiliary widget property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AuxValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl AuxValue {
    pub fn kind(&self) -> AuxKind {
        match self {
            AuxValue::Bool(_) => AuxKind::Bool,
            AuxValue::Number(_) => AuxKind::Number,
            AuxValue::Text(_) => AuxKind::Text,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AuxValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AuxValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AuxValue::Text(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for AuxValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuxValue::Bool(value) => write!(f, "{value}"),
            AuxValue::Number(value) => write!(f, "{value}"),
            AuxValue::Text(value) => f.write_str(value),
        }
    }
}

impl From<bool> for AuxValue {
    fn from(value: bool) -> Self {
        AuxValue::Bool(value)
    }
}

impl From<f64> for AuxValue {
    fn from(value: f64) -> Self {
        AuxValue::Number(value)
    }
}

impl From<i32> for AuxValue {
    fn from(value: i32) -> Self {
        AuxValue::Number(f64::from(value))
    }
}

impl From<&str> for AuxValue {
    fn from(value: &str) -> Self {
        AuxValue::Text(value.to_string())
    }
}

impl From<String> for AuxValue {
    fn from(value: String) -> Self {
        AuxValue::Text(value)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxProperty {
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: AuxKind,
    pub default: AuxValue,
}

impl AuxProperty {
    /// Convert an incoming value into this property's kind.
    ///
    /// Number inputs deliver text, so numeric text is accepted for number
    /// properties; anything renders into a text property.
    pub fn coerce(&self, name: &str, value: AuxValue) -> Result<AuxValue> {
        let mismatch = || EngineError::AuxTypeMismatch {
            name: name.to_string(),
            expected: self.kind.to_string(),
        };
        match (self.kind, value) {
            (AuxKind::Bool, AuxValue::Bool(flag)) => Ok(AuxValue::Bool(flag)),
            (AuxKind::Bool, AuxValue::Text(raw)) => match raw.trim() {
                "true" => Ok(AuxValue::Bool(true)),
                "false" => Ok(AuxValue::Bool(false)),
                _ => Err(mismatch()),
            },
            (AuxKind::Number, AuxValue::Number(number)) if number.is_finite() => {
                Ok(AuxValue::Number(number))
            }
            (AuxKind::Number, AuxValue::Text(raw)) => match raw.trim().parse::<f64>() {
                Ok(number) if number.is_finite() => Ok(AuxValue::Number(number)),
                _ => Err(mismatch()),
            },
            (AuxKind::Text, AuxValue::Text(text)) => Ok(AuxValue::Text(text)),
            (AuxKind::Text, other) => Ok(AuxValue::Text(other.to_string())),
            _ => Err(mismatch()),
        }
    }
}

/// Declarative rules for one widget kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeConstraint {
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub description: Option<String>,
    pub accepted_types: IndexSet<String>,
    #[serde(default)]
    pub multiple: bool,
    #[serde(default)]
    pub weighted: bool,
    #[serde(default)]
    pub eligibility: Eligibility,
    #[serde(default)]
    pub aux_properties: IndexMap<String, AuxProperty>,
}

impl TypeConstraint {
    pub fn aux_property(&self, name: &str) -> Result<&AuxProperty> {
        self.aux_properties
            .get(name)
            .ok_or_else(|| EngineError::UnknownProperty {
                name: name.to_string(),
                kind: self.kind.clone(),
            })
    }

    fn check(&self) -> Result<()> {
        if self.kind.trim().is_empty() {
            return Err(EngineError::InvalidRegistry(
                "widget kind must not be empty".to_string(),
            ));
        }
        if self.accepted_types.is_empty() {
            return Err(EngineError::InvalidRegistry(format!(
                "widget kind '{}' accepts no field types",
                self.kind
            )));
        }
        for (name, property) in &self.aux_properties {
            if property.default.kind() != property.kind {
                return Err(EngineError::InvalidRegistry(format!(
                    "default of '{}.{name}' is {} but the property is {}",
                    self.kind,
                    property.default.kind(),
                    property.kind
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number_property() -> AuxProperty {
        AuxProperty {
            label: "Size".to_string(),
            description: None,
            kind: AuxKind::Number,
            default: AuxValue::Number(10.0),
        }
    }

    #[test]
    fn number_property_accepts_numeric_text() {
        let coerced = number_property().coerce("size", " 25 ".into()).unwrap();
        assert_eq!(coerced, AuxValue::Number(25.0));
    }

    #[test]
    fn number_property_rejects_words() {
        let err = number_property().coerce("size", "lots".into()).unwrap_err();
        assert_eq!(
            err,
            EngineError::AuxTypeMismatch {
                name: "size".to_string(),
                expected: "number".to_string()
            }
        );
    }

    #[test]
    fn text_property_renders_other_values() {
        let property = AuxProperty {
            label: "Placeholder".to_string(),
            description: None,
            kind: AuxKind::Text,
            default: AuxValue::Text(String::new()),
        };
        assert_eq!(
            property.coerce("placeholder", AuxValue::Number(3.0)).unwrap(),
            AuxValue::Text("3".to_string())
        );
    }

    #[test]
    fn bool_property_accepts_switch_text() {
        let property = AuxProperty {
            label: "Highlight".to_string(),
            description: None,
            kind: AuxKind::Bool,
            default: AuxValue::Bool(false),
        };
        assert_eq!(
            property.coerce("highlight", "true".into()).unwrap(),
            AuxValue::Bool(true)
        );
        assert!(property.coerce("highlight", AuxValue::Number(1.0)).is_err());
    }

    #[test]
    fn accessors_match_the_variant() {
        let size = AuxValue::from(25);
        assert_eq!(size.as_f64(), Some(25.0));
        assert_eq!(size.as_bool(), None);
        assert_eq!(AuxValue::from(true).as_bool(), Some(true));
        assert_eq!(AuxValue::from("Search books").as_str(), Some("Search books"));
        assert_eq!(AuxValue::from(f64::from(i32::MAX)).as_f64(), Some(2147483647.0));
        assert_eq!(AuxValue::from("25").as_f64(), None);
    }
}

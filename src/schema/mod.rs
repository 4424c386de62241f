use indexmap::{IndexMap, IndexSet};
use serde_json::Value;

use crate::constraint::Eligibility;
use crate::domain::{SchemaField, parse_mappings};
use crate::error::{EngineError, Result};

/// Queryable view over a loaded mapping document. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct SchemaIndex {
    fields: IndexMap<String, SchemaField>,
}

impl SchemaIndex {
    pub fn new(fields: impl IntoIterator<Item = SchemaField>) -> Result<Self> {
        let mut map = IndexMap::new();
        for field in fields {
            if map.contains_key(&field.name) {
                return Err(EngineError::InvalidSchema(format!(
                    "field '{}' is declared twice",
                    field.name
                )));
            }
            map.insert(field.name.clone(), field);
        }
        Ok(Self { fields: map })
    }

    /// Build an index from a raw mapping document.
    pub fn from_value(document: &Value) -> Result<Self> {
        Self::new(parse_mappings(document)?)
    }

    pub fn field(&self, name: &str) -> Option<&SchemaField> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchemaField> {
        self.fields.values()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names a widget may choose as roots, in declaration order.
    ///
    /// With [`Eligibility::Declared`] only the field's own type counts; with
    /// [`Eligibility::DeclaredOrSubFields`] a matching sub-field type also
    /// makes the root eligible.
    pub fn fields(&self, accepted: &IndexSet<String>, eligibility: Eligibility) -> Vec<String> {
        self.fields
            .values()
            .filter(|field| is_eligible(field, accepted, eligibility))
            .map(|field| field.name.clone())
            .collect()
    }

    pub fn is_eligible(
        &self,
        name: &str,
        accepted: &IndexSet<String>,
        eligibility: Eligibility,
    ) -> bool {
        self.fields
            .get(name)
            .is_some_and(|field| is_eligible(field, accepted, eligibility))
    }

    /// Sub-fields of `field` whose type is accepted, rendered as `field.sub`.
    /// Unknown fields have no sub-fields.
    pub fn sub_fields(&self, field: &str, accepted: &IndexSet<String>) -> Vec<String> {
        let Some(field) = self.fields.get(field) else {
            return Vec::new();
        };
        field
            .sub_fields
            .iter()
            .filter(|sub| accepted.contains(&sub.field_type))
            .map(|sub| field.sub_field_path(sub))
            .collect()
    }
}

fn is_eligible(field: &SchemaField, accepted: &IndexSet<String>, eligibility: Eligibility) -> bool {
    if accepted.contains(&field.field_type) {
        return true;
    }
    match eligibility {
        Eligibility::Declared => false,
        Eligibility::DeclaredOrSubFields => field
            .sub_fields
            .iter()
            .any(|sub| accepted.contains(&sub.field_type)),
    }
}

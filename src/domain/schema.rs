use indexmap::IndexMap;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One entry of a mapping document as it arrives from the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RawFieldMapping {
    #[serde(rename = "type")]
    pub field_type: String,
    /// Local names of the index-time variants, in analysis order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub original_fields: IndexMap<String, RawSubField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RawSubField {
    #[serde(rename = "type")]
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubField {
    pub name: String,
    pub field_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaField {
    pub name: String,
    pub field_type: String,
    pub sub_fields: Vec<SubField>,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            sub_fields: Vec::new(),
        }
    }

    pub fn with_sub_field(mut self, name: impl Into<String>, field_type: impl Into<String>) -> Self {
        self.sub_fields.push(SubField {
            name: name.into(),
            field_type: field_type.into(),
        });
        self
    }

    /// Fully qualified path of a sub-field, e.g. `title.keyword`.
    pub fn sub_field_path(&self, sub: &SubField) -> String {
        format!("{}.{}", self.name, sub.name)
    }
}

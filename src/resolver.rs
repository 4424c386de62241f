use indexmap::IndexMap;
use serde::Serialize;

use crate::config::WidgetConfig;
use crate::constraint::{AuxValue, TypeConstraint};
use crate::error::{EngineError, Result};
use crate::schema::SchemaIndex;

/// Sub-field name that inherits its root's relevance weight.
pub const KEYWORD_SUB_FIELD: &str = "keyword";

/// Weight given to every other matching sub-field.
pub const SUB_FIELD_WEIGHT: u32 = 1;

/// Concrete field(s) a widget queries once its roots are expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum DataField {
    /// Single-root widgets bind to the first matching sub-field, if any.
    Single(Option<String>),
    Multiple(Vec<String>),
}

impl DataField {
    pub fn fields(&self) -> Vec<&str> {
        match self {
            DataField::Single(field) => field.as_deref().into_iter().collect(),
            DataField::Multiple(fields) => fields.iter().map(String::as_str).collect(),
        }
    }
}

/// What a caller hands to the widget at runtime.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedBinding {
    pub widget_id: String,
    pub data_field: DataField,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_weights: Option<Vec<u32>>,
    pub aux_values: IndexMap<String, AuxValue>,
}

/// Parse an operator-entered weight: a positive base-10 integer.
pub fn parse_weight(raw: &str) -> Result<u32> {
    match raw.trim().parse::<u32>() {
        Ok(weight) if weight > 0 => Ok(weight),
        _ => Err(EngineError::InvalidWeight {
            raw: raw.to_string(),
        }),
    }
}

/// Expands root fields into the concrete fields a widget operates over.
#[derive(Debug, Clone, Copy)]
pub struct FieldResolver<'a> {
    schema: &'a SchemaIndex,
    constraint: &'a TypeConstraint,
}

impl<'a> FieldResolver<'a> {
    pub fn new(schema: &'a SchemaIndex, constraint: &'a TypeConstraint) -> Self {
        Self { schema, constraint }
    }

    /// Expanded field list.
    ///
    /// Multi-root kinds emit every root followed by its matching sub-fields.
    /// Single-root kinds yield at most one entry: the first matching
    /// sub-field of the sole root.
    pub fn expand(&self, root_fields: &[String]) -> Vec<String> {
        if self.constraint.multiple {
            return root_fields
                .iter()
                .flat_map(|root| {
                    std::iter::once(root.clone()).chain(
                        self.schema
                            .sub_fields(root, &self.constraint.accepted_types),
                    )
                })
                .collect();
        }
        root_fields
            .first()
            .and_then(|root| self.expand_single(root))
            .into_iter()
            .collect()
    }

    pub fn expand_single(&self, root: &str) -> Option<String> {
        self.schema
            .sub_fields(root, &self.constraint.accepted_types)
            .into_iter()
            .next()
    }

    pub fn data_field(&self, root_fields: &[String]) -> DataField {
        if self.constraint.multiple {
            DataField::Multiple(self.expand(root_fields))
        } else {
            DataField::Single(root_fields.first().and_then(|root| self.expand_single(root)))
        }
    }

    /// Weights parallel to [`expand`](Self::expand) for multi-root kinds.
    ///
    /// Each root keeps its own weight; a sub-field named `keyword` inherits
    /// it and every other matching sub-field gets weight 1.
    pub fn expand_weights(&self, root_fields: &[String], per_root: &[u32]) -> Result<Vec<u32>> {
        if root_fields.len() != per_root.len() {
            return Err(EngineError::InvalidConfig(format!(
                "{} root field(s) but {} weight(s)",
                root_fields.len(),
                per_root.len()
            )));
        }
        let mut weights = Vec::with_capacity(root_fields.len());
        for (root, &weight) in root_fields.iter().zip(per_root) {
            weights.push(weight);
            let Some(field) = self.schema.field(root) else {
                continue;
            };
            weights.extend(
                field
                    .sub_fields
                    .iter()
                    .filter(|sub| self.constraint.accepted_types.contains(&sub.field_type))
                    .map(|sub| {
                        if sub.name == KEYWORD_SUB_FIELD {
                            weight
                        } else {
                            SUB_FIELD_WEIGHT
                        }
                    }),
            );
        }
        Ok(weights)
    }

    /// Same as [`expand_weights`](Self::expand_weights) for raw operator input.
    pub fn expand_weight_inputs<S: AsRef<str>>(
        &self,
        root_fields: &[String],
        per_root: &[S],
    ) -> Result<Vec<u32>> {
        let parsed = per_root
            .iter()
            .map(|raw| parse_weight(raw.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        self.expand_weights(root_fields, &parsed)
    }

    pub fn resolve(&self, config: &WidgetConfig) -> Result<ResolvedBinding> {
        let field_weights = match (&config.field_weights, self.constraint.weighted) {
            (Some(weights), true) => Some(self.expand_weights(&config.root_fields, weights)?),
            _ => None,
        };
        Ok(ResolvedBinding {
            widget_id: config.widget_id.clone(),
            data_field: self.data_field(&config.root_fields),
            field_weights,
            aux_values: config.effective_aux_values(self.constraint),
        })
    }
}

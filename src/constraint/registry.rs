use std::sync::{Arc, LazyLock};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{EngineError, Result};

use super::TypeConstraint;

macro_rules! constraints_source {
    () => {
        include_str!(concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/constraints/default.constraints.json"
        ))
    };
}

static BUILTIN: LazyLock<ConstraintRegistry> = LazyLock::new(|| {
    let raw: Value = serde_json::from_str(constraints_source!())
        .expect("invalid constraints/default.constraints.json");
    ConstraintRegistry::from_value(&raw).expect("invalid constraints/default.constraints.json")
});

/// Lookup table from widget kind to its [`TypeConstraint`].
///
/// Built once and never mutated; constraints are shared through `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    kinds: IndexMap<String, Arc<TypeConstraint>>,
}

impl ConstraintRegistry {
    /// The registry compiled into the crate (`search`, `filter`, `results`).
    pub fn builtin() -> &'static ConstraintRegistry {
        &BUILTIN
    }

    pub fn from_constraints(constraints: impl IntoIterator<Item = TypeConstraint>) -> Result<Self> {
        let mut kinds = IndexMap::new();
        for constraint in constraints {
            constraint.check()?;
            if kinds.contains_key(&constraint.kind) {
                return Err(EngineError::InvalidRegistry(format!(
                    "widget kind '{}' is registered twice",
                    constraint.kind
                )));
            }
            kinds.insert(constraint.kind.clone(), Arc::new(constraint));
        }
        debug!(kinds = kinds.len(), "constraint registry loaded");
        Ok(Self { kinds })
    }

    /// Parse a constraint table: a JSON array of constraint entries.
    pub fn from_value(table: &Value) -> Result<Self> {
        let constraints: Vec<TypeConstraint> = serde_json::from_value(table.clone())
            .map_err(|err| EngineError::InvalidRegistry(err.to_string()))?;
        Self::from_constraints(constraints)
    }

    pub fn constraint_for(&self, kind: &str) -> Result<Arc<TypeConstraint>> {
        self.kinds
            .get(kind)
            .cloned()
            .ok_or_else(|| EngineError::UnknownWidgetKind(kind.to_string()))
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.kinds.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeConstraint> {
        self.kinds.values().map(Arc::as_ref)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

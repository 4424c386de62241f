use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures produced by the field-mapping engine.
///
/// `IneligibleField` and `InvalidWeight` are operator mistakes and are also
/// surfaced through the session notifier. `IndexOutOfRange` and
/// `UnknownProperty` mean the caller passed a stale index or a wrong name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown widget kind '{0}'")]
    UnknownWidgetKind(String),

    #[error("schema has no field eligible for widget kind '{kind}'")]
    NoEligibleField { kind: String },

    #[error("field '{field}' cannot be used by this widget")]
    IneligibleField { field: String },

    #[error("row {index} is out of range ({len} row(s))")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("'{raw}' is not a valid weight; expected a positive whole number")]
    InvalidWeight { raw: String },

    #[error("property '{name}' is not declared for widget kind '{kind}'")]
    UnknownProperty { name: String, kind: String },

    #[error("property '{name}' expects a {expected} value")]
    AuxTypeMismatch { name: String, expected: String },

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    #[error("invalid constraint table: {0}")]
    InvalidRegistry(String),

    #[error("invalid widget configuration: {0}")]
    InvalidConfig(String),

    #[error("widget '{0}' already has an open edit session")]
    SessionAlreadyOpen(String),

    #[error("widget '{0}' has no open edit session")]
    NotEditing(String),

    #[error("unknown widget '{0}'")]
    UnknownWidget(String),

    #[error("widget '{0}' is already attached")]
    DuplicateWidget(String),
}

impl EngineError {
    /// True for mistakes an operator can make through the edit form.
    pub fn is_user_input(&self) -> bool {
        matches!(
            self,
            EngineError::IneligibleField { .. }
                | EngineError::InvalidWeight { .. }
                | EngineError::AuxTypeMismatch { .. }
        )
    }

    /// True for errors that mean the caller broke the engine's contract.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            EngineError::IndexOutOfRange { .. }
                | EngineError::UnknownProperty { .. }
                | EngineError::SessionAlreadyOpen(_)
                | EngineError::NotEditing(_)
        )
    }
}

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::config::{ConfigFactory, WidgetConfig};
use crate::constraint::{ConstraintRegistry, TypeConstraint};
use crate::error::{EngineError, Result};
use crate::options::EngineOptions;
use crate::resolver::{FieldResolver, ResolvedBinding};
use crate::schema::SchemaIndex;
use crate::store::ConfigStore;

use super::EditSession;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorState {
    Idle,
    Editing,
}

/// One attached widget: its committed baseline plus at most one open session.
#[derive(Debug, Clone)]
pub struct WidgetEditor {
    baseline: WidgetConfig,
    schema: Arc<SchemaIndex>,
    constraint: Arc<TypeConstraint>,
    options: EngineOptions,
    session: Option<EditSession>,
}

impl WidgetEditor {
    /// Attach a new widget with the factory default configuration.
    pub fn attach(
        widget_id: &str,
        kind: &str,
        registry: &ConstraintRegistry,
        schema: Arc<SchemaIndex>,
        options: EngineOptions,
    ) -> Result<Self> {
        let baseline = ConfigFactory::new(registry)
            .with_options(options)
            .default_config(widget_id, kind, &schema)?;
        let constraint = registry.constraint_for(kind)?;
        Ok(Self {
            baseline,
            schema,
            constraint,
            options,
            session: None,
        })
    }

    /// Wrap an already stored configuration after checking its invariants.
    pub fn restore(
        mut config: WidgetConfig,
        registry: &ConstraintRegistry,
        schema: Arc<SchemaIndex>,
        options: EngineOptions,
    ) -> Result<Self> {
        let constraint = registry.constraint_for(&config.kind)?;
        config.normalize_aux_values(&constraint)?;
        config.validate(&schema, &constraint)?;
        Ok(Self {
            baseline: config,
            schema,
            constraint,
            options,
            session: None,
        })
    }

    pub fn widget_id(&self) -> &str {
        &self.baseline.widget_id
    }

    /// Last committed configuration.
    pub fn config(&self) -> &WidgetConfig {
        &self.baseline
    }

    pub fn constraint(&self) -> &TypeConstraint {
        &self.constraint
    }

    pub fn resolver(&self) -> FieldResolver<'_> {
        FieldResolver::new(&self.schema, &self.constraint)
    }

    /// Binding for the committed configuration.
    pub fn resolved(&self) -> Result<ResolvedBinding> {
        self.resolver().resolve(&self.baseline)
    }

    pub fn state(&self) -> EditorState {
        if self.session.is_some() {
            EditorState::Editing
        } else {
            EditorState::Idle
        }
    }

    /// Open a session whose draft is a fresh copy of the baseline.
    pub fn begin_edit(&mut self) -> Result<&mut EditSession> {
        if self.session.is_some() {
            let err = EngineError::SessionAlreadyOpen(self.baseline.widget_id.clone());
            warn!(%err, "contract violation");
            return Err(err);
        }
        debug!(widget_id = %self.baseline.widget_id, "edit session opened");
        let session = EditSession::open(
            &self.baseline,
            Arc::clone(&self.schema),
            Arc::clone(&self.constraint),
            self.options,
        );
        Ok(self.session.insert(session))
    }

    pub fn session(&self) -> Option<&EditSession> {
        self.session.as_ref()
    }

    pub fn session_mut(&mut self) -> Result<&mut EditSession> {
        match self.session.as_mut() {
            Some(session) => Ok(session),
            None => Err(EngineError::NotEditing(self.baseline.widget_id.clone())),
        }
    }

    /// True when the open draft differs from the baseline.
    pub fn is_dirty(&self) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.draft() != &self.baseline)
    }

    /// Replace the baseline with the draft in one step and hand it to `store`.
    pub fn commit<S: ConfigStore + ?Sized>(&mut self, store: &mut S) -> Result<&WidgetConfig> {
        let Some(session) = self.session.as_ref() else {
            return Err(EngineError::NotEditing(self.baseline.widget_id.clone()));
        };
        // the session stays open when the draft is somehow invalid
        session.draft().validate(&self.schema, &self.constraint)?;
        if let Some(session) = self.session.take() {
            self.baseline = session.into_draft();
        }
        info!(widget_id = %self.baseline.widget_id, "widget config committed");
        store.on_commit(&self.baseline.widget_id, &self.baseline);
        Ok(&self.baseline)
    }

    /// Drop the draft; the baseline is untouched.
    pub fn discard(&mut self) -> Result<()> {
        match self.session.take() {
            Some(_) => {
                debug!(widget_id = %self.baseline.widget_id, "edit session discarded");
                Ok(())
            }
            None => Err(EngineError::NotEditing(self.baseline.widget_id.clone())),
        }
    }

    pub fn tick(&mut self, now: Instant) -> bool {
        self.session
            .as_mut()
            .is_some_and(|session| session.tick(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn editor(kind: &str) -> WidgetEditor {
        let schema = SchemaIndex::from_value(&json!({
            "title": {"type": "text"},
            "author": {"type": "text"}
        }))
        .unwrap();
        WidgetEditor::attach(
            "w1",
            kind,
            ConstraintRegistry::builtin(),
            Arc::new(schema),
            EngineOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn second_session_is_refused() {
        let mut editor = editor("search");
        editor.begin_edit().unwrap();
        assert_eq!(editor.state(), EditorState::Editing);
        assert_eq!(
            editor.begin_edit().unwrap_err(),
            EngineError::SessionAlreadyOpen("w1".to_string())
        );
    }

    #[test]
    fn discard_keeps_baseline_and_next_session_starts_fresh() {
        let mut editor = editor("search");
        let before = editor.config().clone();
        editor.begin_edit().unwrap().add_root_field_row();
        assert!(editor.is_dirty());
        editor.discard().unwrap();
        assert_eq!(editor.state(), EditorState::Idle);
        assert_eq!(editor.config(), &before);

        let session = editor.begin_edit().unwrap();
        assert_eq!(session.draft(), &before);
    }

    #[test]
    fn commit_replaces_baseline_and_notifies_store() {
        let mut editor = editor("search");
        let mut store = MemoryStore::default();
        editor.begin_edit().unwrap().add_root_field_row();
        editor.commit(&mut store).unwrap();
        assert_eq!(editor.config().root_fields, ["title", "author"]);
        assert_eq!(store.get("w1"), Some(editor.config()));
        assert_eq!(store.commit_count(), 1);
        assert_eq!(editor.state(), EditorState::Idle);
    }

    #[test]
    fn commit_and_discard_need_a_session() {
        let mut editor = editor("search");
        let mut store = MemoryStore::default();
        assert_eq!(
            editor.commit(&mut store).unwrap_err(),
            EngineError::NotEditing("w1".to_string())
        );
        assert!(editor.discard().is_err());
        assert!(editor.session_mut().is_err());
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn restore_rejects_invalid_configs() {
        let schema = Arc::new(SchemaIndex::from_value(&json!({"title": {"type": "text"}})).unwrap());
        let config = WidgetConfig {
            widget_id: "w1".to_string(),
            kind: "filter".to_string(),
            root_fields: vec!["title".to_string()],
            field_weights: None,
            aux_values: Default::default(),
        };
        let err = WidgetEditor::restore(
            config,
            ConstraintRegistry::builtin(),
            schema,
            EngineOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::IneligibleField {
                field: "title".to_string()
            }
        );
    }
}

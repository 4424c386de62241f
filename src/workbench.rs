use std::sync::Arc;
use std::time::Instant;

use indexmap::IndexMap;
use tracing::info;

use crate::config::WidgetConfig;
use crate::constraint::ConstraintRegistry;
use crate::error::{EngineError, Result};
use crate::options::EngineOptions;
use crate::schema::SchemaIndex;
use crate::session::{EditSession, WidgetEditor};
use crate::store::ConfigStore;

/// Independent widget editors over one schema, backed by a caller store.
#[derive(Debug)]
pub struct Workbench<S: ConfigStore> {
    schema: Arc<SchemaIndex>,
    registry: ConstraintRegistry,
    options: EngineOptions,
    editors: IndexMap<String, WidgetEditor>,
    store: S,
}

impl<S: ConfigStore> Workbench<S> {
    pub fn new(schema: SchemaIndex, registry: ConstraintRegistry, store: S) -> Self {
        Self {
            schema: Arc::new(schema),
            registry,
            options: EngineOptions::default(),
            editors: IndexMap::new(),
            store,
        }
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn schema(&self) -> &SchemaIndex {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn widget_ids(&self) -> impl Iterator<Item = &str> {
        self.editors.keys().map(String::as_str)
    }

    /// Attach a widget with its default configuration. Fails without
    /// attaching anything when the kind is unknown or no field fits.
    pub fn attach(&mut self, widget_id: &str, kind: &str) -> Result<&mut WidgetEditor> {
        if self.editors.contains_key(widget_id) {
            return Err(EngineError::DuplicateWidget(widget_id.to_string()));
        }
        let editor = WidgetEditor::attach(
            widget_id,
            kind,
            &self.registry,
            Arc::clone(&self.schema),
            self.options,
        )?;
        self.store.on_attach(widget_id, editor.config());
        info!(widget_id, kind, "widget attached");
        Ok(self.editors.entry(widget_id.to_string()).or_insert(editor))
    }

    /// Re-attach a widget from a previously stored configuration.
    pub fn restore(&mut self, config: WidgetConfig) -> Result<&mut WidgetEditor> {
        if self.editors.contains_key(&config.widget_id) {
            return Err(EngineError::DuplicateWidget(config.widget_id));
        }
        let widget_id = config.widget_id.clone();
        let editor =
            WidgetEditor::restore(config, &self.registry, Arc::clone(&self.schema), self.options)?;
        Ok(self.editors.entry(widget_id).or_insert(editor))
    }

    pub fn editor(&self, widget_id: &str) -> Result<&WidgetEditor> {
        self.editors
            .get(widget_id)
            .ok_or_else(|| EngineError::UnknownWidget(widget_id.to_string()))
    }

    pub fn editor_mut(&mut self, widget_id: &str) -> Result<&mut WidgetEditor> {
        self.editors
            .get_mut(widget_id)
            .ok_or_else(|| EngineError::UnknownWidget(widget_id.to_string()))
    }

    pub fn begin_edit(&mut self, widget_id: &str) -> Result<&mut EditSession> {
        self.editor_mut(widget_id)?.begin_edit()
    }

    pub fn session_mut(&mut self, widget_id: &str) -> Result<&mut EditSession> {
        self.editor_mut(widget_id)?.session_mut()
    }

    pub fn commit(&mut self, widget_id: &str) -> Result<WidgetConfig> {
        let editor = self
            .editors
            .get_mut(widget_id)
            .ok_or_else(|| EngineError::UnknownWidget(widget_id.to_string()))?;
        editor.commit(&mut self.store).cloned()
    }

    pub fn discard(&mut self, widget_id: &str) -> Result<()> {
        self.editor_mut(widget_id)?.discard()
    }

    /// Remove a widget, dropping any open session before the store hears of it.
    pub fn delete(&mut self, widget_id: &str) -> Result<()> {
        let editor = self
            .editors
            .shift_remove(widget_id)
            .ok_or_else(|| EngineError::UnknownWidget(widget_id.to_string()))?;
        drop(editor);
        self.store.on_delete(widget_id);
        info!(widget_id, "widget deleted");
        Ok(())
    }

    /// Advance notice expiry for every open session.
    pub fn tick(&mut self, now: Instant) {
        for editor in self.editors.values_mut() {
            editor.tick(now);
        }
    }
}

use indexmap::IndexMap;

use crate::config::WidgetConfig;

/// Caller-side persistence for widget configurations.
pub trait ConfigStore {
    /// Called once per successful commit with the whole replacement config.
    fn on_commit(&mut self, widget_id: &str, config: &WidgetConfig);

    /// Called after the engine has dropped every reference to the widget.
    fn on_delete(&mut self, widget_id: &str);

    /// Called when a widget is attached with its factory default.
    fn on_attach(&mut self, _widget_id: &str, _config: &WidgetConfig) {}
}

/// In-memory [`ConfigStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    configs: IndexMap<String, WidgetConfig>,
    commits: usize,
}

impl MemoryStore {
    pub fn get(&self, widget_id: &str) -> Option<&WidgetConfig> {
        self.configs.get(widget_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &WidgetConfig> {
        self.configs.values()
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    /// Number of commits received so far.
    pub fn commit_count(&self) -> usize {
        self.commits
    }
}

impl ConfigStore for MemoryStore {
    fn on_commit(&mut self, widget_id: &str, config: &WidgetConfig) {
        self.commits += 1;
        self.configs.insert(widget_id.to_string(), config.clone());
    }

    fn on_delete(&mut self, widget_id: &str) {
        self.configs.shift_remove(widget_id);
    }

    fn on_attach(&mut self, widget_id: &str, config: &WidgetConfig) {
        self.configs.insert(widget_id.to_string(), config.clone());
    }
}

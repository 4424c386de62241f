use std::time::Duration;

/// How long a validation notice stays visible.
pub const DEFAULT_NOTICE_TTL: Duration = Duration::from_secs(3);

/// Relevance weight seeded for newly selected search fields.
pub const DEFAULT_FIELD_WEIGHT: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub notice_ttl: Duration,
    pub default_weight: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            notice_ttl: DEFAULT_NOTICE_TTL,
            default_weight: DEFAULT_FIELD_WEIGHT,
        }
    }
}

impl EngineOptions {
    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    /// Weight used by the config factory and when a search row is added.
    /// Zero is bumped to one since weights are positive.
    pub fn with_default_weight(mut self, weight: u32) -> Self {
        self.default_weight = weight.max(1);
        self
    }
}

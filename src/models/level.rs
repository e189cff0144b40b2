//! Generic Level server model.

use std::sync::Arc;

use crate::models::registry::Publication;

/// Invoked with the new level whenever it changes, from a network set or
/// the local API. Called without registry locks held.
pub type LevelChanged = Arc<dyn Fn(i16) + Send + Sync>;

/// Configuration for one Generic Level server instance.
#[derive(Clone)]
pub struct LevelConfig {
    pub initial: i16,
    /// Allocate a publication context so status updates can be published.
    pub publish: bool,
    pub on_change: Option<LevelChanged>,
}

impl LevelConfig {
    pub fn new(initial: i16) -> Self {
        Self { initial, publish: true, on_change: None }
    }

    pub fn on_change(mut self, f: impl Fn(i16) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn with_publication(mut self, enabled: bool) -> Self {
        self.publish = enabled;
        self
    }
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Runtime state for one Level entry.
pub(crate) struct LevelState {
    pub(crate) value: i16,
    pub(crate) on_change: Option<LevelChanged>,
    pub(crate) publication: Publication,
}

impl LevelState {
    pub(crate) fn new(config: LevelConfig) -> Self {
        Self {
            value: config.initial,
            on_change: config.on_change,
            publication: Publication::new(config.publish),
        }
    }
}

/// Generic Level Status payload: the present level, little-endian.
pub fn encode_status(level: i16) -> [u8; 2] {
    level.to_le_bytes()
}

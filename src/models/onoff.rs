//! Generic OnOff server model.

use std::sync::Arc;

use crate::models::registry::Publication;

/// Invoked with the new value whenever the on/off state changes, from a
/// network set or the local API. Called without registry locks held.
pub type OnOffChanged = Arc<dyn Fn(bool) + Send + Sync>;

/// Configuration for one Generic OnOff server instance.
#[derive(Clone)]
pub struct OnOffConfig {
    pub initial: bool,
    /// Allocate a publication context so status updates can be published.
    pub publish: bool,
    pub on_change: Option<OnOffChanged>,
}

impl OnOffConfig {
    pub fn new(initial: bool) -> Self {
        Self { initial, publish: true, on_change: None }
    }

    pub fn on_change(mut self, f: impl Fn(bool) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Arc::new(f));
        self
    }

    pub fn with_publication(mut self, enabled: bool) -> Self {
        self.publish = enabled;
        self
    }
}

impl Default for OnOffConfig {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Runtime state for one OnOff entry.
pub(crate) struct OnOffState {
    pub(crate) value: bool,
    pub(crate) on_change: Option<OnOffChanged>,
    pub(crate) publication: Publication,
}

impl OnOffState {
    pub(crate) fn new(config: OnOffConfig) -> Self {
        Self {
            value: config.initial,
            on_change: config.on_change,
            publication: Publication::new(config.publish),
        }
    }
}

/// Generic OnOff Status payload: a single present-state byte.
pub fn encode_status(value: bool) -> [u8; 1] {
    [value as u8]
}

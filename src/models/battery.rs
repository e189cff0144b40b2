//! Generic Battery server model.

use std::sync::Arc;
use std::time::Duration;

use crate::error::MeshResult;
use crate::models::registry::Publication;

/// Reads the current battery percentage from the application. Called
/// without registry locks held.
pub type BatteryRead = Arc<dyn Fn() -> MeshResult<u8> + Send + Sync>;

/// Level reported until the first set or successful callback read.
pub const DEFAULT_LEVEL: u8 = 100;

/// Upper bound of the valid percentage range.
pub const LEVEL_MAX: u8 = 100;

// Time-to-discharge and time-to-charge are 24-bit fields; all ones marks
// them unknown.
const TIME_UNKNOWN: [u8; 3] = [0xFF, 0xFF, 0xFF];

// Flags byte: presence, indicator, charging, and serviceability unknown.
const FLAGS_UNKNOWN: u8 = 0x00;

/// Configuration for one Generic Battery server instance.
#[derive(Clone)]
pub struct BatteryConfig {
    /// Refreshes the level on gets and publishes. Without it the model
    /// reports whatever was last set locally.
    pub read: Option<BatteryRead>,
    /// Interval for periodic publishing; `None` leaves publishing manual.
    pub publish_period: Option<Duration>,
    /// Allocate a publication context so status updates can be published.
    pub publish: bool,
}

impl BatteryConfig {
    pub fn new() -> Self {
        Self { read: None, publish_period: None, publish: true }
    }

    pub fn with_reader(mut self, f: impl Fn() -> MeshResult<u8> + Send + Sync + 'static) -> Self {
        self.read = Some(Arc::new(f));
        self
    }

    pub fn with_publish_period(mut self, period: Duration) -> Self {
        self.publish_period = Some(period);
        self
    }

    pub fn with_publication(mut self, enabled: bool) -> Self {
        self.publish = enabled;
        self
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime state for one Battery entry.
pub(crate) struct BatteryState {
    pub(crate) level: u8,
    pub(crate) read: Option<BatteryRead>,
    pub(crate) publish_period: Option<Duration>,
    pub(crate) publication: Publication,
}

impl BatteryState {
    pub(crate) fn new(config: BatteryConfig) -> Self {
        Self {
            level: DEFAULT_LEVEL,
            read: config.read,
            publish_period: config.publish_period,
            publication: Publication::new(config.publish),
        }
    }

    /// Clamps a level into the valid percentage range.
    pub(crate) fn clamp(level: u8) -> u8 {
        level.min(LEVEL_MAX)
    }
}

/// Generic Battery Status payload: level, time to discharge, time to
/// charge, flags. Only the level is known; the rest is marked unknown.
pub fn encode_status(level: u8) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[0] = level;
    out[1..4].copy_from_slice(&TIME_UNKNOWN);
    out[4..7].copy_from_slice(&TIME_UNKNOWN);
    out[7] = FLAGS_UNKNOWN;
    out
}

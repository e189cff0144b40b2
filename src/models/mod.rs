//! Mesh model kinds, per-kind configuration, and the model registry.

pub mod battery;
pub mod level;
pub mod onoff;
pub mod registry;
pub mod sensor;
pub mod vendor;

pub use battery::{BatteryConfig, BatteryRead};
pub use level::{LevelChanged, LevelConfig};
pub use onoff::{OnOffChanged, OnOffConfig};
pub use registry::{ModelRegistry, Publication, RegistryEntry, MAX_MODELS};
pub use sensor::{SensorConfig, SensorRead, SensorSpec};
pub use vendor::{VendorConfig, VendorHandler, VendorMessage};

use std::fmt;

use serde::{Deserialize, Serialize};

/// Model kinds a node can host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    OnOff,
    Level,
    Sensor,
    PowerLevel,
    Battery,
    Vendor,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::OnOff => "OnOff",
            ModelKind::Level => "Level",
            ModelKind::Sensor => "Sensor",
            ModelKind::PowerLevel => "PowerLevel",
            ModelKind::Battery => "Battery",
            ModelKind::Vendor => "Vendor",
        };
        f.write_str(name)
    }
}

/// A user-declared model, one variant per kind. Declaration order fixes
/// both element slot order and per-kind instance indices.
#[derive(Clone)]
pub enum ModelConfig {
    OnOff(OnOffConfig),
    Level(LevelConfig),
    Sensor(SensorConfig),
    /// Declared in the wire vocabulary but not implemented; registration
    /// returns [`MeshError::Unsupported`](crate::MeshError::Unsupported).
    PowerLevel,
    Battery(BatteryConfig),
    Vendor(VendorConfig),
}

impl ModelConfig {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelConfig::OnOff(_) => ModelKind::OnOff,
            ModelConfig::Level(_) => ModelKind::Level,
            ModelConfig::Sensor(_) => ModelKind::Sensor,
            ModelConfig::PowerLevel => ModelKind::PowerLevel,
            ModelConfig::Battery(_) => ModelKind::Battery,
            ModelConfig::Vendor(_) => ModelKind::Vendor,
        }
    }
}

//! The model registry: an append-only, fixed-capacity table mapping
//! declared models onto element slots.

use dashmap::DashMap;
use log::info;

use crate::error::{MeshError, MeshResult};
use crate::models::battery::BatteryState;
use crate::models::level::LevelState;
use crate::models::onoff::OnOffState;
use crate::models::sensor::SensorState;
use crate::models::vendor::{self, VendorConfig, VendorState};
use crate::models::{ModelConfig, ModelKind};
use crate::stack::composition::{AutoRespond, StackModel};
use crate::stack::{ModelHandle, ModelId, ADDR_UNASSIGNED};

/// Maximum number of user-declared models per node. The mandatory Config
/// Server does not count against it.
pub const MAX_MODELS: usize = 8;

/// Publication record for one model: allocated at registration, addressed
/// by the provisioner during configuration.
#[derive(Debug, Clone, Copy)]
pub struct Publication {
    enabled: bool,
    address: u16,
}

impl Publication {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled, address: ADDR_UNASSIGNED }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn address(&self) -> u16 {
        self.address
    }

    /// Destination for a publish, once enabled and assigned.
    pub fn target(&self) -> Option<u16> {
        if self.enabled && self.address != ADDR_UNASSIGNED {
            Some(self.address)
        } else {
            None
        }
    }

    pub(crate) fn set_address(&mut self, address: u16) {
        self.address = address;
    }
}

/// Kind-specific runtime state, owned by the entry.
pub(crate) enum ModelState {
    OnOff(OnOffState),
    Level(LevelState),
    Sensor(SensorState),
    Battery(BatteryState),
    Vendor(VendorState),
}

/// One registered model instance.
pub struct RegistryEntry {
    index: usize,
    kind: ModelKind,
    handle: ModelHandle,
    pub(crate) state: ModelState,
}

impl RegistryEntry {
    /// Position in overall registration order, across kinds.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// Primary slot. A sensor's Setup companion occupies the next SIG
    /// slot and routes to the same entry.
    pub fn handle(&self) -> ModelHandle {
        self.handle
    }

    pub(crate) fn publication(&self) -> &Publication {
        match &self.state {
            ModelState::OnOff(s) => &s.publication,
            ModelState::Level(s) => &s.publication,
            ModelState::Sensor(s) => &s.publication,
            ModelState::Battery(s) => &s.publication,
            ModelState::Vendor(s) => &s.publication,
        }
    }

    pub(crate) fn publication_mut(&mut self) -> &mut Publication {
        match &mut self.state {
            ModelState::OnOff(s) => &mut s.publication,
            ModelState::Level(s) => &mut s.publication,
            ModelState::Sensor(s) => &mut s.publication,
            ModelState::Battery(s) => &mut s.publication,
            ModelState::Vendor(s) => &mut s.publication,
        }
    }

    pub(crate) fn onoff(&self) -> Option<&OnOffState> {
        match &self.state {
            ModelState::OnOff(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn onoff_mut(&mut self) -> Option<&mut OnOffState> {
        match &mut self.state {
            ModelState::OnOff(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn level(&self) -> Option<&LevelState> {
        match &self.state {
            ModelState::Level(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn level_mut(&mut self) -> Option<&mut LevelState> {
        match &mut self.state {
            ModelState::Level(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn sensor(&self) -> Option<&SensorState> {
        match &self.state {
            ModelState::Sensor(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn sensor_mut(&mut self) -> Option<&mut SensorState> {
        match &mut self.state {
            ModelState::Sensor(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn battery(&self) -> Option<&BatteryState> {
        match &self.state {
            ModelState::Battery(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn battery_mut(&mut self) -> Option<&mut BatteryState> {
        match &mut self.state {
            ModelState::Battery(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn vendor(&self) -> Option<&VendorState> {
        match &self.state {
            ModelState::Vendor(s) => Some(s),
            _ => None,
        }
    }
}

/// Append-only table of registered models, plus the element slot tables
/// built alongside it for the stack.
pub struct ModelRegistry {
    entries: Vec<RegistryEntry>,
    sig_models: Vec<StackModel>,
    vendor_models: Vec<StackModel>,
    by_handle: DashMap<ModelHandle, usize>,
}

impl ModelRegistry {
    /// Starts with the mandatory Configuration Server in SIG slot 0.
    pub fn new() -> Self {
        let mut sig_models = Vec::with_capacity(MAX_MODELS + 1);
        sig_models.push(StackModel {
            handle: ModelHandle::sig(0),
            id: ModelId::CONFIG_SERVER,
            publish: false,
            auto_respond: AutoRespond::ALL,
            opcodes: Vec::new(),
        });
        Self {
            entries: Vec::new(),
            sig_models,
            vendor_models: Vec::new(),
            by_handle: DashMap::new(),
        }
    }

    /// Registers one model, claiming element slots in declaration order.
    /// Failures leave the registry untouched.
    pub fn register(&mut self, config: ModelConfig) -> MeshResult<ModelHandle> {
        if self.entries.len() >= MAX_MODELS {
            return Err(MeshError::CapacityExceeded { max: MAX_MODELS });
        }
        let kind = config.kind();
        let index = self.entries.len();
        let (handle, state) = match config {
            ModelConfig::OnOff(cfg) => {
                let handle =
                    self.push_sig(ModelId::GEN_ONOFF_SERVER, cfg.publish, AutoRespond::ALL);
                (handle, ModelState::OnOff(OnOffState::new(cfg)))
            }
            ModelConfig::Level(cfg) => {
                let handle =
                    self.push_sig(ModelId::GEN_LEVEL_SERVER, cfg.publish, AutoRespond::ALL);
                (handle, ModelState::Level(LevelState::new(cfg)))
            }
            ModelConfig::Sensor(cfg) => {
                if cfg.sensors.is_empty() {
                    return Err(MeshError::InvalidConfig(
                        "sensor model declares no sensors".into(),
                    ));
                }
                if cfg.sensors.iter().any(|s| s.publish_period == Some(std::time::Duration::ZERO)) {
                    return Err(MeshError::InvalidConfig(
                        "sensor publish period must be non-zero".into(),
                    ));
                }
                let handle =
                    self.push_sig(ModelId::SENSOR_SERVER, cfg.publish, AutoRespond::BY_APP);
                // The stack mandates a Setup companion next to every
                // Sensor Server; it shares this entry.
                let setup =
                    self.push_sig(ModelId::SENSOR_SETUP_SERVER, true, AutoRespond::BY_APP);
                self.by_handle.insert(setup, index);
                (handle, ModelState::Sensor(SensorState::new(cfg)))
            }
            ModelConfig::PowerLevel => {
                return Err(MeshError::Unsupported(ModelKind::PowerLevel));
            }
            ModelConfig::Battery(cfg) => {
                if cfg.publish_period == Some(std::time::Duration::ZERO) {
                    return Err(MeshError::InvalidConfig(
                        "battery publish period must be non-zero".into(),
                    ));
                }
                let handle =
                    self.push_sig(ModelId::GEN_BATTERY_SERVER, cfg.publish, AutoRespond::BY_APP);
                (handle, ModelState::Battery(BatteryState::new(cfg)))
            }
            ModelConfig::Vendor(cfg) => {
                vendor::validate(&cfg)?;
                let handle = self.push_vendor(&cfg);
                (handle, ModelState::Vendor(VendorState::new(cfg)))
            }
        };
        self.by_handle.insert(handle, index);
        self.entries.push(RegistryEntry { index, kind, handle, state });
        info!("Registered {} model #{} at {}", kind, index, handle);
        Ok(handle)
    }

    fn push_sig(&mut self, id: ModelId, publish: bool, auto_respond: AutoRespond) -> ModelHandle {
        let handle = ModelHandle::sig(self.sig_models.len() as u8);
        self.sig_models.push(StackModel {
            handle,
            id,
            publish,
            auto_respond,
            opcodes: Vec::new(),
        });
        handle
    }

    fn push_vendor(&mut self, cfg: &VendorConfig) -> ModelHandle {
        let handle = ModelHandle::vendor(self.vendor_models.len() as u8);
        self.vendor_models.push(StackModel {
            handle,
            id: ModelId::Vendor { company_id: cfg.company_id, model_id: cfg.model_id },
            publish: cfg.publish,
            auto_respond: AutoRespond::BY_APP,
            opcodes: cfg.opcodes.clone(),
        });
        handle
    }

    /// The `index`-th registered model of `kind`, counting registration
    /// order within that kind.
    pub fn find(&self, kind: ModelKind, index: usize) -> Option<&RegistryEntry> {
        self.entries.iter().filter(|e| e.kind == kind).nth(index)
    }

    pub(crate) fn find_mut(&mut self, kind: ModelKind, index: usize) -> Option<&mut RegistryEntry> {
        self.entries.iter_mut().filter(|e| e.kind == kind).nth(index)
    }

    /// Resolves an element slot back to its registry entry.
    pub fn entry_by_handle(&self, handle: ModelHandle) -> Option<&RegistryEntry> {
        let index = *self.by_handle.get(&handle)?;
        self.entries.get(index)
    }

    pub(crate) fn entry_by_handle_mut(&mut self, handle: ModelHandle) -> Option<&mut RegistryEntry> {
        let index = *self.by_handle.get(&handle)?;
        self.entries.get_mut(index)
    }

    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn sig_models(&self) -> &[StackModel] {
        &self.sig_models
    }

    pub(crate) fn vendor_models(&self) -> &[StackModel] {
        &self.vendor_models
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}

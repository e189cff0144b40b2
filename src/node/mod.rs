//! The mesh node: owns the registry, drives the stack, and exposes the
//! typed model API.

mod dispatch;
mod publisher;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{MeshError, MeshResult};
use crate::models::battery::BatteryState;
use crate::models::registry::{ModelRegistry, RegistryEntry};
use crate::models::{battery, level, onoff, sensor, ModelConfig, ModelKind};
use crate::stack::composition::{DEFAULT_COMPANY_ID, DEFAULT_PRODUCT_ID, DEFAULT_VERSION_ID};
use crate::stack::{
    Bearers, Composition, DeviceIdentity, MeshStack, MessageContext, ModelHandle, Opcode,
};

/// Device name used when none is configured.
pub const DEFAULT_DEVICE_NAME: &str = "mesh-node";

/// Lifecycle notifications the surrounding application can subscribe to.
/// All hooks are called without registry locks held.
#[derive(Clone, Default)]
pub struct NodeHooks {
    /// Provisioning completed; the argument is the assigned unicast
    /// address.
    pub provisioned: Option<Arc<dyn Fn(u16) + Send + Sync>>,
    /// The provisioner reset the node.
    pub reset: Option<Arc<dyn Fn() + Send + Sync>>,
    /// An application key was added; the argument is its index.
    pub config_complete: Option<Arc<dyn Fn(u16) + Send + Sync>>,
}

impl NodeHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_provisioned(mut self, f: impl Fn(u16) + Send + Sync + 'static) -> Self {
        self.provisioned = Some(Arc::new(f));
        self
    }

    pub fn on_reset(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.reset = Some(Arc::new(f));
        self
    }

    pub fn on_config_complete(mut self, f: impl Fn(u16) + Send + Sync + 'static) -> Self {
        self.config_complete = Some(Arc::new(f));
        self
    }
}

/// Node-level configuration supplied once at startup.
#[derive(Clone)]
pub struct NodeConfig {
    pub device_name: String,
    /// Leading bytes of the device UUID; provisioners filter candidates
    /// on these.
    pub uuid_prefix: [u8; 2],
    pub company_id: u16,
    pub product_id: u16,
    pub version_id: u16,
    /// Ordered model declarations. Order fixes element slots and
    /// per-kind instance indices.
    pub models: Vec<ModelConfig>,
    pub hooks: NodeHooks,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            device_name: DEFAULT_DEVICE_NAME.to_string(),
            uuid_prefix: [0x00, 0x00],
            company_id: DEFAULT_COMPANY_ID,
            product_id: DEFAULT_PRODUCT_ID,
            version_id: DEFAULT_VERSION_ID,
            models: Vec::new(),
            hooks: NodeHooks::default(),
        }
    }
}

impl NodeConfig {
    pub fn new(device_name: impl Into<String>) -> Self {
        Self { device_name: device_name.into(), ..Default::default() }
    }

    pub fn with_uuid_prefix(mut self, prefix: [u8; 2]) -> Self {
        self.uuid_prefix = prefix;
        self
    }

    pub fn with_model(mut self, model: ModelConfig) -> Self {
        self.models.push(model);
        self
    }

    pub fn with_hooks(mut self, hooks: NodeHooks) -> Self {
        self.hooks = hooks;
        self
    }
}

/// Network-assigned state, populated as provisioning and configuration
/// progress.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeInfo {
    pub provisioned: bool,
    pub unicast_addr: Option<u16>,
    pub net_idx: Option<u16>,
    pub app_key_idx: Option<u16>,
    pub provisioned_at: Option<DateTime<Utc>>,
}

/// A configured mesh node bound to an external stack. Cloning yields a
/// handle to the same node.
#[derive(Clone)]
pub struct MeshNode {
    stack: Arc<dyn MeshStack>,
    registry: Arc<RwLock<ModelRegistry>>,
    info: Arc<RwLock<NodeInfo>>,
    hooks: NodeHooks,
    identity: DeviceIdentity,
    running: Arc<RwLock<bool>>,
}

impl std::fmt::Debug for MeshNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MeshNode")
            .field("identity", &self.identity)
            .finish_non_exhaustive()
    }
}

impl MeshNode {
    /// Registers the declared models, derives the device identity, and
    /// initializes the stack with the resulting composition.
    pub async fn initialize(stack: Arc<dyn MeshStack>, config: NodeConfig) -> MeshResult<Self> {
        let NodeConfig {
            device_name,
            uuid_prefix,
            company_id,
            product_id,
            version_id,
            models,
            hooks,
        } = config;

        let mut registry = ModelRegistry::new();
        for model in models {
            registry.register(model)?;
        }
        if registry.is_empty() {
            warn!("No models registered; only the Config Server is present");
        }

        let name = if device_name.is_empty() {
            DEFAULT_DEVICE_NAME.to_string()
        } else {
            device_name
        };
        let identity = DeviceIdentity::from_parts(uuid_prefix, stack.device_address(), name);
        info!("Device UUID: {} (prefix {})", identity.uuid, hex::encode(uuid_prefix));

        let composition = Composition::from_registry(&registry, company_id, product_id, version_id);
        info!(
            "Composition: {} SIG + {} vendor model slots for {} registered models",
            composition.elements[0].sig_models.len(),
            composition.elements[0].vendor_models.len(),
            registry.len()
        );
        stack.initialize(&identity, &composition).await?;
        info!("Mesh node '{}' initialized", identity.name);

        Ok(Self {
            stack,
            registry: Arc::new(RwLock::new(registry)),
            info: Arc::new(RwLock::new(NodeInfo::default())),
            hooks,
            identity,
            running: Arc::new(RwLock::new(false)),
        })
    }

    /// Starts advertising as an unprovisioned device and begins periodic
    /// publishing.
    pub async fn start(&self) -> MeshResult<()> {
        self.stack.enable_provisioning(Bearers::default()).await?;
        *self.running.write() = true;
        self.spawn_periodic_publishers();
        info!("Mesh node started, waiting to be provisioned");
        Ok(())
    }

    /// Stops periodic publishing. Registered models stay in place; there
    /// is no teardown path for the registry.
    pub fn stop(&self) {
        *self.running.write() = false;
        info!("Mesh node stopped");
    }

    pub fn is_provisioned(&self) -> bool {
        self.info.read().provisioned
    }

    pub fn unicast_addr(&self) -> Option<u16> {
        self.info.read().unicast_addr
    }

    pub fn device_uuid(&self) -> Uuid {
        self.identity.uuid
    }

    pub fn device_name(&self) -> &str {
        &self.identity.name
    }

    pub fn model_count(&self) -> usize {
        self.registry.read().len()
    }

    /// Handle of the `index`-th registered model of `kind`.
    pub fn find(&self, kind: ModelKind, index: usize) -> Option<ModelHandle> {
        self.registry.read().find(kind, index).map(|e| e.handle())
    }

    /// JSON snapshot of node state for dashboards and logs.
    pub fn status(&self) -> serde_json::Value {
        let network = self.info.read().clone();
        let registry = self.registry.read();
        let models: Vec<_> = registry
            .entries()
            .iter()
            .map(|e| {
                json!({
                    "index": e.index(),
                    "kind": e.kind(),
                    "handle": e.handle(),
                    "publish_addr": e.publication().target(),
                })
            })
            .collect();
        json!({
            "device_name": self.identity.name,
            "device_uuid": self.identity.uuid,
            "running": *self.running.read(),
            "network": network,
            "models": models,
        })
    }

    /// Current value of the `index`-th OnOff model.
    pub fn onoff(&self, index: usize) -> MeshResult<bool> {
        let reg = self.registry.read();
        let state = reg
            .find(ModelKind::OnOff, index)
            .and_then(RegistryEntry::onoff)
            .ok_or(MeshError::ModelNotFound { kind: ModelKind::OnOff, index })?;
        Ok(state.value)
    }

    /// Sets the local on/off value, notifies `on_change`, and optionally
    /// publishes the new state.
    pub async fn set_onoff(&self, index: usize, value: bool, publish: bool) -> MeshResult<()> {
        let callback = {
            let mut reg = self.registry.write();
            let state = reg
                .find_mut(ModelKind::OnOff, index)
                .and_then(RegistryEntry::onoff_mut)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::OnOff, index })?;
            state.value = value;
            state.on_change.clone()
        };
        info!("OnOff model #{} set to {}", index, value as u8);
        if let Some(cb) = callback {
            cb(value);
        }
        if publish {
            return self.publish_onoff(index, value).await;
        }
        Ok(())
    }

    /// Publishes an OnOff status carrying `value`, which also becomes the
    /// local state. The value sticks even when no publish address has been
    /// configured yet; only the transmission is skipped in that case.
    pub async fn publish_onoff(&self, index: usize, value: bool) -> MeshResult<()> {
        let (handle, target) = {
            let mut reg = self.registry.write();
            let entry = reg
                .find_mut(ModelKind::OnOff, index)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::OnOff, index })?;
            let handle = entry.handle();
            let state = entry
                .onoff_mut()
                .ok_or(MeshError::InvalidState("registry entry kind mismatch"))?;
            state.value = value;
            let target = state
                .publication
                .target()
                .ok_or(MeshError::PublicationNotConfigured)?;
            (handle, target)
        };
        let payload = onoff::encode_status(value);
        self.stack
            .send_message(handle, MessageContext::status_to(target), Opcode::GEN_ONOFF_STATUS, &payload)
            .await?;
        info!("Published OnOff state {} to 0x{:04X} (model #{})", value as u8, target, index);
        Ok(())
    }

    /// Current value of the `index`-th Level model.
    pub fn level(&self, index: usize) -> MeshResult<i16> {
        let reg = self.registry.read();
        let state = reg
            .find(ModelKind::Level, index)
            .and_then(RegistryEntry::level)
            .ok_or(MeshError::ModelNotFound { kind: ModelKind::Level, index })?;
        Ok(state.value)
    }

    /// Sets the local level, notifies `on_change`, and optionally
    /// publishes the new state.
    pub async fn set_level(&self, index: usize, value: i16, publish: bool) -> MeshResult<()> {
        let callback = {
            let mut reg = self.registry.write();
            let state = reg
                .find_mut(ModelKind::Level, index)
                .and_then(RegistryEntry::level_mut)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Level, index })?;
            state.value = value;
            state.on_change.clone()
        };
        info!("Level model #{} set to {}", index, value);
        if let Some(cb) = callback {
            cb(value);
        }
        if publish {
            return self.publish_level(index, value).await;
        }
        Ok(())
    }

    /// Publishes a Level status carrying `value`, which also becomes the
    /// local state. The value sticks even when no publish address has been
    /// configured yet; only the transmission is skipped in that case.
    pub async fn publish_level(&self, index: usize, value: i16) -> MeshResult<()> {
        let (handle, target) = {
            let mut reg = self.registry.write();
            let entry = reg
                .find_mut(ModelKind::Level, index)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Level, index })?;
            let handle = entry.handle();
            let state = entry
                .level_mut()
                .ok_or(MeshError::InvalidState("registry entry kind mismatch"))?;
            state.value = value;
            let target = state
                .publication
                .target()
                .ok_or(MeshError::PublicationNotConfigured)?;
            (handle, target)
        };
        let payload = level::encode_status(value);
        self.stack
            .send_message(handle, MessageContext::status_to(target), Opcode::GEN_LEVEL_STATUS, &payload)
            .await?;
        info!("Published level {} to 0x{:04X} (model #{})", value, target, index);
        Ok(())
    }

    /// Current battery percentage, refreshed through the read callback
    /// when one is registered. A failing callback falls back to the last
    /// known level.
    pub fn battery(&self, index: usize) -> MeshResult<u8> {
        let (read, cached) = {
            let reg = self.registry.read();
            let state = reg
                .find(ModelKind::Battery, index)
                .and_then(RegistryEntry::battery)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Battery, index })?;
            (state.read.clone(), state.level)
        };
        let Some(read) = read else {
            return Ok(cached);
        };
        match read() {
            Ok(level) => {
                let level = BatteryState::clamp(level);
                let mut reg = self.registry.write();
                if let Some(state) = reg
                    .find_mut(ModelKind::Battery, index)
                    .and_then(RegistryEntry::battery_mut)
                {
                    state.level = level;
                }
                Ok(level)
            }
            Err(err) => {
                warn!("Battery read callback failed: {}", err);
                Ok(cached)
            }
        }
    }

    /// Sets the battery level directly. Values above 100 are clamped.
    pub fn set_battery(&self, index: usize, level: u8) -> MeshResult<()> {
        let level = BatteryState::clamp(level);
        let mut reg = self.registry.write();
        let state = reg
            .find_mut(ModelKind::Battery, index)
            .and_then(RegistryEntry::battery_mut)
            .ok_or(MeshError::ModelNotFound { kind: ModelKind::Battery, index })?;
        state.level = level;
        info!("Battery model #{} set to {}%", index, level);
        Ok(())
    }

    /// Publishes a Battery status, refreshing the level through the read
    /// callback first when one is registered. The refreshed level is kept
    /// even when no publish address has been configured yet.
    pub async fn publish_battery(&self, index: usize) -> MeshResult<()> {
        let (handle, target, read, cached) = {
            let reg = self.registry.read();
            let entry = reg
                .find(ModelKind::Battery, index)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Battery, index })?;
            let handle = entry.handle();
            let state = entry
                .battery()
                .ok_or(MeshError::InvalidState("registry entry kind mismatch"))?;
            (handle, state.publication.target(), state.read.clone(), state.level)
        };
        let level = match read {
            Some(read) => match read() {
                Ok(level) => {
                    let level = BatteryState::clamp(level);
                    let mut reg = self.registry.write();
                    if let Some(state) = reg
                        .find_mut(ModelKind::Battery, index)
                        .and_then(RegistryEntry::battery_mut)
                    {
                        state.level = level;
                    }
                    level
                }
                Err(err) => {
                    warn!("Battery read callback failed: {}", err);
                    cached
                }
            },
            None => cached,
        };
        let Some(target) = target else {
            return Err(MeshError::PublicationNotConfigured);
        };
        let payload = battery::encode_status(level);
        self.stack
            .send_message(handle, MessageContext::status_to(target), Opcode::GEN_BATTERY_STATUS, &payload)
            .await?;
        info!("Published battery level {}% to 0x{:04X} (model #{})", level, target, index);
        Ok(())
    }

    /// Reads a sensor through its callback, caching the value for status
    /// answers.
    pub fn read_sensor(&self, index: usize, property_id: u16) -> MeshResult<i32> {
        let read = {
            let reg = self.registry.read();
            let state = reg
                .find(ModelKind::Sensor, index)
                .and_then(RegistryEntry::sensor)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Sensor, index })?;
            let slot = state
                .sensors
                .iter()
                .find(|s| s.spec.property_id == property_id)
                .ok_or(MeshError::SensorNotFound { property_id })?;
            slot.spec.read.clone()
        };
        let value = read(property_id)?;
        let mut reg = self.registry.write();
        if let Some(slot) = reg
            .find_mut(ModelKind::Sensor, index)
            .and_then(RegistryEntry::sensor_mut)
            .and_then(|s| s.sensors.iter_mut().find(|s| s.spec.property_id == property_id))
        {
            slot.last_value = value;
        }
        Ok(value)
    }

    /// Publishes one sensor's current value as a marshalled Sensor
    /// status. The value is read fresh through the callback and cached
    /// even when no publish address has been configured yet.
    pub async fn publish_sensor(&self, index: usize, property_id: u16) -> MeshResult<()> {
        let (handle, target, read) = {
            let reg = self.registry.read();
            let entry = reg
                .find(ModelKind::Sensor, index)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Sensor, index })?;
            let handle = entry.handle();
            let state = entry
                .sensor()
                .ok_or(MeshError::InvalidState("registry entry kind mismatch"))?;
            let slot = state
                .sensors
                .iter()
                .find(|s| s.spec.property_id == property_id)
                .ok_or(MeshError::SensorNotFound { property_id })?;
            (handle, state.publication.target(), slot.spec.read.clone())
        };
        let value = read(property_id)?;
        {
            let mut reg = self.registry.write();
            if let Some(slot) = reg
                .find_mut(ModelKind::Sensor, index)
                .and_then(RegistryEntry::sensor_mut)
                .and_then(|s| s.sensors.iter_mut().find(|s| s.spec.property_id == property_id))
            {
                slot.last_value = value;
            }
        }
        let Some(target) = target else {
            return Err(MeshError::PublicationNotConfigured);
        };
        let payload = sensor::encode_status(property_id, value);
        self.stack
            .send_message(handle, MessageContext::status_to(target), Opcode::SENSOR_STATUS, &payload)
            .await?;
        info!(
            "Published sensor 0x{:04X} = {} to 0x{:04X} (model #{})",
            property_id, value, target, index
        );
        Ok(())
    }

    /// Sends a vendor message to an explicit destination address.
    pub async fn send_vendor(
        &self,
        index: usize,
        opcode: Opcode,
        payload: &[u8],
        dest_addr: u16,
    ) -> MeshResult<()> {
        let handle = {
            let reg = self.registry.read();
            let entry = reg
                .find(ModelKind::Vendor, index)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Vendor, index })?;
            entry.handle()
        };
        debug!("Vendor send {}: {}", opcode, hex::encode(payload));
        self.stack
            .send_message(handle, MessageContext::status_to(dest_addr), opcode, payload)
            .await?;
        info!(
            "Sent vendor message {} ({} bytes) to 0x{:04X} (model #{})",
            opcode,
            payload.len(),
            dest_addr,
            index
        );
        Ok(())
    }

    /// Publishes a vendor message to the configured publish address.
    pub async fn publish_vendor(
        &self,
        index: usize,
        opcode: Opcode,
        payload: &[u8],
    ) -> MeshResult<()> {
        let (handle, target) = {
            let reg = self.registry.read();
            let entry = reg
                .find(ModelKind::Vendor, index)
                .ok_or(MeshError::ModelNotFound { kind: ModelKind::Vendor, index })?;
            let handle = entry.handle();
            let state = entry
                .vendor()
                .ok_or(MeshError::InvalidState("registry entry kind mismatch"))?;
            let target = state
                .publication
                .target()
                .ok_or(MeshError::PublicationNotConfigured)?;
            (handle, target)
        };
        self.stack
            .send_message(handle, MessageContext::status_to(target), opcode, payload)
            .await?;
        info!(
            "Published vendor message {} ({} bytes) to 0x{:04X} (model #{})",
            opcode,
            payload.len(),
            target,
            index
        );
        Ok(())
    }
}

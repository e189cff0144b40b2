//! Inbound event dispatch: stack callbacks land here.

use chrono::Utc;
use log::{debug, info, warn};

use crate::models::vendor::VendorMessage;
use crate::node::{MeshNode, NodeInfo};
use crate::stack::{ModelHandle, Opcode, StackEvent};

impl MeshNode {
    /// Applies one inbound stack event: updates node and model state,
    /// then invokes the matching user callback. Unknown handles and kind
    /// mismatches are logged and ignored rather than propagated; a
    /// misbehaving peer must not wedge the node.
    pub fn handle_event(&self, event: StackEvent) {
        match event {
            StackEvent::ProvisioningLinkOpened { bearer } => {
                info!("Provisioning link opened ({})", bearer);
            }
            StackEvent::ProvisioningLinkClosed { bearer } => {
                info!("Provisioning link closed ({})", bearer);
            }
            StackEvent::ProvisioningComplete { unicast_addr, net_idx } => {
                self.on_provisioning_complete(unicast_addr, net_idx);
            }
            StackEvent::NodeReset => self.on_node_reset(),
            StackEvent::AppKeyAdded { net_idx, app_idx } => {
                self.on_app_key_added(net_idx, app_idx);
            }
            StackEvent::ModelAppBound { element_addr, app_idx, model_id } => {
                info!(
                    "Model {} bound to app key {} (element 0x{:04X})",
                    model_id, app_idx, element_addr
                );
            }
            StackEvent::PublicationSet { model, publish_addr } => {
                self.on_publication_set(model, publish_addr);
            }
            StackEvent::OnOffSet { model, on_off } => self.on_onoff_set(model, on_off),
            StackEvent::LevelSet { model, level } => self.on_level_set(model, level),
            StackEvent::DeltaSet { model, delta } => {
                debug!("Delta set {} on {} handled by the stack", delta, model);
            }
            StackEvent::MoveSet { model, delta } => {
                debug!("Move set {} on {} handled by the stack", delta, model);
            }
            StackEvent::SensorGet { model, property_id } => {
                debug!(
                    "Sensor get on {} (property {:?}) answered from last written state",
                    model, property_id
                );
            }
            StackEvent::VendorMessage { model, opcode, payload, src_addr } => {
                self.on_vendor_message(model, opcode, payload, src_addr);
            }
        }
    }

    fn on_provisioning_complete(&self, unicast_addr: u16, net_idx: u16) {
        {
            let mut info = self.info.write();
            info.provisioned = true;
            info.unicast_addr = Some(unicast_addr);
            info.net_idx = Some(net_idx);
            info.provisioned_at = Some(Utc::now());
        }
        info!(
            "Provisioning complete: unicast 0x{:04X}, net key index {}",
            unicast_addr, net_idx
        );
        if let Some(hook) = &self.hooks.provisioned {
            hook(unicast_addr);
        }
    }

    fn on_node_reset(&self) {
        *self.info.write() = NodeInfo::default();
        info!("Node reset, returning to unprovisioned state");
        if let Some(hook) = &self.hooks.reset {
            hook();
        }
    }

    fn on_app_key_added(&self, net_idx: u16, app_idx: u16) {
        self.info.write().app_key_idx = Some(app_idx);
        info!("App key added: net 0x{:04X}, app 0x{:04X}", net_idx, app_idx);
        if let Some(hook) = &self.hooks.config_complete {
            hook(app_idx);
        }
    }

    fn on_publication_set(&self, model: ModelHandle, publish_addr: u16) {
        let mut reg = self.registry.write();
        let Some(entry) = reg.entry_by_handle_mut(model) else {
            warn!("Publication set for unknown model {}", model);
            return;
        };
        if entry.handle() != model {
            // The Sensor Setup companion resolves to its server's entry;
            // its own publication is unused.
            debug!("Ignoring publication set on setup companion {}", model);
            return;
        }
        if !entry.publication().enabled() {
            warn!(
                "Publication set for {} model #{}, but publication was disabled at registration",
                entry.kind(),
                entry.index()
            );
            return;
        }
        entry.publication_mut().set_address(publish_addr);
        info!(
            "Publication configured for {} model #{}: 0x{:04X}",
            entry.kind(),
            entry.index(),
            publish_addr
        );
    }

    fn on_onoff_set(&self, model: ModelHandle, value: bool) {
        let callback = {
            let mut reg = self.registry.write();
            let Some(entry) = reg.entry_by_handle_mut(model) else {
                warn!("OnOff set for unknown model {}", model);
                return;
            };
            let index = entry.index();
            let Some(state) = entry.onoff_mut() else {
                warn!("OnOff set for non-OnOff model {}", model);
                return;
            };
            state.value = value;
            info!("OnOff model #{} changed to {} by the network", index, value as u8);
            state.on_change.clone()
        };
        if let Some(cb) = callback {
            cb(value);
        }
    }

    fn on_level_set(&self, model: ModelHandle, value: i16) {
        let callback = {
            let mut reg = self.registry.write();
            let Some(entry) = reg.entry_by_handle_mut(model) else {
                warn!("Level set for unknown model {}", model);
                return;
            };
            let index = entry.index();
            let Some(state) = entry.level_mut() else {
                warn!("Level set for non-Level model {}", model);
                return;
            };
            state.value = value;
            info!("Level model #{} changed to {} by the network", index, value);
            state.on_change.clone()
        };
        if let Some(cb) = callback {
            cb(value);
        }
    }

    fn on_vendor_message(&self, model: ModelHandle, opcode: Opcode, payload: Vec<u8>, src_addr: u16) {
        debug!(
            "Vendor message {} from 0x{:04X}: {}",
            opcode,
            src_addr,
            hex::encode(&payload)
        );
        let handler = {
            let reg = self.registry.read();
            let Some(entry) = reg.entry_by_handle(model) else {
                warn!("Vendor message for unknown model {}", model);
                return;
            };
            let Some(state) = entry.vendor() else {
                warn!("Vendor message for non-vendor model {}", model);
                return;
            };
            match &state.handler {
                Some(handler) => handler.clone(),
                None => {
                    warn!(
                        "No handler for vendor model CID 0x{:04X} MID 0x{:04X}",
                        state.company_id, state.model_id
                    );
                    return;
                }
            }
        };
        handler(&VendorMessage { opcode, payload, src_addr });
    }
}

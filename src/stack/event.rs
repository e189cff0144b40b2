//! Inbound events delivered by the external mesh stack.
//!
//! The callback families a vendor stack exposes (provisioning, config
//! server, generic server, sensor server, vendor model) collapse into one
//! enum. An integration layer decodes stack callbacks into these values
//! and hands them to
//! [`MeshNode::handle_event`](crate::node::MeshNode::handle_event); tests
//! construct them directly.

use crate::stack::{ModelHandle, ModelId, Opcode, ProvBearer};

#[derive(Debug, Clone)]
pub enum StackEvent {
    /// A provisioning link opened on the given bearer.
    ProvisioningLinkOpened { bearer: ProvBearer },

    /// A provisioning link closed.
    ProvisioningLinkClosed { bearer: ProvBearer },

    /// Provisioning finished; the node now owns a unicast address.
    ProvisioningComplete { unicast_addr: u16, net_idx: u16 },

    /// The provisioner reset the node back to the unprovisioned state.
    NodeReset,

    /// An application key was added. Configuration is considered complete
    /// once this arrives.
    AppKeyAdded { net_idx: u16, app_idx: u16 },

    /// A model was bound to an application key.
    ModelAppBound { element_addr: u16, app_idx: u16, model_id: ModelId },

    /// The provisioner configured a publish address for a model.
    PublicationSet { model: ModelHandle, publish_addr: u16 },

    /// Generic OnOff Set or Set Unacknowledged landed on a model. The
    /// stack answers any acknowledgement itself after state is updated.
    OnOffSet { model: ModelHandle, on_off: bool },

    /// Generic Level Set or Set Unacknowledged landed on a model.
    LevelSet { model: ModelHandle, level: i16 },

    /// Generic Delta Set. The stack applies it to its own bound state.
    DeltaSet { model: ModelHandle, delta: i32 },

    /// Generic Move Set. The stack applies it to its own bound state.
    MoveSet { model: ModelHandle, delta: i16 },

    /// Sensor Get, answered by the stack from the last written status.
    /// `property_id` is present when the client asked for one property.
    SensorGet { model: ModelHandle, property_id: Option<u16> },

    /// A message arrived on a vendor model.
    VendorMessage { model: ModelHandle, opcode: Opcode, payload: Vec<u8>, src_addr: u16 },
}

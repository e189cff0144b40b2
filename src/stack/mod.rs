//! The seam between the node and the external mesh protocol stack.
//!
//! Everything below the access layer (provisioning, encryption, relay,
//! segmentation) belongs to a vendor stack. The node drives it through
//! [`MeshStack`] and receives inbound traffic as [`StackEvent`]s.

pub mod composition;
pub mod event;
pub mod types;

pub use composition::{
    AutoRespond, Composition, ConfigServerSettings, Element, Retransmit, StackModel,
};
pub use event::StackEvent;
pub use types::{
    Bearers, DeviceIdentity, MessageContext, ModelHandle, ModelId, ModelTable, Opcode, ProvBearer,
    ADDR_UNASSIGNED, DEFAULT_TTL, PRIMARY_APP_IDX, PRIMARY_NET_IDX,
};

use async_trait::async_trait;

use crate::error::StackError;

/// Operations the node drives on the external mesh stack.
///
/// Production implementations wrap a vendor protocol engine; tests
/// substitute an in-memory double. All methods take `&self` so one
/// instance can be shared behind an [`Arc`](std::sync::Arc).
#[async_trait]
pub trait MeshStack: Send + Sync {
    /// Bluetooth device address, used to derive the device UUID.
    fn device_address(&self) -> [u8; 6];

    /// Registers the provisioning identity and composition data. Called
    /// once, before [`enable_provisioning`](Self::enable_provisioning).
    async fn initialize(
        &self,
        identity: &DeviceIdentity,
        composition: &Composition,
    ) -> Result<(), StackError>;

    /// Starts advertising as an unprovisioned device on the given bearers.
    async fn enable_provisioning(&self, bearers: Bearers) -> Result<(), StackError>;

    /// Transmits one access-layer message from the given model slot.
    async fn send_message(
        &self,
        model: ModelHandle,
        ctx: MessageContext,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<(), StackError>;
}

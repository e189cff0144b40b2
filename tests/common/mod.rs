//! Shared test support: an in-memory stack double recording everything
//! the node drives, plus helpers to walk a node through provisioning.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use meshnode::stack::{
    Bearers, Composition, DeviceIdentity, MeshStack, MessageContext, ModelHandle, Opcode,
};
use meshnode::{MeshNode, ModelConfig, ModelKind, NodeConfig, StackError, StackEvent};

/// Device address every test node reports.
pub const DEVICE_ADDR: [u8; 6] = [0xAA, 0xBB, 0xCC, 0x11, 0x22, 0x33];

/// Unicast address handed out by the fake provisioner.
pub const UNICAST: u16 = 0x0005;

/// Group address used as publish target.
pub const GROUP: u16 = 0xC000;

/// One transmission captured by [`RecordingStack`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub model: ModelHandle,
    pub ctx: MessageContext,
    pub opcode: Opcode,
    pub payload: Vec<u8>,
}

/// In-memory [`MeshStack`] double.
#[derive(Default)]
pub struct RecordingStack {
    sent: Mutex<Vec<SentMessage>>,
    initialized: Mutex<Option<(DeviceIdentity, Composition)>>,
    provisioning: Mutex<Option<Bearers>>,
    fail_sends: AtomicBool,
}

impl RecordingStack {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every subsequent send fail at the transport.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn last_sent(&self) -> Option<SentMessage> {
        self.sent.lock().last().cloned()
    }

    pub fn initialized_with(&self) -> Option<(DeviceIdentity, Composition)> {
        self.initialized.lock().clone()
    }

    pub fn provisioning_bearers(&self) -> Option<Bearers> {
        *self.provisioning.lock()
    }
}

#[async_trait]
impl MeshStack for RecordingStack {
    fn device_address(&self) -> [u8; 6] {
        DEVICE_ADDR
    }

    async fn initialize(
        &self,
        identity: &DeviceIdentity,
        composition: &Composition,
    ) -> Result<(), StackError> {
        *self.initialized.lock() = Some((identity.clone(), composition.clone()));
        Ok(())
    }

    async fn enable_provisioning(&self, bearers: Bearers) -> Result<(), StackError> {
        *self.provisioning.lock() = Some(bearers);
        Ok(())
    }

    async fn send_message(
        &self,
        model: ModelHandle,
        ctx: MessageContext,
        opcode: Opcode,
        payload: &[u8],
    ) -> Result<(), StackError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(StackError::Transmit("injected failure".into()));
        }
        self.sent.lock().push(SentMessage { model, ctx, opcode, payload: payload.to_vec() });
        Ok(())
    }
}

/// Initializes a node with the given models over a fresh recording stack.
pub async fn node_with(models: Vec<ModelConfig>) -> (MeshNode, Arc<RecordingStack>) {
    let stack = RecordingStack::new();
    let mut config = NodeConfig::new("test-node");
    for model in models {
        config = config.with_model(model);
    }
    let node = MeshNode::initialize(stack.clone(), config)
        .await
        .expect("node initialization failed");
    (node, stack)
}

/// Walks the node through provisioning and app key configuration.
pub fn provision(node: &MeshNode) {
    node.handle_event(StackEvent::ProvisioningComplete { unicast_addr: UNICAST, net_idx: 0 });
    node.handle_event(StackEvent::AppKeyAdded { net_idx: 0, app_idx: 0 });
}

/// Assigns a publish address to the `index`-th model of `kind`, the way
/// a provisioner's Model Publication Set would.
pub fn set_publish_addr(node: &MeshNode, kind: ModelKind, index: usize, addr: u16) {
    let model = node.find(kind, index).expect("model not registered");
    node.handle_event(StackEvent::PublicationSet { model, publish_addr: addr });
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

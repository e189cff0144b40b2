//! Vendor-defined models: custom opcodes carrying opaque payloads.

use std::sync::Arc;

use crate::error::{MeshError, MeshResult};
use crate::models::registry::Publication;
use crate::stack::Opcode;

/// An inbound message on a vendor model.
#[derive(Debug, Clone)]
pub struct VendorMessage {
    pub opcode: Opcode,
    pub payload: Vec<u8>,
    /// Source unicast address.
    pub src_addr: u16,
}

/// Handles inbound vendor-model messages. Called without registry locks
/// held.
pub type VendorHandler = Arc<dyn Fn(&VendorMessage) + Send + Sync>;

/// Configuration for one vendor model instance.
#[derive(Clone)]
pub struct VendorConfig {
    pub company_id: u16,
    pub model_id: u16,
    /// Every opcode this model sends or receives. The stack registers the
    /// table at initialization and drops traffic outside it.
    pub opcodes: Vec<Opcode>,
    pub handler: Option<VendorHandler>,
    /// Allocate a publication context so messages can be published.
    pub publish: bool,
}

impl VendorConfig {
    pub fn new(company_id: u16, model_id: u16) -> Self {
        Self { company_id, model_id, opcodes: Vec::new(), handler: None, publish: true }
    }

    pub fn with_opcode(mut self, opcode: Opcode) -> Self {
        self.opcodes.push(opcode);
        self
    }

    pub fn with_handler(mut self, f: impl Fn(&VendorMessage) + Send + Sync + 'static) -> Self {
        self.handler = Some(Arc::new(f));
        self
    }

    pub fn with_publication(mut self, enabled: bool) -> Self {
        self.publish = enabled;
        self
    }
}

/// Runtime state for one vendor entry.
pub(crate) struct VendorState {
    pub(crate) company_id: u16,
    pub(crate) model_id: u16,
    pub(crate) handler: Option<VendorHandler>,
    pub(crate) publication: Publication,
}

impl VendorState {
    pub(crate) fn new(config: VendorConfig) -> Self {
        Self {
            company_id: config.company_id,
            model_id: config.model_id,
            handler: config.handler,
            publication: Publication::new(config.publish),
        }
    }
}

/// Rejects opcode tables that the stack would refuse or misroute.
pub(crate) fn validate(config: &VendorConfig) -> MeshResult<()> {
    if config.opcodes.is_empty() {
        return Err(MeshError::InvalidConfig(format!(
            "vendor model CID 0x{:04X} MID 0x{:04X} declares no opcodes",
            config.company_id, config.model_id
        )));
    }
    for op in &config.opcodes {
        if !op.is_vendor() {
            return Err(MeshError::InvalidConfig(format!(
                "opcode {} is outside the vendor range",
                op
            )));
        }
        if op.company_id() != config.company_id {
            return Err(MeshError::InvalidConfig(format!(
                "opcode {} carries company 0x{:04X} but the model declares 0x{:04X}",
                op,
                op.company_id(),
                config.company_id
            )));
        }
    }
    Ok(())
}

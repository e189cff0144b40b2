//! Declarative Bluetooth LE Mesh node models over a vendor mesh stack.
//!
//! Firmware declares which mesh models a node exposes (on/off, level,
//! sensor, battery, vendor-custom) and this crate does the rest: it
//! builds the element and model tables, owns per-model runtime state,
//! routes inbound set events back to user callbacks, and publishes
//! bit-exact status messages. The protocol engine itself (provisioning,
//! encryption, relaying) stays behind the [`stack::MeshStack`] trait.
//!
//! ```no_run
//! use std::sync::Arc;
//! use meshnode::{MeshNode, ModelConfig, NodeConfig, OnOffConfig};
//! # async fn run(stack: Arc<dyn meshnode::stack::MeshStack>) -> meshnode::MeshResult<()> {
//! let config = NodeConfig::new("hallway-light")
//!     .with_model(ModelConfig::OnOff(OnOffConfig::new(false).on_change(|on| {
//!         println!("light is now {}", if on { "on" } else { "off" });
//!     })));
//! let node = MeshNode::initialize(stack, config).await?;
//! node.start().await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod models;
pub mod node;
pub mod stack;

pub use error::{MeshError, MeshResult, StackError};
pub use models::{
    BatteryConfig, LevelConfig, ModelConfig, ModelKind, OnOffConfig, SensorConfig, SensorSpec,
    VendorConfig, VendorMessage, MAX_MODELS,
};
pub use node::{MeshNode, NodeConfig, NodeHooks, NodeInfo, DEFAULT_DEVICE_NAME};
pub use stack::{
    Bearers, Composition, DeviceIdentity, MeshStack, MessageContext, ModelHandle, ModelId,
    Opcode, ProvBearer, StackEvent,
};

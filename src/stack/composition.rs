//! Composition data: the element and model tables registered with the
//! stack at initialization.

use serde::Serialize;

use crate::models::ModelRegistry;
use crate::stack::{ModelHandle, ModelId, Opcode, DEFAULT_TTL};

/// Location descriptor of the single main element.
pub const ELEMENT_LOCATION_MAIN: u16 = 0x0000;

/// Company ID used before a Bluetooth SIG assignment exists.
pub const DEFAULT_COMPANY_ID: u16 = 0xFFFF;
pub const DEFAULT_PRODUCT_ID: u16 = 0x0000;
pub const DEFAULT_VERSION_ID: u16 = 0x0000;

/// Retransmission schedule: count plus inter-transmission interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Retransmit {
    pub count: u8,
    pub interval_ms: u16,
}

/// State backing the mandatory Configuration Server in SIG slot 0.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigServerSettings {
    pub relay: bool,
    pub secure_beacon: bool,
    pub friend: bool,
    pub gatt_proxy: bool,
    pub default_ttl: u8,
    pub net_transmit: Retransmit,
    pub relay_retransmit: Retransmit,
}

impl Default for ConfigServerSettings {
    fn default() -> Self {
        Self {
            relay: false,
            secure_beacon: true,
            friend: false,
            gatt_proxy: false,
            default_ttl: DEFAULT_TTL,
            net_transmit: Retransmit { count: 2, interval_ms: 20 },
            relay_retransmit: Retransmit { count: 2, interval_ms: 20 },
        }
    }
}

/// Whether the stack answers get and set messages itself or defers the
/// response to the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoRespond {
    pub get: bool,
    pub set: bool,
}

impl AutoRespond {
    /// The stack answers both gets and sets from bound state.
    pub const ALL: AutoRespond = AutoRespond { get: true, set: true };
    /// Responses are the application's job.
    pub const BY_APP: AutoRespond = AutoRespond { get: false, set: false };
}

/// One model slot handed to the stack.
#[derive(Debug, Clone, Serialize)]
pub struct StackModel {
    pub handle: ModelHandle,
    pub id: ModelId,
    /// Whether a publication context is allocated for this slot.
    pub publish: bool,
    pub auto_respond: AutoRespond,
    /// Vendor models list every opcode they send or receive. SIG models
    /// leave this empty; the stack knows their opcode tables.
    pub opcodes: Vec<Opcode>,
}

/// One addressable element hosting a SIG and a vendor model table.
#[derive(Debug, Clone, Serialize)]
pub struct Element {
    pub location: u16,
    pub sig_models: Vec<StackModel>,
    pub vendor_models: Vec<StackModel>,
}

/// Composition data the stack advertises to the network.
#[derive(Debug, Clone, Serialize)]
pub struct Composition {
    pub company_id: u16,
    pub product_id: u16,
    pub version_id: u16,
    pub config_server: ConfigServerSettings,
    pub elements: Vec<Element>,
}

impl Composition {
    /// Builds single-element composition data from the registry's slot
    /// tables.
    pub fn from_registry(
        registry: &ModelRegistry,
        company_id: u16,
        product_id: u16,
        version_id: u16,
    ) -> Self {
        Self {
            company_id,
            product_id,
            version_id,
            config_server: ConfigServerSettings::default(),
            elements: vec![Element {
                location: ELEMENT_LOCATION_MAIN,
                sig_models: registry.sig_models().to_vec(),
                vendor_models: registry.vendor_models().to_vec(),
            }],
        }
    }
}

//! Wire-level types shared between the node and the external mesh stack.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The unassigned mesh address. Publish addresses hold this value until
/// the provisioner configures publication for the model.
pub const ADDR_UNASSIGNED: u16 = 0x0000;

/// Default time-to-live for outbound messages (maximum relay hops).
pub const DEFAULT_TTL: u8 = 7;

/// Index of the primary network key.
pub const PRIMARY_NET_IDX: u16 = 0x0000;

/// Index of the primary application key.
pub const PRIMARY_APP_IDX: u16 = 0x0000;

/// Access-layer opcode, packed into a `u32`.
///
/// SIG opcodes occupy the low 16 bits. Vendor opcodes are three octets on
/// the wire: the leading byte (0xC0..=0xFF) sits in bits 16..24 and the
/// owning company ID fills the low 16 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Opcode(u32);

impl Opcode {
    // Generic OnOff
    pub const GEN_ONOFF_GET: Opcode = Opcode(0x8201);
    pub const GEN_ONOFF_SET: Opcode = Opcode(0x8202);
    pub const GEN_ONOFF_SET_UNACK: Opcode = Opcode(0x8203);
    pub const GEN_ONOFF_STATUS: Opcode = Opcode(0x8204);

    // Generic Level
    pub const GEN_LEVEL_GET: Opcode = Opcode(0x8205);
    pub const GEN_LEVEL_SET: Opcode = Opcode(0x8206);
    pub const GEN_LEVEL_SET_UNACK: Opcode = Opcode(0x8207);
    pub const GEN_LEVEL_STATUS: Opcode = Opcode(0x8208);
    pub const GEN_DELTA_SET: Opcode = Opcode(0x8209);
    pub const GEN_DELTA_SET_UNACK: Opcode = Opcode(0x820A);
    pub const GEN_MOVE_SET: Opcode = Opcode(0x820B);
    pub const GEN_MOVE_SET_UNACK: Opcode = Opcode(0x820C);

    // Generic Battery
    pub const GEN_BATTERY_GET: Opcode = Opcode(0x8223);
    pub const GEN_BATTERY_STATUS: Opcode = Opcode(0x8224);

    // Sensor
    pub const SENSOR_GET: Opcode = Opcode(0x8231);
    pub const SENSOR_STATUS: Opcode = Opcode(0x52);

    /// Packs a vendor opcode from its leading byte (0xC0..=0xFF) and the
    /// owning company ID.
    pub const fn vendor(lead: u8, company_id: u16) -> Opcode {
        Opcode(((lead as u32) << 16) | company_id as u32)
    }

    /// The packed representation.
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// True for three-octet vendor opcodes.
    pub const fn is_vendor(self) -> bool {
        (self.0 >> 16) >= 0xC0
    }

    /// Company ID carried in a vendor opcode. Meaningless for SIG opcodes.
    pub const fn company_id(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_vendor() {
            write!(f, "0x{:06X}", self.0)
        } else {
            write!(f, "0x{:04X}", self.0)
        }
    }
}

/// Identifies a model type on the wire: SIG-defined or vendor-defined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelId {
    Sig(u16),
    Vendor { company_id: u16, model_id: u16 },
}

impl ModelId {
    pub const CONFIG_SERVER: ModelId = ModelId::Sig(0x0000);
    pub const GEN_ONOFF_SERVER: ModelId = ModelId::Sig(0x1000);
    pub const GEN_LEVEL_SERVER: ModelId = ModelId::Sig(0x1002);
    pub const GEN_BATTERY_SERVER: ModelId = ModelId::Sig(0x100C);
    pub const SENSOR_SERVER: ModelId = ModelId::Sig(0x1100);
    pub const SENSOR_SETUP_SERVER: ModelId = ModelId::Sig(0x1101);
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelId::Sig(id) => write!(f, "SIG 0x{:04X}", id),
            ModelId::Vendor { company_id, model_id } => {
                write!(f, "vendor CID 0x{:04X} MID 0x{:04X}", company_id, model_id)
            }
        }
    }
}

/// Which of the element's two model tables a slot lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelTable {
    Sig,
    Vendor,
}

/// Stable reference to one model slot on the element.
///
/// Handles are assigned at registration and never move, so they work as
/// keys for inbound event routing and as the send-side model reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelHandle {
    pub table: ModelTable,
    pub slot: u8,
}

impl ModelHandle {
    pub const fn sig(slot: u8) -> Self {
        Self { table: ModelTable::Sig, slot }
    }

    pub const fn vendor(slot: u8) -> Self {
        Self { table: ModelTable::Vendor, slot }
    }
}

impl fmt::Display for ModelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table {
            ModelTable::Sig => write!(f, "sig[{}]", self.slot),
            ModelTable::Vendor => write!(f, "vnd[{}]", self.slot),
        }
    }
}

/// Addressing and transmission parameters for one outbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageContext {
    pub net_idx: u16,
    pub app_idx: u16,
    /// Destination address.
    pub addr: u16,
    pub send_ttl: u8,
    /// Acknowledged transport. Status publishes leave this off.
    pub send_rel: bool,
}

impl MessageContext {
    /// Context for an unacknowledged status message on the primary keys.
    pub fn status_to(addr: u16) -> Self {
        Self {
            net_idx: PRIMARY_NET_IDX,
            app_idx: PRIMARY_APP_IDX,
            addr,
            send_ttl: DEFAULT_TTL,
            send_rel: false,
        }
    }
}

/// Identity the node advertises while unprovisioned.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceIdentity {
    /// 16-byte device UUID: two prefix bytes, the six-byte device address,
    /// then zero padding. Provisioners filter candidates on the prefix.
    pub uuid: Uuid,
    /// Human-readable name shown by provisioner UIs.
    pub name: String,
}

impl DeviceIdentity {
    pub fn from_parts(prefix: [u8; 2], device_addr: [u8; 6], name: impl Into<String>) -> Self {
        let mut bytes = [0u8; 16];
        bytes[0] = prefix[0];
        bytes[1] = prefix[1];
        bytes[2..8].copy_from_slice(&device_addr);
        Self { uuid: Uuid::from_bytes(bytes), name: name.into() }
    }
}

/// Provisioning bearers to advertise on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bearers {
    pub pb_adv: bool,
    pub pb_gatt: bool,
}

impl Default for Bearers {
    fn default() -> Self {
        Self { pb_adv: true, pb_gatt: true }
    }
}

/// The bearer a provisioning link was opened or closed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvBearer {
    Adv,
    Gatt,
}

impl fmt::Display for ProvBearer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvBearer::Adv => f.write_str("PB-ADV"),
            ProvBearer::Gatt => f.write_str("PB-GATT"),
        }
    }
}

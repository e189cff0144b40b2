//! Sensor server model: property declarations, read callbacks, and the
//! marshalled status encoding.

use std::sync::Arc;
use std::time::Duration;

use crate::error::MeshResult;
use crate::models::registry::Publication;

/// Device property IDs usable in sensor declarations. The 0x5xxx block is
/// a project-assigned range for IMU axes; the rest are Bluetooth SIG
/// assignments.
pub mod properties {
    /// Temperature in 0.01 degrees Celsius.
    pub const TEMPERATURE: u16 = 0x004F;
    /// Relative humidity in 0.01 percent.
    pub const HUMIDITY: u16 = 0x004D;
    /// Pressure in 0.1 Pa.
    pub const PRESSURE: u16 = 0x2A6D;
    /// Motion detected, 0 or 1.
    pub const MOTION_DETECTED: u16 = 0x0042;
    /// People count.
    pub const PEOPLE_COUNT: u16 = 0x004C;
    /// Ambient light level in lux.
    pub const AMBIENT_LIGHT: u16 = 0x004E;
    /// Battery level in percent.
    pub const BATTERY_LEVEL: u16 = 0x2A19;
    /// Voltage in 1/64 V.
    pub const VOLTAGE: u16 = 0x2B18;

    /// Accelerometer X axis in mg.
    pub const ACCEL_X: u16 = 0x5001;
    /// Accelerometer Y axis in mg.
    pub const ACCEL_Y: u16 = 0x5002;
    /// Accelerometer Z axis in mg.
    pub const ACCEL_Z: u16 = 0x5003;
    /// Gyroscope X axis in millidegrees per second.
    pub const GYRO_X: u16 = 0x5004;
    /// Gyroscope Y axis in millidegrees per second.
    pub const GYRO_Y: u16 = 0x5005;
    /// Gyroscope Z axis in millidegrees per second.
    pub const GYRO_Z: u16 = 0x5006;
}

/// Reads the current value for a property from the application. Called
/// without registry locks held.
pub type SensorRead = Arc<dyn Fn(u16) -> MeshResult<i32> + Send + Sync>;

/// One declared sensor on a Sensor server model.
#[derive(Clone)]
pub struct SensorSpec {
    pub property_id: u16,
    pub read: SensorRead,
    /// Interval for periodic publishing; `None` leaves publishing manual.
    pub publish_period: Option<Duration>,
}

impl SensorSpec {
    pub fn new(property_id: u16, read: impl Fn(u16) -> MeshResult<i32> + Send + Sync + 'static) -> Self {
        Self { property_id, read: Arc::new(read), publish_period: None }
    }

    pub fn with_publish_period(mut self, period: Duration) -> Self {
        self.publish_period = Some(period);
        self
    }
}

/// Configuration for one Sensor server instance. The stack requires a
/// Sensor Setup Server alongside every Sensor Server, so registration
/// claims two SIG slots.
#[derive(Clone)]
pub struct SensorConfig {
    pub sensors: Vec<SensorSpec>,
    /// Allocate a publication context so status updates can be published.
    pub publish: bool,
}

impl SensorConfig {
    pub fn new(sensors: Vec<SensorSpec>) -> Self {
        Self { sensors, publish: true }
    }

    pub fn with_publication(mut self, enabled: bool) -> Self {
        self.publish = enabled;
        self
    }
}

/// Runtime record per declared sensor.
pub(crate) struct SensorSlot {
    pub(crate) spec: SensorSpec,
    /// Last value read, answering gets and seeding publishes.
    pub(crate) last_value: i32,
}

/// Runtime state for one Sensor entry.
pub(crate) struct SensorState {
    pub(crate) sensors: Vec<SensorSlot>,
    pub(crate) publication: Publication,
}

impl SensorState {
    pub(crate) fn new(config: SensorConfig) -> Self {
        Self {
            sensors: config
                .sensors
                .into_iter()
                .map(|spec| SensorSlot { spec, last_value: 0 })
                .collect(),
            publication: Publication::new(config.publish),
        }
    }
}

// Raw value width in the marshalled payload.
const VALUE_LEN: u8 = 4;

/// Sensor Status payload for one property, marshalled in MPID Format B:
/// a format byte carrying the value length, the property ID, then the
/// raw value, all little-endian.
pub fn encode_status(property_id: u16, value: i32) -> Vec<u8> {
    let mut out = Vec::with_capacity(7);
    out.push((VALUE_LEN << 1) | 0x01);
    out.extend_from_slice(&property_id.to_le_bytes());
    out.extend_from_slice(&value.to_le_bytes());
    out
}

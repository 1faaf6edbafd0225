//! The output of automation: devices to switch.

use std::fmt;

use serde::{Deserialize, Serialize};
use smarthub_protocol::{Address, DeviceType};

/// Put one device into an on/off state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStatusCommand {
    /// Where to send the `SetStatus`.
    pub address: Address,
    /// The target's device type, stamped into the outbound header.
    pub dev_type: DeviceType,
    /// Name the target was resolved from.
    pub target: String,
    pub on: bool,
    pub reason: Reason,
}

/// What caused a [`SetStatusCommand`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reason {
    /// A switch changed state and this device is bound to it.
    SwitchBinding { switch: Address },
    /// A sensor reading satisfied one of the sensor's triggers.
    SensorTrigger {
        sensor_device: Address,
        sensor: u8,
        value: u32,
        threshold: u32,
    },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SwitchBinding { switch } => write!(f, "bound to switch {switch}"),
            Self::SensorTrigger {
                sensor_device,
                sensor,
                value,
                threshold,
            } => write!(
                f,
                "sensor {sensor} of {sensor_device} read {value} (threshold {threshold})"
            ),
        }
    }
}

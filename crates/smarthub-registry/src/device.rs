//! A device as the registry remembers it.

use serde::{Deserialize, Serialize};
use smarthub_protocol::{
    Address, DeviceProps, DeviceType, EnvSensorProps, Payload, SwitchProps,
};

/// One known device: identity plus the capabilities it announced.
///
/// Created from the first `WhoIsHere`/`IAmHere` seen from an address and
/// replaced wholesale by any later announcement from the same address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub name: String,
    pub address: Address,
    pub dev_type: DeviceType,
    /// Sensor fit and triggers, or switch bindings. `None` for devices
    /// that announce nothing beyond their name.
    pub props: Option<DeviceProps>,
}

impl Device {
    /// Builds a device from an announcement record.
    ///
    /// Returns `None` if the payload carries no announcement body.
    pub fn from_announce(payload: &Payload) -> Option<Self> {
        let announce = payload.announce()?;
        Some(Self {
            name: announce.name.clone(),
            address: payload.src,
            dev_type: payload.dev_type,
            props: announce.props.clone(),
        })
    }

    pub fn env_sensor_props(&self) -> Option<&EnvSensorProps> {
        match &self.props {
            Some(DeviceProps::EnvSensor(props)) => Some(props),
            _ => None,
        }
    }

    pub fn switch_props(&self) -> Option<&SwitchProps> {
        match &self.props {
            Some(DeviceProps::Switch(props)) => Some(props),
            _ => None,
        }
    }
}

//! Core protocol types: everything that travels inside a record.
//!
//! A record ("payload") is a small header followed by a body whose shape
//! depends on the `(cmd, dev_type)` pair in the header. The set of shapes
//! is small and closed, so the body is a plain enum ([`Body`]) rather than
//! an open trait hierarchy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 14-bit device address.
///
/// Device and hub addresses are assigned once at discovery and never
/// change for the lifetime of the process. The top of the range,
/// [`Address::BROADCAST`], addresses every device at once.
///
/// Serialized as the bare integer; deserialization re-checks the range.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "u16", into = "u16")]
pub struct Address(u16);

impl Address {
    /// Largest valid address value.
    pub const MAX: u16 = 0x3fff;

    /// The reserved broadcast address (16383).
    pub const BROADCAST: Address = Address(Self::MAX);

    /// Creates an address, or `None` if `raw` is above [`Address::MAX`].
    pub const fn new(raw: u16) -> Option<Self> {
        if raw <= Self::MAX { Some(Self(raw)) } else { None }
    }

    /// Returns the raw numeric address.
    pub const fn get(self) -> u16 {
        self.0
    }

    /// Returns `true` for the broadcast address.
    pub const fn is_broadcast(self) -> bool {
        self.0 == Self::MAX
    }
}

impl TryFrom<u32> for Address {
    type Error = ProtocolError;

    fn try_from(raw: u32) -> Result<Self, Self::Error> {
        u16::try_from(raw)
            .ok()
            .and_then(Address::new)
            .ok_or(ProtocolError::AddressOutOfRange(raw))
    }
}

impl TryFrom<u16> for Address {
    type Error = ProtocolError;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        Address::new(raw).ok_or(ProtocolError::AddressOutOfRange(raw.into()))
    }
}

impl From<Address> for u16 {
    fn from(address: Address) -> Self {
        address.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06x}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Header tags
// ---------------------------------------------------------------------------

/// The kind of device that sent (or is addressed by) a record.
///
/// Unknown tags are carried through as `Unknown(byte)` so that a newer hub
/// can't crash an older client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeviceType {
    Hub,
    EnvSensor,
    Switch,
    Lamp,
    Socket,
    Timer,
    Unknown(u8),
}

impl DeviceType {
    /// Maps a wire byte to a device type.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::Hub,
            2 => Self::EnvSensor,
            3 => Self::Switch,
            4 => Self::Lamp,
            5 => Self::Socket,
            6 => Self::Timer,
            other => Self::Unknown(other),
        }
    }

    /// Returns the wire byte for this device type.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::Hub => 1,
            Self::EnvSensor => 2,
            Self::Switch => 3,
            Self::Lamp => 4,
            Self::Socket => 5,
            Self::Timer => 6,
            Self::Unknown(byte) => byte,
        }
    }

    /// Devices whose status is a single on/off byte.
    pub fn has_binary_status(self) -> bool {
        matches!(self, Self::Switch | Self::Lamp | Self::Socket)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hub => write!(f, "Hub"),
            Self::EnvSensor => write!(f, "EnvSensor"),
            Self::Switch => write!(f, "Switch"),
            Self::Lamp => write!(f, "Lamp"),
            Self::Socket => write!(f, "Socket"),
            Self::Timer => write!(f, "Timer"),
            Self::Unknown(byte) => write!(f, "Unknown({byte})"),
        }
    }
}

/// The command a record carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Command {
    /// "Who is on the network?" Sent by a device (or this client) on boot.
    WhoIsHere,
    /// "I am." The answer to `WhoIsHere`.
    IAmHere,
    /// Ask a device for its current state.
    GetStatus,
    /// A device reporting its state.
    Status,
    /// Tell a device to change its state.
    SetStatus,
    /// The timer's clock broadcast. Drives all virtual time.
    Tick,
    Unknown(u8),
}

impl Command {
    /// Maps a wire byte to a command.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            1 => Self::WhoIsHere,
            2 => Self::IAmHere,
            3 => Self::GetStatus,
            4 => Self::Status,
            5 => Self::SetStatus,
            6 => Self::Tick,
            other => Self::Unknown(other),
        }
    }

    /// Returns the wire byte for this command.
    pub fn as_byte(self) -> u8 {
        match self {
            Self::WhoIsHere => 1,
            Self::IAmHere => 2,
            Self::GetStatus => 3,
            Self::Status => 4,
            Self::SetStatus => 5,
            Self::Tick => 6,
            Self::Unknown(byte) => byte,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WhoIsHere => write!(f, "WhoIsHere"),
            Self::IAmHere => write!(f, "IAmHere"),
            Self::GetStatus => write!(f, "GetStatus"),
            Self::Status => write!(f, "Status"),
            Self::SetStatus => write!(f, "SetStatus"),
            Self::Tick => write!(f, "Tick"),
            Self::Unknown(byte) => write!(f, "Unknown({byte})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Device properties
// ---------------------------------------------------------------------------

/// One automation rule configured on an environment sensor.
///
/// When the sensor at `sensor` reports a value below `threshold` (or above
/// it, if `compare_greater`), the device named `device` is switched to
/// `on`.
///
/// On the wire a trigger has no sensor field of its own: the sensor is
/// read back as `op & 3`. Triggers built with [`Trigger::from_op`] always
/// agree with that; a hand-built one whose `sensor` disagrees is rejected
/// by the encoder (see [`Trigger::is_encodable`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// State to put the target device into when the trigger fires.
    pub on: bool,
    /// `true` fires on `value > threshold`, `false` on `value < threshold`.
    pub compare_greater: bool,
    /// Sensor index (0..=3) this trigger watches.
    pub sensor: u8,
    pub threshold: u32,
    /// Name of the device to switch.
    pub device: String,
}

impl Trigger {
    /// Builds a trigger from its wire op byte.
    ///
    /// Bit 0 is the on/off action, bit 1 selects `>` over `<`, and the
    /// sensor selector is the two low bits read together (`op & 3`).
    pub fn from_op(op: u8, threshold: u32, device: impl Into<String>) -> Self {
        Self {
            on: op & 0x01 != 0,
            compare_greater: op & 0x02 != 0,
            sensor: op & 0x03,
            threshold,
            device: device.into(),
        }
    }

    /// The op byte written on the wire.
    pub fn op(&self) -> u8 {
        u8::from(self.on) | (u8::from(self.compare_greater) << 1)
    }

    /// The sensor a receiver decodes from [`op`](Self::op).
    pub fn wire_sensor(&self) -> u8 {
        self.op() & 0x03
    }

    /// `true` if encoding and decoding this trigger gives it back unchanged.
    pub fn is_encodable(&self) -> bool {
        self.sensor == self.wire_sensor()
    }

    /// Returns `true` if `value` satisfies this trigger's comparison.
    pub fn matches(&self, value: u32) -> bool {
        if self.compare_greater {
            value > self.threshold
        } else {
            value < self.threshold
        }
    }
}

/// Capabilities announced by an environment sensor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EnvSensorProps {
    /// Which of the four sensors (temperature, humidity, light, air
    /// quality) are fitted. Status values are reported only for these,
    /// in index order.
    pub sensors: [bool; 4],
    pub triggers: Vec<Trigger>,
}

impl EnvSensorProps {
    /// Decodes the sensor flags byte (bit N → sensor N).
    pub fn sensors_from_flags(flags: u8) -> [bool; 4] {
        std::array::from_fn(|i| flags & (1 << i) != 0)
    }

    /// Encodes the sensor flags byte.
    pub fn flags(&self) -> u8 {
        self.sensors
            .iter()
            .enumerate()
            .filter(|(_, enabled)| **enabled)
            .fold(0u8, |acc, (i, _)| acc | (1 << i))
    }

    /// Indices of the fitted sensors, ascending.
    pub fn enabled_sensors(&self) -> impl Iterator<Item = u8> + '_ {
        self.sensors
            .iter()
            .enumerate()
            .filter(|(_, enabled)| **enabled)
            .map(|(i, _)| i as u8)
    }
}

/// Capabilities announced by a switch: the devices it controls.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SwitchProps {
    pub devices: Vec<String>,
}

/// Device-type-specific properties carried by an announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeviceProps {
    EnvSensor(EnvSensorProps),
    Switch(SwitchProps),
}

// ---------------------------------------------------------------------------
// Body and Payload
// ---------------------------------------------------------------------------

/// The body of a `WhoIsHere` / `IAmHere` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceAnnounce {
    pub name: String,
    /// Present only for environment sensors and switches.
    pub props: Option<DeviceProps>,
}

/// A record body, selected by the header's `(cmd, dev_type)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Body {
    /// No body: `GetStatus`, relayed `SetStatus`, or a combination this
    /// client doesn't understand.
    Empty,
    /// `WhoIsHere` / `IAmHere`.
    Device(DeviceAnnounce),
    /// Sensor readings, one per fitted sensor in index order.
    EnvSensorStatus { values: Vec<u32> },
    /// On/off state of a switch, lamp, or socket (also the outbound
    /// `SetStatus` value).
    BinaryStatus { on: bool },
    /// Server virtual time in milliseconds.
    Tick { timestamp: u64 },
}

/// One decoded protocol record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    pub src: Address,
    pub dst: Address,
    /// Per-sender sequence number. Informational only.
    pub serial: u32,
    pub dev_type: DeviceType,
    pub cmd: Command,
    pub body: Body,
}

impl Payload {
    /// The timestamp of a `Tick` record, `None` for anything else.
    pub fn tick_timestamp(&self) -> Option<u64> {
        match (self.cmd, &self.body) {
            (Command::Tick, Body::Tick { timestamp }) => Some(*timestamp),
            _ => None,
        }
    }

    /// The announcement carried by a `WhoIsHere` / `IAmHere` record.
    pub fn announce(&self) -> Option<&DeviceAnnounce> {
        match &self.body {
            Body::Device(announce) => Some(announce),
            _ => None,
        }
    }

    /// Returns `true` if this record is a `Status` report from `address`.
    pub fn is_status_from(&self, address: Address) -> bool {
        self.cmd == Command::Status && self.src == address
    }
}

// =========================================================================
// Tests
// =========================================================================

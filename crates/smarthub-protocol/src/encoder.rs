//! Outbound packet construction.
//!
//! [`PacketEncoder`] owns the hub's identity (address and name) and the
//! serial counter, so every command the client sends gets a fresh serial
//! without the caller having to thread one through.

use crate::frame::encode_packet;
use crate::{Address, Body, Command, DeviceAnnounce, DeviceType, Payload, ProtocolError};

/// Name the client announces itself under unless configured otherwise.
pub const DEFAULT_HUB_NAME: &str = "HUB";

/// Builds the four outbound commands as ready-to-send transport text.
///
/// Serials start at 1 and increase by one per packet built, whether or not
/// the packet is actually sent.
#[derive(Debug, Clone)]
pub struct PacketEncoder {
    src: Address,
    name: String,
    next_serial: u32,
}

impl PacketEncoder {
    pub fn new(src: Address, name: impl Into<String>) -> Self {
        Self {
            src,
            name: name.into(),
            next_serial: 1,
        }
    }

    /// The hub address stamped into every packet.
    pub fn src(&self) -> Address {
        self.src
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The serial the next packet will carry.
    pub fn next_serial(&self) -> u32 {
        self.next_serial
    }

    /// Broadcasts a discovery request announcing this hub.
    pub fn who_is_here(&mut self) -> Result<String, ProtocolError> {
        let body = self.announce();
        self.build(Address::BROADCAST, DeviceType::Hub, Command::WhoIsHere, body)
    }

    /// Broadcasts this hub's answer to someone else's discovery request.
    pub fn i_am_here(&mut self) -> Result<String, ProtocolError> {
        let body = self.announce();
        self.build(Address::BROADCAST, DeviceType::Hub, Command::IAmHere, body)
    }

    /// Asks `dst` for its current state.
    pub fn get_status(
        &mut self,
        dst: Address,
        dev_type: DeviceType,
    ) -> Result<String, ProtocolError> {
        self.build(dst, dev_type, Command::GetStatus, Body::Empty)
    }

    /// Tells `dst` to switch on or off.
    pub fn set_status(
        &mut self,
        dst: Address,
        dev_type: DeviceType,
        on: bool,
    ) -> Result<String, ProtocolError> {
        self.build(dst, dev_type, Command::SetStatus, Body::BinaryStatus { on })
    }

    fn announce(&self) -> Body {
        Body::Device(DeviceAnnounce {
            name: self.name.clone(),
            props: None,
        })
    }

    fn build(
        &mut self,
        dst: Address,
        dev_type: DeviceType,
        cmd: Command,
        body: Body,
    ) -> Result<String, ProtocolError> {
        let payload = Payload {
            src: self.src,
            dst,
            serial: self.next_serial,
            dev_type,
            cmd,
            body,
        };
        self.next_serial = self.next_serial.wrapping_add(1);
        encode_packet(&[payload.encode()?])
    }
}

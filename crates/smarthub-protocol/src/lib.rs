//! Wire protocol for smarthub.
//!
//! This crate defines the language the hub client and the smart-home
//! server speak:
//!
//! - **Types** ([`Payload`], [`Body`], [`Address`], [`DeviceType`], etc.):
//!   the records that travel on the wire.
//! - **Framing** ([`decode_packet`], [`encode_packet`]): Base64URL text
//!   ⇄ length-prefixed, CRC8-checked records.
//! - **Grammar** ([`Payload::decode`], [`Payload::encode`]): record body
//!   bytes ⇄ typed payloads. [`decode_response`] runs framing and grammar
//!   together and reports what it skipped.
//! - **Encoder** ([`PacketEncoder`]): the four commands the client sends.
//! - **Errors** ([`ProtocolError`]): what can go wrong decoding a record.
//!
//! # Architecture
//!
//! ```text
//! Transport (text) → frame (record bodies) → codec (Payload) → client
//! ```
//!
//! Nothing in here knows about HTTP, device registries or timing. Every
//! function is pure apart from [`PacketEncoder`]'s serial counter.

// ---------------------------------------------------------------------------
// Module declarations
// ---------------------------------------------------------------------------

mod codec;
mod encoder;
mod error;
mod types;

pub mod crc8;
pub mod frame;
pub mod varint;

// ---------------------------------------------------------------------------
// Re-exports
// ---------------------------------------------------------------------------

pub use codec::{DecodedPayloads, decode_payloads, decode_response};
pub use encoder::{DEFAULT_HUB_NAME, PacketEncoder};
pub use error::ProtocolError;
pub use frame::{DecodedPacket, decode_packet, encode_packet};
pub use types::{
    Address, Body, Command, DeviceAnnounce, DeviceProps, DeviceType, EnvSensorProps,
    Payload, SwitchProps, Trigger,
};

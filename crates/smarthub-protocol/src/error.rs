//! Error types for the protocol layer.
//!
//! Every variant here is *record-level*: it describes why one record (or
//! one response blob) could not be decoded. None of them is fatal to a
//! session. The framer and the payload grammar recover from them locally
//! by skipping the offending record, so callers above the protocol crate
//! mostly see these in logs, not in their control flow.

/// Errors that can occur while encoding or decoding protocol data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// A VarInt or length-prefixed field runs past the end of the buffer.
    ///
    /// In the framer this silently ends decoding of the current blob;
    /// inside a record it discards just that record.
    #[error("input truncated")]
    TruncatedInput,

    /// The trailing CRC8 byte does not match the record body.
    #[error("corrupt record: expected crc {expected:#04x}, computed {actual:#04x}")]
    CorruptRecord { expected: u8, actual: u8 },

    /// A VarInt is longer than its target integer width allows.
    #[error("varint overflows its target width")]
    VarIntOverflow,

    /// A record body does not fit the one-byte length prefix.
    #[error("record body of {0} bytes exceeds the 255-byte frame limit")]
    RecordTooLarge(usize),

    /// A length-prefixed string is longer than 255 bytes.
    #[error("string of {0} bytes exceeds the 255-byte field limit")]
    FieldTooLarge(usize),

    /// The transport text is not valid URL-safe Base64.
    #[error("invalid base64: {0}")]
    InvalidBase64(String),

    /// An address outside `0..=16383` was found in a record header.
    #[error("address {0} is outside the 14-bit address space")]
    AddressOutOfRange(u32),

    /// A device name is not valid UTF-8.
    #[error("device name is not valid UTF-8")]
    InvalidName,

    /// A trigger's sensor index can't be expressed by its op byte.
    ///
    /// The wire carries only the op byte, and a receiver reads the sensor
    /// back as `op & 3`.
    #[error("trigger for sensor {sensor} cannot be encoded by op {op:#04b}")]
    UnencodableTrigger { sensor: u8, op: u8 },
}

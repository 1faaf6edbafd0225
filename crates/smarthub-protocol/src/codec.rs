//! Payload grammar: record body bytes ⇄ [`Payload`].
//!
//! Every record starts with the same header:
//!
//! ```text
//! src: varint │ dst: varint │ serial: varint │ dev_type: u8 │ cmd: u8
//! ```
//!
//! What follows depends on `(cmd, dev_type)`:
//!
//! | cmd                 | dev_type              | body                                        |
//! |---------------------|-----------------------|---------------------------------------------|
//! | WhoIsHere / IAmHere | any known             | name (u8 len + bytes), then props below     |
//! |                     | EnvSensor             | flags u8, n u8, n × (op u8, threshold varint, name) |
//! |                     | Switch                | n u8, n × name                              |
//! | Status              | EnvSensor             | n u8, n × varint                            |
//! |                     | Switch / Lamp / Socket| u8 (1 = on)                                 |
//! | SetStatus (outbound)| Switch / Lamp / Socket| u8 (1 = on)                                 |
//! | Tick                | Timer                 | timestamp varint (64-bit)                   |
//!
//! Anything else decodes to [`Body::Empty`]. Received `GetStatus` and
//! `SetStatus` records are addressed to other devices and are not decoded
//! past the header.

use tracing::debug;

use crate::frame::decode_packet;
use crate::varint;
use crate::{
    Address, Body, Command, DeviceAnnounce, DeviceProps, DeviceType, EnvSensorProps,
    Payload, ProtocolError, SwitchProps, Trigger,
};

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// A bounds-checked cursor over one record body.
struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn u8(&mut self) -> Result<u8, ProtocolError> {
        let byte = *self.buf.get(self.pos).ok_or(ProtocolError::TruncatedInput)?;
        self.pos += 1;
        Ok(byte)
    }

    fn varint(&mut self) -> Result<u32, ProtocolError> {
        let (value, consumed) = varint::decode_unsigned(self.buf, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    fn timestamp(&mut self) -> Result<u64, ProtocolError> {
        let (value, consumed) = varint::decode_timestamp(self.buf, self.pos)?;
        self.pos += consumed;
        Ok(value)
    }

    fn address(&mut self) -> Result<Address, ProtocolError> {
        Address::try_from(self.varint()?)
    }

    /// A one-byte length followed by that many bytes of name.
    fn string(&mut self) -> Result<String, ProtocolError> {
        let len = usize::from(self.u8()?);
        let end = self.pos + len;
        let bytes = self
            .buf
            .get(self.pos..end)
            .ok_or(ProtocolError::TruncatedInput)?;
        self.pos = end;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidName)
    }
}

impl Payload {
    /// Decodes one record body (without length prefix or checksum).
    ///
    /// # Errors
    /// Any field running past the end of `body`, an over-long VarInt, an
    /// address above 16383, or a name that isn't UTF-8. The caller should
    /// drop the record and carry on with the next one.
    pub fn decode(body: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = Reader::new(body);

        let src = r.address()?;
        let dst = r.address()?;
        let serial = r.varint()?;
        let dev_type = DeviceType::from_byte(r.u8()?);
        let cmd = Command::from_byte(r.u8()?);

        let body = match cmd {
            Command::WhoIsHere | Command::IAmHere => decode_announce(&mut r, dev_type)?,
            Command::Status => decode_status(&mut r, dev_type)?,
            Command::Tick => Body::Tick {
                timestamp: r.timestamp()?,
            },
            Command::GetStatus | Command::SetStatus | Command::Unknown(_) => Body::Empty,
        };

        Ok(Payload {
            src,
            dst,
            serial,
            dev_type,
            cmd,
            body,
        })
    }
}

fn decode_announce(r: &mut Reader<'_>, dev_type: DeviceType) -> Result<Body, ProtocolError> {
    if matches!(dev_type, DeviceType::Unknown(_)) {
        return Ok(Body::Empty);
    }

    let name = r.string()?;
    let props = match dev_type {
        DeviceType::EnvSensor => {
            let sensors = EnvSensorProps::sensors_from_flags(r.u8()?);
            let count = r.u8()?;
            let mut triggers = Vec::with_capacity(usize::from(count));
            for _ in 0..count {
                let op = r.u8()?;
                let threshold = r.varint()?;
                let device = r.string()?;
                triggers.push(Trigger::from_op(op, threshold, device));
            }
            Some(DeviceProps::EnvSensor(EnvSensorProps { sensors, triggers }))
        }
        DeviceType::Switch => {
            let count = r.u8()?;
            let devices = (0..count)
                .map(|_| r.string())
                .collect::<Result<Vec<_>, _>>()?;
            Some(DeviceProps::Switch(SwitchProps { devices }))
        }
        _ => None,
    };

    Ok(Body::Device(DeviceAnnounce { name, props }))
}

fn decode_status(r: &mut Reader<'_>, dev_type: DeviceType) -> Result<Body, ProtocolError> {
    match dev_type {
        DeviceType::EnvSensor => {
            let count = r.u8()?;
            let values = (0..count)
                .map(|_| r.varint())
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Body::EnvSensorStatus { values })
        }
        t if t.has_binary_status() => Ok(Body::BinaryStatus { on: r.u8()? == 1 }),
        _ => Ok(Body::Empty),
    }
}

/// Payloads decoded from one transport response, with what was skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPayloads {
    /// Records that decoded cleanly, in delivery order.
    pub payloads: Vec<Payload>,
    /// Records dropped for a bad checksum.
    pub corrupt: usize,
    /// Records that passed the checksum but not the grammar.
    pub undecodable: usize,
    /// `true` if the last record ran past the end of the data.
    pub truncated: bool,
}

/// Decodes transport text into payloads, counting what had to be skipped.
///
/// Records that fail the checksum or the grammar are logged and skipped.
///
/// # Errors
/// Only [`ProtocolError::InvalidBase64`].
pub fn decode_response(text: &str) -> Result<DecodedPayloads, ProtocolError> {
    let packet = decode_packet(text)?;

    let mut decoded = DecodedPayloads {
        payloads: Vec::with_capacity(packet.records.len()),
        corrupt: packet.corrupt,
        undecodable: 0,
        truncated: packet.truncated,
    };
    for body in &packet.records {
        match Payload::decode(body) {
            Ok(payload) => decoded.payloads.push(payload),
            Err(error) => {
                decoded.undecodable += 1;
                debug!(%error, len = body.len(), "skipping undecodable record");
            }
        }
    }
    Ok(decoded)
}

/// Decodes transport text straight into payloads.
///
/// Shorthand for [`decode_response`] when the skip counts don't matter.
pub fn decode_payloads(text: &str) -> Result<Vec<Payload>, ProtocolError> {
    decode_response(text).map(|decoded| decoded.payloads)
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

impl Payload {
    /// Encodes this payload as a record body (no length prefix, no CRC).
    ///
    /// # Errors
    /// [`ProtocolError::FieldTooLarge`] if a name or list doesn't fit its
    /// one-byte length, [`ProtocolError::UnencodableTrigger`] if a trigger's
    /// sensor can't be carried by its op byte.
    pub fn encode(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut out = Vec::with_capacity(16);
        varint::encode_into(u64::from(self.src.get()), &mut out);
        varint::encode_into(u64::from(self.dst.get()), &mut out);
        varint::encode_into(u64::from(self.serial), &mut out);
        out.push(self.dev_type.as_byte());
        out.push(self.cmd.as_byte());

        match &self.body {
            Body::Empty => {}
            Body::Device(announce) => {
                write_string(&mut out, &announce.name)?;
                match &announce.props {
                    Some(DeviceProps::EnvSensor(props)) => {
                        out.push(props.flags());
                        out.push(count_byte(props.triggers.len())?);
                        for trigger in &props.triggers {
                            if !trigger.is_encodable() {
                                return Err(ProtocolError::UnencodableTrigger {
                                    sensor: trigger.sensor,
                                    op: trigger.op(),
                                });
                            }
                            out.push(trigger.op());
                            varint::encode_into(u64::from(trigger.threshold), &mut out);
                            write_string(&mut out, &trigger.device)?;
                        }
                    }
                    Some(DeviceProps::Switch(props)) => {
                        out.push(count_byte(props.devices.len())?);
                        for device in &props.devices {
                            write_string(&mut out, device)?;
                        }
                    }
                    None => {}
                }
            }
            Body::EnvSensorStatus { values } => {
                out.push(count_byte(values.len())?);
                for value in values {
                    varint::encode_into(u64::from(*value), &mut out);
                }
            }
            Body::BinaryStatus { on } => out.push(u8::from(*on)),
            Body::Tick { timestamp } => varint::encode_into(*timestamp, &mut out),
        }

        Ok(out)
    }
}

fn count_byte(len: usize) -> Result<u8, ProtocolError> {
    u8::try_from(len).map_err(|_| ProtocolError::FieldTooLarge(len))
}

fn write_string(out: &mut Vec<u8>, s: &str) -> Result<(), ProtocolError> {
    out.push(count_byte(s.len())?);
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

// =========================================================================
// Tests
// =========================================================================

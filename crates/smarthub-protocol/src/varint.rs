//! Base-128 variable-length integers (unsigned LEB128).
//!
//! Seven payload bits per byte, least significant group first. Every byte
//! except the last has the continuation bit (`0x80`) set:
//!
//! ```text
//!   300 = 0b1_0010_1100
//!       → [0b1010_1100, 0b0000_0010] = [0xAC, 0x02]
//! ```
//!
//! Addresses, serials, sensor values and trigger thresholds use the 32-bit
//! form. Tick timestamps use the 64-bit form so large server clocks don't
//! overflow.

use crate::ProtocolError;

const CONTINUATION: u8 = 0x80;
const PAYLOAD_MASK: u8 = 0x7f;

/// Longest valid encoding of a `u32` (ceil(32 / 7)).
const MAX_U32_BYTES: usize = 5;
/// Longest valid encoding of a `u64` (ceil(64 / 7)).
const MAX_U64_BYTES: usize = 10;

/// Encodes an unsigned 32-bit value.
pub fn encode_unsigned(value: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_U32_BYTES);
    encode_into(u64::from(value), &mut out);
    out
}

/// Encodes a 64-bit timestamp (Tick bodies).
pub fn encode_timestamp(value: u64) -> Vec<u8> {
    let mut out = Vec::with_capacity(MAX_U64_BYTES);
    encode_into(value, &mut out);
    out
}

/// Appends the encoding of `value` to `out`.
pub fn encode_into(mut value: u64, out: &mut Vec<u8>) {
    loop {
        let mut byte = (value as u8) & PAYLOAD_MASK;
        value >>= 7;
        if value != 0 {
            byte |= CONTINUATION;
        }
        out.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decodes an unsigned 32-bit value starting at `offset`.
///
/// Returns the value and the number of bytes consumed.
///
/// # Errors
/// - [`ProtocolError::TruncatedInput`] if the buffer ends mid-sequence.
/// - [`ProtocolError::VarIntOverflow`] if the value does not fit in `u32`.
pub fn decode_unsigned(
    buf: &[u8],
    offset: usize,
) -> Result<(u32, usize), ProtocolError> {
    let (value, consumed) = decode(buf, offset, MAX_U32_BYTES)?;
    let value = u32::try_from(value).map_err(|_| ProtocolError::VarIntOverflow)?;
    Ok((value, consumed))
}

/// Decodes a 64-bit timestamp starting at `offset`.
///
/// Same scheme as [`decode_unsigned`], accumulated in 64-bit arithmetic.
pub fn decode_timestamp(
    buf: &[u8],
    offset: usize,
) -> Result<(u64, usize), ProtocolError> {
    decode(buf, offset, MAX_U64_BYTES)
}

fn decode(
    buf: &[u8],
    offset: usize,
    max_bytes: usize,
) -> Result<(u64, usize), ProtocolError> {
    let mut result = 0u64;
    let mut consumed = 0usize;

    loop {
        let byte = *buf
            .get(offset + consumed)
            .ok_or(ProtocolError::TruncatedInput)?;

        if consumed == max_bytes {
            return Err(ProtocolError::VarIntOverflow);
        }

        let group = u64::from(byte & PAYLOAD_MASK);
        let shift = 7 * consumed as u32;
        // The tenth byte of a u64 may only carry the single top bit.
        if shift == 63 && group > 1 {
            return Err(ProtocolError::VarIntOverflow);
        }
        result |= group << shift;
        consumed += 1;

        if byte & CONTINUATION == 0 {
            return Ok((result, consumed));
        }
    }
}

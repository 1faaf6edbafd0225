//! Packet framing: Base64URL text ⇄ checksummed records.
//!
//! A transport payload is URL-safe Base64 (no padding) of one or more
//! records laid end to end:
//!
//! ```text
//! ┌────────┬──────────────────────┬────────┐
//! │ len: 1 │ body: len bytes      │ crc: 1 │  ...repeated
//! └────────┴──────────────────────┴────────┘
//! ```
//!
//! The CRC8 covers the body only. Decoding is forgiving: a record with a
//! bad checksum is skipped and scanning resumes right after it, and a
//! record cut off by the end of the buffer ends decoding without an error.
//! Hub responses are sometimes partial, and one bad record must not cost
//! the rest of the batch.

use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use tracing::{debug, trace};

use crate::crc8::crc8;
use crate::ProtocolError;

/// Largest body a one-byte length prefix can describe.
pub const MAX_RECORD_BODY: usize = u8::MAX as usize;

/// URL-safe alphabet, never pads on output, accepts either on input.
const BASE64URL: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// The raw record bodies recovered from one transport payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedPacket {
    /// Bodies that passed the checksum, in encounter order.
    pub records: Vec<Vec<u8>>,
    /// How many records were dropped for a checksum mismatch.
    pub corrupt: usize,
    /// `true` if the buffer ended in the middle of a record.
    pub truncated: bool,
}

/// Decodes transport text into record bodies.
///
/// Whitespace anywhere in `text` is ignored.
///
/// # Errors
/// Only [`ProtocolError::InvalidBase64`]. Checksum failures and truncation
/// are reported through the fields of [`DecodedPacket`].
pub fn decode_packet(text: &str) -> Result<DecodedPacket, ProtocolError> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64URL
        .decode(compact.as_bytes())
        .map_err(|e| ProtocolError::InvalidBase64(e.to_string()))?;
    Ok(split_records(&bytes))
}

/// Splits an already-decoded byte buffer into checked record bodies.
pub fn split_records(bytes: &[u8]) -> DecodedPacket {
    let mut packet = DecodedPacket::default();
    let mut cursor = 0usize;

    while cursor < bytes.len() {
        let len = usize::from(bytes[cursor]);
        let body_start = cursor + 1;
        let crc_at = body_start + len;

        let Some(&expected) = bytes.get(crc_at) else {
            trace!(
                offset = cursor,
                len,
                available = bytes.len() - body_start,
                "record runs past end of buffer, dropping tail"
            );
            packet.truncated = true;
            break;
        };

        let body = &bytes[body_start..crc_at];
        let actual = crc8(body);
        if actual == expected {
            packet.records.push(body.to_vec());
        } else {
            debug!(
                offset = cursor,
                error = %ProtocolError::CorruptRecord { expected, actual },
                "skipping record"
            );
            packet.corrupt += 1;
        }

        cursor = crc_at + 1;
    }

    packet
}

/// Wraps a record body with its length prefix and trailing checksum.
///
/// # Errors
/// [`ProtocolError::RecordTooLarge`] if `body` is longer than 255 bytes.
pub fn frame_record(body: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let len = u8::try_from(body.len())
        .map_err(|_| ProtocolError::RecordTooLarge(body.len()))?;
    let mut framed = Vec::with_capacity(body.len() + 2);
    framed.push(len);
    framed.extend_from_slice(body);
    framed.push(crc8(body));
    Ok(framed)
}

/// Frames each body and Base64URL-encodes the concatenation.
pub fn encode_packet<B: AsRef<[u8]>>(bodies: &[B]) -> Result<String, ProtocolError> {
    let mut raw = Vec::new();
    for body in bodies {
        raw.extend(frame_record(body.as_ref())?);
    }
    Ok(BASE64URL.encode(raw))
}

/// Base64URL-encodes raw bytes without framing them.
///
/// Useful for building deliberately malformed payloads.
pub fn encode_raw(bytes: &[u8]) -> String {
    BASE64URL.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn framed(bodies: &[&[u8]]) -> Vec<u8> {
        bodies
            .iter()
            .flat_map(|b| frame_record(b).unwrap())
            .collect()
    }

    #[test]
    fn test_frame_record_layout() {
        let framed = frame_record(&[0x01, 0x02, 0x03]).unwrap();
        assert_eq!(framed.len(), 5);
        assert_eq!(framed[0], 3);
        assert_eq!(&framed[1..4], &[0x01, 0x02, 0x03]);
        assert_eq!(framed[4], crc8(&[0x01, 0x02, 0x03]));
    }

    #[test]
    fn test_frame_record_rejects_oversized_body() {
        assert!(frame_record(&[0u8; 255]).is_ok());
        assert_eq!(
            frame_record(&[0u8; 256]),
            Err(ProtocolError::RecordTooLarge(256))
        );
    }

    #[test]
    fn test_encode_packet_has_no_padding_and_is_url_safe() {
        // Lengths chosen so standard Base64 would need padding.
        let text = encode_packet(&[vec![0xfb, 0xff]]).unwrap();
        assert!(!text.contains('='));
        assert!(!text.contains('+'));
        assert!(!text.contains('/'));
    }

    #[test]
    fn test_decode_packet_recovers_records_in_order() {
        let bodies: [&[u8]; 3] = [b"first", b"second", b"third"];
        let text = encode_packet(&bodies).unwrap();
        let packet = decode_packet(&text).unwrap();

        assert_eq!(
            packet.records,
            vec![b"first".to_vec(), b"second".to_vec(), b"third".to_vec()]
        );
        assert_eq!(packet.corrupt, 0);
        assert!(!packet.truncated);
    }

    #[test]
    fn test_decode_packet_skips_record_with_bad_crc() {
        // One good record followed by one whose CRC byte is flipped.
        let mut raw = framed(&[b"good", b"bad!"]);
        let last = raw.len() - 1;
        raw[last] ^= 0xff;

        let packet = decode_packet(&encode_raw(&raw)).unwrap();

        assert_eq!(packet.records, vec![b"good".to_vec()]);
        assert_eq!(packet.corrupt, 1);
    }

    #[test]
    fn test_decode_packet_resumes_after_corrupt_record() {
        let mut raw = framed(&[b"one", b"two", b"three"]);
        // Corrupt a body byte of the middle record: [3,o,n,e,crc][3,t,...]
        raw[6] ^= 0x01;

        let packet = decode_packet(&encode_raw(&raw)).unwrap();

        assert_eq!(packet.records, vec![b"one".to_vec(), b"three".to_vec()]);
        assert_eq!(packet.corrupt, 1);
    }

    #[test]
    fn test_decode_packet_drops_truncated_tail_silently() {
        let mut raw = framed(&[b"whole"]);
        // A length byte promising 10 bytes, followed by only 3.
        raw.extend_from_slice(&[10, 1, 2, 3]);

        let packet = decode_packet(&encode_raw(&raw)).unwrap();

        assert_eq!(packet.records, vec![b"whole".to_vec()]);
        assert!(packet.truncated);
    }

    #[test]
    fn test_decode_packet_missing_crc_byte_is_truncation() {
        let mut raw = framed(&[b"abc"]);
        raw.pop();

        let packet = decode_packet(&encode_raw(&raw)).unwrap();

        assert!(packet.records.is_empty());
        assert!(packet.truncated);
    }

    #[test]
    fn test_decode_packet_ignores_whitespace_and_padding() {
        let text = encode_packet(&[b"hi".as_slice()]).unwrap();
        let spaced = format!(" {} \n", text.chars().map(|c| format!("{c} ")).collect::<String>());
        assert_eq!(decode_packet(&spaced).unwrap().records, vec![b"hi".to_vec()]);

        let padded = format!("{text}{}", "=".repeat((4 - text.len() % 4) % 4));
        assert_eq!(decode_packet(&padded).unwrap().records, vec![b"hi".to_vec()]);
    }

    #[test]
    fn test_decode_packet_empty_text_yields_nothing() {
        let packet = decode_packet("").unwrap();
        assert_eq!(packet, DecodedPacket::default());
    }

    #[test]
    fn test_decode_packet_invalid_base64_is_error() {
        assert!(matches!(
            decode_packet("not*base64!"),
            Err(ProtocolError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_split_records_zero_length_body() {
        let packet = split_records(&[0, crc8(&[])]);
        assert_eq!(packet.records, vec![Vec::<u8>::new()]);
    }
}

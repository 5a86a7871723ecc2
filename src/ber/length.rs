//! BER length encoding and decoding.
//!
//! Length encoding follows X.690 Section 8.1.3:
//! - Short form: Single byte, bit 8=0, value 0-127
//! - Long form: Initial byte (bit 8=1, bits 7-1=count), followed by length bytes
//! - Indefinite form (0x80): Rejected

use std::net::SocketAddr;

use crate::error::{Error, Result, UNKNOWN_TARGET};

/// Maximum length we'll accept.
///
/// Device responses for GET/GETNEXT/SET are a few hundred bytes; 2MB is a
/// sanity bound, not a protocol limit.
pub const MAX_LENGTH: usize = 0x200000;

/// Encode a length, returning bytes in reverse order for prepending.
pub(crate) fn encode_length(len: usize) -> ([u8; 5], usize) {
    let mut buf = [0u8; 5];

    if len <= 127 {
        buf[0] = len as u8;
        return (buf, 1);
    }

    let mut remaining = len;
    let mut count = 0;
    while remaining > 0 {
        buf[count] = remaining as u8;
        remaining >>= 8;
        count += 1;
    }
    buf[count] = 0x80 | count as u8;
    (buf, count + 1)
}

/// Decode a length, returning (length, bytes_consumed).
///
/// `base_offset` is only used for diagnostics.
pub(crate) fn decode_length(
    data: &[u8],
    base_offset: usize,
    target: Option<SocketAddr>,
) -> Result<(usize, usize)> {
    let malformed = |reason: &'static str| {
        tracing::debug!(target: "albedo_snmp::ber", { snmp.offset = base_offset }, "{}", reason);
        Error::MalformedResponse {
            target: target.unwrap_or(UNKNOWN_TARGET),
        }
        .boxed()
    };

    let Some(&first) = data.first() else {
        return Err(malformed("truncated length"));
    };

    if first == 0x80 {
        return Err(malformed("indefinite length not supported"));
    }

    if first & 0x80 == 0 {
        return Ok((first as usize, 1));
    }

    let num_octets = (first & 0x7F) as usize;
    if num_octets == 0 || num_octets > 4 {
        return Err(malformed("invalid long-form length"));
    }
    if data.len() < 1 + num_octets {
        return Err(malformed("truncated length"));
    }

    let len = data[1..=num_octets]
        .iter()
        .fold(0usize, |acc, &b| (acc << 8) | b as usize);

    if len > MAX_LENGTH {
        return Err(malformed("length exceeds maximum"));
    }

    Ok((len, 1 + num_octets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(len: usize) -> Vec<u8> {
        let (bytes, count) = encode_length(len);
        bytes[..count].iter().rev().copied().collect()
    }

    #[test]
    fn short_and_long_forms() {
        assert_eq!(wire(5), [0x05]);
        assert_eq!(wire(127), [0x7F]);
        assert_eq!(wire(128), [0x81, 0x80]);
        assert_eq!(wire(300), [0x82, 0x01, 0x2C]);
    }

    #[test]
    fn decode_matches_encode() {
        for len in [0, 1, 127, 128, 255, 256, 65535, 70000] {
            let bytes = wire(len);
            assert_eq!(decode_length(&bytes, 0, None).unwrap(), (len, bytes.len()));
        }
    }

    #[test]
    fn rejects_indefinite_and_oversized() {
        assert!(decode_length(&[0x80], 0, None).is_err());
        assert!(decode_length(&[0x85, 1, 2, 3, 4, 5], 0, None).is_err());
        assert!(decode_length(&[0x83, 0xFF, 0xFF, 0xFF], 0, None).is_err());
        assert!(decode_length(&[0x82, 0x01], 0, None).is_err());
    }
}

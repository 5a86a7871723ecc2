//! BER decoding of agent responses.
//!
//! Slices share the datagram buffer; nothing is copied until a value is
//! turned into an owned type.

use std::net::SocketAddr;

use super::length::decode_length;
use super::tag;
use crate::error::{Error, Result, UNKNOWN_TARGET};
use crate::oid::Oid;
use bytes::Bytes;

/// Cursor over one received datagram (or a nested TLV inside it).
pub struct Decoder {
    data: Bytes,
    offset: usize,
    target: Option<SocketAddr>,
}

impl Decoder {
    pub fn new(data: Bytes) -> Self {
        Self {
            data,
            offset: 0,
            target: None,
        }
    }

    /// Decoder whose errors name the agent the datagram came from.
    pub fn with_target(data: Bytes, target: SocketAddr) -> Self {
        Self {
            data,
            offset: 0,
            target: Some(target),
        }
    }

    /// Copying constructor, mostly for tests.
    pub fn from_slice(data: &[u8]) -> Self {
        Self::new(Bytes::copy_from_slice(data))
    }

    pub(crate) fn malformed(&self, reason: &str) -> Box<Error> {
        tracing::debug!(target: "albedo_snmp::ber", { snmp.offset = self.offset }, "{}", reason);
        Error::MalformedResponse {
            target: self.target.unwrap_or(UNKNOWN_TARGET),
        }
        .boxed()
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    /// True once every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.offset >= self.data.len()
    }

    pub fn read_tag(&mut self) -> Result<u8> {
        let Some(&byte) = self.data.get(self.offset) else {
            return Err(self.malformed("truncated data: unexpected end of input"));
        };
        self.offset += 1;
        Ok(byte)
    }

    /// Definite lengths only; SNMP never uses the indefinite form.
    pub fn read_length(&mut self) -> Result<usize> {
        let (len, consumed) = decode_length(&self.data[self.offset..], self.offset, self.target)?;
        self.offset += consumed;
        Ok(len)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        if self.offset.saturating_add(len) > self.data.len() {
            return Err(self.malformed("insufficient data"));
        }
        let bytes = self.data.slice(self.offset..self.offset + len);
        self.offset += len;
        Ok(bytes)
    }

    /// Consume `expected` and its length, returning the length.
    fn expect_tag(&mut self, expected: u8) -> Result<usize> {
        let tag = self.read_tag()?;
        if tag != expected {
            tracing::debug!(target: "albedo_snmp::ber", { snmp.offset = self.offset - 1, expected, actual = tag }, "unexpected tag");
            return Err(self.malformed("unexpected tag"));
        }
        self.read_length()
    }

    pub fn read_integer(&mut self) -> Result<i32> {
        let len = self.expect_tag(tag::universal::INTEGER)?;
        self.read_integer_value(len)
    }

    /// Two's-complement content of `len` bytes. Over-long encodings are truncated to their first four bytes.
    pub fn read_integer_value(&mut self, len: usize) -> Result<i32> {
        if len == 0 {
            return Err(self.malformed("zero-length integer"));
        }
        if len > 4 {
            tracing::warn!(target: "albedo_snmp::ber", { snmp.offset = self.offset, length = len }, "integer too long, truncating to 4 bytes");
        }

        let bytes = self.read_bytes(len)?;
        let mut value: i32 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
        for &byte in bytes.iter().take(4) {
            value = (value << 8) | (byte as i32);
        }
        Ok(value)
    }

    /// Counter64 content. Nine bytes are allowed for the leading zero.
    pub fn read_integer64_value(&mut self, len: usize) -> Result<u64> {
        if len == 0 {
            return Err(self.malformed("zero-length integer"));
        }
        if len > 9 {
            return Err(self.malformed("integer64 too long"));
        }
        let bytes = self.read_bytes(len)?;
        Ok(bytes.iter().fold(0u64, |acc, &b| (acc << 8) | b as u64))
    }

    /// Counter32, Gauge32 and TimeTicks content.
    pub fn read_unsigned32_value(&mut self, len: usize) -> Result<u32> {
        if len == 0 {
            return Err(self.malformed("zero-length integer"));
        }
        if len > 5 {
            tracing::warn!(target: "albedo_snmp::ber", { snmp.offset = self.offset, length = len }, "unsigned integer too long, truncating");
        }
        let bytes = self.read_bytes(len)?;
        Ok(bytes
            .iter()
            .take(5)
            .fold(0u32, |acc, &b| (acc << 8) | b as u32))
    }

    pub fn read_octet_string(&mut self) -> Result<Bytes> {
        let len = self.expect_tag(tag::universal::OCTET_STRING)?;
        self.read_bytes(len)
    }

    pub fn read_oid(&mut self) -> Result<Oid> {
        let len = self.expect_tag(tag::universal::OBJECT_IDENTIFIER)?;
        self.read_oid_value(len)
    }

    pub fn read_oid_value(&mut self, len: usize) -> Result<Oid> {
        let bytes = self.read_bytes(len)?;
        Oid::from_ber(&bytes).map_err(|_| self.malformed("invalid OID encoding"))
    }

    /// Decoder over the contents of the next SEQUENCE.
    pub fn read_sequence(&mut self) -> Result<Decoder> {
        let len = self.expect_tag(tag::universal::SEQUENCE)?;
        self.sub_decoder(len)
    }

    /// Decoder over the next `len` bytes; the parent skips past them.
    pub fn sub_decoder(&mut self, len: usize) -> Result<Decoder> {
        let content = self.read_bytes(len)?;
        Ok(Decoder {
            data: content,
            offset: 0,
            target: self.target,
        })
    }
}

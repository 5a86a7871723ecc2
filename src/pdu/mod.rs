//! SNMP Protocol Data Units (PDUs).
//!
//! Only the request/response PDUs used for device operations are modelled:
//! GET, GETNEXT, SET and their Response.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::{ErrorStatus, Result};
use crate::oid::Oid;
use crate::varbind::{VarBind, decode_varbind_list, encode_varbind_list};

/// PDU type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PduType {
    GetRequest = 0xA0,
    GetNextRequest = 0xA1,
    Response = 0xA2,
    SetRequest = 0xA3,
}

impl PduType {
    /// Create from tag byte.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0xA0 => Some(Self::GetRequest),
            0xA1 => Some(Self::GetNextRequest),
            0xA2 => Some(Self::Response),
            0xA3 => Some(Self::SetRequest),
            _ => None,
        }
    }

    /// Get the tag byte.
    pub fn tag(self) -> u8 {
        self as u8
    }
}

impl std::fmt::Display for PduType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::GetRequest => write!(f, "GetRequest"),
            Self::GetNextRequest => write!(f, "GetNextRequest"),
            Self::Response => write!(f, "Response"),
            Self::SetRequest => write!(f, "SetRequest"),
        }
    }
}

/// Generic PDU structure for request/response operations.
#[derive(Debug, Clone)]
pub struct Pdu {
    /// PDU type
    pub pdu_type: PduType,
    /// Request ID for correlating requests and responses
    pub request_id: i32,
    /// Error status (0 for requests, error code for responses)
    pub error_status: i32,
    /// Error index (1-based index of problematic varbind)
    pub error_index: i32,
    /// Variable bindings
    pub varbinds: Vec<VarBind>,
}

impl Pdu {
    fn request(pdu_type: PduType, request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self {
            pdu_type,
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds,
        }
    }

    /// Create a new GET request PDU.
    pub fn get_request(request_id: i32, oids: &[Oid]) -> Self {
        let varbinds = oids.iter().map(|oid| VarBind::null(oid.clone())).collect();
        Self::request(PduType::GetRequest, request_id, varbinds)
    }

    /// Create a new GETNEXT request PDU.
    pub fn get_next_request(request_id: i32, oids: &[Oid]) -> Self {
        let varbinds = oids.iter().map(|oid| VarBind::null(oid.clone())).collect();
        Self::request(PduType::GetNextRequest, request_id, varbinds)
    }

    /// Create a new SET request PDU.
    pub fn set_request(request_id: i32, varbinds: Vec<VarBind>) -> Self {
        Self::request(PduType::SetRequest, request_id, varbinds)
    }

    /// Encode to BER.
    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_constructed(self.pdu_type.tag(), |buf| {
            encode_varbind_list(buf, &self.varbinds);
            buf.push_integer(self.error_index);
            buf.push_integer(self.error_status);
            buf.push_integer(self.request_id);
        });
    }

    /// Decode from BER.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let tag = decoder.read_tag()?;
        let pdu_type = PduType::from_tag(tag).ok_or_else(|| decoder.malformed("unknown PDU type"))?;

        let len = decoder.read_length()?;
        let mut pdu_decoder = decoder.sub_decoder(len)?;

        let request_id = pdu_decoder.read_integer()?;
        let error_status = pdu_decoder.read_integer()?;
        let error_index = pdu_decoder.read_integer()?;
        let varbinds = decode_varbind_list(&mut pdu_decoder)?;

        Ok(Pdu {
            pdu_type,
            request_id,
            error_status,
            error_index,
            varbinds,
        })
    }

    /// Check if this is an error response.
    pub fn is_error(&self) -> bool {
        self.error_status != 0
    }

    /// Get the error status as an enum.
    pub fn error_status_enum(&self) -> ErrorStatus {
        ErrorStatus::from_i32(self.error_status)
    }

    /// The OID named by a 1-based error index, if it points at a varbind.
    pub fn error_oid(&self) -> Option<Oid> {
        let index = usize::try_from(self.error_index).ok()?.checked_sub(1)?;
        self.varbinds.get(index).map(|vb| vb.oid.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;
    use crate::value::Value;

    #[test]
    fn test_set_request_roundtrip() {
        let pdu = Pdu::set_request(
            77,
            vec![VarBind::new(oid!(1, 3, 6, 1, 4, 1, 39412, 1, 3, 1, 5, 1), Value::Integer(5))],
        );
        let mut buf = EncodeBuf::new();
        pdu.encode(&mut buf);
        let decoded = Pdu::decode(&mut Decoder::new(buf.finish())).unwrap();

        assert_eq!(decoded.pdu_type, PduType::SetRequest);
        assert_eq!(decoded.request_id, 77);
        assert_eq!(decoded.varbinds, pdu.varbinds);
    }

    #[test]
    fn test_error_oid_uses_one_based_index() {
        let mut pdu = Pdu::get_request(1, &[oid!(1, 3, 6, 1, 1), oid!(1, 3, 6, 1, 2)]);
        pdu.error_status = ErrorStatus::InconsistentValue.as_i32();
        pdu.error_index = 2;
        assert_eq!(pdu.error_oid(), Some(oid!(1, 3, 6, 1, 2)));

        pdu.error_index = 0;
        assert_eq!(pdu.error_oid(), None);
        pdu.error_index = 3;
        assert_eq!(pdu.error_oid(), None);
    }

    #[test]
    fn test_unknown_pdu_tag_rejected() {
        let mut decoder = Decoder::from_slice(&[0xA7, 0x00]);
        assert!(Pdu::decode(&mut decoder).is_err());
    }
}

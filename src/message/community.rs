//! Community-based SNMPv2c message format.
//!
//! `SEQUENCE { version INTEGER, community OCTET STRING, pdu PDU }`

use crate::ber::{Decoder, EncodeBuf};
use crate::error::Result;
use crate::pdu::Pdu;
use bytes::Bytes;

/// Version field value for SNMPv2c.
pub const SNMP_V2C: i32 = 1;

/// Community-based SNMPv2c message.
#[derive(Debug, Clone)]
pub struct CommunityMessage {
    /// Community string for authentication
    pub community: Bytes,
    /// Protocol data unit
    pub pdu: Pdu,
}

impl CommunityMessage {
    /// Create a V2c message.
    pub fn v2c(community: impl Into<Bytes>, pdu: Pdu) -> Self {
        Self {
            community: community.into(),
            pdu,
        }
    }

    /// Encode to BER.
    pub fn encode(&self) -> Bytes {
        let mut buf = EncodeBuf::new();

        buf.push_sequence(|buf| {
            self.pdu.encode(buf);
            buf.push_octet_string(&self.community);
            buf.push_integer(SNMP_V2C);
        });

        buf.finish()
    }

    /// Decode from BER, rejecting anything but SNMPv2c.
    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;

        let version = seq.read_integer()?;
        if version != SNMP_V2C {
            tracing::debug!(target: "albedo_snmp::ber", { snmp.version = version }, "unsupported message version");
            return Err(seq.malformed("unsupported message version"));
        }

        let community = seq.read_octet_string()?;
        let pdu = Pdu::decode(&mut seq)?;

        Ok(CommunityMessage { community, pdu })
    }

    /// Consume and return the PDU.
    pub fn into_pdu(self) -> Pdu {
        self.pdu
    }
}

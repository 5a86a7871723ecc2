//! Address/value pairs.
//!
//! Every [`Engine`](crate::engine::Engine) call returns one [`VarBind`]; for
//! GETNEXT its address is the next one the agent holds, not the one asked
//! for.

use crate::ber::{Decoder, EncodeBuf};
use crate::error::Result;
use crate::oid::Oid;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct VarBind {
    pub oid: Oid,
    /// May be an exception (`noSuchInstance`, `endOfMibView`, ...).
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: Oid, value: Value) -> Self {
        Self { oid, value }
    }

    /// Request placeholder for GET and GETNEXT.
    pub fn null(oid: Oid) -> Self {
        Self {
            oid,
            value: Value::Null,
        }
    }

    pub fn encode(&self, buf: &mut EncodeBuf) {
        buf.push_sequence(|buf| {
            self.value.encode(buf);
            buf.push_oid(&self.oid);
        });
    }

    pub fn decode(decoder: &mut Decoder) -> Result<Self> {
        let mut seq = decoder.read_sequence()?;
        let oid = seq.read_oid()?;
        let value = Value::decode(&mut seq)?;
        Ok(VarBind { oid, value })
    }
}

impl std::fmt::Display for VarBind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} = {}", self.oid, self.value)
    }
}

/// SEQUENCE OF VarBind, in request order.
pub fn encode_varbind_list(buf: &mut EncodeBuf, varbinds: &[VarBind]) {
    buf.push_sequence(|buf| {
        // reverse buffer: last varbind first
        for vb in varbinds.iter().rev() {
            vb.encode(buf);
        }
    });
}

/// Inverse of [`encode_varbind_list`]; an empty list is valid here and
/// rejected later by the client.
pub fn decode_varbind_list(decoder: &mut Decoder) -> Result<Vec<VarBind>> {
    let mut seq = decoder.read_sequence()?;
    let mut varbinds = Vec::with_capacity((seq.remaining() / 16).max(1));

    while !seq.is_empty() {
        varbinds.push(VarBind::decode(&mut seq)?);
    }

    Ok(varbinds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oid;

    #[test]
    fn test_varbind_list_preserves_order() {
        let varbinds = vec![
            VarBind::new(oid!(1, 3, 6, 1, 4, 1, 39412, 1, 3, 1, 2, 1), Value::Integer(5)),
            VarBind::new(oid!(1, 3, 6, 1, 4, 1, 39412, 1, 3, 1, 3, 1), Value::from("cfg.bin")),
            VarBind::null(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0)),
        ];

        let mut buf = EncodeBuf::new();
        encode_varbind_list(&mut buf, &varbinds);
        let mut decoder = Decoder::new(buf.finish());

        assert_eq!(decode_varbind_list(&mut decoder).unwrap(), varbinds);
    }

    #[test]
    fn test_truncated_list_is_malformed() {
        let mut buf = EncodeBuf::new();
        encode_varbind_list(&mut buf, &[VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(42))]);
        let bytes = buf.finish();
        let mut decoder = Decoder::new(bytes.slice(..bytes.len() - 1));

        assert!(matches!(
            *decode_varbind_list(&mut decoder).unwrap_err(),
            crate::error::Error::MalformedResponse { .. }
        ));
    }

    #[test]
    fn test_display() {
        let vb = VarBind::new(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("mux-7"));
        assert_eq!(vb.to_string(), "1.3.6.1.2.1.1.5.0 = mux-7");
    }
}

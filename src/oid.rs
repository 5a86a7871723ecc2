//! Object Identifier (OID) type.
//!
//! An [`Oid`] is the numeric address of a single readable or writable value on
//! a device. OIDs are stored as `SmallVec<[u32; 16]>` to avoid heap allocation
//! for common OIDs; enterprise table cells rarely exceed 16 arcs.

use crate::error::{Error, Result};
use smallvec::SmallVec;
use std::fmt;

/// Maximum number of arcs (subidentifiers) allowed in a decoded OID.
///
/// Per RFC 2578 Section 3.5: "there are at most 128 sub-identifiers in a value".
pub const MAX_OID_LEN: usize = 128;

/// Object Identifier.
///
/// Ordering is lexicographic over the arcs, so a prefix always sorts before
/// everything beneath it and comparison is defined for OIDs of any length.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Oid {
    arcs: SmallVec<[u32; 16]>,
}

impl Oid {
    /// Create an empty OID.
    pub fn empty() -> Self {
        Self {
            arcs: SmallVec::new(),
        }
    }

    /// Create an OID from arc values.
    ///
    /// ```
    /// use albedo_snmp::oid::Oid;
    ///
    /// let oid = Oid::new([1, 3, 6, 1]);
    /// assert_eq!(oid.len(), 4);
    /// ```
    pub fn new(arcs: impl IntoIterator<Item = u32>) -> Self {
        Self {
            arcs: arcs.into_iter().collect(),
        }
    }

    /// Create an OID from a slice of arcs.
    pub fn from_slice(arcs: &[u32]) -> Self {
        Self {
            arcs: SmallVec::from_slice(arcs),
        }
    }

    /// Parse an OID from dotted string notation (e.g., "1.3.6.1.2.1.1.1.0").
    ///
    /// A leading dot is accepted, as printed by net-snmp tools.
    ///
    /// ```
    /// use albedo_snmp::oid::Oid;
    ///
    /// let oid = Oid::parse(".1.3.6.1.4.1.39412").unwrap();
    /// assert_eq!(oid.to_string(), "1.3.6.1.4.1.39412");
    /// assert!(Oid::parse("1.3.six").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        if trimmed.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();
        for part in trimmed.split('.') {
            let arc: u32 = part
                .parse()
                .map_err(|_| Error::InvalidOid(s.into()).boxed())?;
            arcs.push(arc);
        }

        Ok(Self { arcs })
    }

    /// Returns true if `s` looks like a dotted numeric OID rather than a name.
    pub fn is_numeric(s: &str) -> bool {
        let trimmed = s.strip_prefix('.').unwrap_or(s);
        !trimmed.is_empty()
            && trimmed
                .split('.')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Get the arc values.
    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    /// Get the number of arcs.
    pub fn len(&self) -> usize {
        self.arcs.len()
    }

    /// Check if the OID is empty.
    pub fn is_empty(&self) -> bool {
        self.arcs.is_empty()
    }

    /// Check if this OID starts with another OID.
    ///
    /// An OID always starts with itself, and any OID starts with an empty OID.
    pub fn starts_with(&self, other: &Oid) -> bool {
        self.arcs.len() >= other.arcs.len() && self.arcs[..other.arcs.len()] == other.arcs[..]
    }

    /// The arcs following `prefix`, or `None` if `prefix` does not lead this OID.
    ///
    /// ```
    /// use albedo_snmp::oid;
    ///
    /// let cell = oid!(1, 3, 6, 1, 4, 1, 39412, 2, 1, 3, 7);
    /// let column = oid!(1, 3, 6, 1, 4, 1, 39412, 2, 1, 3);
    /// assert_eq!(cell.suffix_after(&column), Some(&[7][..]));
    /// assert_eq!(column.suffix_after(&cell), None);
    /// ```
    pub fn suffix_after(&self, prefix: &Oid) -> Option<&[u32]> {
        self.starts_with(prefix)
            .then(|| &self.arcs[prefix.arcs.len()..])
    }

    /// Get the parent OID (all arcs except the last).
    ///
    /// Returns `None` if the OID is empty.
    pub fn parent(&self) -> Option<Oid> {
        let (_, rest) = self.arcs.split_last()?;
        Some(Oid::from_slice(rest))
    }

    /// Create a child OID by appending an arc.
    pub fn child(&self, arc: u32) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.push(arc);
        Oid { arcs }
    }

    /// Create a new OID by appending every arc in `suffix` verbatim.
    pub fn join(&self, suffix: &[u32]) -> Oid {
        let mut arcs = self.arcs.clone();
        arcs.extend_from_slice(suffix);
        Oid { arcs }
    }

    /// Encode to BER content octets (X.690 Section 8.19).
    ///
    /// The first two arcs are combined as `(arc1 * 40) + arc2`; every
    /// subidentifier is base-128 with continuation bits.
    pub fn to_ber_smallvec(&self) -> SmallVec<[u8; 64]> {
        let mut bytes = SmallVec::new();

        match self.arcs.as_slice() {
            [] => {}
            [first] => encode_subidentifier(&mut bytes, first * 40),
            [first, second, rest @ ..] => {
                encode_subidentifier(&mut bytes, first * 40 + second);
                for &arc in rest {
                    encode_subidentifier(&mut bytes, arc);
                }
            }
        }

        bytes
    }

    /// Encode to BER content octets.
    pub fn to_ber(&self) -> Vec<u8> {
        self.to_ber_smallvec().to_vec()
    }

    /// Decode from BER content octets.
    ///
    /// Enforces [`MAX_OID_LEN`].
    pub fn from_ber(data: &[u8]) -> Result<Self> {
        if data.is_empty() {
            return Ok(Self::empty());
        }

        let mut arcs = SmallVec::new();

        let (first_subid, consumed) = decode_subidentifier(data)?;
        match first_subid {
            0..40 => arcs.extend([0, first_subid]),
            40..80 => arcs.extend([1, first_subid - 40]),
            _ => arcs.extend([2, first_subid - 80]),
        }

        let mut i = consumed;
        while i < data.len() {
            let (arc, bytes_consumed) = decode_subidentifier(&data[i..])?;
            arcs.push(arc);
            i += bytes_consumed;

            if arcs.len() > MAX_OID_LEN {
                return Err(Error::InvalidOid("too many arcs".into()).boxed());
            }
        }

        Ok(Self { arcs })
    }
}

fn encode_subidentifier(bytes: &mut SmallVec<[u8; 64]>, value: u32) {
    let groups = (32 - value.leading_zeros()).div_ceil(7).max(1);
    for i in (0..groups).rev() {
        let mut byte = ((value >> (i * 7)) & 0x7F) as u8;
        if i > 0 {
            byte |= 0x80;
        }
        bytes.push(byte);
    }
}

/// Decode a subidentifier, returning (value, bytes_consumed).
fn decode_subidentifier(data: &[u8]) -> Result<(u32, usize)> {
    let mut value: u32 = 0;

    for (i, &byte) in data.iter().enumerate() {
        if value > (u32::MAX >> 7) {
            return Err(Error::InvalidOid("subidentifier overflow".into()).boxed());
        }
        value = (value << 7) | u32::from(byte & 0x7F);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(Error::InvalidOid("truncated subidentifier".into()).boxed())
}

impl fmt::Debug for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Oid({})", self)
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.arcs {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for Oid {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Self::from_slice(arcs)
    }
}

impl<const N: usize> From<[u32; N]> for Oid {
    fn from(arcs: [u32; N]) -> Self {
        Self::new(arcs)
    }
}

impl PartialOrd for Oid {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Oid {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.arcs.cmp(&other.arcs)
    }
}

impl serde::Serialize for Oid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> serde::Deserialize<'de> for Oid {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = <std::borrow::Cow<'de, str>>::deserialize(deserializer)?;
        Oid::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Macro to create an OID from literal arcs.
///
/// ```
/// use albedo_snmp::oid;
///
/// let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
/// assert_eq!(sys_descr.to_string(), "1.3.6.1.2.1.1.1.0");
/// assert!(sys_descr.starts_with(&oid!(1, 3, 6, 1, 2, 1, 1)));
/// ```
#[macro_export]
macro_rules! oid {
    ($($arc:expr),* $(,)?) => {
        $crate::oid::Oid::from_slice(&[$($arc),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let oid = Oid::parse("1.3.6.1.4.1.39412.1.12.1.1.0").unwrap();
        assert_eq!(oid.arcs(), &[1, 3, 6, 1, 4, 1, 39412, 1, 12, 1, 1, 0]);
        assert_eq!(oid.to_string(), "1.3.6.1.4.1.39412.1.12.1.1.0");
    }

    #[test]
    fn test_parse_rejects_names_and_empty_arcs() {
        assert!(Oid::parse("1.3.abc.1").is_err());
        assert!(Oid::parse("1..3").is_err());
        assert!(Oid::parse("1.3.-6.1").is_err());
    }

    #[test]
    fn test_is_numeric() {
        assert!(Oid::is_numeric("1.3.6.1"));
        assert!(Oid::is_numeric(".1.3.6.1"));
        assert!(!Oid::is_numeric("SNMPv2-MIB::sysDescr.0"));
        assert!(!Oid::is_numeric("sysDescr"));
        assert!(!Oid::is_numeric(""));
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let short = oid!(1, 3, 6, 1, 2);
        let long = oid!(1, 3, 6, 1, 2, 0);
        let sibling = oid!(1, 3, 6, 1, 10);
        assert!(short < long);
        assert!(long < sibling);
        assert!(short < sibling);
    }

    #[test]
    fn test_join_appends_verbatim() {
        let column = oid!(1, 3, 6, 1, 4, 1, 39412, 1, 3, 1, 2);
        assert_eq!(column.join(&[4, 0, 7]), oid!(1, 3, 6, 1, 4, 1, 39412, 1, 3, 1, 2, 4, 0, 7));
        assert_eq!(column.join(&[]), column);
    }

    #[test]
    fn test_ber_encoding() {
        // 1.3.6.1 encodes as: (1*40+3)=43, 6, 1
        assert_eq!(oid!(1, 3, 6, 1).to_ber(), vec![0x2B, 0x06, 0x01]);
        // 39412 = 0x99F4 -> 0x82 0xB3 0x74
        assert_eq!(
            oid!(1, 3, 6, 1, 4, 1, 39412).to_ber(),
            vec![0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xB3, 0x74]
        );
    }

    #[test]
    fn test_from_ber_enterprise_arc() {
        let oid = Oid::from_ber(&[0x2B, 0x06, 0x01, 0x04, 0x01, 0x82, 0xB3, 0x74]).unwrap();
        assert_eq!(oid, oid!(1, 3, 6, 1, 4, 1, 39412));
    }

    #[test]
    fn test_from_ber_rejects_truncated() {
        assert!(Oid::from_ber(&[0x2B, 0x82]).is_err());
    }

    #[test]
    fn test_from_ber_enforces_max_oid_len() {
        let mut ber = vec![0x2B];
        ber.extend(std::iter::repeat_n(0x01, MAX_OID_LEN - 1));
        assert!(Oid::from_ber(&ber).is_err());
    }

    #[test]
    fn test_serde_uses_dotted_form() {
        let oid = oid!(1, 3, 6, 1, 2, 1, 1, 5, 0);
        let json = serde_json::to_string(&oid).unwrap();
        assert_eq!(json, "\"1.3.6.1.2.1.1.5.0\"");
        let back: Oid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, oid);
    }
}

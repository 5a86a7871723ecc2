//! BER (Basic Encoding Rules) support for the SNMPv2c message subset.
//!
//! Encoding writes back to front into an [`EncodeBuf`], so constructed
//! types can prefix their length once the content is known. Decoding is
//! zero-copy over `Bytes`.

mod decode;
mod encode;
mod length;

pub use decode::Decoder;
pub use encode::EncodeBuf;
pub use length::MAX_LENGTH;

/// BER tag constants.
pub mod tag {
    /// Universal class tags.
    pub mod universal {
        pub const INTEGER: u8 = 0x02;
        pub const OCTET_STRING: u8 = 0x04;
        pub const NULL: u8 = 0x05;
        pub const OBJECT_IDENTIFIER: u8 = 0x06;
        pub const SEQUENCE: u8 = 0x30;
        pub const OCTET_STRING_CONSTRUCTED: u8 = 0x24;
    }

    /// SMIv2 application class tags.
    pub mod application {
        pub const IP_ADDRESS: u8 = 0x40;
        pub const COUNTER32: u8 = 0x41;
        pub const GAUGE32: u8 = 0x42;
        pub const TIMETICKS: u8 = 0x43;
        pub const OPAQUE: u8 = 0x44;
        pub const COUNTER64: u8 = 0x46;
    }

    /// Context class tags used for varbind exception values.
    pub mod context {
        pub const NO_SUCH_OBJECT: u8 = 0x80;
        pub const NO_SUCH_INSTANCE: u8 = 0x81;
        pub const END_OF_MIB_VIEW: u8 = 0x82;
    }
}

//! SNMP message framing.
//!
//! Device sessions speak SNMPv2c only, so the community message is the
//! single framing in use.

mod community;

pub use community::{CommunityMessage, SNMP_V2C};

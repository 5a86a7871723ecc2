//! Error types for albedo-snmp.
//!
//! This module provides:
//!
//! - [`Error`] - The main error type covering resolution, transport,
//!   protocol and device-state failures
//! - [`ErrorStatus`] - SNMP protocol errors returned by agents (RFC 3416)
//! - [`ResolutionErrorKind`] - Why a symbolic name could not become an address
//!
//! # Error Handling
//!
//! Errors are boxed for efficiency: `Result<T> = Result<T, Box<Error>>`.
//!
//! Poll and read-back deadlines are not errors. They are reported as data
//! ([`PollOutcome::Timeout`](crate::row::PollOutcome::Timeout),
//! [`Verification::TimedOut`](crate::row::Verification::TimedOut)) so a slow
//! device can be told apart from a broken one.
//!
//! ```rust
//! use albedo_snmp::{Error, Result};
//!
//! fn handle_error(result: Result<()>) {
//!     match result {
//!         Ok(()) => println!("Success"),
//!         Err(e) => match &*e {
//!             Error::Resolution { module, symbol, reason } => {
//!                 println!("cannot resolve {module}::{symbol}: {reason}");
//!             }
//!             Error::Timeout { target, retries, .. } => {
//!                 println!("{} unreachable after {} retries", target, retries);
//!             }
//!             _ => println!("Error: {}", e),
//!         },
//!     }
//! }
//! ```

use std::net::SocketAddr;
use std::time::Duration;

use crate::multifunction::{ActiveFunction, FunctionType};
use crate::oid::Oid;
use crate::value::Value;

/// Placeholder target address used when no target is known.
pub(crate) const UNKNOWN_TARGET: SocketAddr =
    SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::new(0, 0, 0, 0)), 0);

/// Result type alias using the library's boxed Error type.
pub type Result<T> = std::result::Result<T, Box<Error>>;

/// Reason a symbolic name could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionErrorKind {
    /// The schema source has no module by that name.
    ModuleNotFound,
    /// The module is loaded but does not define the symbol.
    SymbolNotFound,
    /// The symbol exists but carries no concrete address (e.g. a module identity
    /// or textual convention).
    SymbolHasNoAddress,
}

impl std::fmt::Display for ResolutionErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModuleNotFound => write!(f, "module not found"),
            Self::SymbolNotFound => write!(f, "symbol not found"),
            Self::SymbolHasNoAddress => write!(f, "symbol has no address"),
        }
    }
}

/// The main error type for all albedo-snmp operations.
///
/// # Common Patterns
///
/// ```
/// use albedo_snmp::{Error, ErrorStatus};
///
/// fn is_retriable(error: &Error) -> bool {
///     matches!(error, Error::Timeout { .. } | Error::Network { .. })
/// }
///
/// fn is_rejected_write(error: &Error) -> bool {
///     matches!(
///         error,
///         Error::Snmp { status: ErrorStatus::InconsistentValue | ErrorStatus::WrongValue, .. }
///     )
/// }
/// ```
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Symbolic name could not be turned into an address.
    #[error("cannot resolve {module}::{symbol}: {reason}")]
    Resolution {
        module: Box<str>,
        symbol: Box<str>,
        reason: ResolutionErrorKind,
    },

    /// Network failure (connection refused, unreachable, etc.)
    #[error("network error communicating with {target}: {source}")]
    Network {
        target: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Request timed out after retries.
    #[error("timeout after {elapsed:?} waiting for {target} ({retries} retries)")]
    Timeout {
        target: SocketAddr,
        elapsed: Duration,
        retries: u32,
    },

    /// The agent rejected the request.
    #[error("SNMP error from {target}: {status} at index {index}{}", display_oid(.oid))]
    Snmp {
        target: SocketAddr,
        status: ErrorStatus,
        index: u32,
        oid: Option<Oid>,
    },

    /// Malformed response from agent.
    #[error("malformed response from {target}")]
    MalformedResponse { target: SocketAddr },

    /// A status or result column returned something other than an integer code.
    #[error("unexpected value at {oid}: {value}")]
    UnexpectedValue { oid: Oid, value: Box<Value> },

    /// The requested function's class has no row in the function table.
    #[error("function {function} is not available on this device")]
    FunctionNotAvailable { function: FunctionType },

    /// The mode write succeeded but the device did not settle on the target.
    #[error("switch to {wanted} not confirmed, device reports {observed}")]
    SwitchVerificationFailed {
        wanted: FunctionType,
        observed: ActiveFunction,
    },

    /// The session handle has already been released.
    #[error("session is closed")]
    SessionClosed,

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(Box<str>),

    /// Invalid OID format.
    #[error("invalid OID: {0}")]
    InvalidOid(Box<str>),
}

fn display_oid(oid: &Option<Oid>) -> String {
    match oid {
        Some(oid) => format!(" ({oid})"),
        None => String::new(),
    }
}

impl Error {
    /// Box this error (convenience for constructing boxed errors).
    pub fn boxed(self) -> Box<Self> {
        Box::new(self)
    }

    pub(crate) fn resolution(module: &str, symbol: &str, reason: ResolutionErrorKind) -> Box<Self> {
        Self::Resolution {
            module: module.into(),
            symbol: symbol.into(),
            reason,
        }
        .boxed()
    }
}

/// SNMP protocol error status codes (RFC 3416).
///
/// These codes are returned by SNMP agents to indicate the result of an operation.
/// The error status is included in the [`Error::Snmp`] variant along with an error
/// index indicating which varbind caused the error.
///
/// ```
/// use albedo_snmp::ErrorStatus;
///
/// let status = ErrorStatus::from_i32(12);
/// assert_eq!(status, ErrorStatus::InconsistentValue);
/// assert_eq!(status.to_string(), "inconsistentValue");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorStatus {
    /// Operation completed successfully (status = 0).
    NoError,
    /// Response message would be too large for transport (status = 1).
    TooBig,
    /// Requested OID not found (status = 2).
    NoSuchName,
    /// Invalid value provided in SET request (status = 3).
    BadValue,
    /// Attempted to SET a read-only object (status = 4).
    ReadOnly,
    /// Unspecified error occurred (status = 5).
    GenErr,
    /// Object exists but access is denied (status = 6).
    NoAccess,
    /// SET value has wrong ASN.1 type (status = 7).
    WrongType,
    /// SET value has incorrect length (status = 8).
    WrongLength,
    /// SET value uses wrong encoding (status = 9).
    WrongEncoding,
    /// SET value is out of range or otherwise invalid (status = 10).
    WrongValue,
    /// Object does not support row creation (status = 11).
    NoCreation,
    /// Value is inconsistent with other managed objects (status = 12).
    InconsistentValue,
    /// Resource required for SET is unavailable (status = 13).
    ResourceUnavailable,
    /// SET commit phase failed (status = 14).
    CommitFailed,
    /// SET undo phase failed (status = 15).
    UndoFailed,
    /// Access denied by VACM (status = 16).
    AuthorizationError,
    /// Object does not support modification (status = 17).
    NotWritable,
    /// Named object cannot be created (status = 18).
    InconsistentName,
    /// Unknown or future error status code.
    Unknown(i32),
}

impl ErrorStatus {
    /// Create from raw status code.
    pub fn from_i32(value: i32) -> Self {
        match value {
            0 => Self::NoError,
            1 => Self::TooBig,
            2 => Self::NoSuchName,
            3 => Self::BadValue,
            4 => Self::ReadOnly,
            5 => Self::GenErr,
            6 => Self::NoAccess,
            7 => Self::WrongType,
            8 => Self::WrongLength,
            9 => Self::WrongEncoding,
            10 => Self::WrongValue,
            11 => Self::NoCreation,
            12 => Self::InconsistentValue,
            13 => Self::ResourceUnavailable,
            14 => Self::CommitFailed,
            15 => Self::UndoFailed,
            16 => Self::AuthorizationError,
            17 => Self::NotWritable,
            18 => Self::InconsistentName,
            other => {
                tracing::warn!(target: "albedo_snmp::error", { snmp.error_status = other }, "unknown SNMP error status");
                Self::Unknown(other)
            }
        }
    }

    /// Convert to raw status code.
    pub fn as_i32(&self) -> i32 {
        match self {
            Self::NoError => 0,
            Self::TooBig => 1,
            Self::NoSuchName => 2,
            Self::BadValue => 3,
            Self::ReadOnly => 4,
            Self::GenErr => 5,
            Self::NoAccess => 6,
            Self::WrongType => 7,
            Self::WrongLength => 8,
            Self::WrongEncoding => 9,
            Self::WrongValue => 10,
            Self::NoCreation => 11,
            Self::InconsistentValue => 12,
            Self::ResourceUnavailable => 13,
            Self::CommitFailed => 14,
            Self::UndoFailed => 15,
            Self::AuthorizationError => 16,
            Self::NotWritable => 17,
            Self::InconsistentName => 18,
            Self::Unknown(code) => *code,
        }
    }
}

impl std::fmt::Display for ErrorStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NoError => "noError",
            Self::TooBig => "tooBig",
            Self::NoSuchName => "noSuchName",
            Self::BadValue => "badValue",
            Self::ReadOnly => "readOnly",
            Self::GenErr => "genErr",
            Self::NoAccess => "noAccess",
            Self::WrongType => "wrongType",
            Self::WrongLength => "wrongLength",
            Self::WrongEncoding => "wrongEncoding",
            Self::WrongValue => "wrongValue",
            Self::NoCreation => "noCreation",
            Self::InconsistentValue => "inconsistentValue",
            Self::ResourceUnavailable => "resourceUnavailable",
            Self::CommitFailed => "commitFailed",
            Self::UndoFailed => "undoFailed",
            Self::AuthorizationError => "authorizationError",
            Self::NotWritable => "notWritable",
            Self::InconsistentName => "inconsistentName",
            Self::Unknown(code) => return write!(f, "unknown({})", code),
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_size_budget() {
        assert!(
            std::mem::size_of::<Error>() <= 128,
            "Error size {} exceeds 128-byte budget",
            std::mem::size_of::<Error>()
        );

        // Result<(), Box<Error>> should be pointer-sized (8 bytes on 64-bit).
        assert_eq!(
            std::mem::size_of::<Result<()>>(),
            std::mem::size_of::<*const ()>(),
            "Result<()> should be pointer-sized"
        );
    }

    #[test]
    fn resolution_error_names_the_symbol() {
        let err = Error::resolution(
            "ATSL-MULTIFUNCTION-MIB",
            "mfBogus",
            ResolutionErrorKind::SymbolNotFound,
        );
        assert_eq!(
            err.to_string(),
            "cannot resolve ATSL-MULTIFUNCTION-MIB::mfBogus: symbol not found"
        );
    }

    #[test]
    fn snmp_error_includes_offending_oid() {
        let err = Error::Snmp {
            target: UNKNOWN_TARGET,
            status: ErrorStatus::InconsistentValue,
            index: 1,
            oid: Some(crate::oid!(1, 3, 6, 1, 4, 1, 39412, 1, 3)),
        };
        assert!(err.to_string().ends_with("inconsistentValue at index 1 (1.3.6.1.4.1.39412.1.3)"));
    }

    #[test]
    fn unknown_status_round_trips_code() {
        let status = ErrorStatus::from_i32(99);
        assert_eq!(status, ErrorStatus::Unknown(99));
        assert_eq!(status.as_i32(), 99);
        assert_eq!(status.to_string(), "unknown(99)");
    }
}

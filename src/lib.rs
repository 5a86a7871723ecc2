//! # albedo-snmp
//!
//! Async SNMPv2c device-operations engine for test equipment.
//!
//! ## Features
//!
//! - Symbolic addressing: `MODULE::symbol` names resolved through a pluggable
//!   schema source, and numeric OIDs mapped back to names
//! - One device handle per session, opened lazily and closed exactly once
//! - Subtree walks that stop at the subtree boundary, on exceptions, and on
//!   non-increasing OIDs
//! - The RowStatus lifecycle for operation tables: create, populate,
//!   activate, poll, destroy
//! - Detection and switching of the active function on multifunction devices
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use albedo_snmp::DeviceSession;
//!
//! #[tokio::main]
//! async fn main() -> albedo_snmp::Result<()> {
//!     let session = DeviceSession::builder("10.0.0.20")
//!         .read_community("public")
//!         .build();
//!
//!     let descr = session
//!         .run(async |s| s.get("SNMPv2-MIB", "sysDescr", &[0]).await)
//!         .await?;
//!     println!("sysDescr: {descr}");
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Row operations
//!
//! ```rust,no_run
//! use albedo_snmp::DeviceSession;
//! use albedo_snmp::row::{ConfigFileAction, PollOutcome, RowOperation};
//!
//! # async fn example() -> albedo_snmp::Result<()> {
//! let session = DeviceSession::builder("10.0.0.20").mib_dir("/usr/share/albedo/mibs").build();
//! let op = RowOperation::create_and_wait("ATSL-CONFIG-FILES-MIB", "configFilesOps", [1])
//!     .column("FileName", "backup.cfg")
//!     .column("Device", "internal")
//!     .column("Action", ConfigFileAction::Save);
//!
//! let outcome = session
//!     .run(async |s| {
//!         let device = s.device().await?;
//!         if device.perform_row_operation(&op).await?.is_complete() {
//!             device.activate_row(&op).await?;
//!             let outcome = device.poll_row_result(&op).await?;
//!             device.destroy_row(&op).await?;
//!             Ok(Some(outcome))
//!         } else {
//!             Ok(None)
//!         }
//!     })
//!     .await?;
//! if let Some(PollOutcome::Finished(result)) = outcome {
//!     println!("save: {result}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod ber;
pub mod client;
pub mod engine;
pub mod error;
pub mod message;
pub mod mib;
pub mod multifunction;
pub mod oid;
pub mod pdu;
pub mod resolver;
pub mod row;
pub mod session;
pub mod tdm;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod walk;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use client::{Backoff, Client, ClientConfig, Retry};
pub use engine::{Connector, Engine, UdpConnector};
pub use error::{Error, ErrorStatus, ResolutionErrorKind, Result};
pub use multifunction::{ActiveFunction, FunctionType, MultifunctionLayout, SwitchOutcome};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use resolver::{Location, Resolver};
pub use row::{
    CleanupPolicy, ConfigFileAction, OperationResult, PollOutcome, PollPolicy, RowOperation,
    RowStatus, RowWrite, TruthValue, Verification,
};
pub use session::{Device, DeviceSession, SessionBuilder, SessionConfig};
pub use tdm::{PerformanceStandard, TestPattern};
pub use transport::{Transport, UdpTransport};
pub use value::Value;
pub use varbind::VarBind;
pub use walk::{TableRows, WalkEnd, WalkResult};

/// Type alias for a client using a dedicated UDP socket.
pub type UdpClient = Client<UdpTransport>;

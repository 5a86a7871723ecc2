//! Device sessions.
//!
//! A [`DeviceSession`] owns the connection parameters for one device, a
//! shared [`Resolver`], and at most one engine handle. The handle is opened
//! on the first operation and released exactly once by
//! [`close`](DeviceSession::close).
//!
//! # Exclusive use
//!
//! One logical operation runs at a time. Every operation locks the handle for
//! its whole duration, including the polling inside a row operation and the
//! settle wait of a function switch, so operations from concurrent tasks
//! queue behind each other instead of interleaving on the wire. Use
//! [`DeviceSession::device`] to hold the lock across several operations.
//!
//! ```rust,no_run
//! use albedo_snmp::{DeviceSession, Value};
//!
//! # async fn example() -> albedo_snmp::Result<()> {
//! let session = DeviceSession::builder("192.168.1.100").build();
//!
//! let name = session
//!     .run(async |s| s.get("SNMPv2-MIB", "sysName", &[0]).await)
//!     .await?;
//! println!("sysName = {name}");
//! # Ok(())
//! # }
//! ```

mod builder;

pub use builder::SessionBuilder;

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tracing::instrument;

use crate::client::Retry;
use crate::engine::{Connector, Engine, UdpConnector};
use crate::error::{Error, Result};
use crate::multifunction::{ActiveFunction, Detector, FunctionType, MultifunctionLayout, SwitchOutcome};
use crate::oid::Oid;
use crate::resolver::{Location, Resolver};
use crate::row::{self, CleanupPolicy, PollOutcome, PollPolicy, RowOperation, RowWrite, Verification};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::walk::{WalkResult, walk_subtree};

/// Default SNMP agent port.
pub const DEFAULT_PORT: u16 = 161;

/// Default wait after a function switch before re-reading the device.
pub const DEFAULT_SETTLE_TIME: Duration = Duration::from_secs(3);

/// Connection parameters and operation policies for one device.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub host: String,
    /// Agent port (default: 161)
    pub port: u16,
    /// Community for reads (default: "public")
    pub read_community: Bytes,
    /// Community for writes (default: "private")
    pub write_community: Bytes,
    /// Per-request timeout (default: 5 seconds)
    pub timeout: Duration,
    /// Wire retransmissions (default: 3, no backoff)
    pub retry: Retry,
    /// Wait after a function switch (default: 3 seconds)
    pub settle_time: Duration,
    /// Row result polling (default: 500 ms interval, 30 s deadline)
    pub row_poll: PollPolicy,
    /// Write read-back polling (default: 100 ms interval, 5 s deadline)
    pub verify_poll: PollPolicy,
    /// What to do with a partially populated row (default: manual)
    pub cleanup: CleanupPolicy,
    pub multifunction: MultifunctionLayout,
}

impl SessionConfig {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ..Self::default()
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: DEFAULT_PORT,
            read_community: Bytes::from_static(b"public"),
            write_community: Bytes::from_static(b"private"),
            timeout: Duration::from_secs(5),
            retry: Retry::default(),
            settle_time: DEFAULT_SETTLE_TIME,
            row_poll: PollPolicy::row_result(),
            verify_poll: PollPolicy::verify(),
            cleanup: CleanupPolicy::default(),
            multifunction: MultifunctionLayout::default(),
        }
    }
}

enum HandleState<E> {
    Unopened,
    Open(E),
    Closed,
}

/// One device, one engine handle.
pub struct DeviceSession<C: Connector = UdpConnector> {
    config: SessionConfig,
    connector: C,
    resolver: Arc<Resolver>,
    state: Mutex<HandleState<C::Engine>>,
    multifunction: OnceLock<bool>,
}

impl DeviceSession<UdpConnector> {
    /// Start building a UDP session for `host`.
    pub fn builder(host: impl Into<String>) -> SessionBuilder<UdpConnector> {
        SessionBuilder::new(host)
    }
}

impl<C: Connector> DeviceSession<C> {
    pub fn new(config: SessionConfig, connector: C, resolver: Arc<Resolver>) -> Self {
        Self {
            config,
            connector,
            resolver,
            state: Mutex::new(HandleState::Unopened),
            multifunction: OnceLock::new(),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<Resolver> {
        &self.resolver
    }

    /// Lock the session for a sequence of operations, opening the handle if
    /// this is the first use.
    ///
    /// Returns [`Error::SessionClosed`] after [`close`](Self::close). A failed
    /// connect leaves the session unopened, so the next call tries again.
    ///
    /// The lock is not reentrant: calling any `DeviceSession` operation while
    /// the returned [`Device`] is alive waits forever. Use the methods on
    /// [`Device`] for the work done under the guard.
    pub async fn device(&self) -> Result<Device<'_, C::Engine>> {
        let mut state = self.state.lock().await;

        if let HandleState::Unopened = *state {
            tracing::debug!(target: "albedo_snmp::session", { snmp.host = %self.config.host, snmp.port = self.config.port }, "opening session handle");
            let engine = self.connector.connect(&self.config).await?;
            *state = HandleState::Open(engine);
        }

        let engine = MutexGuard::try_map(state, |state| match state {
            HandleState::Open(engine) => Some(engine),
            _ => None,
        })
        .map_err(|_| Error::SessionClosed.boxed())?;

        Ok(Device {
            engine,
            resolver: &self.resolver,
            config: &self.config,
            probed: &self.multifunction,
        })
    }

    /// Release the handle. Later operations fail with
    /// [`Error::SessionClosed`]; closing again does nothing.
    pub async fn close(&self) {
        let mut state = self.state.lock().await;
        match std::mem::replace(&mut *state, HandleState::Closed) {
            HandleState::Open(engine) => {
                engine.close().await;
                tracing::debug!(target: "albedo_snmp::session", { snmp.host = %self.config.host }, "session closed");
            }
            HandleState::Unopened => {
                tracing::debug!(target: "albedo_snmp::session", { snmp.host = %self.config.host }, "session closed before first use");
            }
            HandleState::Closed => {}
        }
    }

    pub async fn is_closed(&self) -> bool {
        matches!(*self.state.lock().await, HandleState::Closed)
    }

    /// Run `f` against this session, then close it whatever `f` returned.
    pub async fn run<R>(self, f: impl AsyncFnOnce(&Self) -> Result<R>) -> Result<R> {
        let result = f(&self).await;
        self.close().await;
        result
    }

    /// Read one value and close the session.
    pub async fn quick_get(self, module: &str, symbol: &str, indices: &[u32]) -> Result<Value> {
        self.run(async |s| s.get(module, symbol, indices).await).await
    }

    /// Write one value and close the session.
    pub async fn quick_set(self, module: &str, symbol: &str, value: Value, indices: &[u32]) -> Result<()> {
        self.run(async move |s| s.set(module, symbol, value, indices).await).await
    }

    /// Best-effort symbolic name for `oid`.
    pub fn reverse(&self, oid: &Oid) -> Location {
        self.resolver.reverse(oid)
    }

    #[instrument(skip(self, indices), err, fields(snmp.host = %self.config.host))]
    pub async fn get(&self, module: &str, symbol: &str, indices: &[u32]) -> Result<Value> {
        self.device().await?.get(module, symbol, indices).await
    }

    #[instrument(skip(self, value, indices), err, fields(snmp.host = %self.config.host))]
    pub async fn set(&self, module: &str, symbol: &str, value: Value, indices: &[u32]) -> Result<()> {
        self.device().await?.set(module, symbol, value, indices).await
    }

    #[instrument(skip(self, value, indices), err, fields(snmp.host = %self.config.host))]
    pub async fn set_verified(
        &self,
        module: &str,
        symbol: &str,
        value: Value,
        indices: &[u32],
    ) -> Result<Verification> {
        self.device().await?.set_verified(module, symbol, value, indices).await
    }

    #[instrument(skip(self), err, fields(snmp.host = %self.config.host))]
    pub async fn walk(&self, module: &str, root: &str) -> Result<WalkResult> {
        self.device().await?.walk(module, root).await
    }

    #[instrument(skip(self, op), err, fields(snmp.host = %self.config.host, snmp.table = %op.table))]
    pub async fn perform_row_operation(&self, op: &RowOperation) -> Result<RowWrite> {
        self.device().await?.perform_row_operation(op).await
    }

    pub async fn activate_row(&self, op: &RowOperation) -> Result<()> {
        self.device().await?.activate_row(op).await
    }

    pub async fn poll_row_result(&self, op: &RowOperation) -> Result<PollOutcome> {
        self.device().await?.poll_row_result(op).await
    }

    pub async fn destroy_row(&self, op: &RowOperation) -> Result<()> {
        self.device().await?.destroy_row(op).await
    }

    pub async fn is_multifunction(&self) -> Result<bool> {
        self.device().await?.is_multifunction().await
    }

    #[instrument(skip(self), err, fields(snmp.host = %self.config.host))]
    pub async fn active_function(&self) -> Result<ActiveFunction> {
        self.device().await?.active_function().await
    }

    #[instrument(skip(self), err, fields(snmp.host = %self.config.host))]
    pub async fn switch_function(&self, target: FunctionType) -> Result<SwitchOutcome> {
        self.device().await?.switch_function(target).await
    }

    #[instrument(skip(self), err, fields(snmp.host = %self.config.host))]
    pub async fn ensure_function(&self, required: FunctionType) -> Result<SwitchOutcome> {
        self.device().await?.ensure_function(required).await
    }
}

impl<C: Connector> Drop for DeviceSession<C> {
    fn drop(&mut self) {
        if let HandleState::Open(_) = self.state.get_mut() {
            tracing::warn!(target: "albedo_snmp::session", { snmp.host = %self.config.host }, "session dropped without close");
        }
    }
}

/// Exclusive access to an open session.
///
/// Holds the session lock until dropped.
pub struct Device<'a, E> {
    engine: MappedMutexGuard<'a, E>,
    resolver: &'a Resolver,
    config: &'a SessionConfig,
    probed: &'a OnceLock<bool>,
}

impl<E: Engine> Device<'_, E> {
    /// The underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn resolver(&self) -> &Resolver {
        self.resolver
    }

    /// Read `module::symbol.indices`. Exception values are returned as values.
    pub async fn get(&self, module: &str, symbol: &str, indices: &[u32]) -> Result<Value> {
        let oid = self.resolver.resolve(module, symbol, indices)?;
        Ok(self.get_oid(&oid).await?.value)
    }

    pub async fn get_oid(&self, oid: &Oid) -> Result<VarBind> {
        self.engine.get(oid).await
    }

    pub async fn set(&self, module: &str, symbol: &str, value: Value, indices: &[u32]) -> Result<()> {
        let oid = self.resolver.resolve(module, symbol, indices)?;
        self.set_oid(&oid, value).await
    }

    pub async fn set_oid(&self, oid: &Oid, value: Value) -> Result<()> {
        self.engine.set(oid, value).await?;
        Ok(())
    }

    /// Write a value, then read it back until the device reports it or the
    /// verify deadline passes.
    ///
    /// A rejected write is an error. A write that never shows up is
    /// [`Verification::TimedOut`].
    pub async fn set_verified(
        &self,
        module: &str,
        symbol: &str,
        value: Value,
        indices: &[u32],
    ) -> Result<Verification> {
        let oid = self.resolver.resolve(module, symbol, indices)?;
        self.set_oid_verified(&oid, value).await
    }

    pub async fn set_oid_verified(&self, oid: &Oid, value: Value) -> Result<Verification> {
        self.engine.set(oid, value.clone()).await?;
        Ok(row::verify_value(&*self.engine, oid, &value, self.config.verify_poll).await)
    }

    /// Walk `module::root`. Only resolution fails; request failures end the
    /// walk and are reported in [`WalkResult::end`].
    pub async fn walk(&self, module: &str, root: &str) -> Result<WalkResult> {
        let oid = self.resolver.resolve(module, root, &[])?;
        Ok(self.walk_oid(&oid).await)
    }

    pub async fn walk_oid(&self, root: &Oid) -> WalkResult {
        walk_subtree(&*self.engine, root).await
    }

    /// Create and populate a row: write every column of `op` in order.
    ///
    /// Stops at the first rejected write. The row is not activated; under
    /// [`CleanupPolicy::Manual`] a failed row is left on the device.
    pub async fn perform_row_operation(&self, op: &RowOperation) -> Result<RowWrite> {
        row::write_row(&*self.engine, self.resolver, op, self.config.cleanup).await
    }

    /// Write `Status = active`, starting the row's action.
    pub async fn activate_row(&self, op: &RowOperation) -> Result<()> {
        row::activate(&*self.engine, self.resolver, op).await
    }

    /// Poll the result column with the session's row poll policy.
    pub async fn poll_row_result(&self, op: &RowOperation) -> Result<PollOutcome> {
        self.poll_row_result_with(op, self.config.row_poll).await
    }

    pub async fn poll_row_result_with(&self, op: &RowOperation, policy: PollPolicy) -> Result<PollOutcome> {
        let oid = self.resolver.resolve(&op.module, &op.result_symbol(), &op.index)?;
        row::poll_result(&*self.engine, &oid, policy).await
    }

    /// Write `Status = destroy`. Never done implicitly under
    /// [`CleanupPolicy::Manual`].
    pub async fn destroy_row(&self, op: &RowOperation) -> Result<()> {
        row::destroy(&*self.engine, self.resolver, op).await
    }

    fn detector(&self) -> Detector<'_, E> {
        Detector {
            engine: &*self.engine,
            resolver: self.resolver,
            layout: &self.config.multifunction,
            probed: self.probed,
        }
    }

    /// Whether the device answers the active-function probe. Probed at most
    /// once per session.
    pub async fn is_multifunction(&self) -> Result<bool> {
        self.detector().is_multifunction().await
    }

    pub async fn active_function(&self) -> Result<ActiveFunction> {
        self.detector().active_function().await
    }

    /// Switch to `target`, even if detection has to be repeated to find out
    /// it is already active.
    ///
    /// Switching stops all test and monitoring activity on the device; stop
    /// it before calling this.
    pub async fn switch_function(&self, target: FunctionType) -> Result<SwitchOutcome> {
        self.detector()
            .switch_function(target, self.config.settle_time)
            .await
    }

    /// Make `required` the active function, writing nothing if it already is.
    ///
    /// Switching stops all test and monitoring activity on the device; stop
    /// it before calling this.
    pub async fn ensure_function(&self, required: FunctionType) -> Result<SwitchOutcome> {
        self.detector()
            .ensure_function(required, self.config.settle_time)
            .await
    }
}

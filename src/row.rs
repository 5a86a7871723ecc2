//! RowStatus-driven table operations.
//!
//! Devices expose actions such as "save the configuration to a file" as a
//! table row driven through the RowStatus convention (RFC 2579):
//!
//! 1. write `Status = createAndWait` (the row exists, `notReady`)
//! 2. write the remaining columns in order; required columns must be
//!    present or activation fails with `inconsistentValue`
//! 3. write `Status = active`; the device starts the action
//! 4. poll the result column until it leaves `inProgress`
//! 5. write `Status = destroy`
//!
//! [`RowOperation`] describes steps 1 and 2. Activation, polling and
//! destruction are separate calls on the session so the caller decides what
//! to do with a row that failed half-way.
//!
//! Column symbols are named by concatenating the table prefix and the column
//! name: table `configFilesOps`, column `Status` is `configFilesOpsStatus`.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tokio::time::Instant;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::resolver::Resolver;
use crate::value::Value;

/// RowStatus textual convention (RFC 2579).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowStatus {
    Active = 1,
    NotInService = 2,
    NotReady = 3,
    CreateAndGo = 4,
    CreateAndWait = 5,
    Destroy = 6,
}

impl RowStatus {
    pub fn from_i32(code: i32) -> Option<Self> {
        Some(match code {
            1 => Self::Active,
            2 => Self::NotInService,
            3 => Self::NotReady,
            4 => Self::CreateAndGo,
            5 => Self::CreateAndWait,
            6 => Self::Destroy,
            _ => return None,
        })
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::NotInService => "notInService",
            Self::NotReady => "notReady",
            Self::CreateAndGo => "createAndGo",
            Self::CreateAndWait => "createAndWait",
            Self::Destroy => "destroy",
        })
    }
}

impl From<RowStatus> for Value {
    fn from(status: RowStatus) -> Self {
        Value::Integer(status.as_i32())
    }
}

/// Result column codes of file and report operation tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationResult {
    Idle,
    Queued,
    InProgress,
    Success,
    FileNotFound,
    DeviceNotFound,
    AccessDenied,
    ReadOnly,
    NotSupported,
    InternalError,
    DeviceFull,
    EntryExists,
    DirNotEmpty,
    MediaIo,
    Unknown(i32),
}

impl OperationResult {
    const TABLE: [(i32, OperationResult, &'static str); 14] = [
        (0, Self::Idle, "idle"),
        (1, Self::Queued, "queued"),
        (2, Self::InProgress, "inProgress"),
        (3, Self::Success, "success"),
        (4, Self::FileNotFound, "fileNotFound"),
        (5, Self::DeviceNotFound, "deviceNotFound"),
        (6, Self::AccessDenied, "accessDenied"),
        (7, Self::ReadOnly, "readOnly"),
        (8, Self::NotSupported, "notSupported"),
        (9, Self::InternalError, "internalError"),
        (10, Self::DeviceFull, "deviceFull"),
        (11, Self::EntryExists, "entryExists"),
        (12, Self::DirNotEmpty, "dirNotEmpty"),
        (13, Self::MediaIo, "mediaIO"),
    ];

    pub fn from_i32(code: i32) -> Self {
        Self::TABLE
            .iter()
            .find(|(c, _, _)| *c == code)
            .map(|(_, result, _)| *result)
            .unwrap_or(Self::Unknown(code))
    }

    pub fn as_i32(self) -> i32 {
        match self {
            Self::Unknown(code) => code,
            known => Self::TABLE
                .iter()
                .find(|(_, result, _)| *result == known)
                .map_or(-1, |(code, _, _)| *code),
        }
    }

    /// Anything other than `inProgress` ends a poll.
    pub fn is_terminal(self) -> bool {
        self != Self::InProgress
    }

    pub fn is_success(self) -> bool {
        self == Self::Success
    }
}

impl fmt::Display for OperationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(code) => write!(f, "unknown({code})"),
            known => {
                let name = Self::TABLE
                    .iter()
                    .find(|(_, result, _)| result == known)
                    .map_or("unknown", |(_, _, name)| *name);
                f.write_str(name)
            }
        }
    }
}

/// TruthValue textual convention (SNMPv2-TC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TruthValue {
    True = 1,
    False = 2,
}

impl TruthValue {
    pub fn from_i32(code: i32) -> Option<Self> {
        match code {
            1 => Some(Self::True),
            2 => Some(Self::False),
            _ => None,
        }
    }

    pub fn as_bool(self) -> bool {
        self == Self::True
    }
}

impl From<bool> for TruthValue {
    fn from(value: bool) -> Self {
        if value { Self::True } else { Self::False }
    }
}

impl From<TruthValue> for Value {
    fn from(value: TruthValue) -> Self {
        Value::Integer(value as i32)
    }
}

impl fmt::Display for TruthValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.as_bool() { "true" } else { "false" })
    }
}

/// Action column codes of the configuration file operations table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigFileAction {
    Idle = 0,
    Delete = 1,
    Rename = 2,
    Import = 3,
    Export = 4,
    Load = 32,
    Save = 33,
}

impl ConfigFileAction {
    const ALL: [ConfigFileAction; 7] = [
        Self::Idle,
        Self::Delete,
        Self::Rename,
        Self::Import,
        Self::Export,
        Self::Load,
        Self::Save,
    ];

    pub fn from_i32(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|action| *action as i32 == code)
    }

    pub fn as_i32(self) -> i32 {
        self as i32
    }

    fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Delete => "delete",
            Self::Rename => "rename",
            Self::Import => "import",
            Self::Export => "export",
            Self::Load => "load",
            Self::Save => "save",
        }
    }
}

impl fmt::Display for ConfigFileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigFileAction {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::Config(format!("unknown config file action: {s}").into()).boxed())
    }
}

impl From<ConfigFileAction> for Value {
    fn from(action: ConfigFileAction) -> Self {
        Value::Integer(action.as_i32())
    }
}

/// What to do with a row whose population failed part-way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CleanupPolicy {
    /// Leave the row for the operator.
    #[default]
    Manual,
    /// Write `destroy` to the status column once, best effort.
    DestroyOnFailure,
}

/// One row-lifecycle transaction: which row, and the columns to write in
/// order.
///
/// ```
/// use albedo_snmp::row::{ConfigFileAction, RowOperation};
///
/// let op = RowOperation::create_and_wait("ATSL-CONFIG-FILES-MIB", "configFilesOps", [1])
///     .column("FileName", "my_config.cfg")
///     .column("Device", "internal")
///     .column("Action", ConfigFileAction::Save);
///
/// assert_eq!(op.columns.len(), 4);
/// assert_eq!(op.column_symbol("Device"), "configFilesOpsDevice");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RowOperation {
    pub module: String,
    /// Prefix shared by the table's column symbols.
    pub table: String,
    pub index: Vec<u32>,
    /// Column suffix and value, written first to last.
    pub columns: Vec<(String, Value)>,
    pub status_column: String,
    pub result_column: String,
}

impl RowOperation {
    pub fn new(module: impl Into<String>, table: impl Into<String>, index: impl Into<Vec<u32>>) -> Self {
        Self {
            module: module.into(),
            table: table.into(),
            index: index.into(),
            columns: Vec::new(),
            status_column: "Status".into(),
            result_column: "Result".into(),
        }
    }

    /// A row whose first write is `Status = createAndWait`.
    pub fn create_and_wait(
        module: impl Into<String>,
        table: impl Into<String>,
        index: impl Into<Vec<u32>>,
    ) -> Self {
        let op = Self::new(module, table, index);
        let status = op.status_column.clone();
        op.column(status, RowStatus::CreateAndWait)
    }

    pub fn column(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.push((name.into(), value.into()));
        self
    }

    pub fn with_status_column(mut self, name: impl Into<String>) -> Self {
        self.status_column = name.into();
        self
    }

    pub fn with_result_column(mut self, name: impl Into<String>) -> Self {
        self.result_column = name.into();
        self
    }

    /// Full symbol name of a column of this table.
    pub fn column_symbol(&self, column: &str) -> String {
        format!("{}{}", self.table, column)
    }

    pub fn status_symbol(&self) -> String {
        self.column_symbol(&self.status_column)
    }

    pub fn result_symbol(&self) -> String {
        self.column_symbol(&self.result_column)
    }

    fn resolve_column(&self, resolver: &Resolver, column: &str) -> Result<Oid> {
        resolver.resolve(&self.module, &self.column_symbol(column), &self.index)
    }
}

/// Outcome of creating and populating a row.
#[derive(Debug)]
pub enum RowWrite {
    /// Every column was written.
    Complete { written: usize },
    /// The write of `column` failed; later columns were not attempted.
    Aborted {
        column: String,
        /// Writes attempted, the failed one included.
        attempted: usize,
        error: Box<Error>,
        /// Whether a `destroy` was written under
        /// [`CleanupPolicy::DestroyOnFailure`] and accepted.
        destroyed: bool,
    },
}

impl RowWrite {
    pub fn is_complete(&self) -> bool {
        matches!(self, RowWrite::Complete { .. })
    }

    pub fn attempted(&self) -> usize {
        match self {
            RowWrite::Complete { written } => *written,
            RowWrite::Aborted { attempted, .. } => *attempted,
        }
    }
}

/// Fixed-interval polling bounded by a wall-clock deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollPolicy {
    pub const fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }

    /// Row result polling: every 500 ms for up to 30 s.
    pub const fn row_result() -> Self {
        Self::new(Duration::from_millis(500), Duration::from_secs(30))
    }

    /// Write read-back: every 100 ms for up to 5 s.
    pub const fn verify() -> Self {
        Self::new(Duration::from_millis(100), Duration::from_secs(5))
    }
}

/// How a result poll ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Finished(OperationResult),
    /// Still `inProgress` at the deadline.
    Timeout,
}

impl fmt::Display for PollOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollOutcome::Finished(result) => write!(f, "{result}"),
            PollOutcome::Timeout => f.write_str("timeout"),
        }
    }
}

/// How a write read-back ended.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    Confirmed,
    TimedOut { last: Option<Value> },
}

impl Verification {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Verification::Confirmed)
    }
}

fn integer_code(oid: &Oid, value: Value) -> Result<i32> {
    value.as_i32().ok_or_else(|| {
        Error::UnexpectedValue {
            oid: oid.clone(),
            value: Box::new(value),
        }
        .boxed()
    })
}

/// Steps 1 and 2: write each column in order, stopping at the first failure.
pub(crate) async fn write_row<E: Engine>(
    engine: &E,
    resolver: &Resolver,
    op: &RowOperation,
    cleanup: CleanupPolicy,
) -> Result<RowWrite> {
    let targets = op
        .columns
        .iter()
        .map(|(column, value)| Ok((column, op.resolve_column(resolver, column)?, value)))
        .collect::<Result<Vec<_>>>()?;

    for (attempt, (column, oid, value)) in targets.into_iter().enumerate() {
        tracing::debug!(target: "albedo_snmp::row", { snmp.oid = %oid, column = %column, value = %value }, "writing row column");
        if let Err(error) = engine.set(&oid, value.clone()).await {
            tracing::warn!(target: "albedo_snmp::row", { snmp.oid = %oid, column = %column, error = %error }, "row column write failed, aborting");
            let destroyed = match cleanup {
                CleanupPolicy::Manual => false,
                CleanupPolicy::DestroyOnFailure => destroy(engine, resolver, op).await.is_ok(),
            };
            return Ok(RowWrite::Aborted {
                column: column.clone(),
                attempted: attempt + 1,
                error,
                destroyed,
            });
        }
    }

    Ok(RowWrite::Complete {
        written: op.columns.len(),
    })
}

async fn write_status<E: Engine>(
    engine: &E,
    resolver: &Resolver,
    op: &RowOperation,
    status: RowStatus,
) -> Result<()> {
    let oid = op.resolve_column(resolver, &op.status_column)?;
    tracing::debug!(target: "albedo_snmp::row", { snmp.oid = %oid, %status }, "writing row status");
    engine.set(&oid, status.into()).await?;
    Ok(())
}

/// Step 3.
pub(crate) async fn activate<E: Engine>(engine: &E, resolver: &Resolver, op: &RowOperation) -> Result<()> {
    write_status(engine, resolver, op, RowStatus::Active).await
}

/// Step 5.
pub(crate) async fn destroy<E: Engine>(engine: &E, resolver: &Resolver, op: &RowOperation) -> Result<()> {
    write_status(engine, resolver, op, RowStatus::Destroy).await
}

/// Step 4: read the result column until it leaves `inProgress` or the
/// deadline passes. The column is read at least once.
pub(crate) async fn poll_result<E: Engine>(engine: &E, oid: &Oid, policy: PollPolicy) -> Result<PollOutcome> {
    let deadline = Instant::now() + policy.timeout;
    let mut reads = 0u32;

    loop {
        let vb = engine.get(oid).await?;
        reads += 1;
        let result = OperationResult::from_i32(integer_code(oid, vb.value)?);
        tracing::debug!(target: "albedo_snmp::row", { snmp.oid = %oid, reads, %result }, "polled row result");

        if result.is_terminal() {
            return Ok(PollOutcome::Finished(result));
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(target: "albedo_snmp::row", { snmp.oid = %oid, reads, timeout = ?policy.timeout }, "row result still in progress at deadline");
            return Ok(PollOutcome::Timeout);
        }
        tokio::time::sleep(policy.interval.min(deadline - now)).await;
    }
}

/// Read `oid` back until it equals `expected` or the deadline passes.
///
/// Failed reads count as "not applied yet".
pub(crate) async fn verify_value<E: Engine>(
    engine: &E,
    oid: &Oid,
    expected: &Value,
    policy: PollPolicy,
) -> Verification {
    let deadline = Instant::now() + policy.timeout;
    let mut last = None;

    loop {
        match engine.get(oid).await {
            Ok(vb) if &vb.value == expected => return Verification::Confirmed,
            Ok(vb) => last = Some(vb.value),
            Err(e) => {
                tracing::debug!(target: "albedo_snmp::row", { snmp.oid = %oid, error = %e }, "read-back failed");
            }
        }

        let now = Instant::now();
        if now >= deadline {
            tracing::warn!(target: "albedo_snmp::row", { snmp.oid = %oid, timeout = ?policy.timeout }, "write not confirmed before deadline");
            return Verification::TimedOut { last };
        }
        tokio::time::sleep(policy.interval.min(deadline - now)).await;
    }
}

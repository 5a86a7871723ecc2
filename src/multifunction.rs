//! Multifunction device personalities.
//!
//! Some test sets run one of several mutually exclusive functions (TDM, PSN,
//! clock monitoring). The active function is identified by two values that
//! live in different places:
//!
//! - the function class, in the `mfActiveFunc.0` scalar
//! - the mode, in the `mfFuncMode` column of the `mfFuncTable` row whose
//!   `mfFuncType` equals that class
//!
//! Writing a row's `mfFuncMode` makes the device switch to that function on
//! its own; `mfActiveFunc` follows once the switch has been applied.
//!
//! # Switching aborts device activity
//!
//! A function switch stops every test or monitoring session running on the
//! device. Nothing here stops or restarts that activity: callers must have
//! finished with it before calling
//! [`switch_function`](crate::session::Device::switch_function) or
//! [`ensure_function`](crate::session::Device::ensure_function).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use std::time::Duration;

use crate::engine::Engine;
use crate::error::{Error, Result};
use crate::oid::Oid;
use crate::resolver::Resolver;
use crate::value::Value;
use crate::walk::{TableRows, WalkEnd, walk_subtree};

/// Every known `(class, mode)` personality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionType {
    TdmMonitor,
    TdmEndpoint,
    TdmThrough,
    E0Endpoint,
    DataEndpoint,
    DataMonitor,
    C3794Endpoint,
    C3794Monitor,
    TdmExternal,
    PsnL1Endpoint,
    PsnEthEndpoint,
    PsnIpEndpoint,
    PsnExternal,
    ClkmonExternal,
    ClkmonActive,
}

pub const CLASS_TDM: i32 = 1;
pub const CLASS_PSN: i32 = 2;
pub const CLASS_CLKMON: i32 = 3;

const ALL_FUNCTIONS: [FunctionType; 15] = [
    FunctionType::TdmMonitor,
    FunctionType::TdmEndpoint,
    FunctionType::TdmThrough,
    FunctionType::E0Endpoint,
    FunctionType::DataEndpoint,
    FunctionType::DataMonitor,
    FunctionType::C3794Endpoint,
    FunctionType::C3794Monitor,
    FunctionType::TdmExternal,
    FunctionType::PsnL1Endpoint,
    FunctionType::PsnEthEndpoint,
    FunctionType::PsnIpEndpoint,
    FunctionType::PsnExternal,
    FunctionType::ClkmonExternal,
    FunctionType::ClkmonActive,
];

impl FunctionType {
    /// All variants in table order.
    pub fn all() -> impl Iterator<Item = FunctionType> {
        ALL_FUNCTIONS.into_iter()
    }

    /// Look up a `(class, mode)` pair; `None` if the pair is not a known
    /// personality.
    pub fn from_pair(class: i32, mode: i32) -> Option<Self> {
        Self::all().find(|ft| ft.pair() == (class, mode))
    }

    /// `(class, mode)`.
    pub fn pair(self) -> (i32, i32) {
        match self {
            FunctionType::TdmMonitor => (CLASS_TDM, 0),
            FunctionType::TdmEndpoint => (CLASS_TDM, 1),
            FunctionType::TdmThrough => (CLASS_TDM, 2),
            FunctionType::E0Endpoint => (CLASS_TDM, 3),
            FunctionType::DataEndpoint => (CLASS_TDM, 4),
            FunctionType::DataMonitor => (CLASS_TDM, 5),
            FunctionType::C3794Endpoint => (CLASS_TDM, 6),
            FunctionType::C3794Monitor => (CLASS_TDM, 7),
            FunctionType::TdmExternal => (CLASS_TDM, 8),
            FunctionType::PsnL1Endpoint => (CLASS_PSN, 0),
            FunctionType::PsnEthEndpoint => (CLASS_PSN, 1),
            FunctionType::PsnIpEndpoint => (CLASS_PSN, 2),
            FunctionType::PsnExternal => (CLASS_PSN, 3),
            FunctionType::ClkmonExternal => (CLASS_CLKMON, 0),
            FunctionType::ClkmonActive => (CLASS_CLKMON, 1),
        }
    }

    pub fn class(self) -> i32 {
        self.pair().0
    }

    pub fn mode(self) -> i32 {
        self.pair().1
    }

    pub fn name(self) -> &'static str {
        match self {
            FunctionType::TdmMonitor => "tdm-monitor",
            FunctionType::TdmEndpoint => "tdm-endpoint",
            FunctionType::TdmThrough => "tdm-through",
            FunctionType::E0Endpoint => "e0-endpoint",
            FunctionType::DataEndpoint => "data-endpoint",
            FunctionType::DataMonitor => "data-monitor",
            FunctionType::C3794Endpoint => "c3794-endpoint",
            FunctionType::C3794Monitor => "c3794-monitor",
            FunctionType::TdmExternal => "tdm-external",
            FunctionType::PsnL1Endpoint => "psn-l1-endpoint",
            FunctionType::PsnEthEndpoint => "psn-eth-endpoint",
            FunctionType::PsnIpEndpoint => "psn-ip-endpoint",
            FunctionType::PsnExternal => "psn-external",
            FunctionType::ClkmonExternal => "clkmon-external",
            FunctionType::ClkmonActive => "clkmon-active",
        }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FunctionType {
    type Err = Box<Error>;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.replace('_', "-");
        Self::all()
            .find(|ft| ft.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::Config(format!("unknown function type: {s}").into()).boxed())
    }
}

/// Result of active-function detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveFunction {
    Function(FunctionType),
    /// The device is multifunction but the active pair could not be
    /// determined or is not a known personality.
    Unknown,
    NotMultifunction,
}

impl ActiveFunction {
    pub fn function(self) -> Option<FunctionType> {
        match self {
            ActiveFunction::Function(ft) => Some(ft),
            _ => None,
        }
    }
}

impl fmt::Display for ActiveFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveFunction::Function(ft) => write!(f, "{ft}"),
            ActiveFunction::Unknown => f.write_str("unknown"),
            ActiveFunction::NotMultifunction => f.write_str("not-multifunction"),
        }
    }
}

/// Where the active function lives in the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultifunctionLayout {
    pub module: String,
    /// Scalar holding the active function class.
    pub active_function: String,
    pub active_index: Vec<u32>,
    /// Table walked for per-class modes.
    pub table: String,
    pub class_column: String,
    pub mode_column: String,
}

impl Default for MultifunctionLayout {
    fn default() -> Self {
        Self {
            module: "ATSL-MULTIFUNCTION-MIB".into(),
            active_function: "mfActiveFunc".into(),
            active_index: vec![0],
            table: "mfFuncTable".into(),
            class_column: "mfFuncType".into(),
            mode_column: "mfFuncMode".into(),
        }
    }
}

/// Result of a switch request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// Nothing was written.
    AlreadyActive(FunctionType),
    /// The mode was written and the device confirmed the new function.
    Switched { from: ActiveFunction, to: FunctionType },
    /// The device has no function table; nothing was written.
    NotMultifunction,
}

impl SwitchOutcome {
    /// True if the device is now running the requested function.
    pub fn is_active(&self) -> bool {
        !matches!(self, SwitchOutcome::NotMultifunction)
    }
}

const CLASS: usize = 0;
const MODE: usize = 1;

/// Detection and switching against one engine.
///
/// `probed` caches the capability probe for the lifetime of the session.
pub(crate) struct Detector<'a, E> {
    pub engine: &'a E,
    pub resolver: &'a Resolver,
    pub layout: &'a MultifunctionLayout,
    pub probed: &'a OnceLock<bool>,
}

impl<E: Engine> Detector<'_, E> {
    fn active_class_oid(&self) -> Result<Oid> {
        let layout = self.layout;
        self.resolver
            .resolve(&layout.module, &layout.active_function, &layout.active_index)
    }

    /// Read the active class; `None` when the device returns an exception.
    async fn read_active_class(&self) -> Result<Option<i32>> {
        let oid = self.active_class_oid()?;
        let vb = self.engine.get(&oid).await?;
        if vb.value.is_exception() {
            tracing::debug!(target: "albedo_snmp::multifunction", { snmp.oid = %oid, value = %vb.value }, "active function not present");
            return Ok(None);
        }
        match vb.value.as_i32() {
            Some(class) => Ok(Some(class)),
            None => Err(Error::UnexpectedValue {
                oid,
                value: Box::new(vb.value),
            }
            .boxed()),
        }
    }

    /// A failed or exceptional probe read means the device has no
    /// multifunction support. Only resolution errors escape.
    pub async fn is_multifunction(&self) -> Result<bool> {
        if let Some(&cached) = self.probed.get() {
            return Ok(cached);
        }
        let oid = self.active_class_oid()?;
        let present = match self.engine.get(&oid).await {
            Ok(vb) => !vb.value.is_exception(),
            Err(e) => {
                tracing::debug!(target: "albedo_snmp::multifunction", { snmp.oid = %oid, error = %e }, "capability probe failed");
                false
            }
        };
        tracing::debug!(target: "albedo_snmp::multifunction", { multifunction = present }, "capability probe");
        Ok(*self.probed.get_or_init(|| present))
    }

    async fn function_rows(&self) -> Result<TableRows> {
        let layout = self.layout;
        let table = self.resolver.resolve(&layout.module, &layout.table, &[])?;
        let class = self.resolver.resolve(&layout.module, &layout.class_column, &[])?;
        let mode = self.resolver.resolve(&layout.module, &layout.mode_column, &[])?;

        let walk = walk_subtree(self.engine, &table).await;
        if let WalkEnd::Failed(e) = walk.end {
            tracing::warn!(target: "albedo_snmp::multifunction", { rows_read = walk.varbinds.len(), error = %e }, "function table walk failed");
            return Err(e);
        }
        Ok(TableRows::group(vec![class, mode], &walk.varbinds))
    }

    fn match_row(rows: &TableRows, class: i32) -> ActiveFunction {
        let Some(index) = rows.find(CLASS, |v| v.as_i32() == Some(class)) else {
            tracing::debug!(target: "albedo_snmp::multifunction", { class }, "no function table row for active class");
            return ActiveFunction::Unknown;
        };
        let Some(mode) = rows.cell(index, MODE).and_then(Value::as_i32) else {
            tracing::debug!(target: "albedo_snmp::multifunction", { class, row = ?index }, "function row has no mode");
            return ActiveFunction::Unknown;
        };
        match FunctionType::from_pair(class, mode) {
            Some(ft) => ActiveFunction::Function(ft),
            None => {
                tracing::debug!(target: "albedo_snmp::multifunction", { class, mode }, "unmapped function pair");
                ActiveFunction::Unknown
            }
        }
    }

    /// Detect the active function, returning the table rows used.
    async fn detect(&self) -> Result<(ActiveFunction, Option<TableRows>)> {
        if !self.is_multifunction().await? {
            return Ok((ActiveFunction::NotMultifunction, None));
        }
        let Some(class) = self.read_active_class().await? else {
            return Ok((ActiveFunction::Unknown, None));
        };
        let rows = self.function_rows().await?;
        let active = Self::match_row(&rows, class);
        tracing::debug!(target: "albedo_snmp::multifunction", { class, %active }, "detected active function");
        Ok((active, Some(rows)))
    }

    pub async fn active_function(&self) -> Result<ActiveFunction> {
        Ok(self.detect().await?.0)
    }

    pub async fn switch_function(&self, target: FunctionType, settle: Duration) -> Result<SwitchOutcome> {
        let (current, rows) = self.detect().await?;
        if current == ActiveFunction::NotMultifunction {
            return Ok(SwitchOutcome::NotMultifunction);
        }
        if current == ActiveFunction::Function(target) {
            return Ok(SwitchOutcome::AlreadyActive(target));
        }

        let rows = match rows {
            Some(rows) => rows,
            None => self.function_rows().await?,
        };
        let (class, mode) = target.pair();
        let Some(index) = rows.find(CLASS, |v| v.as_i32() == Some(class)) else {
            return Err(Error::FunctionNotAvailable { function: target }.boxed());
        };

        let layout = self.layout;
        let mode_oid = self.resolver.resolve(&layout.module, &layout.mode_column, index)?;
        tracing::info!(target: "albedo_snmp::multifunction", { from = %current, to = %target, snmp.oid = %mode_oid }, "switching function");
        self.engine.set(&mode_oid, Value::Integer(mode)).await?;

        tokio::time::sleep(settle).await;

        let observed = self.active_function().await?;
        if observed == ActiveFunction::Function(target) {
            Ok(SwitchOutcome::Switched {
                from: current,
                to: target,
            })
        } else {
            tracing::warn!(target: "albedo_snmp::multifunction", { wanted = %target, %observed }, "function switch not confirmed");
            Err(Error::SwitchVerificationFailed {
                wanted: target,
                observed,
            }
            .boxed())
        }
    }

    pub async fn ensure_function(&self, required: FunctionType, settle: Duration) -> Result<SwitchOutcome> {
        match self.active_function().await? {
            ActiveFunction::NotMultifunction => Ok(SwitchOutcome::NotMultifunction),
            ActiveFunction::Function(ft) if ft == required => Ok(SwitchOutcome::AlreadyActive(ft)),
            _ => self.switch_function(required, settle).await,
        }
    }
}

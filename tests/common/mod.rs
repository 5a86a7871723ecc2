//! Shared test infrastructure for albedo-snmp.
//!
//! Provides FakeAgent (an in-memory engine), FakeConnector, and the schema
//! fixtures the device-level tests resolve against.

// Not every test binary uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

pub mod fixtures;

pub use fixtures::{
    CF_TABLE, MF_ACTIVE, MF_MODE, MF_TABLE, MF_TYPE, config_files_column, fixture_resolver,
    fixture_schema,
};

use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use albedo_snmp::engine::{Connector, Engine};
use albedo_snmp::{Error, ErrorStatus, Oid, Result, SessionConfig, Value, VarBind};

pub const AGENT_ADDR: SocketAddr = SocketAddr::new(std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST), 161);

#[derive(Default)]
struct AgentState {
    store: BTreeMap<Oid, Value>,
    /// Values returned by successive GETs; the last one repeats.
    scripted: HashMap<Oid, VecDeque<Value>>,
    /// Replies to GETNEXT from a given cursor, overriding the store.
    next_overrides: HashMap<Oid, VarBind>,
    set_failures: HashMap<Oid, ErrorStatus>,
    get_timeouts: HashSet<Oid>,
    /// Fail GETNEXT with a timeout after this many successful calls.
    next_budget: Option<usize>,
    /// Store changes applied when an address is written with a value.
    effects: Vec<(Oid, Value, Vec<(Oid, Value)>)>,
    writes: Vec<(Oid, Value)>,
    reads: HashMap<Oid, usize>,
    next_calls: usize,
}

/// An in-memory agent: a sorted map of addresses behind the [`Engine`]
/// trait, with failure injection.
///
/// Clones share state, so a test keeps one clone for inspection while the
/// session owns another.
#[derive(Clone, Default)]
pub struct FakeAgent {
    state: Arc<Mutex<AgentState>>,
    closes: Arc<AtomicUsize>,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, AgentState> {
        self.state.lock().unwrap()
    }

    pub fn with(self, oid: Oid, value: impl Into<Value>) -> Self {
        self.insert(oid, value);
        self
    }

    pub fn insert(&self, oid: Oid, value: impl Into<Value>) {
        self.lock().store.insert(oid, value.into());
    }

    pub fn value(&self, oid: &Oid) -> Option<Value> {
        self.lock().store.get(oid).cloned()
    }

    /// Successive GETs of `oid` return `values` in order, then keep
    /// returning the last one.
    pub fn script_reads(&self, oid: Oid, values: impl IntoIterator<Item = Value>) {
        self.lock().scripted.insert(oid, values.into_iter().collect());
    }

    pub fn override_next(&self, cursor: Oid, reply: VarBind) {
        self.lock().next_overrides.insert(cursor, reply);
    }

    pub fn fail_set(&self, oid: Oid, status: ErrorStatus) {
        self.lock().set_failures.insert(oid, status);
    }

    pub fn time_out_get(&self, oid: Oid) {
        self.lock().get_timeouts.insert(oid);
    }

    pub fn fail_get_next_after(&self, successes: usize) {
        self.lock().next_budget = Some(successes);
    }

    /// When `oid` is written with `value`, also apply `changes` to the store.
    pub fn on_set(&self, oid: Oid, value: impl Into<Value>, changes: Vec<(Oid, Value)>) {
        self.lock().effects.push((oid, value.into(), changes));
    }

    /// Every SET received, failed ones included.
    pub fn writes(&self) -> Vec<(Oid, Value)> {
        self.lock().writes.clone()
    }

    pub fn reads_of(&self, oid: &Oid) -> usize {
        self.lock().reads.get(oid).copied().unwrap_or(0)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn timeout() -> Box<Error> {
        Error::Timeout {
            target: AGENT_ADDR,
            elapsed: Duration::from_secs(1),
            retries: 0,
        }
        .boxed()
    }
}

impl FakeAgent {
    fn get_now(&self, oid: &Oid) -> Result<VarBind> {
        let mut state = self.lock();
        *state.reads.entry(oid.clone()).or_default() += 1;
        if state.get_timeouts.contains(oid) {
            return Err(Self::timeout());
        }
        if let Some(queue) = state.scripted.get_mut(oid)
            && let Some(front) = queue.front().cloned()
        {
            if queue.len() > 1 {
                queue.pop_front();
            }
            return Ok(VarBind::new(oid.clone(), front));
        }
        let value = state.store.get(oid).cloned().unwrap_or(Value::NoSuchInstance);
        Ok(VarBind::new(oid.clone(), value))
    }

    fn get_next_now(&self, oid: &Oid) -> Result<VarBind> {
        let mut state = self.lock();
        if let Some(budget) = state.next_budget
            && state.next_calls >= budget
        {
            return Err(Self::timeout());
        }
        state.next_calls += 1;
        if let Some(reply) = state.next_overrides.get(oid) {
            return Ok(reply.clone());
        }
        let next = state
            .store
            .range((Bound::Excluded(oid.clone()), Bound::Unbounded))
            .next()
            .map(|(oid, value)| VarBind::new(oid.clone(), value.clone()));
        Ok(next.unwrap_or_else(|| VarBind::new(oid.clone(), Value::EndOfMibView)))
    }

    fn set_now(&self, oid: &Oid, value: Value) -> Result<VarBind> {
        let mut state = self.lock();
        state.writes.push((oid.clone(), value.clone()));
        if let Some(&status) = state.set_failures.get(oid) {
            return Err(Error::Snmp {
                target: AGENT_ADDR,
                status,
                index: 1,
                oid: Some(oid.clone()),
            }
            .boxed());
        }
        let changes: Vec<(Oid, Value)> = state
            .effects
            .iter()
            .filter(|(target, wanted, _)| target == oid && *wanted == value)
            .flat_map(|(_, _, changes)| changes.iter().cloned())
            .collect();
        state.store.insert(oid.clone(), value.clone());
        state.store.extend(changes);
        Ok(VarBind::new(oid.clone(), value))
    }
}

impl Engine for FakeAgent {
    async fn get(&self, oid: &Oid) -> Result<VarBind> {
        self.get_now(oid)
    }

    async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        self.get_next_now(oid)
    }

    async fn set(&self, oid: &Oid, value: Value) -> Result<VarBind> {
        self.set_now(oid, value)
    }

    async fn close(self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

/// Hands out clones of one [`FakeAgent`] and counts connects.
#[derive(Clone, Default)]
pub struct FakeConnector {
    pub agent: FakeAgent,
    connects: Arc<AtomicUsize>,
    refuse: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub fn new(agent: FakeAgent) -> Self {
        Self {
            agent,
            ..Self::default()
        }
    }

    /// Fail the next `n` connects.
    pub fn refuse_next(&self, n: usize) {
        self.refuse.store(n, Ordering::SeqCst);
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

impl Connector for FakeConnector {
    type Engine = FakeAgent;

    async fn connect(&self, _config: &SessionConfig) -> Result<FakeAgent> {
        let refused = self
            .refuse
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if refused {
            return Err(Error::Network {
                target: AGENT_ADDR,
                source: std::io::Error::from(std::io::ErrorKind::ConnectionRefused),
            }
            .boxed());
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.agent.clone())
    }
}

/// A session over `connector` using the fixture schema.
pub fn session(connector: FakeConnector) -> albedo_snmp::DeviceSession<FakeConnector> {
    albedo_snmp::DeviceSession::builder("device-under-test")
        .connector(connector)
        .resolver(Arc::new(fixture_resolver()))
        .settle_time(Duration::ZERO)
        .build()
}

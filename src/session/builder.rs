//! Session builder.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use super::{DeviceSession, SessionConfig};
use crate::client::Retry;
use crate::engine::{Connector, UdpConnector};
use crate::multifunction::MultifunctionLayout;
use crate::resolver::Resolver;
use crate::row::{CleanupPolicy, PollPolicy};

/// Builder for [`DeviceSession`].
///
/// ```rust
/// use albedo_snmp::{DeviceSession, Retry};
/// use std::time::Duration;
///
/// let session = DeviceSession::builder("192.168.1.100")
///     .read_community("public")
///     .write_community("private")
///     .timeout(Duration::from_secs(2))
///     .retry(Retry::fixed(1, Duration::ZERO))
///     .settle_time(Duration::from_secs(5))
///     .build();
/// assert_eq!(session.config().port, 161);
/// ```
pub struct SessionBuilder<C = UdpConnector> {
    config: SessionConfig,
    connector: C,
    resolver: Option<Arc<Resolver>>,
    mib_dir: Option<PathBuf>,
}

impl SessionBuilder<UdpConnector> {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            config: SessionConfig::new(host),
            connector: UdpConnector,
            resolver: None,
            mib_dir: None,
        }
    }
}

impl<C: Connector> SessionBuilder<C> {
    /// Use a different connector, e.g. a test double.
    pub fn connector<C2: Connector>(self, connector: C2) -> SessionBuilder<C2> {
        SessionBuilder {
            config: self.config,
            connector,
            resolver: self.resolver,
            mib_dir: self.mib_dir,
        }
    }

    /// Replace the whole configuration, keeping nothing set so far.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the agent port (default: 161).
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Set the read community (default: "public").
    pub fn read_community(mut self, community: impl Into<Bytes>) -> Self {
        self.config.read_community = community.into();
        self
    }

    /// Set the write community (default: "private").
    pub fn write_community(mut self, community: impl Into<Bytes>) -> Self {
        self.config.write_community = community.into();
        self
    }

    /// Set the per-request timeout (default: 5 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retransmission policy (default: 3 retries, no backoff).
    pub fn retry(mut self, retry: Retry) -> Self {
        self.config.retry = retry;
        self
    }

    /// Set the wait after a function switch (default: 3 seconds).
    pub fn settle_time(mut self, settle: Duration) -> Self {
        self.config.settle_time = settle;
        self
    }

    pub fn row_poll(mut self, policy: PollPolicy) -> Self {
        self.config.row_poll = policy;
        self
    }

    pub fn verify_poll(mut self, policy: PollPolicy) -> Self {
        self.config.verify_poll = policy;
        self
    }

    pub fn cleanup(mut self, cleanup: CleanupPolicy) -> Self {
        self.config.cleanup = cleanup;
        self
    }

    pub fn multifunction_layout(mut self, layout: MultifunctionLayout) -> Self {
        self.config.multifunction = layout;
        self
    }

    /// Share a resolver (and its module cache) with other sessions.
    pub fn resolver(mut self, resolver: Arc<Resolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Load JSON schema modules from `dir`. Ignored if a resolver is set.
    pub fn mib_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.mib_dir = Some(dir.into());
        self
    }

    pub fn build(self) -> DeviceSession<C> {
        let resolver = match (self.resolver, self.mib_dir) {
            (Some(resolver), _) => resolver,
            (None, Some(dir)) => Arc::new(Resolver::from_dir(dir)),
            (None, None) => Arc::new(Resolver::builtin()),
        };
        DeviceSession::new(self.config, self.connector, resolver)
    }
}

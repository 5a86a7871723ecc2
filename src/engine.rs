//! The seam between device operations and the wire.
//!
//! Everything above this module (walks, row operations, function switching)
//! is written against [`Engine`]; a [`Connector`] produces one engine per
//! [`DeviceSession`](crate::session::DeviceSession). The default pair is
//! [`Client`] over UDP and [`UdpConnector`].

use std::future::Future;
use std::net::SocketAddr;

use crate::client::{Client, ClientConfig};
use crate::error::{Error, Result, UNKNOWN_TARGET};
use crate::oid::Oid;
use crate::session::SessionConfig;
use crate::transport::{Transport, UdpTransport};
use crate::value::Value;
use crate::varbind::VarBind;

/// Single-varbind request primitives.
///
/// `get` and `get_next` return exception values (`noSuchObject`,
/// `noSuchInstance`, `endOfMibView`) as ordinary varbinds. Agent rejections
/// are [`Error::Snmp`]; lost requests are [`Error::Timeout`].
pub trait Engine: Send + Sync {
    /// Read one address.
    fn get(&self, oid: &Oid) -> impl Future<Output = Result<VarBind>> + Send;

    /// Read the first address after `oid`.
    fn get_next(&self, oid: &Oid) -> impl Future<Output = Result<VarBind>> + Send;

    /// Write one address.
    fn set(&self, oid: &Oid, value: Value) -> impl Future<Output = Result<VarBind>> + Send;

    /// Release the underlying handle.
    fn close(self) -> impl Future<Output = ()> + Send
    where
        Self: Sized;
}

/// Opens an [`Engine`] for a session's connection parameters.
pub trait Connector: Send + Sync {
    type Engine: Engine;

    fn connect(&self, config: &SessionConfig) -> impl Future<Output = Result<Self::Engine>> + Send;
}

impl<T: Transport + 'static> Engine for Client<T> {
    async fn get(&self, oid: &Oid) -> Result<VarBind> {
        Client::get(self, oid).await
    }

    async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        Client::get_next(self, oid).await
    }

    async fn set(&self, oid: &Oid, value: Value) -> Result<VarBind> {
        Client::set(self, oid, value).await
    }

    async fn close(self) {
        tracing::debug!(target: "albedo_snmp::client", { snmp.target = %self.peer_addr() }, "releasing client");
    }
}

/// Connects a [`Client`] over UDP.
#[derive(Clone, Copy, Debug, Default)]
pub struct UdpConnector;

impl UdpConnector {
    async fn lookup(host: &str, port: u16) -> Result<SocketAddr> {
        let mut addrs = tokio::net::lookup_host((host, port)).await.map_err(|source| {
            Error::Network {
                target: UNKNOWN_TARGET,
                source,
            }
            .boxed()
        })?;
        addrs
            .next()
            .ok_or_else(|| Error::Config(format!("no address found for host {host}").into()).boxed())
    }
}

impl Connector for UdpConnector {
    type Engine = Client<UdpTransport>;

    async fn connect(&self, config: &SessionConfig) -> Result<Self::Engine> {
        let target = Self::lookup(&config.host, config.port).await?;
        let transport = UdpTransport::connect(target).await?;

        let client_config = ClientConfig {
            read_community: config.read_community.clone(),
            write_community: config.write_community.clone(),
            timeout: config.timeout,
            retry: config.retry.clone(),
        };
        Ok(Client::new(transport, client_config))
    }
}

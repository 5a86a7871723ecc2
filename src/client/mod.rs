//! SNMPv2c client.
//!
//! The wire engine behind a [`DeviceSession`](crate::session::DeviceSession):
//! single-varbind GET, GETNEXT and SET over any [`Transport`]. GET and
//! GETNEXT carry the read community, SET carries the write community.

mod retry;

pub use retry::{Backoff, Retry};

use crate::ber::Decoder;
use crate::error::{Error, Result};
use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::transport::{Transport, UdpTransport};
use crate::value::Value;
use crate::varbind::VarBind;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};
use tracing::{Span, instrument};

/// SNMPv2c client.
///
/// Generic over transport type, with `UdpTransport` as default. Cloning is
/// cheap; the transport is released when the last clone is dropped.
#[derive(Clone)]
pub struct Client<T: Transport = UdpTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T: Transport> {
    transport: T,
    config: ClientConfig,
    next_request_id: AtomicI32,
}

/// Client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Community for GET and GETNEXT (default: "public")
    pub read_community: Bytes,
    /// Community for SET (default: "private")
    pub write_community: Bytes,
    /// Time to wait for each response (default: 5 seconds)
    pub timeout: Duration,
    /// Retransmission policy (default: 3 retries, no backoff)
    pub retry: Retry,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            read_community: Bytes::from_static(b"public"),
            write_community: Bytes::from_static(b"private"),
            timeout: Duration::from_secs(5),
            retry: Retry::default(),
        }
    }
}

fn initial_request_id() -> i32 {
    let seed = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0)
        ^ std::process::id();
    (seed & 0x3FFF_FFFF) as i32 + 1
}

impl<T: Transport> Client<T> {
    /// Create a new client with the given transport and config.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                transport,
                config,
                next_request_id: AtomicI32::new(initial_request_id()),
            }),
        }
    }

    /// Get the peer (target) address.
    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.transport.peer_addr()
    }

    /// The configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    fn next_request_id(&self) -> i32 {
        let id = self.inner.next_request_id.fetch_add(1, Ordering::Relaxed);
        if id <= 0 {
            self.inner.next_request_id.store(2, Ordering::Relaxed);
            return 1;
        }
        id
    }

    /// Wait for the response carrying `request_id`, discarding stale replies.
    async fn recv_matching(&self, request_id: i32) -> Result<Pdu> {
        let deadline = Instant::now() + self.inner.config.timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let (data, source) = self.inner.transport.recv(request_id, remaining).await?;
            tracing::trace!(target: "albedo_snmp::client", { snmp.bytes = data.len() }, "received response");

            let mut decoder = Decoder::with_target(data, source);
            let pdu = CommunityMessage::decode(&mut decoder)?.into_pdu();

            if pdu.pdu_type != PduType::Response {
                tracing::debug!(target: "albedo_snmp::client", { snmp.pdu_type = %pdu.pdu_type }, "ignoring non-response PDU");
                continue;
            }
            if pdu.request_id != request_id {
                tracing::warn!(target: "albedo_snmp::client", { expected_request_id = request_id, actual_request_id = pdu.request_id, peer = %self.peer_addr() }, "discarding response with stale request ID");
                continue;
            }
            return Ok(pdu);
        }
    }

    /// Send a request and wait for response, retransmitting on timeout.
    #[instrument(
        level = "debug",
        skip(self, data),
        fields(
            snmp.target = %self.peer_addr(),
            snmp.request_id = request_id,
            snmp.attempt = tracing::field::Empty,
            snmp.elapsed_ms = tracing::field::Empty,
        )
    )]
    async fn send_and_recv(&self, request_id: i32, data: &[u8]) -> Result<Pdu> {
        let start = Instant::now();
        let max_attempts = self.inner.config.retry.max_attempts;

        for attempt in 0..=max_attempts {
            Span::current().record("snmp.attempt", attempt);
            if attempt > 0 {
                tracing::debug!(target: "albedo_snmp::client", "retrying request");
            }

            tracing::trace!(target: "albedo_snmp::client", { snmp.bytes = data.len() }, "sending request");
            self.inner.transport.send(data).await?;

            match self.recv_matching(request_id).await {
                Ok(response) => {
                    Span::current().record("snmp.elapsed_ms", start.elapsed().as_millis() as u64);
                    if response.is_error() {
                        return Err(Error::Snmp {
                            target: self.peer_addr(),
                            status: response.error_status_enum(),
                            index: response.error_index.max(0) as u32,
                            oid: response.error_oid(),
                        }
                        .boxed());
                    }
                    return Ok(response);
                }
                Err(e) if matches!(*e, Error::Timeout { .. }) => {
                    if attempt < max_attempts {
                        let delay = self.inner.config.retry.compute_delay(attempt);
                        if !delay.is_zero() {
                            tracing::debug!(target: "albedo_snmp::client", { delay_ms = delay.as_millis() as u64 }, "backing off");
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
                Err(e) => {
                    Span::current().record("snmp.elapsed_ms", start.elapsed().as_millis() as u64);
                    return Err(e);
                }
            }
        }

        let elapsed = start.elapsed();
        Span::current().record("snmp.elapsed_ms", elapsed.as_millis() as u64);
        tracing::debug!(target: "albedo_snmp::client", { request_id, peer = %self.peer_addr(), ?elapsed, retries = max_attempts }, "request timed out");
        Err(Error::Timeout {
            target: self.peer_addr(),
            elapsed,
            retries: max_attempts,
        }
        .boxed())
    }

    async fn request(&self, pdu: Pdu, community: &Bytes) -> Result<VarBind> {
        tracing::debug!(target: "albedo_snmp::client", { snmp.pdu_type = %pdu.pdu_type }, "sending {} request", pdu.pdu_type);

        let request_id = pdu.request_id;
        let data = CommunityMessage::v2c(community.clone(), pdu).encode();
        let response = self.send_and_recv(request_id, &data).await?;

        response.varbinds.into_iter().next().ok_or_else(|| {
            tracing::debug!(target: "albedo_snmp::client", { peer = %self.peer_addr() }, "empty response");
            Error::MalformedResponse {
                target: self.peer_addr(),
            }
            .boxed()
        })
    }

    /// GET a single OID.
    ///
    /// An exception value (`noSuchObject`, `noSuchInstance`) is returned as
    /// the varbind's value, not as an error.
    #[instrument(skip(self), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get(&self, oid: &Oid) -> Result<VarBind> {
        let pdu = Pdu::get_request(self.next_request_id(), std::slice::from_ref(oid));
        self.request(pdu, &self.inner.config.read_community).await
    }

    /// GETNEXT: the first varbind strictly after `oid`.
    #[instrument(skip(self), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        let pdu = Pdu::get_next_request(self.next_request_id(), std::slice::from_ref(oid));
        self.request(pdu, &self.inner.config.read_community).await
    }

    /// SET a single OID using the write community.
    #[instrument(skip(self, value), err, fields(snmp.target = %self.peer_addr(), snmp.oid = %oid))]
    pub async fn set(&self, oid: &Oid, value: Value) -> Result<VarBind> {
        let pdu = Pdu::set_request(self.next_request_id(), vec![VarBind::new(oid.clone(), value)]);
        self.request(pdu, &self.inner.config.write_community).await
    }
}

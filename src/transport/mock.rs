//! Mock transport for testing.
//!
//! Provides a programmable transport that simulates agent replies without a
//! network connection.

use super::Transport;
use crate::ber::Decoder;
use crate::error::{Error, Result};
use crate::message::CommunityMessage;
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::Value;
use crate::varbind::VarBind;
use bytes::Bytes;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// A mock response to return for a request.
#[derive(Clone, Debug)]
pub enum MockResponse {
    /// Return this data as the response (request_id will be patched to match)
    Data(Bytes),
    /// Return this data as-is without patching request_id
    RawData(Bytes),
    /// Simulate a timeout
    Timeout,
    /// Simulate an IO error
    IoError(String),
}

/// A request sent through the mock transport, decoded.
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    /// The raw request data
    pub data: Bytes,
    /// Community string the request carried
    pub community: Bytes,
    /// The decoded PDU
    pub pdu: Pdu,
}

struct MockTransportInner {
    target: SocketAddr,
    responses: VecDeque<MockResponse>,
    requests: Vec<RecordedRequest>,
}

/// Mock transport for testing the SNMPv2c client.
///
/// ```rust
/// use albedo_snmp::transport::{MockTransport, ResponseBuilder};
/// use albedo_snmp::{Value, oid};
///
/// let mut mock = MockTransport::new("127.0.0.1:161".parse().unwrap());
/// mock.queue_response(
///     ResponseBuilder::new(1)
///         .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("mux-7"))
///         .build_v2c(b"public"),
/// );
/// mock.queue_timeout();
/// ```
#[derive(Clone)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new(target: SocketAddr) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner {
                target,
                responses: VecDeque::new(),
                requests: Vec::new(),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a response whose request_id is patched to match the request.
    pub fn queue_response(&mut self, data: impl Into<Bytes>) {
        self.lock().responses.push_back(MockResponse::Data(data.into()));
    }

    /// Queue a response returned exactly as provided.
    pub fn queue_raw_response(&mut self, data: impl Into<Bytes>) {
        self.lock().responses.push_back(MockResponse::RawData(data.into()));
    }

    /// Queue a timeout.
    pub fn queue_timeout(&mut self) {
        self.lock().responses.push_back(MockResponse::Timeout);
    }

    /// Queue an IO error.
    pub fn queue_io_error(&mut self, msg: impl Into<String>) {
        self.lock().responses.push_back(MockResponse::IoError(msg.into()));
    }

    /// Get all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    /// Get the number of queued responses remaining.
    pub fn queued_response_count(&self) -> usize {
        self.lock().responses.len()
    }

    fn patch_request_id(data: Bytes, request_id: i32) -> Bytes {
        match CommunityMessage::decode(&mut Decoder::new(data.clone())) {
            Ok(mut msg) => {
                msg.pdu.request_id = request_id;
                msg.encode()
            }
            Err(_) => data,
        }
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let data = Bytes::copy_from_slice(data);
        let msg = CommunityMessage::decode(&mut Decoder::new(data.clone()))?;
        self.lock().requests.push(RecordedRequest {
            data,
            community: msg.community,
            pdu: msg.pdu,
        });
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let (response, target) = {
            let mut inner = self.lock();
            (inner.responses.pop_front(), inner.target)
        };

        match response {
            Some(MockResponse::Data(data)) => Ok((Self::patch_request_id(data, request_id), target)),
            Some(MockResponse::RawData(data)) => Ok((data, target)),
            Some(MockResponse::IoError(msg)) => Err(Error::Network {
                target,
                source: std::io::Error::other(msg),
            }
            .boxed()),
            Some(MockResponse::Timeout) | None => Err(Error::Timeout {
                target,
                elapsed: timeout,
                retries: 0,
            }
            .boxed()),
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.lock().target
    }
}

/// Builder for SNMPv2c response messages in tests.
pub struct ResponseBuilder {
    request_id: i32,
    varbinds: Vec<VarBind>,
    error_status: i32,
    error_index: i32,
}

impl ResponseBuilder {
    /// Create a new response builder with the given request ID.
    pub fn new(request_id: i32) -> Self {
        Self {
            request_id,
            varbinds: Vec::new(),
            error_status: 0,
            error_index: 0,
        }
    }

    /// Add a varbind to the response.
    pub fn varbind(mut self, oid: Oid, value: Value) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    /// Set the error status.
    pub fn error_status(mut self, status: i32) -> Self {
        self.error_status = status;
        self
    }

    /// Set the error index.
    pub fn error_index(mut self, index: i32) -> Self {
        self.error_index = index;
        self
    }

    /// Build a v2c SNMP response message.
    pub fn build_v2c(self, community: &[u8]) -> Bytes {
        let pdu = Pdu {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: self.error_status,
            error_index: self.error_index,
            varbinds: self.varbinds,
        };
        CommunityMessage::v2c(Bytes::copy_from_slice(community), pdu).encode()
    }
}

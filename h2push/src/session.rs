use async_trait::async_trait;
use bytes::Bytes;

use crate::encode::OutgoingRequest;
use crate::TransportError;

/// Completed response of one stream, with the body fully read
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Bytes,
}

/// One physical multiplexed connection to the gateway
///
/// Streams are opened with [`Session::submit`] and their responses collected with
/// [`Session::await_response`]. The peer may revise its concurrency limit at any moment, so
/// [`Session::peer_concurrency_limit`] must be safe to call while streams are in flight.
#[async_trait]
pub trait Session: Send {
    /// Handle of a submitted stream
    type Stream: Send;

    /// Establish the connection. Does nothing if already connected.
    async fn connect(&mut self) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    async fn submit(&mut self, request: OutgoingRequest) -> Result<Self::Stream, TransportError>;

    async fn await_response(&mut self, stream: Self::Stream) -> Result<Response, TransportError>;

    /// Raw SETTINGS_MAX_CONCURRENT_STREAMS as currently advertised by the peer
    fn peer_concurrency_limit(&self) -> usize;
}

use async_trait::async_trait;
use bytes::Bytes;
use h2::client::{ResponseFuture, SendRequest};
use h2::{Ping, PingPong};
use http::{Method, Request};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::task::JoinHandle;
use tokio::time::{timeout, Duration, Instant};
use tracing::{debug, trace, warn};

use std::fmt::{self, Debug};
use std::future::{poll_fn, Future};
use std::marker::PhantomData;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::connector::Connector;
use crate::encode::OutgoingRequest;
use crate::session::{Response, Session};
use crate::utils::{read_body, DurationExt};
use crate::TransportError;

/// Driver of an HTTP/2 connection, to be polled on a spawned task
pub struct Connection<IO: AsyncRead + AsyncWrite + Unpin> {
    conn: h2::client::Connection<IO, Bytes>,
}

/// Handle to issue requests on a connection that is driven elsewhere
pub struct Control {
    send_request: SendRequest<Bytes>,
    ping_pong: Option<PingPong>,
}

#[derive(Clone, Debug)]
pub struct Builder {
    proto_builder: h2::client::Builder,
    settle_timeout: Duration,
}

/// Response of a submitted stream, not yet received
pub struct PendingResponse {
    stream_id: u32,
    response: ResponseFuture,
}

impl Debug for PendingResponse {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("PendingResponse")
            .field("stream_id", &self.stream_id)
            .finish()
    }
}

impl PendingResponse {
    pub fn stream_id(&self) -> u32 {
        self.stream_id
    }
}

impl<IO: AsyncRead + AsyncWrite + Unpin> Future for Connection<IO> {
    type Output = Result<(), TransportError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.conn).poll(cx).map_err(|e| e.into())
    }
}

impl Control {
    /// Open a stream carrying `request`, with the body sent in full
    pub async fn open_stream(
        &mut self,
        authority: &str,
        request: OutgoingRequest,
    ) -> Result<PendingResponse, TransportError> {
        let mut head = Request::builder()
            .method(Method::POST)
            .uri(format!("https://{}{}", authority, request.path));
        for (name, value) in request.headers.iter() {
            head = head.header(*name, value.as_str());
        }
        let head = head.body(())?;

        poll_fn(|cx: &mut Context<'_>| self.send_request.poll_ready(cx)).await?;
        let (response, mut send_stream) = self.send_request.send_request(head, false)?;
        send_stream.send_data(request.body, true)?;
        Ok(PendingResponse {
            stream_id: response.stream_id().as_u32(),
            response,
        })
    }

    /// Wait for a PING round trip, by which time the peer's initial SETTINGS has been applied
    ///
    /// The peer sends SETTINGS as the first frame of its preface, so it is always processed
    /// before the acknowledgement of any PING.
    pub async fn settle(&mut self, within: Duration) -> Result<(), TransportError> {
        if let Some(ping_pong) = self.ping_pong.as_mut() {
            timeout(within, ping_pong.ping(Ping::opaque()))
                .await
                .map_err(|_| TransportError::SettleTimedOut(within))??;
        }
        Ok(())
    }

    pub fn max_concurrent_send_streams(&self) -> usize {
        self.send_request.current_max_send_streams()
    }
}

impl Default for Builder {
    fn default() -> Self {
        let mut proto_builder = h2::client::Builder::new();
        proto_builder.enable_push(false);
        Self {
            proto_builder,
            settle_timeout: Duration::from_secs(5),
        }
    }
}

impl Builder {
    pub fn new(proto_builder: h2::client::Builder) -> Self {
        Self {
            proto_builder,
            ..Default::default()
        }
    }

    /// Sets how long to wait for the peer's initial SETTINGS after the handshake.
    ///
    /// Default is 5 seconds.
    pub fn settle_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.settle_timeout = timeout;
        self
    }

    pub async fn handshake<IO: AsyncRead + AsyncWrite + Unpin>(
        &self,
        io: IO,
    ) -> Result<(Control, Connection<IO>), TransportError> {
        let (send_request, mut conn) = self.proto_builder.handshake::<_, Bytes>(io).await?;
        debug!("h2 handshaked");
        let ping_pong = conn.ping_pong();
        Ok((
            Control {
                send_request,
                ping_pong,
            },
            Connection { conn },
        ))
    }
}

struct Live {
    control: Control,
    driver: JoinHandle<()>,
}

/// [`Session`] over an HTTP/2 connection established through a [`Connector`]
pub struct H2Session<C, S> {
    connector: C,
    authority: String,
    builder: Builder,
    live: Option<Live>,
    _io: PhantomData<fn() -> S>,
}

impl<C, S> H2Session<C, S>
where
    C: Connector<S> + Send + Sync,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    /// Create a session whose requests are addressed to `authority` (`host[:port]`)
    pub fn new(connector: C, authority: impl Into<String>) -> Self {
        Self::with_builder(connector, authority, Builder::default())
    }

    pub fn with_builder(connector: C, authority: impl Into<String>, builder: Builder) -> Self {
        Self {
            connector,
            authority: authority.into(),
            builder,
            live: None,
            _io: PhantomData,
        }
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    fn control(&mut self) -> Result<&mut Control, TransportError> {
        self.live
            .as_mut()
            .map(|live| &mut live.control)
            .ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl<C, S> Session for H2Session<C, S>
where
    C: Connector<S> + Send + Sync,
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Stream = PendingResponse;

    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.is_connected() {
            return Ok(());
        }
        let t = Instant::now();
        let io = self.connector.connect().await?;
        let (mut control, connection) = self.builder.handshake(io).await?;
        let authority = self.authority.clone();
        let driver = tokio::spawn(async move {
            match connection.await {
                Ok(()) => debug!(%authority, "h2 connection closed"),
                Err(error) => warn!(%authority, %error, "h2 connection terminated"),
            }
        });
        if let Err(e) = control.settle(self.builder.settle_timeout).await {
            driver.abort();
            return Err(e);
        }
        debug!(
            authority = %self.authority,
            max_concurrent_streams = control.max_concurrent_send_streams(),
            "connected within {}",
            t.elapsed().autofmt()
        );
        self.live = Some(Live { control, driver });
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.live
            .as_ref()
            .map_or(false, |live| !live.driver.is_finished())
    }

    async fn submit(&mut self, request: OutgoingRequest) -> Result<PendingResponse, TransportError> {
        let authority = self.authority.clone();
        let pending = self.control()?.open_stream(&authority, request).await?;
        trace!(stream_id = pending.stream_id(), "stream opened");
        Ok(pending)
    }

    async fn await_response(
        &mut self,
        pending: PendingResponse,
    ) -> Result<Response, TransportError> {
        let stream_id = pending.stream_id();
        let (head, mut body) = pending.response.await?.into_parts();
        let body = read_body(&mut body).await?;
        trace!(stream_id, status = head.status.as_u16(), len = body.len(), "stream completed");
        Ok(Response {
            status: head.status.as_u16(),
            body,
        })
    }

    fn peer_concurrency_limit(&self) -> usize {
        self.live
            .as_ref()
            .map_or(0, |live| live.control.max_concurrent_send_streams())
    }
}

use serde::Serialize;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use std::collections::HashMap;

use crate::config::ClientConfig;
use crate::connect::ensure_connected;
use crate::connector::TlsConnector;
use crate::dispatch::dispatch_batch;
use crate::encode::encode;
use crate::interpret::interpret;
use crate::limit::ConcurrencyLimit;
use crate::notification::{Notification, Outcome, Priority};
use crate::session::Session;
use crate::transport::{Builder, H2Session};
use crate::Error;

/// Session type of a client talking to the real gateway
pub type TlsSession = H2Session<TlsConnector, TlsStream<TcpStream>>;

/// Client delivering notifications over one session
///
/// Methods take `&mut self`: a batch owns the connection's streams for its whole duration, so
/// dispatches on the same client are serialized.
pub struct PushClient<S> {
    session: S,
    limit: ConcurrencyLimit,
}

impl PushClient<TlsSession> {
    /// Create a client for the gateway described by `config`. No connection is made until the
    /// first send or [`PushClient::connect`].
    pub fn from_config(config: &ClientConfig) -> Result<Self, Error> {
        let connector = TlsConnector::from_config(config)?;
        let mut builder = Builder::default();
        builder.settle_timeout(config.settle_timeout);
        Ok(Self::new(H2Session::with_builder(
            connector,
            config.authority(),
            builder,
        )))
    }
}

impl<S: Session> PushClient<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            limit: ConcurrencyLimit::new(),
        }
    }

    /// Connect to the gateway if not yet connected, retrying a bounded number of times
    pub async fn connect(&mut self) -> Result<(), Error> {
        ensure_connected(&mut self.session).await
    }

    /// Send one notification and wait for its result
    ///
    /// Fails with [`Error::NotificationRejected`] carrying the gateway's reason when the
    /// notification is not accepted.
    pub async fn send_notification<P: Serialize + ?Sized>(
        &mut self,
        token: &str,
        payload: &P,
        topic: &str,
        priority: Priority,
        expiration: Option<u64>,
    ) -> Result<(), Error> {
        let stream = self
            .send_notification_async(token, payload, topic, priority, expiration)
            .await?;
        match self.get_notification_result(stream).await? {
            Outcome::Success => Ok(()),
            Outcome::Failure(reason) => Err(Error::NotificationRejected(reason)),
        }
    }

    /// Submit one notification without waiting for its response
    pub async fn send_notification_async<P: Serialize + ?Sized>(
        &mut self,
        token: &str,
        payload: &P,
        topic: &str,
        priority: Priority,
        expiration: Option<u64>,
    ) -> Result<S::Stream, Error> {
        ensure_connected(&mut self.session).await?;
        let request = encode(token, payload, topic, priority, expiration)?;
        debug!(token, "sending notification");
        Ok(self.session.submit(request).await?)
    }

    /// Wait for the response of a stream returned by [`PushClient::send_notification_async`]
    pub async fn get_notification_result(&mut self, stream: S::Stream) -> Result<Outcome, Error> {
        let response = self.session.await_response(stream).await?;
        interpret(&response)
    }

    /// Send a batch of notifications concurrently over the connection's streams
    ///
    /// Returns the outcome for every token once all notifications have been answered. A
    /// token occurring more than once keeps the outcome of its last occurrence. Any failure
    /// aborts the batch and no partial result is returned.
    pub async fn send_notification_batch<P, I>(
        &mut self,
        notifications: I,
        topic: &str,
        priority: Priority,
        expiration: Option<u64>,
    ) -> Result<HashMap<String, Outcome>, Error>
    where
        P: Serialize,
        I: IntoIterator<Item = Notification<P>>,
    {
        // the peer's initial SETTINGS must be known before admitting any stream
        ensure_connected(&mut self.session).await?;
        dispatch_batch(
            &mut self.session,
            &mut self.limit,
            notifications,
            topic,
            priority,
            expiration,
        )
        .await
    }

    /// Effective concurrency limit as of the last scheduling step
    pub fn max_concurrent_streams(&self) -> usize {
        self.limit.current()
    }

    pub fn session(&self) -> &S {
        &self.session
    }
}

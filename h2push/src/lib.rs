//! Pipelined push-notification delivery over a single HTTP/2 connection, built upon
//! [h2](https://docs.rs/h2/).
//!
//! Notifications of a batch are sent as concurrent streams on one connection. The number of
//! streams kept open follows the peer's SETTINGS_MAX_CONCURRENT_STREAMS, which is re-read on
//! every scheduling step since the gateway may revise it at any time. Responses are collected
//! in submission order.

use std::io;
use std::time::Duration;

use thiserror::Error;

pub mod client;
pub mod config;
pub mod connector;
pub mod encode;
pub mod interpret;
pub mod limit;
pub mod notification;
pub mod session;
pub mod transport;
pub mod utils;

mod connect;
mod dispatch;

#[cfg(test)]
mod testing;

pub use crate::client::{PushClient, TlsSession};
pub use crate::config::{ClientConfig, Environment};
pub use crate::connector::{Connector, TlsConnector};
pub use crate::limit::{ConcurrencyLimit, CONCURRENT_STREAMS_SAFETY_MAXIMUM};
pub use crate::notification::{Notification, Outcome, Priority, DEFAULT_PRIORITY};
pub use crate::session::{Response, Session};
pub use crate::transport::H2Session;

/// Number of connection attempts made before giving up with [`Error::ConnectionFailed`]
pub const MAX_CONNECTION_RETRIES: usize = 3;

/// Failures of the transport layer beneath the scheduler
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("h2 layer error")]
    H2Error(#[from] h2::Error),
    #[error("io error")]
    IoError(#[from] io::Error),
    #[error("invalid request head")]
    InvalidRequest(#[from] http::Error),
    #[error("tls error")]
    TlsError(#[from] rustls::Error),
    #[error("invalid server name: {0}")]
    InvalidServerName(String),
    #[error("invalid client identity: {0}")]
    InvalidIdentity(String),
    #[error("session is not connected")]
    NotConnected,
    #[error("peer settings not received within {0:?}")]
    SettleTimedOut(Duration),
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to connect after {attempts} attempts")]
    ConnectionFailed {
        attempts: usize,
        #[source]
        source: TransportError,
    },
    #[error("undecodable response body (status {status})")]
    ResponseDecodeFailed {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("notification rejected: {0}")]
    NotificationRejected(String),
    #[error("failed to serialize payload")]
    PayloadEncodeFailed(#[source] serde_json::Error),
    #[error("transport error")]
    Transport(#[from] TransportError),
}

impl Error {
    /// Reason code returned by the gateway, if this error is a rejection
    pub fn reason(&self) -> Option<&str> {
        match self {
            Error::NotificationRejected(reason) => Some(reason),
            _ => None,
        }
    }
}

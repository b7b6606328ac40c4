//! Scripted in-memory session for exercising the scheduler.

use async_trait::async_trait;
use bytes::Bytes;

use std::cell::Cell;
use std::collections::HashMap;
use std::io;

use crate::encode::OutgoingRequest;
use crate::limit::CONCURRENT_STREAMS_SAFETY_MAXIMUM;
use crate::session::{Response, Session};
use crate::TransportError;

#[derive(Debug)]
pub(crate) struct MockStream {
    pub token: String,
}

pub(crate) struct MockSession {
    pub connected: bool,
    /// Number of connect calls that fail before one succeeds
    pub connect_failures: usize,
    pub connect_attempts: usize,
    /// Raw peer limit as a function of the number of requests submitted so far
    pub limit: fn(usize) -> usize,
    /// Non-200 replies by token; everything else gets `200 OK`
    pub replies: HashMap<String, (u16, &'static str)>,
    /// Token whose submission fails
    pub fail_submit: Option<String>,
    pub submitted: Vec<OutgoingRequest>,
    pub drained: Vec<String>,
    pub open: usize,
    pub peak_open: usize,
    last_reported: Cell<usize>,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            connected: false,
            connect_failures: 0,
            connect_attempts: 0,
            limit: |_| 100,
            replies: HashMap::new(),
            fail_submit: None,
            submitted: Vec::new(),
            drained: Vec::new(),
            open: 0,
            peak_open: 0,
            last_reported: Cell::new(usize::MAX),
        }
    }

    pub fn with_limit(limit: fn(usize) -> usize) -> Self {
        Self {
            limit,
            ..Self::new()
        }
    }

    pub fn reply(mut self, token: &str, status: u16, body: &'static str) -> Self {
        self.replies.insert(token.to_owned(), (status, body));
        self
    }

    pub fn submitted_tokens(&self) -> Vec<String> {
        self.submitted.iter().map(|r| r.token.clone()).collect()
    }
}

#[async_trait]
impl Session for MockSession {
    type Stream = MockStream;

    async fn connect(&mut self) -> Result<(), TransportError> {
        if self.connected {
            return Ok(());
        }
        self.connect_attempts += 1;
        if self.connect_attempts <= self.connect_failures {
            return Err(io::Error::new(io::ErrorKind::ConnectionRefused, "refused").into());
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn submit(&mut self, request: OutgoingRequest) -> Result<MockStream, TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        if self.fail_submit.as_deref() == Some(request.token.as_str()) {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "stream refused").into());
        }
        self.open += 1;
        self.peak_open = self.peak_open.max(self.open);
        let effective = self
            .last_reported
            .get()
            .clamp(1, CONCURRENT_STREAMS_SAFETY_MAXIMUM);
        assert!(
            self.open <= effective,
            "{} streams open with a limit of {}",
            self.open,
            effective
        );
        let stream = MockStream {
            token: request.token.clone(),
        };
        self.submitted.push(request);
        Ok(stream)
    }

    async fn await_response(&mut self, stream: MockStream) -> Result<Response, TransportError> {
        self.open -= 1;
        self.drained.push(stream.token.clone());
        let (status, body) = self
            .replies
            .get(&stream.token)
            .copied()
            .unwrap_or((200, ""));
        Ok(Response {
            status,
            body: Bytes::from_static(body.as_bytes()),
        })
    }

    fn peer_concurrency_limit(&self) -> usize {
        let raw = (self.limit)(self.submitted.len());
        self.last_reported.set(raw);
        raw
    }
}

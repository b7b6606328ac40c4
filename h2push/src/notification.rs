use serde::{Deserialize, Serialize};

use std::fmt::{self, Display};
use std::str::FromStr;

/// Priority is sent only when it differs from this
pub const DEFAULT_PRIORITY: Priority = Priority::Immediate;

/// Delivery priority, carried in the `apns-priority` header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Priority {
    #[default]
    Immediate,
    Delayed,
}

impl Priority {
    pub fn as_header_value(&self) -> &'static str {
        match self {
            Priority::Immediate => "10",
            Priority::Delayed => "5",
        }
    }
}

impl FromStr for Priority {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "immediate" | "10" => Ok(Priority::Immediate),
            "delayed" | "5" => Ok(Priority::Delayed),
            _ => Err("Unrecognized priority, expected: immediate, delayed, 10 or 5"),
        }
    }
}

/// A payload addressed to one device token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification<P = serde_json::Value> {
    pub token: String,
    pub payload: P,
}

impl<P> Notification<P> {
    pub fn new(token: impl Into<String>, payload: P) -> Self {
        Self {
            token: token.into(),
            payload,
        }
    }
}

/// Result of delivering one notification
///
/// A gateway reason is kept as an open string so codes unknown to this crate pass through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Success => None,
            Outcome::Failure(reason) => Some(reason),
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success => write!(fmt, "Success"),
            Outcome::Failure(reason) => write!(fmt, "{}", reason),
        }
    }
}

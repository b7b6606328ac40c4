//! Turning a notification into the request sent on its own stream.

use bytes::Bytes;
use serde::Serialize;

use crate::notification::{Priority, DEFAULT_PRIORITY};
use crate::Error;

pub const HEADER_TOPIC: &str = "apns-topic";
pub const HEADER_PRIORITY: &str = "apns-priority";
pub const HEADER_EXPIRATION: &str = "apns-expiration";

/// Request for one notification, ready to be submitted
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingRequest {
    pub token: String,
    pub path: String,
    pub headers: Vec<(&'static str, String)>,
    pub body: Bytes,
}

impl OutgoingRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Encode a notification as `POST /3/device/{token}` with a compact JSON body
///
/// `apns-priority` is omitted for the default priority and `apns-expiration` is omitted when
/// no expiration is given. Non-ASCII characters in the payload are emitted as UTF-8.
pub fn encode<P: Serialize + ?Sized>(
    token: &str,
    payload: &P,
    topic: &str,
    priority: Priority,
    expiration: Option<u64>,
) -> Result<OutgoingRequest, Error> {
    let body = serde_json::to_vec(payload).map_err(Error::PayloadEncodeFailed)?;

    let mut headers = vec![(HEADER_TOPIC, topic.to_owned())];
    if priority != DEFAULT_PRIORITY {
        headers.push((HEADER_PRIORITY, priority.as_header_value().to_owned()));
    }
    if let Some(expiration) = expiration {
        headers.push((HEADER_EXPIRATION, expiration.to_string()));
    }

    Ok(OutgoingRequest {
        token: token.to_owned(),
        path: format!("/3/device/{}", token),
        headers,
        body: body.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn default_priority_without_expiration_sends_only_topic() {
        let request = encode(
            "0a1b",
            &json!({"aps": {"alert": "hi"}}),
            "com.example.app",
            Priority::Immediate,
            None,
        )
        .unwrap();
        assert_eq!(
            request.headers,
            vec![(HEADER_TOPIC, "com.example.app".to_owned())]
        );
        assert_eq!(request.path, "/3/device/0a1b");
        assert_eq!(request.token, "0a1b");
    }

    #[test]
    fn delayed_priority_with_expiration_sends_all_headers() {
        let request = encode(
            "0a1b",
            &json!({}),
            "com.example.app",
            Priority::Delayed,
            Some(100),
        )
        .unwrap();
        assert_eq!(request.headers.len(), 3);
        assert_eq!(request.header(HEADER_TOPIC), Some("com.example.app"));
        assert_eq!(request.header(HEADER_PRIORITY), Some("5"));
        assert_eq!(request.header(HEADER_EXPIRATION), Some("100"));
    }

    #[test]
    fn expiration_zero_is_still_sent() {
        let request = encode("t", &json!({}), "topic", Priority::Immediate, Some(0)).unwrap();
        assert_eq!(request.header(HEADER_EXPIRATION), Some("0"));
        assert_eq!(request.header(HEADER_PRIORITY), None);
    }

    #[test]
    fn body_is_compact_utf8_json() {
        let mut payload = BTreeMap::new();
        payload.insert("alert", "Grüße, 世界");
        payload.insert("sound", "default");
        let request = encode("t", &payload, "topic", Priority::Immediate, None).unwrap();
        assert_eq!(
            std::str::from_utf8(&request.body).unwrap(),
            r#"{"alert":"Grüße, 世界","sound":"default"}"#
        );
    }

    #[test]
    fn unserializable_payload_is_an_error() {
        let mut payload = BTreeMap::new();
        payload.insert(vec![1u8], "map keys must be strings");
        let err = encode("t", &payload, "topic", Priority::Immediate, None).unwrap_err();
        assert!(matches!(err, Error::PayloadEncodeFailed(_)));
    }
}

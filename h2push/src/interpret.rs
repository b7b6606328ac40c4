use serde::Deserialize;

use crate::notification::Outcome;
use crate::session::Response;
use crate::Error;

const STATUS_OK: u16 = 200;

#[derive(Deserialize)]
struct ErrorBody {
    reason: String,
}

/// Map a completed response to its outcome
///
/// Anything but `200 OK` carries a JSON body with a `reason`. A body that does not parse is a
/// protocol error rather than an outcome.
pub fn interpret(response: &Response) -> Result<Outcome, Error> {
    if response.status == STATUS_OK {
        return Ok(Outcome::Success);
    }
    let body: ErrorBody =
        serde_json::from_slice(&response.body).map_err(|source| Error::ResponseDecodeFailed {
            status: response.status,
            source,
        })?;
    Ok(Outcome::Failure(body.reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn response(status: u16, body: &'static str) -> Response {
        Response {
            status,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    #[test]
    fn ok_is_success() {
        assert_eq!(interpret(&response(200, "")).unwrap(), Outcome::Success);
    }

    #[test]
    fn reason_is_extracted() {
        let outcome =
            interpret(&response(410, r#"{"reason":"Unregistered","timestamp":1700000000}"#))
                .unwrap();
        assert_eq!(outcome, Outcome::Failure("Unregistered".to_owned()));

        let outcome = interpret(&response(400, r#"{"reason":"SomeFutureReason"}"#)).unwrap();
        assert_eq!(outcome.reason(), Some("SomeFutureReason"));
    }

    #[test]
    fn undecodable_body_is_an_error() {
        for body in ["", "not json", r#"{"status":"bad"}"#] {
            match interpret(&response(400, body)) {
                Err(Error::ResponseDecodeFailed { status, .. }) => assert_eq!(status, 400),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn non_utf8_body_is_an_error() {
        let r = Response {
            status: 500,
            body: Bytes::from_static(&[0xff, 0xfe, 0x7b]),
        };
        assert!(matches!(
            interpret(&r),
            Err(Error::ResponseDecodeFailed { status: 500, .. })
        ));
    }
}

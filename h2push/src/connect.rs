use tracing::{info, warn};

use crate::session::Session;
use crate::{Error, MAX_CONNECTION_RETRIES};

/// Make sure the session is connected, trying up to [`MAX_CONNECTION_RETRIES`] times
pub(crate) async fn ensure_connected<S: Session + ?Sized>(session: &mut S) -> Result<(), Error> {
    if session.is_connected() {
        return Ok(());
    }
    let mut attempts = 0;
    loop {
        attempts += 1;
        match session.connect().await {
            Ok(()) => {
                info!(attempts, "connected to gateway");
                return Ok(());
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "failed connecting to gateway (attempt {} of {})",
                    attempts,
                    MAX_CONNECTION_RETRIES
                );
                if attempts >= MAX_CONNECTION_RETRIES {
                    return Err(Error::ConnectionFailed {
                        attempts,
                        source: e,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSession;
    use crate::TransportError;

    #[tokio::test]
    async fn gives_up_after_three_attempts() {
        let mut session = MockSession::new();
        session.connect_failures = usize::MAX;
        match ensure_connected(&mut session).await {
            Err(Error::ConnectionFailed { attempts, source }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, TransportError::IoError(_)));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(session.connect_attempts, 3);
        assert!(!session.is_connected());
    }

    #[tokio::test]
    async fn retries_until_connected() {
        let mut session = MockSession::new();
        session.connect_failures = 2;
        ensure_connected(&mut session).await.unwrap();
        assert_eq!(session.connect_attempts, 3);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn connected_session_is_left_alone() {
        let mut session = MockSession::new();
        ensure_connected(&mut session).await.unwrap();
        ensure_connected(&mut session).await.unwrap();
        assert_eq!(session.connect_attempts, 1);
    }
}

//! Pipelining a batch of notifications over the streams of one session.

use serde::Serialize;
use tracing::{debug, info, trace};

use std::collections::{HashMap, VecDeque};

use crate::encode::encode;
use crate::interpret::interpret;
use crate::limit::ConcurrencyLimit;
use crate::notification::{Notification, Outcome, Priority};
use crate::session::Session;
use crate::Error;

/// A submitted stream whose response is yet to be consumed
struct PendingStream<H> {
    stream: H,
    token: String,
}

/// Send all notifications, keeping as many streams open as the peer currently allows
///
/// The peer's limit is re-read on every step. While under the limit the next notification is
/// submitted; otherwise the oldest open stream is drained. Streams are always drained in
/// submission order, so a slow response holds up the collection of later ones. A limit lowered
/// below the number of open streams only stops admission until enough streams have drained.
///
/// Any failure aborts the whole batch.
pub(crate) async fn dispatch_batch<S, P, I>(
    session: &mut S,
    limit: &mut ConcurrencyLimit,
    notifications: I,
    topic: &str,
    priority: Priority,
    expiration: Option<u64>,
) -> Result<HashMap<String, Outcome>, Error>
where
    S: Session + ?Sized,
    P: Serialize,
    I: IntoIterator<Item = Notification<P>>,
{
    let mut notifications = notifications.into_iter();
    let mut next_notification = notifications.next();
    let mut open_streams: VecDeque<PendingStream<S::Stream>> = VecDeque::new();
    let mut results = HashMap::new();

    while !open_streams.is_empty() || next_notification.is_some() {
        // SETTINGS may arrive at any time
        if limit.refresh(session) {
            debug!(
                limit = limit.current(),
                open = open_streams.len(),
                "concurrency limit changed"
            );
        }

        match next_notification.take() {
            Some(notification) if open_streams.len() < limit.current() => {
                debug!(token = %notification.token, "sending notification");
                let request = encode(
                    &notification.token,
                    &notification.payload,
                    topic,
                    priority,
                    expiration,
                )?;
                let stream = session.submit(request).await?;
                open_streams.push_back(PendingStream {
                    stream,
                    token: notification.token,
                });

                next_notification = notifications.next();
                if next_notification.is_none() {
                    info!(
                        pending = open_streams.len(),
                        "finished sending all notifications, waiting for pending responses"
                    );
                }
            }
            blocked => {
                next_notification = blocked;
                let pending = open_streams
                    .pop_front()
                    .expect("open stream present when admission is blocked");
                trace!(token = %pending.token, "waiting for oldest open stream");
                let response = session.await_response(pending.stream).await?;
                let outcome = interpret(&response)?;
                debug!(token = %pending.token, %outcome, "got response");
                results.insert(pending.token, outcome);
            }
        }
    }

    Ok(results)
}

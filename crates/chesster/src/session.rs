//! Per-connection sessions and their transport pumps.
//!
//! A [`Session`] is created when a websocket upgrade is accepted and
//! lives until the transport dies. Its outbound path is a bounded
//! queue behind an [`Outbox`]: sends never block (a full queue means
//! the session is evicted) and closing is idempotent, so every
//! shutdown path can call [`Outbox::close`] without coordination.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::hub::HubHandle;
use crate::message::{self, ClientFrame};
use crate::room::RoomEvent;
use crate::types::{Identity, UserId};

/// Why an outbound send did not happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutboxError {
    /// The outbox has been closed.
    Closed,
    /// The queue is full; the session should be evicted.
    Full,
}

/// The sending half of a session's bounded outbound queue.
///
/// Cloneable; all clones share the close tombstone.
#[derive(Debug, Clone)]
pub struct Outbox {
    tx: mpsc::Sender<String>,
    closed: CancellationToken,
}

impl Outbox {
    /// Create an outbox and the receiver its writer pump drains.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(capacity);
        (
            Self {
                tx,
                closed: CancellationToken::new(),
            },
            rx,
        )
    }

    /// Enqueue a frame without ever blocking.
    pub fn send(&self, frame: String) -> Result<(), OutboxError> {
        if self.closed.is_cancelled() {
            return Err(OutboxError::Closed);
        }
        self.tx.try_send(frame).map_err(|err| match err {
            mpsc::error::TrySendError::Full(_) => OutboxError::Full,
            mpsc::error::TrySendError::Closed(_) => OutboxError::Closed,
        })
    }

    /// Close the outbox. Safe to call any number of times from any
    /// task; the first call wins and the rest are no-ops.
    pub fn close(&self) {
        self.closed.cancel();
    }

    /// Whether the outbox has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.is_cancelled()
    }

    /// The close tombstone, for the writer pump to select on.
    #[must_use]
    pub fn closed_token(&self) -> &CancellationToken {
        &self.closed
    }
}

/// One live client connection.
#[derive(Debug)]
pub struct Session {
    /// Unique per connection; a user reconnecting gets a fresh one.
    pub id: Uuid,
    /// The authenticated account.
    pub user_id: UserId,
    /// The account's rating at connect time.
    pub rating: i32,
    /// The room id from the connection path, or `ranked`.
    pub requested_room: String,
    /// The outbound frame queue.
    pub outbox: Outbox,
}

/// Shared handle to a session. Rooms and the queue hold these; the
/// session's tasks drop theirs when the transport dies, and the hub's
/// room map entry is the last owner to go.
pub type SessionRef = Arc<Session>;

impl Session {
    /// Create a session and the receiving end of its outbox.
    #[must_use]
    pub fn create(
        identity: Identity,
        requested_room: &str,
        outbox_capacity: usize,
    ) -> (SessionRef, mpsc::Receiver<String>) {
        let (outbox, rx) = Outbox::channel(outbox_capacity);
        let session = Arc::new(Self {
            id: Uuid::new_v4(),
            user_id: identity.user_id,
            rating: identity.rating,
            requested_room: requested_room.to_string(),
            outbox,
        });
        (session, rx)
    }

    /// Encode and enqueue an outbound frame.
    pub fn send(&self, action: &str, payload: &impl Serialize) -> Result<(), OutboxError> {
        self.outbox.send(message::encode(action, payload))
    }
}

/// Accept an upgraded socket: build the session, register it with the
/// hub, pump frames both ways, and unregister exactly once at the end.
pub(crate) async fn connect(
    socket: WebSocket,
    identity: Identity,
    room_id: String,
    hub: HubHandle,
    config: Arc<ServerConfig>,
) {
    let (session, frames) = Session::create(identity, &room_id, config.outbox_capacity);
    tracing::info!(
        session_id = %session.id,
        user_id = %session.user_id,
        room_id = %room_id,
        "session connected"
    );

    let room = hub.register(session.clone()).await;

    let (sink, stream) = socket.split();
    let mut writer = tokio::spawn(write_pump(
        sink,
        frames,
        session.outbox.clone(),
        config.clone(),
    ));
    let mut reader = tokio::spawn(read_pump(stream, session.clone(), room, config));

    // Whichever pump dies first takes the session down with it.
    tokio::select! {
        _ = &mut writer => {}
        _ = &mut reader => {}
    }
    session.outbox.close();
    writer.abort();
    reader.abort();

    hub.unregister(session.clone()).await;
    tracing::info!(session_id = %session.id, "session disconnected");
}

/// Drain the outbox to the socket, pinging periodically. Exits when
/// the outbox closes, the channel drains dry, or a write fails.
async fn write_pump(
    mut sink: SplitSink<WebSocket, Message>,
    mut frames: mpsc::Receiver<String>,
    outbox: Outbox,
    config: Arc<ServerConfig>,
) {
    let mut ping = tokio::time::interval(config.ping_interval);
    ping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // The first interval tick fires immediately; swallow it.
    ping.tick().await;

    loop {
        tokio::select! {
            () = outbox.closed_token().cancelled() => {
                // Flush anything already queued, then say goodbye.
                while let Ok(frame) = frames.try_recv() {
                    if send_with_deadline(&mut sink, Message::Text(frame.into()), &config)
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                let _ = sink.send(Message::Close(None)).await;
                return;
            }
            frame = frames.recv() => {
                let Some(frame) = frame else { return };
                if send_with_deadline(&mut sink, Message::Text(frame.into()), &config)
                    .await
                    .is_err()
                {
                    return;
                }
            }
            _ = ping.tick() => {
                if send_with_deadline(&mut sink, Message::Ping(Vec::new().into()), &config)
                    .await
                    .is_err()
                {
                    return;
                }
            }
        }
    }
}

async fn send_with_deadline(
    sink: &mut SplitSink<WebSocket, Message>,
    message: Message,
    config: &ServerConfig,
) -> Result<(), ()> {
    match tokio::time::timeout(config.write_timeout, sink.send(message)).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => {
            tracing::debug!(%err, "websocket write failed");
            Err(())
        }
        Err(_) => {
            tracing::warn!("websocket write deadline exceeded");
            Err(())
        }
    }
}

/// Forward inbound frames to the owning room. Malformed frames are
/// logged and dropped; silence past the pong deadline kills the
/// connection.
async fn read_pump(
    mut stream: SplitStream<WebSocket>,
    session: SessionRef,
    room: Option<mpsc::Sender<RoomEvent>>,
    config: Arc<ServerConfig>,
) {
    loop {
        let next = match tokio::time::timeout(config.pong_timeout, stream.next()).await {
            Ok(next) => next,
            Err(_) => {
                tracing::warn!(session_id = %session.id, "pong deadline exceeded");
                return;
            }
        };
        let message = match next {
            Some(Ok(message)) => message,
            Some(Err(err)) => {
                tracing::debug!(session_id = %session.id, %err, "websocket read failed");
                return;
            }
            None => return,
        };

        match message {
            Message::Text(text) => {
                if text.len() > config.max_frame_bytes {
                    tracing::warn!(
                        session_id = %session.id,
                        bytes = text.len(),
                        "dropping oversized frame"
                    );
                    continue;
                }
                let frame: ClientFrame = match serde_json::from_str(text.as_str()) {
                    Ok(frame) => frame,
                    Err(err) => {
                        tracing::warn!(session_id = %session.id, %err, "dropping malformed frame");
                        continue;
                    }
                };
                match &room {
                    Some(room) => {
                        let event = RoomEvent::Message {
                            session: session.clone(),
                            frame,
                        };
                        if room.send(event).await.is_err() {
                            // Room loop is gone; nothing left to talk to.
                            return;
                        }
                    }
                    None => {
                        // Queue-bound sessions have no room to act on
                        // game messages.
                        tracing::debug!(
                            session_id = %session.id,
                            action = %frame.action,
                            "dropping frame from queue-bound session"
                        );
                    }
                }
            }
            Message::Close(_) => return,
            // The transport layer answers pings; pongs only matter as
            // traffic for the deadline above.
            Message::Ping(_) | Message::Pong(_) | Message::Binary(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outbox_send_and_drain() {
        let (outbox, mut rx) = Outbox::channel(4);
        outbox.send("one".to_string()).unwrap();
        outbox.send("two".to_string()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), "one");
        assert_eq!(rx.try_recv().unwrap(), "two");
    }

    #[test]
    fn full_outbox_reports_eviction() {
        let (outbox, _rx) = Outbox::channel(1);
        outbox.send("one".to_string()).unwrap();
        assert_eq!(outbox.send("two".to_string()), Err(OutboxError::Full));
    }

    #[test]
    fn close_is_idempotent_and_sticky() {
        let (outbox, _rx) = Outbox::channel(4);
        assert!(!outbox.is_closed());
        outbox.close();
        outbox.close();
        assert!(outbox.is_closed());
        assert_eq!(outbox.send("late".to_string()), Err(OutboxError::Closed));
    }

    #[test]
    fn clones_share_the_tombstone() {
        let (outbox, _rx) = Outbox::channel(4);
        let other = outbox.clone();
        other.close();
        assert!(outbox.is_closed());
    }

    #[test]
    fn session_create_carries_identity() {
        let identity = Identity::new(UserId::new(5)).with_rating(1340);
        let (session, mut rx) = Session::create(identity, "ranked", 8);
        assert_eq!(session.user_id, UserId::new(5));
        assert_eq!(session.rating, 1340);
        assert_eq!(session.requested_room, "ranked");

        session
            .send(
                "error",
                &crate::message::ErrorPayload {
                    message: "hello".to_string(),
                },
            )
            .unwrap();
        let frame = rx.try_recv().unwrap();
        assert!(frame.contains("\"action\":\"error\""));
    }
}

//! The hub: owner of the room directory.
//!
//! One event loop owns `rooms` outright. Session registration, ranked
//! room installation, and room deletion all arrive as commands on the
//! hub mailbox, so the map is never touched from two tasks; the ranked
//! queue installs its rooms by message rather than by reaching in.
//! Channel ordering also guarantees a `match_found` client can never
//! observe a missing room: the install command is enqueued before the
//! client can possibly reconnect and register.
//!
//! The hub performs no game logic and never touches a position.

use std::collections::HashMap;
use std::sync::Arc;

use chesster_engine::Color;
use tokio::sync::{mpsc, oneshot};

use crate::config::ServerConfig;
use crate::queue::RankedQueue;
use crate::rating::RatingStore;
use crate::room::{Room, RoomEvent};
use crate::session::SessionRef;
use crate::types::UserId;

/// The requested-room id that routes a session to matchmaking instead
/// of a room.
pub const RANKED_ROOM_ID: &str = "ranked";

/// A command for the hub loop.
pub enum HubCommand {
    /// Route a new session to its room or to the ranked queue. The
    /// reply carries the owning room's mailbox for the session's
    /// reader, or `None` for queue-bound sessions.
    Register {
        /// The connecting session.
        session: SessionRef,
        /// Completed once routing is done.
        reply: oneshot::Sender<Option<mpsc::Sender<RoomEvent>>>,
    },
    /// A session's transport died; route the departure.
    Unregister {
        /// The departing session.
        session: SessionRef,
    },
    /// Install a matchmaking-created room with pre-bound colors.
    InstallRankedRoom {
        /// The fresh 8-hex room id.
        room_id: String,
        /// user id to assigned color, both players.
        pending: HashMap<UserId, Color>,
    },
    /// Drop a room from the directory. Sent by the room's own loop as
    /// it exits.
    DeleteRoom {
        /// The room being deleted.
        room_id: String,
    },
}

/// Cloneable sending side of the hub mailbox.
#[derive(Debug, Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<HubCommand>,
}

impl HubHandle {
    /// Register a session; returns the owning room's mailbox for
    /// non-ranked sessions.
    pub async fn register(&self, session: SessionRef) -> Option<mpsc::Sender<RoomEvent>> {
        let (reply, response) = oneshot::channel();
        if self
            .tx
            .send(HubCommand::Register { session, reply })
            .await
            .is_err()
        {
            return None;
        }
        response.await.ok().flatten()
    }

    /// Unregister a session.
    pub async fn unregister(&self, session: SessionRef) {
        let _ = self.tx.send(HubCommand::Unregister { session }).await;
    }

    /// Install a ranked room created by the matchmaking queue.
    pub async fn install_ranked_room(&self, room_id: String, pending: HashMap<UserId, Color>) {
        let _ = self
            .tx
            .send(HubCommand::InstallRankedRoom { room_id, pending })
            .await;
    }

    /// Remove a room from the directory.
    pub async fn delete_room(&self, room_id: &str) {
        let _ = self
            .tx
            .send(HubCommand::DeleteRoom {
                room_id: room_id.to_string(),
            })
            .await;
    }
}

/// The hub loop state.
pub struct Hub {
    rooms: HashMap<String, mpsc::Sender<RoomEvent>>,
    rx: mpsc::Receiver<HubCommand>,
    queue: Arc<RankedQueue>,
    store: Arc<dyn RatingStore>,
    config: Arc<ServerConfig>,
    handle: HubHandle,
}

impl Hub {
    /// Spawn the hub loop and the ranked queue's pairing loop.
    pub fn spawn(
        config: Arc<ServerConfig>,
        store: Arc<dyn RatingStore>,
    ) -> (HubHandle, Arc<RankedQueue>) {
        let (tx, rx) = mpsc::channel(config.hub_mailbox_capacity);
        let handle = HubHandle { tx };
        let queue = Arc::new(RankedQueue::new(handle.clone(), config.clone()));
        tokio::spawn(Arc::clone(&queue).run());

        let hub = Self {
            rooms: HashMap::new(),
            rx,
            queue: Arc::clone(&queue),
            store,
            config,
            handle: handle.clone(),
        };
        tokio::spawn(hub.run());
        (handle, queue)
    }

    async fn run(mut self) {
        while let Some(command) = self.rx.recv().await {
            match command {
                HubCommand::Register { session, reply } => {
                    let room = self.register(session);
                    let _ = reply.send(room);
                }
                HubCommand::Unregister { session } => self.unregister(session),
                HubCommand::InstallRankedRoom { room_id, pending } => {
                    self.install_ranked_room(room_id, pending);
                }
                HubCommand::DeleteRoom { room_id } => {
                    if self.rooms.remove(&room_id).is_some() {
                        tracing::info!(room_id = %room_id, "room deleted");
                    }
                }
            }
        }
    }

    fn register(&mut self, session: SessionRef) -> Option<mpsc::Sender<RoomEvent>> {
        if session.requested_room == RANKED_ROOM_ID {
            tracing::info!(user_id = %session.user_id, "session joins the ranked queue");
            self.queue.add(session);
            return None;
        }

        let room_id = session.requested_room.clone();
        let room = self
            .rooms
            .entry(room_id.clone())
            .or_insert_with(|| {
                tracing::info!(room_id = %room_id, "creating unranked room");
                Room::spawn_unranked(
                    room_id.clone(),
                    self.handle.clone(),
                    Arc::clone(&self.store),
                    &self.config,
                )
            })
            .clone();

        // try_send keeps the hub loop unblockable; a room mailbox this
        // backed up is as good as gone.
        if room
            .try_send(RoomEvent::Register(session.clone()))
            .is_err()
        {
            tracing::warn!(room_id = %room_id, "room mailbox unavailable, dropping session");
            session.outbox.close();
            return None;
        }
        Some(room)
    }

    fn unregister(&mut self, session: SessionRef) {
        if session.requested_room == RANKED_ROOM_ID {
            self.queue.remove(&session);
            return;
        }
        if let Some(room) = self.rooms.get(&session.requested_room) {
            if room.try_send(RoomEvent::Unregister(session)).is_err() {
                tracing::debug!("room mailbox gone during unregister");
            }
        }
    }

    fn install_ranked_room(&mut self, room_id: String, pending: HashMap<UserId, Color>) {
        if self.rooms.contains_key(&room_id) {
            // Astronomically unlikely with 4 random bytes, but the id
            // must stay unique; refuse rather than clobber.
            tracing::warn!(room_id = %room_id, "ranked room id collision, dropping install");
            return;
        }
        tracing::info!(room_id = %room_id, "installing ranked room");
        let room = Room::spawn_ranked(
            room_id.clone(),
            pending,
            self.handle.clone(),
            Arc::clone(&self.store),
            &self.config,
        );
        self.rooms.insert(room_id, room);
    }
}

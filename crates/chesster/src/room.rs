//! The per-game room state machine.
//!
//! Every room runs one event loop that owns all of its state: the
//! lobby bookkeeping, the game position, and the member roster. Inputs
//! arrive on a single mailbox (registration, unregistration, client
//! frames), so transitions are totally ordered and no lock is ever
//! taken. Outbound traffic goes through each member's outbox with
//! `try_send`; a full outbox evicts that member rather than stall the
//! loop.

use std::collections::HashMap;
use std::sync::Arc;

use chesster_engine::{Color, GameStatus, Position};
use rand::Rng;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::hub::HubHandle;
use crate::message::{
    AssignColorPayload, ClientFrame, ColorChoice, ErrorPayload, GameStatePayload,
    LobbyStatePayload, MovePayload, PlayerAssignedPayload,
};
use crate::rating::RatingStore;
use crate::session::SessionRef;
use crate::types::UserId;

/// Rating change for winning a ranked game by checkmate.
pub const WIN_RATING_DELTA: i32 = 100;
/// Rating change for losing a ranked game by checkmate.
pub const LOSS_RATING_DELTA: i32 = -50;

/// Whether a room was created by a host or by the matchmaking queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomKind {
    /// Host-created; lobby flow applies and ratings never change.
    Unranked,
    /// Matchmaking-created; colors are pre-bound and checkmate moves
    /// ratings.
    Ranked,
}

impl RoomKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Unranked => "unranked",
            Self::Ranked => "ranked",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    InProgress,
    Finished,
}

impl Phase {
    fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }
}

/// An input to a room's event loop.
#[derive(Debug)]
pub enum RoomEvent {
    /// A session joins the room.
    Register(SessionRef),
    /// A session leaves the room (disconnect or eviction).
    Unregister(SessionRef),
    /// A client frame from a registered session.
    Message {
        /// The sender.
        session: SessionRef,
        /// The decoded envelope.
        frame: ClientFrame,
    },
}

struct Member {
    session: SessionRef,
    color: Option<Color>,
    ready: bool,
}

/// One game room. Constructed by [`Room::spawn_unranked`] or
/// [`Room::spawn_ranked`], which hand back the mailbox sender and run
/// the loop on its own task.
pub struct Room {
    id: String,
    kind: RoomKind,
    phase: Phase,
    game: Position,
    host: Option<Uuid>,
    members: HashMap<Uuid, Member>,
    /// Player seats in arrival order; the host is first for unranked.
    players: Vec<Uuid>,
    /// Queue-assigned colors awaiting their session, ranked only.
    pending_ranked: HashMap<UserId, Color>,
    hub: HubHandle,
    store: Arc<dyn RatingStore>,
    rx: mpsc::Receiver<RoomEvent>,
    done: bool,
}

impl Room {
    /// Spawn an unranked room loop and return its mailbox.
    pub fn spawn_unranked(
        id: String,
        hub: HubHandle,
        store: Arc<dyn RatingStore>,
        config: &ServerConfig,
    ) -> mpsc::Sender<RoomEvent> {
        Self::spawn(id, RoomKind::Unranked, HashMap::new(), hub, store, config)
    }

    /// Spawn a ranked room loop with queue-assigned colors.
    pub fn spawn_ranked(
        id: String,
        pending: HashMap<UserId, Color>,
        hub: HubHandle,
        store: Arc<dyn RatingStore>,
        config: &ServerConfig,
    ) -> mpsc::Sender<RoomEvent> {
        Self::spawn(id, RoomKind::Ranked, pending, hub, store, config)
    }

    fn spawn(
        id: String,
        kind: RoomKind,
        pending_ranked: HashMap<UserId, Color>,
        hub: HubHandle,
        store: Arc<dyn RatingStore>,
        config: &ServerConfig,
    ) -> mpsc::Sender<RoomEvent> {
        let (tx, rx) = mpsc::channel(config.room_mailbox_capacity);
        let room = Self {
            id,
            kind,
            phase: Phase::Waiting,
            game: Position::new_game(),
            host: None,
            members: HashMap::new(),
            players: Vec::new(),
            pending_ranked,
            hub,
            store,
            rx,
            done: false,
        };
        tokio::spawn(room.run());
        tx
    }

    async fn run(mut self) {
        while let Some(event) = self.rx.recv().await {
            match event {
                RoomEvent::Register(session) => {
                    let evicted = self.on_register(session);
                    self.reap(evicted);
                }
                RoomEvent::Unregister(session) => {
                    let evicted = self.unregister(session);
                    self.reap(evicted);
                }
                RoomEvent::Message { session, frame } => {
                    let (evicted, terminal) = self.on_frame(&session, frame);
                    self.reap(evicted);
                    if let Some(status) = terminal {
                        self.finish(status).await;
                    }
                }
            }
            if self.done {
                break;
            }
        }
        self.hub.delete_room(&self.id).await;
        tracing::info!(room_id = %self.id, "room closed");
    }

    /// Process evictions from failed broadcasts, including any new
    /// evictions those unregistrations cause in turn.
    fn reap(&mut self, mut evicted: Vec<SessionRef>) {
        while let Some(session) = evicted.pop() {
            tracing::warn!(
                room_id = %self.id,
                session_id = %session.id,
                "evicting session with a full or closed outbox"
            );
            evicted.extend(self.unregister(session));
        }
    }

    // --- Registration ---

    fn on_register(&mut self, session: SessionRef) -> Vec<SessionRef> {
        match self.kind {
            RoomKind::Unranked => self.register_unranked(session),
            RoomKind::Ranked => self.register_ranked(session),
        }
    }

    fn register_unranked(&mut self, session: SessionRef) -> Vec<SessionRef> {
        let id = session.id;
        if self.host.is_none() {
            self.host = Some(id);
        }
        if self.players.len() < 2 {
            self.players.push(id);
        }
        self.members.insert(
            id,
            Member {
                session,
                color: None,
                ready: false,
            },
        );
        tracing::info!(
            room_id = %self.id,
            players = self.players.len(),
            spectators = self.members.len() - self.players.len(),
            "session registered"
        );
        self.broadcast_lobby()
    }

    fn register_ranked(&mut self, session: SessionRef) -> Vec<SessionRef> {
        let Some(color) = self.pending_ranked.remove(&session.user_id) else {
            tracing::warn!(
                room_id = %self.id,
                user_id = %session.user_id,
                "rejecting session not bound to this ranked game"
            );
            self.send_error(&session, "You are not a participant in this game.");
            session.outbox.close();
            return Vec::new();
        };

        let id = session.id;
        self.players.push(id);
        self.members.insert(
            id,
            Member {
                session,
                color: Some(color),
                ready: true,
            },
        );
        tracing::info!(room_id = %self.id, color = %color, "ranked player bound");

        if self.pending_ranked.is_empty() && self.players.len() == 2 {
            self.phase = Phase::InProgress;
            self.send_player_assignments();
            return self.broadcast_game_state(GameStatus::InProgress);
        }
        Vec::new()
    }

    // --- Unregistration and abandonment ---

    fn unregister(&mut self, session: SessionRef) -> Vec<SessionRef> {
        let id = session.id;
        if self.members.remove(&id).is_none() {
            // Already gone: a duplicate disconnect or an eviction that
            // raced the transport teardown.
            return Vec::new();
        }
        let was_host = self.host == Some(id);
        let was_player = self.players.contains(&id);
        self.players.retain(|p| *p != id);
        session.outbox.close();

        match self.kind {
            RoomKind::Ranked => {
                tracing::info!(room_id = %self.id, user_id = %session.user_id, "ranked player left");
                self.abandon("Your opponent has disconnected. The game has ended.")
            }
            RoomKind::Unranked if was_host => {
                tracing::info!(room_id = %self.id, "host left, closing room");
                self.abandon("The host has disconnected. The game has ended.")
            }
            RoomKind::Unranked if self.phase == Phase::InProgress && was_player => {
                tracing::info!(room_id = %self.id, "player left mid-game, closing room");
                self.abandon("Your opponent has disconnected. The game has ended.")
            }
            RoomKind::Unranked => {
                if self.members.is_empty() {
                    self.done = true;
                    return Vec::new();
                }
                if self.phase == Phase::Waiting {
                    return self.broadcast_lobby();
                }
                Vec::new()
            }
        }
    }

    /// Tell everyone the game is over out-of-band and tear the room
    /// down. Disconnect forfeits never move ratings.
    fn abandon(&mut self, reason: &str) -> Vec<SessionRef> {
        for member in self.members.values() {
            let _ = member.session.send(
                "error",
                &ErrorPayload {
                    message: reason.to_string(),
                },
            );
            member.session.outbox.close();
        }
        self.phase = Phase::Finished;
        self.done = true;
        Vec::new()
    }

    // --- Client frames ---

    fn on_frame(
        &mut self,
        session: &SessionRef,
        frame: ClientFrame,
    ) -> (Vec<SessionRef>, Option<GameStatus>) {
        if !self.members.contains_key(&session.id) {
            tracing::debug!(room_id = %self.id, "frame from unregistered session");
            return (Vec::new(), None);
        }

        match self.phase {
            Phase::Waiting => {
                if self.kind == RoomKind::Ranked {
                    tracing::debug!(
                        room_id = %self.id,
                        action = %frame.action,
                        "ranked rooms take no lobby actions"
                    );
                    return (Vec::new(), None);
                }
                let evicted = match frame.action.as_str() {
                    "assign_color" => self.handle_assign_color(session, frame.payload),
                    "player_ready" => self.handle_player_ready(session),
                    "start_game" => self.handle_start_game(session),
                    other => {
                        tracing::debug!(
                            room_id = %self.id,
                            action = %other,
                            "action not allowed while waiting"
                        );
                        Vec::new()
                    }
                };
                (evicted, None)
            }
            Phase::InProgress => match frame.action.as_str() {
                "move" => self.handle_move(session, frame.payload),
                other => {
                    tracing::debug!(
                        room_id = %self.id,
                        action = %other,
                        "action not allowed while in progress"
                    );
                    (Vec::new(), None)
                }
            },
            Phase::Finished => (Vec::new(), None),
        }
    }

    fn handle_assign_color(
        &mut self,
        sender: &SessionRef,
        payload: serde_json::Value,
    ) -> Vec<SessionRef> {
        if self.host != Some(sender.id) {
            self.send_error(sender, "Only the host can assign colors.");
            return Vec::new();
        }
        let Ok(payload) = serde_json::from_value::<AssignColorPayload>(payload) else {
            self.send_error(sender, "Invalid color selection.");
            return Vec::new();
        };

        let host_color = match payload.color {
            ColorChoice::White => Color::White,
            ColorChoice::Black => Color::Black,
            ColorChoice::Random => {
                if rand::thread_rng().gen_bool(0.5) {
                    Color::White
                } else {
                    Color::Black
                }
            }
        };

        let guest = self.guest_id();
        for (id, member) in &mut self.members {
            if Some(*id) == self.host {
                member.color = Some(host_color);
            } else if Some(*id) == guest {
                member.color = Some(host_color.opposite());
            }
        }
        tracing::info!(room_id = %self.id, host_color = %host_color, "colors assigned");
        self.broadcast_lobby()
    }

    fn handle_player_ready(&mut self, sender: &SessionRef) -> Vec<SessionRef> {
        if let Some(member) = self.members.get_mut(&sender.id) {
            member.ready = !member.ready;
        }
        self.broadcast_lobby()
    }

    fn handle_start_game(&mut self, sender: &SessionRef) -> Vec<SessionRef> {
        if self.host != Some(sender.id) {
            self.send_error(sender, "Only the host can start the game.");
            return Vec::new();
        }
        let Some(guest) = self.guest_id() else {
            self.send_error(sender, "Two players are required to start.");
            return Vec::new();
        };
        if !self.members.get(&guest).is_some_and(|m| m.ready) {
            self.send_error(sender, "Guest must be ready.");
            return Vec::new();
        }
        let colors_assigned = self
            .players
            .iter()
            .all(|id| self.members.get(id).is_some_and(|m| m.color.is_some()));
        if !colors_assigned {
            self.send_error(sender, "The host must select a color first.");
            return Vec::new();
        }

        self.phase = Phase::InProgress;
        tracing::info!(room_id = %self.id, "game started");
        self.send_player_assignments();
        self.broadcast_game_state(GameStatus::InProgress)
    }

    fn handle_move(
        &mut self,
        sender: &SessionRef,
        payload: serde_json::Value,
    ) -> (Vec<SessionRef>, Option<GameStatus>) {
        let Some(color) = self.members.get(&sender.id).and_then(|m| m.color) else {
            self.send_error(sender, "Spectators cannot make moves.");
            return (Vec::new(), None);
        };
        if color != self.game.turn {
            self.send_error(sender, "It's not your turn.");
            return (Vec::new(), None);
        }
        let Ok(payload) = serde_json::from_value::<MovePayload>(payload) else {
            self.send_error(sender, "Invalid move payload.");
            return (Vec::new(), None);
        };

        let m = match self.game.parse_uci(&payload.as_uci()) {
            Ok(m) => m,
            Err(err) => {
                self.send_error(sender, &format!("Invalid move: {err}"));
                return (Vec::new(), None);
            }
        };

        self.game = self.game.apply_move(m);
        let status = self.game.status();
        tracing::debug!(room_id = %self.id, mv = %m, status = %status, "move applied");

        if status.is_terminal() {
            // Terminal handling broadcasts and closes; run() drives it
            // so rating persistence can await.
            (Vec::new(), Some(status))
        } else {
            (self.broadcast_game_state(status), None)
        }
    }

    // --- Terminal processing ---

    async fn finish(&mut self, status: GameStatus) {
        self.phase = Phase::Finished;
        self.done = true;
        tracing::info!(room_id = %self.id, status = %status, "game finished");

        // Terminal broadcast first; persistence strictly after.
        let _ = self.broadcast_game_state(status);

        if self.kind == RoomKind::Ranked && status == GameStatus::Checkmate {
            // The mated side is the one left to move.
            let loser_color = self.game.turn;
            self.persist_delta(loser_color.opposite(), WIN_RATING_DELTA).await;
            self.persist_delta(loser_color, LOSS_RATING_DELTA).await;
        }

        for member in self.members.values() {
            member.session.outbox.close();
        }
    }

    async fn persist_delta(&self, color: Color, delta: i32) {
        let Some(member) = self
            .members
            .values()
            .find(|member| member.color == Some(color))
        else {
            return;
        };
        let user_id = member.session.user_id;
        let new_rating = member.session.rating + delta;
        match self.store.persist_rating(user_id, new_rating).await {
            Ok(()) => {
                tracing::info!(
                    room_id = %self.id,
                    user_id = %user_id,
                    new_rating,
                    "rating persisted"
                );
            }
            Err(err) => {
                // The in-memory rating stands; no retry.
                tracing::error!(
                    room_id = %self.id,
                    user_id = %user_id,
                    new_rating,
                    %err,
                    "failed to persist rating"
                );
            }
        }
    }

    // --- Broadcasts ---

    fn guest_id(&self) -> Option<Uuid> {
        self.players.iter().copied().find(|id| Some(*id) != self.host)
    }

    fn send_error(&self, session: &SessionRef, message: &str) {
        let _ = session.send(
            "error",
            &ErrorPayload {
                message: message.to_string(),
            },
        );
    }

    fn send_player_assignments(&self) {
        for id in &self.players {
            let Some(member) = self.members.get(id) else {
                continue;
            };
            let Some(color) = member.color else { continue };
            let _ = member.session.send(
                "player_assigned",
                &PlayerAssignedPayload {
                    color: color.to_string(),
                },
            );
        }
    }

    /// Lobby state is per-recipient because of the `is_host` flag.
    fn broadcast_lobby(&mut self) -> Vec<SessionRef> {
        let host_ready = self
            .host
            .and_then(|id| self.members.get(&id))
            .is_some_and(|m| m.ready);
        let guest = self.guest_id();
        let guest_ready = guest
            .and_then(|id| self.members.get(&id))
            .is_some_and(|m| m.ready);
        let host_color = self
            .host
            .and_then(|id| self.members.get(&id))
            .and_then(|m| m.color)
            .map(|c| c.to_string())
            .unwrap_or_default();

        let mut evicted = Vec::new();
        for (id, member) in &self.members {
            let payload = LobbyStatePayload {
                host_ready,
                guest_ready,
                host_color: host_color.clone(),
                is_host: self.host == Some(*id),
                game_state: self.phase.as_str().to_string(),
                player_count: self.players.len(),
                game_type: self.kind.as_str().to_string(),
            };
            if member.session.send("lobby_state", &payload).is_err() {
                evicted.push(member.session.clone());
            }
        }
        evicted
    }

    fn broadcast_game_state(&mut self, status: GameStatus) -> Vec<SessionRef> {
        let frame = crate::message::encode(
            "game_state",
            &GameStatePayload {
                fen: self.game.fen(),
                game_status: status.as_str().to_string(),
            },
        );
        let mut evicted = Vec::new();
        for member in self.members.values() {
            if member.session.outbox.send(frame.clone()).is_err() {
                evicted.push(member.session.clone());
            }
        }
        evicted
    }
}

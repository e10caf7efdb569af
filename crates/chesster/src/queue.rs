//! The ranked matchmaking queue.
//!
//! Sessions that connect to the `ranked` pseudo-room park here. A
//! background loop scans the queue every tick and greedily pairs
//! players whose ratings sit within the configured window; each pair
//! gets a fresh room installed through the hub and a `match_found`
//! frame telling both players where to reconnect.
//!
//! The entry map is the one piece of state crossed by outside tasks
//! (the hub loop adds and removes entries), so it sits behind a mutex;
//! the pairing pass snapshots and removes under the lock and does all
//! channel work after dropping it.

use std::collections::HashMap;
use std::sync::Arc;

use chesster_engine::Color;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rand::Rng;

use crate::config::ServerConfig;
use crate::hub::HubHandle;
use crate::message::{MatchFoundPayload, QueueStatusPayload};
use crate::session::SessionRef;
use crate::types::{fresh_room_id, UserId};

/// A player waiting for a ranked match.
#[derive(Debug, Clone)]
pub struct QueueEntry {
    /// The parked session.
    pub session: SessionRef,
    /// Rating at enqueue time.
    pub rating: i32,
    /// When the player joined the queue.
    pub joined_at: DateTime<Utc>,
    /// Cleared once a pairing pass claims the entry.
    pub searching: bool,
}

/// The ranked queue. Shared between the hub loop (add/remove) and its
/// own pairing loop.
pub struct RankedQueue {
    entries: Mutex<HashMap<UserId, QueueEntry>>,
    hub: HubHandle,
    config: Arc<ServerConfig>,
}

impl RankedQueue {
    /// Create a queue bound to a hub.
    #[must_use]
    pub fn new(hub: HubHandle, config: Arc<ServerConfig>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            hub,
            config,
        }
    }

    /// Park a session in the queue. Duplicate user ids are ignored.
    pub fn add(&self, session: SessionRef) {
        {
            let mut entries = self.entries.lock();
            if entries.contains_key(&session.user_id) {
                tracing::debug!(user_id = %session.user_id, "already in the ranked queue");
                return;
            }
            entries.insert(
                session.user_id,
                QueueEntry {
                    session: session.clone(),
                    rating: session.rating,
                    joined_at: Utc::now(),
                    searching: true,
                },
            );
            tracing::info!(
                user_id = %session.user_id,
                rating = session.rating,
                queue_size = entries.len(),
                "joined the ranked queue"
            );
        }
        let _ = session.send(
            "queue_status",
            &QueueStatusPayload {
                status: "joined_queue".to_string(),
                message: "Waiting for opponent...".to_string(),
            },
        );
    }

    /// Remove a session from the queue, if present.
    pub fn remove(&self, session: &SessionRef) {
        let removed = self.entries.lock().remove(&session.user_id).is_some();
        if !removed {
            return;
        }
        tracing::info!(user_id = %session.user_id, "left the ranked queue");
        let _ = session.send(
            "queue_status",
            &QueueStatusPayload {
                status: "left_queue".to_string(),
                message: "You left the queue.".to_string(),
            },
        );
    }

    /// Number of parked players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Whether a user is currently parked.
    #[must_use]
    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.lock().contains_key(&user_id)
    }

    /// The pairing loop: one [`RankedQueue::pair_once`] pass per tick.
    pub async fn run(self: Arc<Self>) {
        let mut tick = tokio::time::interval(self.config.queue_tick);
        tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tick.tick().await;
            self.pair_once().await;
        }
    }

    /// Run one greedy pairing pass over the queue.
    ///
    /// Pairing is greedy, not optimal: entries are scanned in map
    /// order and the first in-window partner wins, so two compatible
    /// players can stay unpaired for a tick if a closer partner was
    /// claimed first. One pass may produce several disjoint matches.
    pub async fn pair_once(&self) {
        let pairs = self.claim_pairs();
        for (a, b) in pairs {
            let room_id = fresh_room_id();
            let (white, black) = if rand::thread_rng().gen_bool(0.5) {
                (a, b)
            } else {
                (b, a)
            };
            tracing::info!(
                room_id = %room_id,
                white = %white.user_id,
                black = %black.user_id,
                "match found"
            );

            let pending = HashMap::from([
                (white.user_id, Color::White),
                (black.user_id, Color::Black),
            ]);
            // Install before announcing: the hub mailbox is ordered,
            // so the room exists before either client can re-register.
            self.hub.install_ranked_room(room_id.clone(), pending).await;

            let _ = white.send(
                "match_found",
                &MatchFoundPayload {
                    room_id: room_id.clone(),
                    color: "white".to_string(),
                },
            );
            let _ = black.send(
                "match_found",
                &MatchFoundPayload {
                    room_id,
                    color: "black".to_string(),
                },
            );
        }
    }

    /// Claim every matchable pair under the lock and drop their
    /// entries.
    fn claim_pairs(&self) -> Vec<(SessionRef, SessionRef)> {
        let mut entries = self.entries.lock();
        let snapshot: Vec<(UserId, i32)> = entries
            .values()
            .filter(|entry| entry.searching)
            .map(|entry| (entry.session.user_id, entry.rating))
            .collect();

        let mut claimed = vec![false; snapshot.len()];
        let mut pairs = Vec::new();
        for i in 0..snapshot.len() {
            if claimed[i] {
                continue;
            }
            for j in (i + 1)..snapshot.len() {
                if claimed[j] {
                    continue;
                }
                if (snapshot[i].1 - snapshot[j].1).abs() <= self.config.rating_window {
                    claimed[i] = true;
                    claimed[j] = true;
                    if let Some(first) = entries.get_mut(&snapshot[i].0) {
                        first.searching = false;
                    }
                    if let Some(second) = entries.get_mut(&snapshot[j].0) {
                        second.searching = false;
                    }
                    let first = entries.remove(&snapshot[i].0);
                    let second = entries.remove(&snapshot[j].0);
                    if let (Some(first), Some(second)) = (first, second) {
                        pairs.push((first.session, second.session));
                    }
                    break;
                }
            }
        }
        pairs
    }
}

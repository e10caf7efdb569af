//! The rating persistence seam.
//!
//! The core never talks to a database. Terminal ranked games call
//! [`RatingStore::persist_rating`] once per player; failures are
//! logged by the caller and never retried, and the in-memory rating a
//! session carries stands regardless.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::ServerError;
use crate::types::UserId;

/// Persists a user's new rating after a ranked game.
///
/// Implementations must be safe for concurrent callers; every finished
/// ranked room invokes this from its own task.
#[async_trait]
pub trait RatingStore: Send + Sync {
    /// Persist `new_rating` as `user_id`'s current rating.
    async fn persist_rating(&self, user_id: UserId, new_rating: i32) -> Result<(), ServerError>;
}

/// In-memory store used by tests and the development binary.
///
/// Records every write in arrival order so tests can assert that a
/// finished game persisted exactly once per player.
#[derive(Debug, Default)]
pub struct MemoryRatingStore {
    ratings: Mutex<HashMap<UserId, i32>>,
    writes: Mutex<Vec<(UserId, i32)>>,
}

impl MemoryRatingStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The latest persisted rating for a user, if any.
    #[must_use]
    pub fn rating(&self, user_id: UserId) -> Option<i32> {
        self.ratings.lock().get(&user_id).copied()
    }

    /// Every write in arrival order.
    #[must_use]
    pub fn writes(&self) -> Vec<(UserId, i32)> {
        self.writes.lock().clone()
    }
}

#[async_trait]
impl RatingStore for MemoryRatingStore {
    async fn persist_rating(&self, user_id: UserId, new_rating: i32) -> Result<(), ServerError> {
        self.ratings.lock().insert(user_id, new_rating);
        self.writes.lock().push((user_id, new_rating));
        Ok(())
    }
}

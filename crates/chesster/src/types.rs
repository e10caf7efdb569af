//! Identity types shared across the service.

use serde::{Deserialize, Serialize};

/// Default rating for an account that has never played a ranked game.
pub const DEFAULT_RATING: i32 = 1000;

/// Stable identifier of an authenticated user.
///
/// Assigned by the external account store; the core only carries it
/// between the auth seam and the rating seam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(u64);

impl UserId {
    /// Wrap a raw user id.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// The raw id.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An authenticated identity, as delivered by the auth collaborator
/// when a connection is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// The account's user id.
    pub user_id: UserId,
    /// The account's current rating.
    pub rating: i32,
}

impl Identity {
    /// An identity with the default rating.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            rating: DEFAULT_RATING,
        }
    }

    /// This identity with a specific rating.
    #[must_use]
    pub const fn with_rating(mut self, rating: i32) -> Self {
        self.rating = rating;
        self
    }
}

/// Draw a fresh room id: four random bytes as eight lowercase hex
/// characters.
#[must_use]
pub fn fresh_room_id() -> String {
    format!("{:08x}", rand::random::<u32>())
}

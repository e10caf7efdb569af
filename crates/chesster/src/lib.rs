//! # chesster
//!
//! The server side of a real-time two-player chess service. The rules
//! live in [`chesster_engine`]; this crate owns everything around them:
//!
//! - **Sessions**: one per websocket connection, with a bounded,
//!   close-once outbound queue and reader/writer pumps.
//! - **Hub**: a single event loop that owns the room directory and
//!   routes session registration to rooms.
//! - **Rooms**: one event loop per game, driving the lobby and game
//!   state machine without shared locks.
//! - **Ranked queue**: a background pairing loop that matches players
//!   by rating and installs ranked rooms through the hub.
//! - **Bot endpoint**: a stateless HTTP responder backed by the
//!   engine's search.
//!
//! Authentication and rating storage are collaborator seams
//! ([`auth::Authenticator`], [`rating::RatingStore`]); the core only
//! ever sees an already-resolved identity.

pub mod auth;
pub mod bot;
pub mod config;
pub mod error;
pub mod hub;
pub mod message;
pub mod queue;
pub mod rating;
pub mod room;
pub mod routes;
pub mod session;
pub mod types;

pub use config::ServerConfig;
pub use error::ServerError;
pub use hub::{Hub, HubHandle};
pub use types::{Identity, UserId};

//! Server configuration.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::ServerError;

/// Configuration for the chess server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the HTTP/websocket listener binds to.
    pub listen_addr: SocketAddr,
    /// Capacity of each session's outbound frame queue. A full queue
    /// evicts the session rather than block the sender. Default: 256.
    pub outbox_capacity: usize,
    /// Capacity of each room's event mailbox. Default: 64.
    pub room_mailbox_capacity: usize,
    /// Capacity of the hub's command mailbox. Default: 256.
    pub hub_mailbox_capacity: usize,
    /// How often the ranked queue runs a pairing pass. Default: 2s.
    pub queue_tick: Duration,
    /// Maximum rating difference for a ranked pairing. Default: 50.
    pub rating_window: i32,
    /// Deadline for a single websocket write. Default: 10s.
    pub write_timeout: Duration,
    /// Keep-alive ping period. Must be shorter than `pong_timeout`.
    /// Default: 48s.
    pub ping_interval: Duration,
    /// How long the read side waits for any traffic (pongs included)
    /// before killing the connection. Default: 54s.
    pub pong_timeout: Duration,
    /// Maximum accepted inbound frame size in bytes; larger frames are
    /// dropped with a log line. Default: 512.
    pub max_frame_bytes: usize,
    /// Search depth for the bot endpoint, in plies. Default: 4.
    pub bot_depth: u32,
}

impl ServerConfig {
    /// Build a config from the environment, starting from defaults.
    ///
    /// `CHESSTER_LISTEN` overrides the listen address.
    pub fn from_env() -> Result<Self, ServerError> {
        let mut config = Self::default();
        if let Ok(listen) = std::env::var("CHESSTER_LISTEN") {
            config.listen_addr = listen.parse().map_err(|_| ServerError::InvalidConfig {
                reason: format!("CHESSTER_LISTEN is not a socket address: {listen}"),
            })?;
        }
        Ok(config)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.outbox_capacity == 0 {
            return Err(ServerError::InvalidConfig {
                reason: "outbox_capacity must be >= 1".to_string(),
            });
        }
        if self.room_mailbox_capacity == 0 {
            return Err(ServerError::InvalidConfig {
                reason: "room_mailbox_capacity must be >= 1".to_string(),
            });
        }
        if self.hub_mailbox_capacity == 0 {
            return Err(ServerError::InvalidConfig {
                reason: "hub_mailbox_capacity must be >= 1".to_string(),
            });
        }
        if self.queue_tick.is_zero() {
            return Err(ServerError::InvalidConfig {
                reason: "queue_tick must be > 0".to_string(),
            });
        }
        if self.rating_window < 0 {
            return Err(ServerError::InvalidConfig {
                reason: format!("rating_window must be >= 0, got {}", self.rating_window),
            });
        }
        if self.write_timeout.is_zero() {
            return Err(ServerError::InvalidConfig {
                reason: "write_timeout must be > 0".to_string(),
            });
        }
        if self.ping_interval.is_zero() || self.ping_interval >= self.pong_timeout {
            return Err(ServerError::InvalidConfig {
                reason: "ping_interval must be > 0 and shorter than pong_timeout".to_string(),
            });
        }
        if self.max_frame_bytes == 0 {
            return Err(ServerError::InvalidConfig {
                reason: "max_frame_bytes must be >= 1".to_string(),
            });
        }
        if self.bot_depth == 0 {
            return Err(ServerError::InvalidConfig {
                reason: "bot_depth must be >= 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            outbox_capacity: 256,
            room_mailbox_capacity: 64,
            hub_mailbox_capacity: 256,
            queue_tick: Duration::from_secs(2),
            rating_window: 50,
            write_timeout: Duration::from_secs(10),
            ping_interval: Duration::from_secs(48),
            pong_timeout: Duration::from_secs(54),
            max_frame_bytes: 512,
            bot_depth: 4,
        }
    }
}

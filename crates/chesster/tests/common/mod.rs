//! Shared test support: channel-backed sessions and frame helpers.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;

use chesster::session::{Session, SessionRef};
use chesster::types::{Identity, UserId};
use chesster::ServerConfig;

/// A config with a fast queue tick so matchmaking tests finish quickly.
pub fn test_config() -> Arc<ServerConfig> {
    Arc::new(ServerConfig {
        queue_tick: Duration::from_millis(25),
        ..ServerConfig::default()
    })
}

/// A session with a plain channel where the websocket would be.
pub fn session(user: u64, rating: i32, room: &str) -> (SessionRef, mpsc::Receiver<String>) {
    Session::create(
        Identity::new(UserId::new(user)).with_rating(rating),
        room,
        64,
    )
}

/// Receive the next frame, parsed.
pub async fn recv_frame(rx: &mut mpsc::Receiver<String>) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for a frame")
        .expect("outbox channel closed");
    serde_json::from_str(&frame).expect("frame is not json")
}

/// Receive frames until one with the given action arrives.
pub async fn recv_action(rx: &mut mpsc::Receiver<String>, action: &str) -> Value {
    loop {
        let frame = recv_frame(rx).await;
        if frame["action"] == action {
            return frame;
        }
    }
}

/// Assert that no frame arrives for a little while.
pub async fn assert_silent(rx: &mut mpsc::Receiver<String>) {
    match tokio::time::timeout(Duration::from_millis(200), rx.recv()).await {
        Err(_) => {}
        Ok(None) => {}
        Ok(Some(frame)) => panic!("unexpected frame: {frame}"),
    }
}

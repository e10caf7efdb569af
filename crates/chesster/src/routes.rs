//! HTTP surface and router assembly.
//!
//! Three endpoints touch the core: room id minting, the bot responder,
//! and the websocket upgrade that turns an HTTP request into a
//! session. Authentication happens here, before the upgrade, so a bad
//! token is a plain 401 and the core never sees the connection.

use std::sync::Arc;

use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::Authenticator;
use crate::bot;
use crate::config::ServerConfig;
use crate::hub::HubHandle;
use crate::session;
use crate::types::fresh_room_id;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// The hub's command mailbox.
    pub hub: HubHandle,
    /// The identity resolution collaborator.
    pub auth: Arc<dyn Authenticator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/rooms/create", post(create_room))
        .route("/api/bot/move", post(bot::bot_move))
        .route("/ws/game/{room_id}", get(upgrade_game_socket))
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct CreateRoomResponse {
    #[serde(rename = "roomID")]
    room_id: String,
}

async fn create_room() -> Json<CreateRoomResponse> {
    let room_id = fresh_room_id();
    tracing::info!(room_id = %room_id, "room id minted");
    Json(CreateRoomResponse { room_id })
}

#[derive(Debug, Deserialize)]
struct WsQuery {
    #[serde(default)]
    token: Option<String>,
}

/// `GET /ws/game/{room_id}?token=...`: authenticate, then upgrade.
/// `room_id` of `ranked` routes the session into matchmaking.
async fn upgrade_game_socket(
    ws: WebSocketUpgrade,
    Path(room_id): Path<String>,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    let token = query.token.unwrap_or_default();
    let identity = match state.auth.authenticate(&token).await {
        Ok(identity) => identity,
        Err(err) => {
            tracing::debug!(%err, room_id = %room_id, "rejecting websocket upgrade");
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let hub = state.hub.clone();
    let config = Arc::clone(&state.config);
    ws.on_upgrade(move |socket| session::connect(socket, identity, room_id, hub, config))
}

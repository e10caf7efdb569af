//! The offline bot opponent.
//!
//! A stateless HTTP responder: given a FEN and the player's move, it
//! validates and applies the move, then answers with the engine's
//! search reply and the resulting status. All the chess lives in
//! [`chesster_engine::search`]; this module is the seam between HTTP
//! and the kernel.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chesster_engine::{search, Position};
use serde::{Deserialize, Serialize};

use crate::message::ErrorPayload;
use crate::routes::AppState;

/// Body of `POST /api/bot/move`.
#[derive(Debug, Clone, Deserialize)]
pub struct BotMoveRequest {
    /// The position before the player's move.
    #[serde(rename = "currentFen")]
    pub current_fen: String,
    /// The player's move as `fromto`, e.g. `e2e4`.
    #[serde(rename = "playerMove")]
    pub player_move: String,
    /// Promotion piece letter when the player promotes.
    #[serde(rename = "promotionPiece", default)]
    pub promotion_piece: Option<String>,
}

/// Response of `POST /api/bot/move`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotMoveResponse {
    /// The position after the player's move and, if the game went on,
    /// the bot's reply.
    #[serde(rename = "newFen")]
    pub new_fen: String,
    /// Status of the returned position.
    #[serde(rename = "gameStatus")]
    pub game_status: String,
}

/// Apply the player's move and compute the bot's reply.
///
/// Pure function of the request; the HTTP handler maps errors to 400.
pub fn respond(request: &BotMoveRequest, depth: u32) -> Result<BotMoveResponse, String> {
    let pos = Position::from_fen(&request.current_fen).map_err(|err| err.to_string())?;

    let mut uci = request.player_move.clone();
    if let Some(promotion) = &request.promotion_piece {
        if !promotion.is_empty() && uci.len() == 4 {
            uci.push_str(&promotion.to_lowercase());
        }
    }
    let player_move = pos
        .parse_uci(&uci)
        .map_err(|err| format!("invalid player move: {err}"))?;

    let mut pos = pos.apply_move(player_move);
    let mut status = pos.status();

    // Only reply if the player's move left a game to play.
    if !status.is_terminal() {
        if let Some(reply) = search::best_move(&pos, depth) {
            pos = pos.apply_move(reply);
            status = pos.status();
        }
    }

    Ok(BotMoveResponse {
        new_fen: pos.fen(),
        game_status: status.as_str().to_string(),
    })
}

/// `POST /api/bot/move` handler.
pub(crate) async fn bot_move(
    State(state): State<AppState>,
    Json(request): Json<BotMoveRequest>,
) -> Result<Json<BotMoveResponse>, (StatusCode, Json<ErrorPayload>)> {
    match respond(&request, state.config.bot_depth) {
        Ok(response) => Ok(Json(response)),
        Err(message) => {
            tracing::debug!(%message, "bot move rejected");
            Err((StatusCode::BAD_REQUEST, Json(ErrorPayload { message })))
        }
    }
}

//! Integration tests for the room state machine: the unranked lobby
//! flow, the ranked binding flow, terminal rating updates, and
//! abandonment semantics.

mod common;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;

use chesster_engine::Color;

use chesster::hub::Hub;
use chesster::message::ClientFrame;
use chesster::rating::{MemoryRatingStore, RatingStore};
use chesster::room::RoomEvent;
use chesster::session::SessionRef;
use chesster::types::UserId;

async fn send_action(
    room: &mpsc::Sender<RoomEvent>,
    session: &SessionRef,
    action: &str,
    payload: serde_json::Value,
) {
    room.send(RoomEvent::Message {
        session: session.clone(),
        frame: ClientFrame::new(action, payload),
    })
    .await
    .expect("room mailbox closed");
}

async fn send_move(room: &mpsc::Sender<RoomEvent>, session: &SessionRef, from: &str, to: &str) {
    send_action(room, session, "move", json!({ "from": from, "to": to })).await;
}

#[tokio::test]
async fn ranked_checkmate_updates_ratings_and_deletes_the_room() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, _queue) = Hub::spawn(common::test_config(), Arc::clone(&store) as Arc<dyn RatingStore>);

    hub.install_ranked_room(
        "feedc0de".to_string(),
        HashMap::from([
            (UserId::new(1), Color::White),
            (UserId::new(2), Color::Black),
        ]),
    )
    .await;

    let (white, mut wrx) = common::session(1, 1500, "feedc0de");
    let (black, mut brx) = common::session(2, 1500, "feedc0de");
    let room = hub.register(white.clone()).await.expect("room mailbox");
    hub.register(black.clone()).await.expect("room mailbox");

    // Both bound: assignments go out and the game auto-starts.
    let assigned = common::recv_action(&mut wrx, "player_assigned").await;
    assert_eq!(assigned["payload"]["color"], "white");
    let assigned = common::recv_action(&mut brx, "player_assigned").await;
    assert_eq!(assigned["payload"]["color"], "black");

    let state = common::recv_action(&mut wrx, "game_state").await;
    assert_eq!(state["payload"]["game_status"], "in_progress");
    common::recv_action(&mut brx, "game_state").await;

    // Fool's mate; black delivers it. Drain the broadcast on both
    // sides after every move so the terminal frame is unambiguous.
    for (mover, from, to) in [
        (&white, "f2", "f3"),
        (&black, "e7", "e5"),
        (&white, "g2", "g4"),
    ] {
        send_move(&room, mover, from, to).await;
        let state = common::recv_action(&mut wrx, "game_state").await;
        assert_eq!(state["payload"]["game_status"], "in_progress");
        common::recv_action(&mut brx, "game_state").await;
    }
    send_move(&room, &black, "d8", "h4").await;

    let terminal = common::recv_action(&mut wrx, "game_state").await;
    assert_eq!(terminal["payload"]["game_status"], "checkmate");
    let terminal = common::recv_action(&mut brx, "game_state").await;
    assert_eq!(terminal["payload"]["game_status"], "checkmate");

    // Winner +100, loser -50, persisted exactly once each.
    tokio::time::sleep(Duration::from_millis(100)).await;
    let mut writes = store.writes();
    writes.sort_by_key(|(user, _)| user.as_u64());
    assert_eq!(writes, vec![(UserId::new(1), 1450), (UserId::new(2), 1600)]);

    assert!(white.outbox.is_closed());
    assert!(black.outbox.is_closed());

    // The room is gone: the same id now lazily creates an unranked
    // room, which greets with lobby state.
    let (probe, mut prx) = common::session(9, 1000, "feedc0de");
    hub.register(probe).await.expect("room mailbox");
    let lobby = common::recv_action(&mut prx, "lobby_state").await;
    assert_eq!(lobby["payload"]["game_type"], "unranked");
}

#[tokio::test]
async fn ranked_room_rejects_sessions_that_were_not_paired() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, _queue) = Hub::spawn(common::test_config(), store as Arc<dyn RatingStore>);

    hub.install_ranked_room(
        "0badd00d".to_string(),
        HashMap::from([
            (UserId::new(1), Color::White),
            (UserId::new(2), Color::Black),
        ]),
    )
    .await;

    let (intruder, mut irx) = common::session(99, 1500, "0badd00d");
    hub.register(intruder.clone()).await.expect("room mailbox");

    let error = common::recv_action(&mut irx, "error").await;
    assert_eq!(
        error["payload"]["message"],
        "You are not a participant in this game."
    );
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(intruder.outbox.is_closed());
}

#[tokio::test]
async fn unranked_lobby_flow_into_a_game() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, _queue) = Hub::spawn(common::test_config(), Arc::clone(&store) as Arc<dyn RatingStore>);

    let (host, mut hrx) = common::session(10, 1000, "cafe0001");
    let (guest, mut grx) = common::session(11, 1000, "cafe0001");
    let (watcher, mut srx) = common::session(12, 1000, "cafe0001");

    let room = hub.register(host.clone()).await.expect("room mailbox");
    let lobby = common::recv_action(&mut hrx, "lobby_state").await;
    assert_eq!(lobby["payload"]["is_host"], true);
    assert_eq!(lobby["payload"]["player_count"], 1);
    assert_eq!(lobby["payload"]["game_state"], "waiting");
    assert_eq!(lobby["payload"]["game_type"], "unranked");

    hub.register(guest.clone()).await.expect("room mailbox");
    let lobby = common::recv_action(&mut hrx, "lobby_state").await;
    assert_eq!(lobby["payload"]["player_count"], 2);
    let lobby = common::recv_action(&mut grx, "lobby_state").await;
    assert_eq!(lobby["payload"]["is_host"], false);

    hub.register(watcher.clone()).await.expect("room mailbox");
    common::recv_action(&mut hrx, "lobby_state").await;
    common::recv_action(&mut grx, "lobby_state").await;
    let lobby = common::recv_action(&mut srx, "lobby_state").await;
    // The third arrival spectates; seats stay at two.
    assert_eq!(lobby["payload"]["player_count"], 2);

    // Guests cannot steer the lobby.
    send_action(&room, &guest, "assign_color", json!({ "color": "white" })).await;
    let error = common::recv_action(&mut grx, "error").await;
    assert_eq!(error["payload"]["message"], "Only the host can assign colors.");

    // Start preconditions are reported one at a time.
    send_action(&room, &host, "start_game", json!(null)).await;
    let error = common::recv_action(&mut hrx, "error").await;
    assert_eq!(error["payload"]["message"], "Guest must be ready.");

    send_action(&room, &guest, "player_ready", json!(null)).await;
    let lobby = common::recv_action(&mut hrx, "lobby_state").await;
    assert_eq!(lobby["payload"]["guest_ready"], true);
    common::recv_action(&mut grx, "lobby_state").await;
    common::recv_action(&mut srx, "lobby_state").await;

    send_action(&room, &host, "start_game", json!(null)).await;
    let error = common::recv_action(&mut hrx, "error").await;
    assert_eq!(
        error["payload"]["message"],
        "The host must select a color first."
    );

    send_action(&room, &host, "assign_color", json!({ "color": "white" })).await;
    let lobby = common::recv_action(&mut hrx, "lobby_state").await;
    assert_eq!(lobby["payload"]["host_color"], "white");
    common::recv_action(&mut grx, "lobby_state").await;
    common::recv_action(&mut srx, "lobby_state").await;

    send_action(&room, &host, "start_game", json!(null)).await;
    let assigned = common::recv_action(&mut hrx, "player_assigned").await;
    assert_eq!(assigned["payload"]["color"], "white");
    let assigned = common::recv_action(&mut grx, "player_assigned").await;
    assert_eq!(assigned["payload"]["color"], "black");

    let state = common::recv_action(&mut hrx, "game_state").await;
    assert_eq!(state["payload"]["game_status"], "in_progress");
    common::recv_action(&mut grx, "game_state").await;
    let state = common::recv_action(&mut srx, "game_state").await;
    assert_eq!(state["payload"]["game_status"], "in_progress");

    // Spectators cannot move, and turn order is enforced.
    send_move(&room, &watcher, "e2", "e4").await;
    let error = common::recv_action(&mut srx, "error").await;
    assert_eq!(error["payload"]["message"], "Spectators cannot make moves.");

    send_move(&room, &guest, "e7", "e5").await;
    let error = common::recv_action(&mut grx, "error").await;
    assert_eq!(error["payload"]["message"], "It's not your turn.");

    send_move(&room, &host, "e2", "e5").await;
    let error = common::recv_action(&mut hrx, "error").await;
    assert!(
        error["payload"]["message"]
            .as_str()
            .expect("message")
            .starts_with("Invalid move"),
        "got: {error}"
    );

    send_move(&room, &host, "e2", "e4").await;
    let state = common::recv_action(&mut grx, "game_state").await;
    assert!(
        state["payload"]["fen"]
            .as_str()
            .expect("fen")
            .starts_with("rnbqkbnr/pppppppp/8/8/4P3"),
        "got: {state}"
    );

    // Unranked games never touch ratings.
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn host_leaving_closes_the_room() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, _queue) = Hub::spawn(common::test_config(), store as Arc<dyn RatingStore>);

    let (host, mut hrx) = common::session(20, 1000, "cafe0002");
    let (guest, mut grx) = common::session(21, 1000, "cafe0002");
    hub.register(host.clone()).await.expect("room mailbox");
    hub.register(guest.clone()).await.expect("room mailbox");
    common::recv_action(&mut hrx, "lobby_state").await;
    common::recv_action(&mut grx, "lobby_state").await;

    hub.unregister(host).await;

    let error = common::recv_action(&mut grx, "error").await;
    assert_eq!(
        error["payload"]["message"],
        "The host has disconnected. The game has ended."
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(guest.outbox.is_closed());
}

#[tokio::test]
async fn guest_leaving_in_waiting_keeps_the_room_open() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, _queue) = Hub::spawn(common::test_config(), store as Arc<dyn RatingStore>);

    let (host, mut hrx) = common::session(30, 1000, "cafe0003");
    let (guest, mut grx) = common::session(31, 1000, "cafe0003");
    hub.register(host.clone()).await.expect("room mailbox");
    let lobby = common::recv_action(&mut hrx, "lobby_state").await;
    assert_eq!(lobby["payload"]["player_count"], 1);

    hub.register(guest.clone()).await.expect("room mailbox");
    let lobby = common::recv_action(&mut hrx, "lobby_state").await;
    assert_eq!(lobby["payload"]["player_count"], 2);
    common::recv_action(&mut grx, "lobby_state").await;

    hub.unregister(guest).await;

    // The host just sees the lobby shrink back to one player.
    let lobby = common::recv_action(&mut hrx, "lobby_state").await;
    assert_eq!(lobby["payload"]["player_count"], 1);
    assert!(!host.outbox.is_closed());
}

#[tokio::test]
async fn ranked_disconnect_forfeits_without_rating_changes() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, _queue) = Hub::spawn(common::test_config(), Arc::clone(&store) as Arc<dyn RatingStore>);

    hub.install_ranked_room(
        "deadbeef".to_string(),
        HashMap::from([
            (UserId::new(41), Color::White),
            (UserId::new(42), Color::Black),
        ]),
    )
    .await;

    let (white, mut wrx) = common::session(41, 1500, "deadbeef");
    let (black, mut brx) = common::session(42, 1500, "deadbeef");
    let room = hub.register(white.clone()).await.expect("room mailbox");
    hub.register(black.clone()).await.expect("room mailbox");
    common::recv_action(&mut wrx, "game_state").await;
    common::recv_action(&mut brx, "game_state").await;

    // A move happens, then white's transport dies.
    send_move(&room, &white, "e2", "e4").await;
    common::recv_action(&mut brx, "game_state").await;
    hub.unregister(white).await;

    let error = common::recv_action(&mut brx, "error").await;
    assert_eq!(
        error["payload"]["message"],
        "Your opponent has disconnected. The game has ended."
    );
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(black.outbox.is_closed());
    // Forfeits do not move ratings in this version.
    assert!(store.writes().is_empty());
}

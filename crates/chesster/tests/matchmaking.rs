//! Integration tests for the ranked queue: pairing, the rating
//! window, and queue membership messages.

mod common;

use std::sync::Arc;

use chesster::hub::Hub;
use chesster::rating::MemoryRatingStore;
use chesster::types::UserId;

#[tokio::test]
async fn pairs_two_players_within_the_rating_window() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, queue) = Hub::spawn(common::test_config(), store);

    let (s1, mut rx1) = common::session(1, 1200, "ranked");
    let (s2, mut rx2) = common::session(2, 1240, "ranked");
    let (s3, mut rx3) = common::session(3, 1500, "ranked");

    assert!(hub.register(s1.clone()).await.is_none());
    assert!(hub.register(s2.clone()).await.is_none());
    assert!(hub.register(s3.clone()).await.is_none());

    let joined = common::recv_action(&mut rx1, "queue_status").await;
    assert_eq!(joined["payload"]["status"], "joined_queue");
    assert_eq!(joined["payload"]["message"], "Waiting for opponent...");

    // 1200 and 1240 sit inside the 50-point window and get paired on
    // the next tick; both land in the same room with opposite colors.
    let m1 = common::recv_action(&mut rx1, "match_found").await;
    let m2 = common::recv_action(&mut rx2, "match_found").await;

    let room_id = m1["payload"]["roomID"].as_str().expect("room id");
    assert_eq!(room_id.len(), 8);
    assert!(room_id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(m2["payload"]["roomID"], room_id);

    let mut colors = [
        m1["payload"]["color"].as_str().expect("color"),
        m2["payload"]["color"].as_str().expect("color"),
    ];
    colors.sort_unstable();
    assert_eq!(colors, ["black", "white"]);

    // The 1500 player is 260 points away from everyone and stays
    // parked.
    common::recv_action(&mut rx3, "queue_status").await;
    common::assert_silent(&mut rx3).await;
    assert!(queue.contains(UserId::new(3)));
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn ratings_just_outside_the_window_stay_unpaired() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, queue) = Hub::spawn(common::test_config(), store);

    let (s1, mut rx1) = common::session(1, 1000, "ranked");
    let (s2, mut rx2) = common::session(2, 1051, "ranked");
    let _ = hub.register(s1).await;
    let _ = hub.register(s2).await;

    common::recv_action(&mut rx1, "queue_status").await;
    common::recv_action(&mut rx2, "queue_status").await;

    // A few ticks go by; 51 points is one too many.
    common::assert_silent(&mut rx1).await;
    common::assert_silent(&mut rx2).await;
    assert_eq!(queue.len(), 2);
}

#[tokio::test]
async fn one_pass_makes_multiple_disjoint_matches() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, queue) = Hub::spawn(common::test_config(), store);

    let (s1, mut rx1) = common::session(1, 1000, "ranked");
    let (s2, mut rx2) = common::session(2, 1010, "ranked");
    let (s3, mut rx3) = common::session(3, 2000, "ranked");
    let (s4, mut rx4) = common::session(4, 2010, "ranked");
    for s in [s1, s2, s3, s4] {
        let _ = hub.register(s).await;
    }

    let m1 = common::recv_action(&mut rx1, "match_found").await;
    let m2 = common::recv_action(&mut rx2, "match_found").await;
    let m3 = common::recv_action(&mut rx3, "match_found").await;
    let m4 = common::recv_action(&mut rx4, "match_found").await;

    assert_eq!(m1["payload"]["roomID"], m2["payload"]["roomID"]);
    assert_eq!(m3["payload"]["roomID"], m4["payload"]["roomID"]);
    assert_ne!(m1["payload"]["roomID"], m3["payload"]["roomID"]);
    assert!(queue.is_empty());
}

#[tokio::test]
async fn unregistering_leaves_the_queue() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, queue) = Hub::spawn(common::test_config(), store);

    let (s1, mut rx1) = common::session(1, 1000, "ranked");
    let _ = hub.register(s1.clone()).await;
    common::recv_action(&mut rx1, "queue_status").await;
    assert_eq!(queue.len(), 1);

    hub.unregister(s1).await;
    let left = common::recv_action(&mut rx1, "queue_status").await;
    assert_eq!(left["payload"]["status"], "left_queue");
    assert!(queue.is_empty());
}

#[tokio::test]
async fn duplicate_enqueue_is_ignored() {
    let store = Arc::new(MemoryRatingStore::new());
    let (hub, queue) = Hub::spawn(common::test_config(), store);

    // Same user id on two connections; the second add is a no-op.
    let (s1, mut rx1) = common::session(7, 3000, "ranked");
    let (s1_again, mut rx_again) = common::session(7, 3000, "ranked");
    let _ = hub.register(s1).await;
    common::recv_action(&mut rx1, "queue_status").await;
    let _ = hub.register(s1_again).await;

    common::assert_silent(&mut rx_again).await;
    assert_eq!(queue.len(), 1);
}

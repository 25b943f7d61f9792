//! Integration tests for the room layer.
//!
//! These tests talk to rooms only through the `RoomManager`, the way a chat
//! front end would.

use coup_engine::{
    ActionKind, Role, RoomCommand, RoomConfig, RoomManager, RoomResponse, Username,
    room::RoomError,
};

fn name(s: &str) -> Username {
    Username::new(s)
}

async fn run(manager: &RoomManager, room: &str, user: &str, command: RoomCommand) -> RoomResponse {
    manager.execute(room, name(user), command).await.unwrap()
}

#[tokio::test]
async fn test_turns_through_the_manager() {
    let manager = RoomManager::new(RoomConfig::default());
    let deal = run(
        &manager,
        "general",
        "alice",
        RoomCommand::Deal(vec![name("alice"), name("bob")]),
    )
    .await;
    assert!(deal.is_broadcast());

    let reply = run(
        &manager,
        "general",
        "alice",
        RoomCommand::Action {
            action: ActionKind::ForeignAid,
            target: None,
        },
    )
    .await;
    assert_eq!(
        reply,
        RoomResponse::Broadcast(
            "alice used foreign aid!\nAnyone may block with a duke.".to_string()
        )
    );

    let reply = run(&manager, "general", "bob", RoomCommand::Block(Role::Duke)).await;
    assert!(reply.text().starts_with("bob has blocked alice's foreign aid with a duke."));

    let reply = run(
        &manager,
        "general",
        "bob",
        RoomCommand::Action {
            action: ActionKind::Income,
            target: None,
        },
    )
    .await;
    assert_eq!(
        reply,
        RoomResponse::Broadcast(
            "alice's foreign aid was blocked.\nbob used income!".to_string()
        )
    );

    let status = run(&manager, "general", "carol", RoomCommand::Status).await;
    assert!(status.is_broadcast());
    assert!(status.text().contains("alice: 2\u{2022}"));
    assert!(status.text().contains("bob: 3\u{2022}"));
}

#[tokio::test]
async fn test_rejected_moves_are_private_and_harmless() {
    let manager = RoomManager::new(RoomConfig::default());
    run(
        &manager,
        "general",
        "alice",
        RoomCommand::Deal(vec![name("alice"), name("bob")]),
    )
    .await;
    let before = run(&manager, "general", "alice", RoomCommand::Status).await;

    let reply = run(&manager, "general", "bob", RoomCommand::Challenge).await;
    assert_eq!(
        reply,
        RoomResponse::Private("There's nothing to challenge.".to_string())
    );
    let reply = run(&manager, "general", "alice", RoomCommand::TakeCards).await;
    assert!(!reply.is_broadcast());

    let after = run(&manager, "general", "alice", RoomCommand::Status).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_concurrent_deals_only_one_wins() {
    let manager = RoomManager::new(RoomConfig::default());
    let mut tasks = Vec::new();
    for i in 0..8 {
        let manager = manager.clone();
        tasks.push(tokio::spawn(async move {
            let names = vec![name(&format!("a{i}")), name(&format!("b{i}"))];
            manager
                .execute("busy", name(&format!("a{i}")), RoomCommand::Deal(names))
                .await
                .unwrap()
        }));
    }

    let mut dealt = 0;
    for task in tasks {
        if task.await.unwrap().is_broadcast() {
            dealt += 1;
        }
    }
    assert_eq!(dealt, 1);
    assert_eq!(manager.active_room_count().await, 1);
}

#[tokio::test]
async fn test_closed_room_reports_error() {
    let manager = RoomManager::new(RoomConfig::default());
    let handle = manager.get_or_spawn("general").await;
    handle.close().await.unwrap();

    let result = handle.execute(name("alice"), RoomCommand::Status).await;
    assert_eq!(result, Err(RoomError::Closed("general".to_string())));
}

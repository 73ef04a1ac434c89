//! Shared board file tests
//!
//! Operator commands and display clients only meet at the board file, so
//! these tests go through `FileBoardStore` on a temporary directory.

use std::sync::Arc;
use std::time::Duration;

use stageboard::cues::NullCuePlayer;
use stageboard::{
    AudioGate, Category, ClientSession, FileBoardStore, ItemFilter, ItemSource, ItemWriter,
    SessionOptions, SourceError, Stage, StageMachine, TransitionError,
};
use tempfile::TempDir;
use tokio_test::assert_ok;

fn store_in(dir: &TempDir) -> Arc<FileBoardStore> {
    Arc::new(FileBoardStore::new(dir.path().join("board.json")))
}

#[tokio::test]
async fn test_same_stage_write_keeps_updated_at() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let item = store.create_item("A", Category::Large).await.unwrap();
    let queued = store.set_stage(item.id, Stage::Queued).await.unwrap();
    let again = store.set_stage(item.id, Stage::Queued).await.unwrap();
    assert_eq!(queued.updated_at, again.updated_at);
}

#[tokio::test]
async fn test_unknown_item_is_not_found() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let result = store.set_stage(stageboard::ItemId(99), Stage::Queued).await;
    assert!(matches!(result, Err(SourceError::NotFound(_))));
}

#[tokio::test]
async fn test_concurrent_creates_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.create_item(&format!("T{i}"), Category::Large).await })
        })
        .collect();
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap().id);
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 8);
    assert_eq!(store.list_items(&ItemFilter::all()).await.unwrap().len(), 8);
}

#[tokio::test]
async fn test_operator_walks_item_through_pipeline() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    let machine = StageMachine::new(store.clone());
    let id = store.create_item("A-3", Category::Large).await.unwrap().id;

    assert_eq!(machine.enqueue(id).await.unwrap().item.stage, Stage::Queued);
    assert!(matches!(
        machine.enqueue(id).await,
        Err(TransitionError::AlreadyQueued { .. })
    ));
    for expected in [
        Stage::Processing,
        Stage::Subdividing,
        Stage::Allocating,
        Stage::Completed,
    ] {
        assert_eq!(machine.advance(id).await.unwrap().item.stage, expected);
    }
    let before = store.get_item(id).await.unwrap().unwrap();
    assert!(matches!(
        machine.advance(id).await,
        Err(TransitionError::InvalidTransition { .. })
    ));
    assert_eq!(store.get_item(id).await.unwrap().unwrap(), before);

    assert_eq!(machine.revert(id).await.unwrap().item.stage, Stage::Allocating);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_racing_operators_never_skip_the_pipeline() {
    let dir = TempDir::new().unwrap();
    let setup = store_in(&dir);
    let id = setup.create_item("D-1", Category::Large).await.unwrap().id;
    setup.set_stage(id, Stage::Queued).await.unwrap();

    let first = StageMachine::new(store_in(&dir));
    let second = StageMachine::new(store_in(&dir));
    let (advanced, dequeued) = tokio::join!(
        tokio::spawn(async move { first.advance(id).await }),
        tokio::spawn(async move { second.dequeue(id).await }),
    );
    let advanced = advanced.unwrap();
    let dequeued = dequeued.unwrap();

    // A dequeue only ever takes a queued item to the barn.
    if let Ok(result) = &dequeued {
        assert_eq!(result.previous_stage, Stage::Queued);
    }
    let final_stage = setup.get_item(id).await.unwrap().unwrap().stage;
    match (advanced, dequeued) {
        (Ok(_), Ok(_)) => assert_eq!(final_stage, Stage::Queued),
        (Ok(_), Err(TransitionError::InvalidTransition { .. })) => {
            assert_eq!(final_stage, Stage::Processing)
        }
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_display_sees_operator_transition_on_next_tick() {
    let dir = TempDir::new().unwrap();
    let operator = store_in(&dir);
    let display = store_in(&dir);
    let id = operator.create_item("A-9", Category::Small).await.unwrap().id;

    let mut session = ClientSession::new(
        SessionOptions::default(),
        display,
        Arc::new(NullCuePlayer),
        AudioGate::new(),
    );
    assert_ok!(session.tick().await);

    StageMachine::new(operator.clone()).enqueue(id).await.unwrap();
    let report = assert_ok!(session.tick().await);
    assert_eq!(report.forwarded.unwrap().current, Stage::Queued);
    let alert = session.active_alert().unwrap();
    assert_eq!(alert.title, "QUEUED");
    assert_eq!(alert.message, "A-9 added to the queue");
    assert_eq!(session.columns().column(Stage::Queued).tally().small, 1);
}

#[tokio::test]
async fn test_announcement_reaches_display_through_board_file() {
    let dir = TempDir::new().unwrap();
    let operator = store_in(&dir);
    let mut session = ClientSession::new(
        SessionOptions::default(),
        store_in(&dir),
        Arc::new(NullCuePlayer),
        AudioGate::new(),
    );
    operator
        .publish_announcement("Truck at dock 2", Duration::from_secs(45))
        .await
        .unwrap();

    let report = assert_ok!(session.tick().await);
    assert_eq!(report.announcement_shown, Some(1));
    let shown = session.active_announcement().unwrap();
    assert_eq!(shown.announcement.message, "Truck at dock 2");
    assert_eq!(shown.hides_at - shown.shown_at, Duration::from_secs(45));
}

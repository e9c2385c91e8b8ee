use std::time::Duration;

use flashdeck::{
    card::{CardPatch, CardRecord},
    core::{review_log::ReviewLog, store::{CardStore, StoreError}},
    persist::MemorySink,
    review::ReviewRecord,
    runtime::{
        events::DeckEvent,
        handle::{RuntimeConfig, RuntimeError, spawn_deck},
    },
    types::LeitnerBox,
};

async fn next_event(sub: &mut tokio::sync::broadcast::Receiver<DeckEvent>) -> DeckEvent {
    tokio::time::timeout(Duration::from_secs(1), sub.recv())
        .await
        .expect("event")
        .expect("recv")
}

#[tokio::test]
async fn add_edit_review_delete_emit_ordered_events() {
    let handle = spawn_deck(CardStore::in_memory(), ReviewLog::in_memory(), RuntimeConfig::default());
    let mut sub = handle.subscribe();

    let card = handle.add_card("2+2", "4", None).await.expect("add");
    let id = card.id().clone();
    handle
        .edit_card(
            id.clone(),
            CardPatch {
                topic: Some("Math".into()),
                ..CardPatch::default()
            },
        )
        .await
        .expect("edit");
    let reviewed = handle.review(id.clone(), 4).await.expect("review");
    assert_eq!(reviewed.level().get(), 2);
    assert!(reviewed.last_reviewed().is_some());

    assert_eq!(handle.list_by_topic("Math").await.expect("list").len(), 1);
    assert_eq!(handle.history(id.clone()).await.expect("history").len(), 1);

    handle.delete_card(id.clone()).await.expect("delete");
    assert!(handle.get(id.clone()).await.expect("get").is_none());

    assert_eq!(next_event(&mut sub).await, DeckEvent::CardAdded { id: id.clone() });
    assert_eq!(next_event(&mut sub).await, DeckEvent::CardEdited { id: id.clone() });
    match next_event(&mut sub).await {
        DeckEvent::Reviewed { id: rid, performance, level } => {
            assert_eq!(rid, id);
            assert_eq!(performance.get(), 4);
            assert_eq!(level, LeitnerBox::new(2).unwrap());
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert_eq!(next_event(&mut sub).await, DeckEvent::CardDeleted { id: id.clone() });

    let err = handle.review(id, 3).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Store(StoreError::NotFound(_))));

    handle.shutdown().await.expect("shutdown");
    assert!(matches!(
        handle.due_cards(10).await,
        Err(RuntimeError::ChannelClosed)
    ));
}

#[tokio::test]
async fn invalid_score_changes_nothing() {
    let reviews = MemorySink::<ReviewRecord>::new();
    let log = ReviewLog::open(Box::new(reviews.clone())).expect("log");
    let handle = spawn_deck(CardStore::in_memory(), log, RuntimeConfig::default());

    let card = handle.add_card("q", "a", None).await.expect("add");
    let err = handle.review(card.id().clone(), 9).await.unwrap_err();
    assert!(matches!(err, RuntimeError::Validation(_)));

    let unchanged = handle.get(card.id().clone()).await.expect("get").expect("card");
    assert_eq!(unchanged, card);
    assert!(reviews.snapshot().is_empty());

    handle.shutdown().await.expect("shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_writers_are_serialized() {
    let cards = MemorySink::<CardRecord>::new();
    let store = CardStore::open(Box::new(cards.clone())).expect("store");
    let handle = spawn_deck(store, ReviewLog::in_memory(), RuntimeConfig::default());

    let mut tasks = Vec::new();
    for worker in 0..8 {
        let handle = handle.clone();
        tasks.push(tokio::spawn(async move {
            for i in 0..10 {
                let card = handle
                    .add_card(format!("w{worker}-{i}"), "x", None)
                    .await
                    .expect("add");
                handle.review(card.id().clone(), 5).await.expect("review");
            }
        }));
    }
    for task in tasks {
        task.await.expect("join");
    }

    let due = handle.due_cards(1_000).await.expect("due");
    assert_eq!(due.len(), 80);
    assert!(due.iter().all(|c| c.level().get() == 2));
    assert_eq!(cards.snapshot().len(), 80);
    assert!(cards.snapshot().iter().all(|r| r.level == 2));

    handle.shutdown().await.expect("shutdown");
}

use flashdeck::{
    card::CardRecord,
    core::{review_log::ReviewLog, store::CardStore},
    persist::MemorySink,
    review::ReviewRecord,
    session::{
        runner::{SessionError, SessionOptions, SessionRunner},
        traits::{CumulativeScoring, PlainScoring, ScoringMode},
    },
};

fn ordered(limit: usize) -> SessionOptions {
    SessionOptions {
        limit,
        shuffle: false,
    }
}

#[test]
fn submit_persists_box_and_logs_review() {
    let cards = MemorySink::<CardRecord>::new();
    let reviews = MemorySink::<ReviewRecord>::new();
    let mut store = CardStore::open(Box::new(cards.clone())).unwrap();
    let mut log = ReviewLog::open(Box::new(reviews.clone())).unwrap();
    let card = store.add("2+2", "4", Some("Math".into())).unwrap();
    let saves_before = cards.saves();

    let mut session = SessionRunner::new(&mut store, &mut log, PlainScoring::default(), ordered(10));
    assert_eq!(session.remaining(), 1);
    let shown = session.next_card().unwrap();
    assert_eq!(shown.id(), card.id());
    let updated = session.submit(4).unwrap();
    assert_eq!(updated.level().get(), 2);
    assert!(session.next_card().is_none());
    assert_eq!(session.summary().to_string(), "Reviewed 1 card(s)");

    assert_eq!(cards.saves(), saves_before + 1);
    assert_eq!(cards.snapshot()[0].level, 2);
    assert!(cards.snapshot()[0].last_reviewed.is_some());
    let logged = reviews.snapshot();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].card_id, card.id().as_str());
    assert_eq!(logged[0].performance, 4);
}

#[test]
fn invalid_score_keeps_current_card() {
    let mut store = CardStore::in_memory();
    let mut log = ReviewLog::in_memory();
    let card = store.add("q", "a", None).unwrap();

    let mut session = SessionRunner::new(&mut store, &mut log, CumulativeScoring::default(), ordered(10));
    assert!(matches!(session.submit(3), Err(SessionError::NoCurrentCard)));

    session.next_card().unwrap();
    assert!(matches!(session.submit(0), Err(SessionError::Validation(_))));
    assert!(matches!(session.submit(6), Err(SessionError::Validation(_))));
    assert_eq!(session.current().map(|c| c.id().clone()), Some(card.id().clone()));

    session.submit(1).unwrap();
    assert!(session.current().is_none());
    assert_eq!(session.summary().to_string(), "Score: 0/1");
    drop(session);

    assert_eq!(log.len(), 1);
    assert_eq!(store.get(card.id()).unwrap().level().get(), 1);
}

#[test]
fn cards_deleted_mid_session_are_skipped() {
    let mut store = CardStore::in_memory();
    let mut log = ReviewLog::in_memory();
    let a = store.add("a", "1", None).unwrap();
    let b = store.add("b", "2", None).unwrap();
    let c = store.add("c", "3", None).unwrap();

    let mut session = SessionRunner::new(&mut store, &mut log, PlainScoring::default(), ordered(10));
    assert_eq!(session.next_card().unwrap().id(), a.id());
    session.store_mut().delete(b.id()).unwrap();
    session.submit(5).unwrap();

    assert_eq!(session.next_card().unwrap().id(), c.id());
    session.submit(5).unwrap();
    assert!(session.next_card().is_none());
    assert_eq!(session.summary().reviewed, 2);
}

#[test]
fn quiz_draws_lowest_boxes_up_to_limit() {
    let mut store = CardStore::in_memory();
    let mut log = ReviewLog::in_memory();
    let high = store.add("high", "x", None).unwrap();
    for _ in 0..3 {
        let mut s = SessionRunner::new(&mut store, &mut log, PlainScoring::default(), ordered(1));
        s.next_card().unwrap();
        s.submit(5).unwrap();
    }
    assert_eq!(store.get(high.id()).unwrap().level().get(), 4);
    let low1 = store.add("low1", "x", None).unwrap();
    let low2 = store.add("low2", "x", None).unwrap();

    let mut session = SessionRunner::new(&mut store, &mut log, CumulativeScoring::default(), ordered(2));
    assert_eq!(session.remaining(), 2);
    assert_eq!(session.next_card().unwrap().id(), low1.id());
    session.submit(3).unwrap();
    assert_eq!(session.next_card().unwrap().id(), low2.id());
    session.submit(2).unwrap();
    assert!(session.next_card().is_none());

    let mode = session.into_mode();
    let summary = mode.summary();
    assert_eq!(summary.correct, Some(1));
    assert_eq!(summary.reviewed, 2);
}

#[test]
fn shuffled_session_serves_the_same_batch() {
    let mut store = CardStore::in_memory();
    let mut log = ReviewLog::in_memory();
    let mut ids: Vec<_> = (0..8)
        .map(|i| store.add(format!("q{i}"), "a", None).unwrap().id().clone())
        .collect();

    let mut session = SessionRunner::new(
        &mut store,
        &mut log,
        PlainScoring::default(),
        SessionOptions {
            limit: 8,
            shuffle: true,
        },
    );
    let mut served = Vec::new();
    while let Some(card) = session.next_card() {
        served.push(card.id().clone());
    }
    served.sort();
    ids.sort();
    assert_eq!(served, ids);
}

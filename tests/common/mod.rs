//! Store behavior shared by every backend's integration tests

#![allow(dead_code)]

use a3s_calendar::{CalendarError, Event, EventStore};
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::Arc;
use uuid::Uuid;

pub fn at(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
        .single()
        .expect("valid test timestamp")
}

pub fn event(title: &str, start: DateTime<Utc>) -> Event {
    Event::new(title, "", start, start + Duration::minutes(30), Uuid::new_v4())
}

fn titles(events: &[Event]) -> Vec<&str> {
    events.iter().map(|e| e.title.as_str()).collect()
}

pub async fn crud(store: &dyn EventStore) {
    let original = event("Planning", at(2024, 2, 5, 10, 0, 0));
    store.create(&original).await.unwrap();

    let err = store.create(&original).await.unwrap_err();
    assert!(matches!(err, CalendarError::AlreadyExists(id) if id == original.id));

    assert_eq!(store.get(original.id).await.unwrap(), original);

    let mut replacement = original.clone().with_id(Uuid::new_v4());
    replacement.title = "Planning (moved)".to_string();
    replacement.start_time = at(2024, 2, 6, 10, 0, 0);
    store.update(original.id, &replacement).await.unwrap();

    let stored = store.get(original.id).await.unwrap();
    assert_eq!(stored.id, original.id);
    assert_eq!(stored.title, "Planning (moved)");
    assert_eq!(stored.start_time, at(2024, 2, 6, 10, 0, 0));

    store.delete(original.id).await.unwrap();
    let missing = original.id;
    assert!(matches!(store.get(missing).await, Err(CalendarError::NotFound(id)) if id == missing));
    assert!(matches!(store.delete(missing).await, Err(CalendarError::NotFound(_))));
    assert!(matches!(
        store.update(missing, &replacement).await,
        Err(CalendarError::NotFound(_))
    ));
}

pub async fn day_boundaries(store: &dyn EventStore) {
    for (title, start) in [
        ("midnight", at(2024, 3, 10, 0, 0, 0)),
        ("first-second", at(2024, 3, 10, 0, 0, 1)),
        ("last-second", at(2024, 3, 10, 23, 59, 59)),
        ("next-midnight", at(2024, 3, 11, 0, 0, 0)),
        ("day-before", at(2024, 3, 9, 12, 0, 0)),
    ] {
        store.create(&event(title, start)).await.unwrap();
    }

    let day = store.list_by_day(at(2024, 3, 10, 15, 30, 0)).await.unwrap();
    assert_eq!(titles(&day), ["first-second", "last-second"]);
}

pub async fn week_boundaries(store: &dyn EventStore) {
    let start = at(2024, 6, 3, 8, 0, 0);
    for (title, offset) in [
        ("at-start", Duration::zero()),
        ("inside", Duration::days(3)),
        ("just-before-end", Duration::days(7) - Duration::seconds(1)),
        ("at-end", Duration::days(7)),
    ] {
        store.create(&event(title, start + offset)).await.unwrap();
    }

    let week = store.list_by_week(start).await.unwrap();
    assert_eq!(titles(&week), ["inside", "just-before-end"]);
}

pub async fn month_boundaries(store: &dyn EventStore) {
    for (title, start) in [
        ("at-start", at(2024, 9, 1, 0, 0, 0)),
        ("mid", at(2024, 9, 15, 9, 0, 0)),
        ("last-day", at(2024, 9, 30, 23, 0, 0)),
        ("next-month", at(2024, 10, 1, 0, 0, 0)),
    ] {
        store.create(&event(title, start)).await.unwrap();
    }

    let month = store.list_by_month(at(2024, 9, 1, 0, 0, 0)).await.unwrap();
    assert_eq!(titles(&month), ["mid", "last-day"]);
}

pub async fn prune(store: &dyn EventStore) {
    let cutoff = at(1995, 1, 1, 0, 0, 0);
    let mut old = event("old", at(1994, 12, 31, 0, 0, 0));
    old.end_time = cutoff - Duration::seconds(1);
    let mut boundary = event("boundary", at(1994, 12, 31, 12, 0, 0));
    boundary.end_time = cutoff;
    let kept = event("kept", at(1995, 1, 2, 0, 0, 0));
    for e in [&old, &boundary, &kept] {
        store.create(e).await.unwrap();
    }

    assert_eq!(store.prune_before(cutoff).await.unwrap(), 1);
    assert!(matches!(store.get(old.id).await, Err(CalendarError::NotFound(_))));
    assert_eq!(store.get(boundary.id).await.unwrap(), boundary);
    assert_eq!(store.get(kept.id).await.unwrap(), kept);

    assert_eq!(store.prune_before(cutoff).await.unwrap(), 0);
    assert!(store.list_all().await.unwrap().iter().all(|e| e.id != old.id));
}

pub async fn concurrent_creates(store: Arc<dyn EventStore>) {
    const TASKS: usize = 8;
    const PER_TASK: usize = 25;

    let before = store.list_all().await.unwrap().len();

    let mut handles = Vec::new();
    for task in 0..TASKS {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            for i in 0..PER_TASK {
                let offset = Duration::minutes((task * PER_TASK + i) as i64);
                let start = at(2025, 1, 1, 0, 0, 0) + offset;
                store.create(&event(&format!("task-{task}-{i}"), start)).await.unwrap();
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let all = store.list_all().await.unwrap();
    assert_eq!(all.len(), before + TASKS * PER_TASK);
}

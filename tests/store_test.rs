//! Event store tests: upsert/remove idempotence, ordering, snapshot seeding.

mod common;

use eventhub_client_core::EventStore;
use pretty_assertions::assert_eq;

#[test]
fn upsert_inserts_then_replaces_in_place() {
    let store = EventStore::new();
    store.upsert(common::event("e1", "Alpha", "u1"));
    store.upsert(common::event("e2", "Beta", "u1"));

    let mut renamed = common::event("e1", "Alpha Renamed", "u1");
    renamed.is_private = true;
    store.upsert(renamed);

    let all = store.all();
    assert_eq!(common::ids(&all), vec!["e1", "e2"], "replace keeps position");
    assert_eq!(all[0].name, "Alpha Renamed");
    assert!(all[0].is_private);
}

#[test]
fn upsert_twice_equals_upsert_once() {
    let store = EventStore::new();
    let event = common::event("e1", "Alpha", "u1");
    store.upsert(event.clone());
    let once = store.all();

    store.upsert(event);
    assert_eq!(store.all(), once);
}

#[test]
fn remove_is_idempotent_and_reports_presence() {
    let store = EventStore::new();
    store.upsert(common::event("e1", "Alpha", "u1"));

    assert!(store.remove("e1"));
    assert!(!store.remove("e1"), "second remove is a no-op");
    assert!(!store.remove("never-there"));
    assert!(store.is_empty());
}

#[test]
fn get_returns_cloned_record_by_id() {
    let store = EventStore::new();
    store.upsert(common::event("e1", "Alpha", "u1"));

    assert_eq!(store.get("e1").map(|e| e.name), Some("Alpha".to_string()));
    assert!(store.get("e2").is_none());
}

#[test]
fn replace_all_collapses_duplicate_ids_last_record_wins() {
    let store = EventStore::new();
    store.upsert(common::event("old", "Stale", "u1"));

    store.replace_all(vec![
        common::event("e1", "First", "u1"),
        common::event("e2", "Other", "u1"),
        common::event("e1", "Second", "u1"),
    ]);

    let all = store.all();
    assert_eq!(common::ids(&all), vec!["e1", "e2"], "old contents replaced");
    assert_eq!(all[0].name, "Second");
}

#[test]
fn ids_are_opaque_strings() {
    let store = EventStore::new();
    let id = uuid::Uuid::new_v4().to_string();
    store.upsert(common::event(&id, "Generated", "u1"));

    assert_eq!(store.len(), 1);
    assert!(store.get(&id).is_some());
}

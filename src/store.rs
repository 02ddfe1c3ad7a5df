//! In-memory event collection: the single source of truth for every read-side
//! derivation. Insertion-ordered, keyed by event id, one short critical
//! section per operation so a concurrent read never observes a half-applied
//! mutation.

use std::sync::Mutex;

use crate::models::Event;

pub struct EventStore {
    events: Mutex<Vec<Event>>,
}

fn upsert_into(list: &mut Vec<Event>, event: Event) {
    match list.iter_mut().find(|e| e.id == event.id) {
        Some(slot) => *slot = event,
        None => list.push(event),
    }
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Insert or full-record replace by id. Idempotent: replaying the same
    /// record leaves the store unchanged, and existing records keep their
    /// position so projection order stays deterministic.
    pub fn upsert(&self, event: Event) {
        let mut list = self.events.lock().unwrap();
        upsert_into(&mut list, event);
    }

    /// Remove by id. Returns false (and changes nothing) when absent.
    pub fn remove(&self, id: &str) -> bool {
        let mut list = self.events.lock().unwrap();
        let before = list.len();
        list.retain(|e| e.id != id);
        list.len() != before
    }

    pub fn get(&self, id: &str) -> Option<Event> {
        let list = self.events.lock().unwrap();
        list.iter().find(|e| e.id == id).cloned()
    }

    /// Cloned snapshot of the collection. Order is stable until the next
    /// mutation; no guarantee beyond that.
    pub fn all(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    /// Replace the whole collection (snapshot seed). Duplicate ids in the
    /// input collapse to the last record, keeping the id-uniqueness invariant.
    pub fn replace_all(&self, events: Vec<Event>) {
        let mut list = self.events.lock().unwrap();
        list.clear();
        for event in events {
            upsert_into(&mut list, event);
        }
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap().is_empty()
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}

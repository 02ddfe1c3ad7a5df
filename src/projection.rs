//! Pure read-side derivations: filtering, sorting, and the dashboard stats.
//! No side effects; recomputed on demand from a store snapshot, never
//! maintained incrementally.

use chrono::{DateTime, NaiveDate, Utc};

use crate::auth::Identity;
use crate::models::Event;

/// Four independent predicates combined by AND. Empty search and empty
/// category match everything; `private_only = false` matches both private and
/// public events (there is deliberately no "public only" mode).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterCriteria {
    pub search: String,
    pub category: String,
    pub date: Option<NaiveDate>,
    pub private_only: bool,
}

impl FilterCriteria {
    pub fn matches(&self, event: &Event) -> bool {
        let search = self.search.to_lowercase();
        let matches_search = search.is_empty()
            || event.name.to_lowercase().contains(&search)
            || event.description.to_lowercase().contains(&search);
        let matches_category = self.category.is_empty() || event.category == self.category;
        let matches_date = self
            .date
            .map_or(true, |day| event.date.date_naive() == day);
        let matches_privacy = !self.private_only || event.is_private;
        matches_search && matches_category && matches_date && matches_privacy
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Name,
    Popularity,
}

impl SortKey {
    /// UI sort selector values. Unrecognized input yields `None`, which sorts
    /// nothing (input order preserved).
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "date" => Some(SortKey::Date),
            "name" => Some(SortKey::Name),
            "popularity" => Some(SortKey::Popularity),
            _ => None,
        }
    }
}

/// Stable in-place sort. Equal-key elements keep their relative input order,
/// so repeated renders of an unchanged store are byte-for-byte identical.
pub fn sort_events(events: &mut [Event], key: Option<SortKey>) {
    let Some(key) = key else { return };
    match key {
        SortKey::Date => events.sort_by_key(|e| e.date),
        SortKey::Name => {
            events.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
        }
        SortKey::Popularity => events.sort_by(|a, b| b.attendees.len().cmp(&a.attendees.len())),
    }
}

/// Filter then sort a store snapshot for rendering.
pub fn project(events: &[Event], filter: &FilterCriteria, sort: Option<SortKey>) -> Vec<Event> {
    let mut out: Vec<Event> = events.iter().filter(|e| filter.matches(e)).cloned().collect();
    sort_events(&mut out, sort);
    out
}

/// Dashboard counters. Recomputed, never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
    pub hosting: usize,
    pub attending: usize,
    pub upcoming: usize,
}

/// A guest viewer gets all zeros; `now` is passed in so callers and tests
/// agree on the evaluation instant.
pub fn compute_stats(events: &[Event], identity: Option<&Identity>, now: DateTime<Utc>) -> Stats {
    let Some(identity) = identity else {
        return Stats::default();
    };
    let user_id = identity.user_id.as_str();
    Stats {
        hosting: events.iter().filter(|e| e.owner_id == user_id).count(),
        attending: events
            .iter()
            .filter(|e| e.attendees.iter().any(|a| a.user_id() == Some(user_id)))
            .count(),
        upcoming: events.iter().filter(|e| e.date > now).count(),
    }
}

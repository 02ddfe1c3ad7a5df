//! EventHub client core: the synchronization and derivation engine behind the
//! event dashboard.
//!
//! Two independent channels feed one canonical in-memory collection: a
//! one-shot bulk snapshot ([`ApiClient::fetch_events`]) and an incremental
//! push stream of create/update/delete deltas. [`EventSession`] owns the
//! merge: stream deltas that arrive before the snapshot resolves are buffered
//! and replayed in arrival order on top of it, so no concurrent update is
//! lost regardless of which channel finishes first.
//!
//! Everything downstream is a pure derivation over a store snapshot:
//! [`projection::project`] (filter + stable sort), [`projection::compute_stats`]
//! (hosting/attending/upcoming counters), and [`auth::capabilities_for`]
//! (per-event UI capability flags from the unverified bearer credential;
//! advisory only, the server is the real authorization boundary).

pub mod api;
pub mod auth;
pub mod dates;
pub mod error;
pub mod models;
pub mod projection;
pub mod session;
pub mod store;
pub mod stream;

pub use api::ApiClient;
pub use auth::{
    can_view_details, capabilities_for, is_attending, is_owner, resolve_identity, Capabilities,
    Identity,
};
pub use error::{ClientError, MutationOp};
pub use models::{Attendee, Event, EventDraft};
pub use projection::{compute_stats, project, sort_events, FilterCriteria, SortKey, Stats};
pub use session::{Delta, EventSession};
pub use store::EventStore;

/// Backend endpoints for one deployment. Constructor-injected everywhere;
/// nothing in this crate reads ambient global configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    pub ws_url: String,
}

impl Config {
    pub fn new(base_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_url: ws_url.into(),
        }
    }
}

//! The viewing session: owns the credential, the resolved identity, the
//! canonical store, the pre-snapshot delta buffer, and the push-channel task.
//! Everything that used to be ambient global state is explicit here and dies
//! with the session.

use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::auth::{self, Identity};
use crate::error::ClientError;
use crate::models::{Attendee, Event, EventDraft};
use crate::store::EventStore;
use crate::stream;
use crate::Config;

/// A normalized push-channel message. `Created`/`Updated`/`Deleted` is the
/// unified model; `AttendeesChanged` is the legacy attendee-only wire shape,
/// kept distinct until apply time because translating it into a full-record
/// replace needs the stored record.
#[derive(Clone, Debug, PartialEq)]
pub enum Delta {
    Created(Event),
    Updated(Event),
    Deleted(String),
    AttendeesChanged {
        event_id: String,
        attendees: Vec<Attendee>,
    },
}

/// Stream messages that arrive before the snapshot resolves are buffered and
/// replayed, in arrival order, on top of the applied snapshot. A naive
/// last-write-wins merge would drop them.
enum Phase {
    Loading { buffered: Vec<Delta> },
    Live,
}

pub struct EventSession {
    config: Config,
    credential: Mutex<Option<String>>,
    identity: Mutex<Option<Identity>>,
    store: EventStore,
    phase: Mutex<Phase>,
    stream_task: Mutex<Option<JoinHandle<()>>>,
}

impl EventSession {
    /// A fresh session with an empty store. The identity is resolved once
    /// from the credential; both are dropped together on [`clear_credential`].
    ///
    /// [`clear_credential`]: EventSession::clear_credential
    pub fn new(config: Config, credential: Option<String>) -> Self {
        let identity = credential.as_deref().and_then(auth::resolve_identity);
        Self {
            config,
            credential: Mutex::new(credential),
            identity: Mutex::new(identity),
            store: EventStore::new(),
            phase: Mutex::new(Phase::Loading {
                buffered: Vec::new(),
            }),
            stream_task: Mutex::new(None),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.identity.lock().unwrap().clone()
    }

    pub fn credential(&self) -> Option<String> {
        self.credential.lock().unwrap().clone()
    }

    pub fn store(&self) -> &EventStore {
        &self.store
    }

    /// Snapshot of the canonical collection for projection.
    pub fn events(&self) -> Vec<Event> {
        self.store.all()
    }

    /// Subscribe to the push channel, then load the snapshot. Stream and
    /// snapshot race; [`ingest`] buffers whatever the stream delivers first.
    /// A stream connect failure is logged and tolerated (live updates are an
    /// enhancement); a snapshot failure is returned.
    ///
    /// [`ingest`]: EventSession::ingest
    pub async fn start(self: &Arc<Self>, api: &ApiClient) -> Result<usize, ClientError> {
        if let Err(e) = self.connect_stream().await {
            tracing::warn!("push channel unavailable, continuing without live updates: {}", e);
        }
        self.load_snapshot(api).await
    }

    /// Open the websocket subscription with the held credential and spawn the
    /// consumer task. Guests (no credential) get no subscription, matching the
    /// server, which rejects unauthenticated connects.
    pub async fn connect_stream(self: &Arc<Self>) -> Result<(), ClientError> {
        let credential = match self.credential() {
            Some(c) => c,
            None => {
                tracing::debug!("no credential held, skipping stream subscription");
                return Ok(());
            }
        };
        let url = stream::subscribe_url(&self.config.ws_url, &credential);
        let socket = stream::connect(&url).await?;
        let session = Arc::clone(self);
        let handle = tokio::spawn(stream::run(session, socket));
        if let Some(previous) = self.stream_task.lock().unwrap().replace(handle) {
            previous.abort();
        }
        Ok(())
    }

    /// Fetch the full collection and apply it as the snapshot. When the fetch
    /// was authenticated, a 401 clears the credential like any other
    /// authenticated call.
    pub async fn load_snapshot(&self, api: &ApiClient) -> Result<usize, ClientError> {
        let credential = self.credential();
        match api.fetch_events(credential.as_deref()).await {
            Ok(events) => Ok(self.apply_snapshot(events)),
            Err(e) if credential.is_some() => Err(self.after_authenticated_call(e)),
            Err(e) => Err(e),
        }
    }

    /// Seed the store from a completed snapshot and replay any buffered
    /// stream deltas in their arrival order. Runs under the phase lock so no
    /// reader ever observes the snapshot without the replayed deltas and no
    /// concurrently ingested delta is lost. Returns the resulting store size.
    pub fn apply_snapshot(&self, events: Vec<Event>) -> usize {
        let mut phase = self.phase.lock().unwrap();
        self.store.replace_all(events);
        if let Phase::Loading { buffered } = &mut *phase {
            let buffered = std::mem::take(buffered);
            if !buffered.is_empty() {
                tracing::info!(
                    "snapshot applied, replaying {} buffered stream deltas",
                    buffered.len()
                );
            }
            for delta in buffered {
                self.apply_delta(delta);
            }
        }
        *phase = Phase::Live;
        self.store.len()
    }

    /// Apply one stream delta, or buffer it while the snapshot is pending.
    /// Deltas are applied strictly in the order this is called.
    pub fn ingest(&self, delta: Delta) {
        let mut phase = self.phase.lock().unwrap();
        match &mut *phase {
            Phase::Loading { buffered } => {
                tracing::debug!("snapshot pending, buffering stream delta");
                buffered.push(delta);
            }
            Phase::Live => self.apply_delta(delta),
        }
    }

    fn apply_delta(&self, delta: Delta) {
        match delta {
            // A Created for a known id repairs a missed delete; an Updated
            // for an unknown id repairs a missed create. Both are upserts.
            Delta::Created(event) | Delta::Updated(event) => self.store.upsert(event),
            Delta::Deleted(id) => {
                if !self.store.remove(&id) {
                    tracing::debug!("delete for unknown event {}, ignoring", id);
                }
            }
            Delta::AttendeesChanged {
                event_id,
                attendees,
            } => match self.store.get(&event_id) {
                Some(mut event) => {
                    event.attendees = attendees;
                    self.store.upsert(event);
                }
                None => {
                    tracing::warn!("attendee delta for unknown event {}, dropping", event_id);
                }
            },
        }
    }

    /// Cancel the push-channel subscription. Called on session end and on
    /// credential clearing; without it the consumer task would keep mutating
    /// a discarded store.
    pub fn close(&self) {
        if let Some(handle) = self.stream_task.lock().unwrap().take() {
            handle.abort();
            tracing::info!("stream subscription cancelled");
        }
    }

    /// Drop the held credential and identity and tear the stream down. The
    /// viewer must re-authenticate; invoked automatically when the server
    /// answers an authenticated call with 401.
    pub fn clear_credential(&self) {
        *self.credential.lock().unwrap() = None;
        *self.identity.lock().unwrap() = None;
        self.close();
        tracing::info!("credential cleared, re-authentication required");
    }

    fn require_credential(&self) -> Result<String, ClientError> {
        self.credential().ok_or(ClientError::Unauthorized)
    }

    fn after_authenticated_call(&self, err: ClientError) -> ClientError {
        if err.is_unauthorized() {
            self.clear_credential();
        }
        err
    }

    /// Create an event and reflect the server's record locally right away.
    /// The stream echo of the same record is an idempotent upsert.
    pub async fn create_event(
        &self,
        api: &ApiClient,
        draft: &EventDraft,
    ) -> Result<Event, ClientError> {
        let credential = self.require_credential()?;
        let event = api
            .create_event(&credential, draft)
            .await
            .map_err(|e| self.after_authenticated_call(e))?;
        self.store.upsert(event.clone());
        Ok(event)
    }

    pub async fn update_event(
        &self,
        api: &ApiClient,
        id: &str,
        draft: &EventDraft,
    ) -> Result<Event, ClientError> {
        let credential = self.require_credential()?;
        let event = api
            .update_event(&credential, id, draft)
            .await
            .map_err(|e| self.after_authenticated_call(e))?;
        self.store.upsert(event.clone());
        Ok(event)
    }

    pub async fn delete_event(&self, api: &ApiClient, id: &str) -> Result<(), ClientError> {
        let credential = self.require_credential()?;
        api.delete_event(&credential, id)
            .await
            .map_err(|e| self.after_authenticated_call(e))?;
        self.store.remove(id);
        Ok(())
    }

    pub async fn add_attendee(
        &self,
        api: &ApiClient,
        id: &str,
        email: &str,
    ) -> Result<Event, ClientError> {
        let credential = self.require_credential()?;
        let event = api
            .add_attendee(&credential, id, email)
            .await
            .map_err(|e| self.after_authenticated_call(e))?;
        self.store.upsert(event.clone());
        Ok(event)
    }

    pub async fn join_event(&self, api: &ApiClient, id: &str) -> Result<Event, ClientError> {
        let credential = self.require_credential()?;
        let event = api
            .join_event(&credential, id)
            .await
            .map_err(|e| self.after_authenticated_call(e))?;
        self.store.upsert(event.clone());
        Ok(event)
    }
}

impl Drop for EventSession {
    fn drop(&mut self) {
        self.close();
    }
}

//! HTTP client for the events API (snapshot, single fetch, mutations).
//! Wire records normalize at this boundary; callers only ever see the
//! canonical model. No retry or backoff: each failure surfaces once.

use std::time::Duration;

use chrono::Utc;
use once_cell::sync::Lazy;

use crate::error::{ClientError, MutationOp};
use crate::models::wire::WireEvent;
use crate::models::{is_valid_email, Event, EventDraft};

static CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()
        .expect("reqwest client")
});

fn mutation_err(op: MutationOp, message: impl Into<String>) -> ClientError {
    ClientError::MutationFailed {
        op,
        message: message.into(),
    }
}

pub struct ApiClient {
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET /api/events/all: the one-shot bulk snapshot. The credential is
    /// optional; guests get the public collection. Malformed records are
    /// skipped with a warning rather than failing the whole snapshot.
    pub async fn fetch_events(&self, credential: Option<&str>) -> Result<Vec<Event>, ClientError> {
        let url = self.url("/api/events/all");
        let mut request = CLIENT.get(&url);
        if let Some(token) = credential {
            request = request.bearer_auth(token);
        }
        let resp = request
            .send()
            .await
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?;
        if status.as_u16() == 401 {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ClientError::FetchFailed(format!("{} {}", status, text)));
        }
        let records: Vec<WireEvent> =
            serde_json::from_str(&text).map_err(|e| ClientError::FetchFailed(e.to_string()))?;
        let total = records.len();
        let mut events = Vec::with_capacity(total);
        for record in records {
            match record.normalize() {
                Some(event) => events.push(event),
                None => tracing::warn!("skipping malformed event record in snapshot"),
            }
        }
        tracing::info!("snapshot fetched: {} of {} records admitted", events.len(), total);
        Ok(events)
    }

    /// GET /api/events/{id}: single fetch, no credential required.
    pub async fn fetch_event(&self, id: &str) -> Result<Event, ClientError> {
        let url = self.url(&format!("/api/events/{}", id));
        let resp = CLIENT
            .get(&url)
            .send()
            .await
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ClientError::FetchFailed(e.to_string()))?;
        if status.as_u16() == 401 {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ClientError::FetchFailed(format!("{} {}", status, text)));
        }
        let record: WireEvent =
            serde_json::from_str(&text).map_err(|e| ClientError::FetchFailed(e.to_string()))?;
        record
            .normalize()
            .ok_or_else(|| ClientError::FetchFailed("malformed event record".to_string()))
    }

    /// POST /api/events/create. Client-side validation first: the date must
    /// not be in the past and invited emails must be well-formed and unique.
    pub async fn create_event(
        &self,
        credential: &str,
        draft: &EventDraft,
    ) -> Result<Event, ClientError> {
        if draft.date < Utc::now() {
            return Err(ClientError::ValidationFailed(
                "event date cannot be in the past".to_string(),
            ));
        }
        validate_invited(&draft.invited)?;
        let body = draft_payload(draft);
        let resp = CLIENT
            .post(&self.url("/api/events/create"))
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| mutation_err(MutationOp::Create, e.to_string()))?;
        event_response(resp, MutationOp::Create).await
    }

    /// PUT /api/events/update/{id}: full-record update.
    pub async fn update_event(
        &self,
        credential: &str,
        id: &str,
        draft: &EventDraft,
    ) -> Result<Event, ClientError> {
        validate_invited(&draft.invited)?;
        let body = draft_payload(draft);
        let resp = CLIENT
            .put(&self.url(&format!("/api/events/update/{}", id)))
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| mutation_err(MutationOp::Update, e.to_string()))?;
        event_response(resp, MutationOp::Update).await
    }

    /// DELETE /api/events/delete/{id}.
    pub async fn delete_event(&self, credential: &str, id: &str) -> Result<(), ClientError> {
        let resp = CLIENT
            .delete(&self.url(&format!("/api/events/delete/{}", id)))
            .bearer_auth(credential)
            .send()
            .await
            .map_err(|e| mutation_err(MutationOp::Delete, e.to_string()))?;
        let status = resp.status();
        if status.as_u16() == 401 {
            return Err(ClientError::Unauthorized);
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(mutation_err(MutationOp::Delete, format!("{} {}", status, text)));
        }
        Ok(())
    }

    /// PUT /api/events/add/{id} with `{"attendee": email}`: owner invites a
    /// party by email. Email validated client-side first.
    pub async fn add_attendee(
        &self,
        credential: &str,
        id: &str,
        email: &str,
    ) -> Result<Event, ClientError> {
        if !is_valid_email(email) {
            return Err(ClientError::ValidationFailed(format!(
                "invalid attendee email: {}",
                email
            )));
        }
        let body = serde_json::json!({ "attendee": email });
        let resp = CLIENT
            .put(&self.url(&format!("/api/events/add/{}", id)))
            .bearer_auth(credential)
            .json(&body)
            .send()
            .await
            .map_err(|e| mutation_err(MutationOp::AddAttendee, e.to_string()))?;
        event_response(resp, MutationOp::AddAttendee).await
    }

    /// POST /api/events/join/{id}: the viewer registers themselves.
    pub async fn join_event(&self, credential: &str, id: &str) -> Result<Event, ClientError> {
        let resp = CLIENT
            .post(&self.url(&format!("/api/events/join/{}", id)))
            .bearer_auth(credential)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| mutation_err(MutationOp::Join, e.to_string()))?;
        event_response(resp, MutationOp::Join).await
    }
}

fn validate_invited(invited: &[String]) -> Result<(), ClientError> {
    for (i, email) in invited.iter().enumerate() {
        if !is_valid_email(email) {
            return Err(ClientError::ValidationFailed(format!(
                "invalid attendee email: {}",
                email
            )));
        }
        if invited[..i].iter().any(|prev| prev.eq_ignore_ascii_case(email)) {
            return Err(ClientError::ValidationFailed(format!(
                "duplicate attendee email: {}",
                email
            )));
        }
    }
    Ok(())
}

/// The server's create/update payload. Invited emails expand into the
/// structured attendee shape the current schema stores.
fn draft_payload(draft: &EventDraft) -> serde_json::Value {
    let attendees: Vec<serde_json::Value> = draft
        .invited
        .iter()
        .map(|email| {
            serde_json::json!({
                "email": email,
                "registered": false,
                "userId": null
            })
        })
        .collect();
    let mut body = serde_json::json!({
        "name": draft.name,
        "description": draft.description,
        "date": draft.date.to_rfc3339(),
        "location": draft.location,
        "category": draft.category,
        "isPrivate": draft.is_private,
        "attendees": attendees,
    });
    if let Some(url) = &draft.image_url {
        body["imageUrl"] = serde_json::json!(url);
    }
    body
}

/// Shared mutation-response handling: 401 clears nothing here (the session
/// does that), other failures map to the operation's sub-kind, and the
/// resulting record normalizes like any other ingested event.
async fn event_response(resp: reqwest::Response, op: MutationOp) -> Result<Event, ClientError> {
    let status = resp.status();
    let text = resp
        .text()
        .await
        .map_err(|e| mutation_err(op, e.to_string()))?;
    if status.as_u16() == 401 {
        return Err(ClientError::Unauthorized);
    }
    if !status.is_success() {
        return Err(mutation_err(op, format!("{} {}", status, text)));
    }
    let record: WireEvent =
        serde_json::from_str(&text).map_err(|e| mutation_err(op, e.to_string()))?;
    record
        .normalize()
        .ok_or_else(|| mutation_err(op, "malformed event record in response"))
}

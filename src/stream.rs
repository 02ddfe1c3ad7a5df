//! Push-channel consumer: websocket subscription, wire-frame decoding, and
//! the read loop feeding [`EventSession::ingest`].
//!
//! Three wire generations exist and all decode into the unified
//! [`Delta`] model: the current `event-*` tags, the older `new-event` /
//! `update-event` / `delete-event` tags (same payloads), and the attendee-only
//! `attendees-changed` frame.
//!
//! [`EventSession::ingest`]: crate::EventSession::ingest

use std::sync::Arc;

use futures_util::StreamExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::error::ClientError;
use crate::models::wire::{self, WireEvent};
use crate::models::Event;
use crate::session::{Delta, EventSession};

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Subscription endpoint with the credential as a query parameter, the way
/// the gateway accepts it.
pub(crate) fn subscribe_url(ws_url: &str, credential: &str) -> String {
    format!(
        "{}/ws?token={}",
        ws_url.trim_end_matches('/'),
        urlencoding::encode(credential)
    )
}

pub(crate) async fn connect(url: &str) -> Result<WsStream, ClientError> {
    let (socket, _response) = connect_async(url)
        .await
        .map_err(|e| ClientError::StreamFailed(e.to_string()))?;
    Ok(socket)
}

/// Decode one inbound text frame. `None` for frames that carry nothing
/// applicable: unknown types, malformed JSON, or records the normalizer
/// rejects (all logged, never fatal).
pub fn decode(text: &str) -> Option<Delta> {
    let value: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!("undecodable stream frame, skipping: {}", e);
            return None;
        }
    };
    let kind = value.get("type").and_then(|v| v.as_str())?;
    let payload = value
        .get("payload")
        .or_else(|| value.get("data"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    match kind {
        "event-created" | "new-event" => decode_event(payload).map(Delta::Created),
        "event-updated" | "update-event" => decode_event(payload).map(Delta::Updated),
        "event-deleted" | "delete-event" => decode_deleted_id(&payload).map(Delta::Deleted),
        "attendees-changed" => decode_attendees_changed(payload),
        other => {
            tracing::debug!("unknown stream frame type {:?}, skipping", other);
            None
        }
    }
}

fn decode_event(payload: serde_json::Value) -> Option<Event> {
    let raw: WireEvent = match serde_json::from_value(payload) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::warn!("malformed event payload in stream frame, skipping: {}", e);
            return None;
        }
    };
    let normalized = raw.normalize();
    if normalized.is_none() {
        tracing::warn!("stream event record failed normalization, skipping");
    }
    normalized
}

/// Delete frames carried either the bare id string or a `{_id}` object.
fn decode_deleted_id(payload: &serde_json::Value) -> Option<String> {
    if let Some(id) = payload.as_str() {
        return Some(id.to_string());
    }
    payload
        .get("_id")
        .or_else(|| payload.get("id"))
        .and_then(|v| v.as_str())
        .map(String::from)
}

fn decode_attendees_changed(payload: serde_json::Value) -> Option<Delta> {
    let event_id = payload
        .get("eventId")
        .or_else(|| payload.get("event_id"))
        .and_then(|v| v.as_str())
        .map(String::from)?;
    let raw: Vec<wire::WireAttendee> =
        serde_json::from_value(payload.get("attendees").cloned().unwrap_or_default()).ok()?;
    Some(Delta::AttendeesChanged {
        event_id,
        attendees: wire::normalize_attendees(raw),
    })
}

/// Read loop: every decoded frame goes to the session in arrival order. Ends
/// on close or read error; there is no automatic reconnect.
pub(crate) async fn run(session: Arc<EventSession>, mut socket: WsStream) {
    tracing::info!("stream connected");
    while let Some(message) = socket.next().await {
        match message {
            Ok(Message::Text(text)) => {
                if let Some(delta) = decode(&text) {
                    session.ingest(delta);
                }
            }
            Ok(Message::Close(_)) => {
                tracing::info!("stream closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("stream read error: {}", e);
                break;
            }
        }
    }
    tracing::info!("stream consumer stopped (no automatic reconnect)");
}

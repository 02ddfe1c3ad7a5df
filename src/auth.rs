//! Viewer identity and per-event capability flags.
//!
//! The credential is an opaque compact token; we decode its middle segment
//! locally to read the claimed user id. No signature or expiry check happens
//! here: everything derived from it is UI hinting, the server re-checks every
//! mutation.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine as _;
use serde::Deserialize;

use crate::models::Event;

/// The viewer's claimed identity for this session. Ephemeral, never persisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
}

#[derive(Deserialize)]
struct Claims {
    #[serde(rename = "userId", alias = "user_id")]
    user_id: String,
}

/// Extract the claimed user id from a bearer credential. Never fails: a
/// missing, truncated, or undecodable token yields `None` and the viewer is
/// treated as a guest.
pub fn resolve_identity(credential: &str) -> Option<Identity> {
    let payload = credential.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD
        .decode(payload)
        .or_else(|_| STANDARD.decode(payload))
        .ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    if claims.user_id.is_empty() {
        return None;
    }
    Some(Identity {
        user_id: claims.user_id,
    })
}

/// Whether the viewer claims to own the event. False for guests.
pub fn is_owner(event: &Event, identity: Option<&Identity>) -> bool {
    identity.map_or(false, |identity| event.owner_id == identity.user_id)
}

/// Whether the viewer is on the attendee list as a registered user.
pub fn is_attending(event: &Event, identity: Option<&Identity>) -> bool {
    identity.map_or(false, |identity| {
        event
            .attendees
            .iter()
            .any(|a| a.user_id() == Some(identity.user_id.as_str()))
    })
}

/// Private events hide their detail from unauthenticated non-owners; such a
/// viewer gets a restricted placeholder instead of the event body. Any
/// authenticated viewer (owner or not) sees the full detail.
pub fn can_view_details(event: &Event, identity: Option<&Identity>) -> bool {
    !(event.is_private && identity.is_none() && !is_owner(event, identity))
}

/// UI-advisory capability flags for one event and viewer. Not a security
/// boundary: the server is the real gate on every mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Capabilities {
    pub can_update: bool,
    pub can_delete: bool,
    pub can_add_attendee: bool,
    pub can_join: bool,
    pub can_view_details: bool,
}

pub fn capabilities_for(event: &Event, identity: Option<&Identity>) -> Capabilities {
    let owner = is_owner(event, identity);
    Capabilities {
        can_update: owner,
        can_delete: owner,
        can_add_attendee: owner,
        can_join: !owner && !is_attending(event, identity),
        can_view_details: can_view_details(event, identity),
    }
}

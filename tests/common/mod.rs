//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, TimeZone, Utc};
use eventhub_client_core::{Config, Event};

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 15, 18, 0, 0).unwrap()
}

pub fn config() -> Config {
    Config::new("http://127.0.0.1:1", "ws://127.0.0.1:1")
}

/// Minimal well-formed event; tests tweak fields directly.
pub fn event(id: &str, name: &str, owner_id: &str) -> Event {
    Event {
        id: id.to_string(),
        name: name.to_string(),
        description: format!("{} description", name),
        date: base_time(),
        location: "Main Hall".to_string(),
        category: "social".to_string(),
        image_url: None,
        is_private: false,
        owner_id: owner_id.to_string(),
        owner_name: None,
        contact_email: None,
        attendees: Vec::new(),
    }
}

/// Compact token whose middle segment decodes to `{"userId": ...}`: enough
/// for the unauthenticated client-side decode, no real signature.
pub fn token_for(user_id: &str) -> String {
    let payload = URL_SAFE_NO_PAD.encode(format!(r#"{{"userId":"{}"}}"#, user_id));
    format!("eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9.{}.test-signature", payload)
}

pub fn ids(events: &[Event]) -> Vec<String> {
    events.iter().map(|e| e.id.clone()).collect()
}

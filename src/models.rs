//! Data models for events and attendees.
//! Wire format (JSON from the REST API and the push channel) is messy across
//! schema versions; everything normalizes into these types at the ingestion
//! boundary and only the canonical shapes exist downstream.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// One party on an event's attendee list. Exactly one identifying field per
/// variant: a registered user is referenced by id, an invited-but-unregistered
/// party only by email.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Attendee {
    Registered { user_id: String },
    Invited { email: String },
}

impl Attendee {
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Attendee::Registered { user_id } => Some(user_id),
            Attendee::Invited { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Attendee::Registered { .. } => None,
            Attendee::Invited { email } => Some(email),
        }
    }
}

/// Canonical event record held in the store.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub image_url: Option<String>,
    pub is_private: bool,
    pub owner_id: String,
    /// Organiser display name when the server sent a populated owner object.
    pub owner_name: Option<String>,
    pub contact_email: Option<String>,
    pub attendees: Vec<Attendee>,
}

/// Client-side payload for create/update mutations. `invited` holds plain
/// email addresses; the API layer expands them into the server's attendee
/// shape.
#[derive(Clone, Debug, PartialEq)]
pub struct EventDraft {
    pub name: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    pub category: String,
    pub image_url: Option<String>,
    pub is_private: bool,
    pub invited: Vec<String>,
}

/// Same shape the signup forms accept: non-empty local part, one `@`, a domain
/// with a dot, no whitespace anywhere.
pub fn is_valid_email(s: &str) -> bool {
    let mut parts = s.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => (local, domain),
        _ => return false,
    };
    if local.is_empty() || local.chars().any(char::is_whitespace) {
        return false;
    }
    if domain.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Instant parsing for server dates: RFC 3339 first, then the naive
/// `datetime-local` shapes older records carry (assumed UTC).
pub(crate) fn parse_instant(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive.and_utc());
        }
    }
    None
}

/// Append `candidate` unless the list already carries the same party:
/// registered attendees are unique by user id, invited ones by
/// case-insensitive email. First occurrence wins.
pub(crate) fn push_unique_attendee(list: &mut Vec<Attendee>, candidate: Attendee) {
    let duplicate = list.iter().any(|existing| match (existing, &candidate) {
        (Attendee::Registered { user_id: a }, Attendee::Registered { user_id: b }) => a == b,
        (Attendee::Invited { email: a }, Attendee::Invited { email: b }) => {
            a.eq_ignore_ascii_case(b)
        }
        _ => false,
    });
    if !duplicate {
        list.push(candidate);
    }
}

pub(crate) mod wire {
    //! Raw serde shapes for the two historical schema versions, and their
    //! normalization into the canonical model. Nothing outside ingestion
    //! should touch these.

    use serde::Deserialize;

    use super::{parse_instant, push_unique_attendee, Attendee, Event};

    /// Owner field: either a bare id string or a populated user object.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub(crate) enum OwnerRef {
        Id(String),
        Object {
            #[serde(rename = "_id", alias = "id")]
            id: String,
            #[serde(default)]
            username: Option<String>,
        },
    }

    /// `userId` inside an attendee object: bare id or populated user object.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub(crate) enum UserRef {
        Id(String),
        Object {
            #[serde(rename = "_id", alias = "id")]
            id: String,
        },
    }

    impl UserRef {
        fn into_id(self) -> String {
            match self {
                UserRef::Id(id) | UserRef::Object { id } => id,
            }
        }
    }

    /// Attendee as the server sends it: the old schema used plain email
    /// strings, the new one structured objects.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub(crate) enum WireAttendee {
        Email(String),
        Object {
            #[serde(rename = "userId", default)]
            user_id: Option<UserRef>,
            #[serde(default)]
            email: Option<String>,
        },
    }

    impl WireAttendee {
        /// `None` when the record identifies nobody (no user id, no email).
        pub(crate) fn normalize(self) -> Option<Attendee> {
            match self {
                WireAttendee::Email(email) => {
                    if email.is_empty() {
                        None
                    } else {
                        Some(Attendee::Invited { email })
                    }
                }
                WireAttendee::Object { user_id, email } => match user_id {
                    Some(user) => Some(Attendee::Registered {
                        user_id: user.into_id(),
                    }),
                    None => email
                        .filter(|e| !e.is_empty())
                        .map(|email| Attendee::Invited { email }),
                },
            }
        }
    }

    /// Collapse a raw attendee list into the canonical de-duplicated one.
    pub(crate) fn normalize_attendees(raw: Vec<WireAttendee>) -> Vec<Attendee> {
        let mut attendees = Vec::with_capacity(raw.len());
        for record in raw {
            if let Some(attendee) = record.normalize() {
                push_unique_attendee(&mut attendees, attendee);
            }
        }
        attendees
    }

    #[derive(Debug, Deserialize)]
    pub(crate) struct WireEvent {
        #[serde(alias = "_id", default)]
        pub(crate) id: Option<String>,
        #[serde(default)]
        pub(crate) name: String,
        #[serde(default)]
        pub(crate) description: String,
        #[serde(default)]
        pub(crate) date: Option<String>,
        #[serde(default)]
        pub(crate) location: String,
        #[serde(default)]
        pub(crate) category: String,
        #[serde(rename = "imageUrl", default)]
        pub(crate) image_url: Option<String>,
        #[serde(rename = "isPrivate", default)]
        pub(crate) is_private: bool,
        #[serde(default)]
        pub(crate) owner: Option<OwnerRef>,
        #[serde(rename = "contactEmail", default)]
        pub(crate) contact_email: Option<String>,
        #[serde(default)]
        pub(crate) attendees: Vec<WireAttendee>,
    }

    impl WireEvent {
        /// `None` when the record cannot be admitted: no id, no owner, or a
        /// date that does not parse. The store never holds half-formed rows.
        pub(crate) fn normalize(self) -> Option<Event> {
            let id = self.id.filter(|id| !id.is_empty())?;
            let date = parse_instant(self.date.as_deref()?)?;
            let (owner_id, owner_name) = match self.owner? {
                OwnerRef::Id(id) => (id, None),
                OwnerRef::Object { id, username } => (id, username),
            };
            Some(Event {
                id,
                name: self.name,
                description: self.description,
                date,
                location: self.location,
                category: self.category,
                image_url: self.image_url,
                is_private: self.is_private,
                owner_id,
                owner_name,
                contact_email: self.contact_email,
                attendees: normalize_attendees(self.attendees),
            })
        }
    }
}

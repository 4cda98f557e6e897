//! Domain types and wire DTOs for the calendar API.
//!
//! # Design
//! `WireEvent` is the JSON shape the backend sends and accepts, with dates
//! as strings. `CalendarEvent` is the in-memory shape the stores hold, with
//! dates as `DateTime<Utc>`. Conversion between the two lives in
//! [`crate::dates`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// The authenticated user as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub uid: String,
    pub name: String,
}

/// Owner reference carried by every stored event.
///
/// The backend populates the owner document, which names the id `_id`;
/// locally merged events use `uid`. Both deserialize into the same field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventOwner {
    #[serde(alias = "_id")]
    pub uid: String,
    pub name: String,
}

impl From<&User> for EventOwner {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            name: user.name.clone(),
        }
    }
}

/// Login payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Registration payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Successful answer of `/auth`, `/auth/new` and `/auth/renew`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub ok: bool,
    pub uid: String,
    pub name: String,
    pub token: String,
}

impl AuthResponse {
    pub fn user(&self) -> User {
        User {
            uid: self.uid.clone(),
            name: self.name.clone(),
        }
    }
}

/// An event as it travels over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub start: String,
    pub end: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<EventOwner>,
}

/// An event held by the calendar store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    /// Server-assigned; `None` for drafts that were never saved.
    pub id: Option<String>,
    pub title: String,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub user: Option<EventOwner>,
}

/// Default length of a freshly drafted event.
pub const DRAFT_DURATION_HOURS: i64 = 2;

impl CalendarEvent {
    /// An unsaved event starting at `now`, owned by `owner`.
    pub fn draft(now: DateTime<Utc>, owner: Option<&User>) -> Self {
        Self {
            id: None,
            title: String::new(),
            notes: String::new(),
            start: now,
            end: now + Duration::hours(DRAFT_DURATION_HOURS),
            user: owner.map(EventOwner::from),
        }
    }

    pub fn is_saved(&self) -> bool {
        self.id.is_some()
    }

    pub fn is_owned_by(&self, user: &User) -> bool {
        self.user.as_ref().is_some_and(|owner| owner.uid == user.uid)
    }

    /// Check the invariants the backend also enforces.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.end < self.start {
            return Err(ValidationError::EndBeforeStart);
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        Ok(())
    }
}

/// Local rejection of an event before it reaches the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("The end date must be after the start date")]
    EndBeforeStart,

    #[error("The title is required")]
    MissingTitle,
}

/// Envelope of `GET /events`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventListResponse {
    #[serde(default)]
    pub ok: bool,
    pub events: Vec<WireEvent>,
}

/// Envelope of `POST /events`; only the assigned id is read back.
#[derive(Debug, Clone, Deserialize)]
pub struct EventCreatedResponse {
    #[serde(default)]
    pub ok: bool,
    pub event: CreatedEvent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatedEvent {
    pub id: String,
}

/// Failure envelope shared by every endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FailureBody {
    #[serde(default)]
    pub msg: String,
}

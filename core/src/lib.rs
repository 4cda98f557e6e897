//! Client state core for the calendar service.
//!
//! # Overview
//! Two state containers sit on top of a REST backend: the auth session
//! (`checking` → `authenticated` / `not-authenticated`) and the calendar
//! event store (events plus the active selection). Hosts drive them through
//! [`AppContext`] and subscribe to their change notifications.
//!
//! # Design
//! - `CalendarApi` is stateless; each endpoint has a `build_*` that produces
//!   an `HttpRequest` and a `parse_*` that consumes an `HttpResponse`.
//! - A [`Transport`] executes requests. `UreqTransport` is the blocking
//!   default; tests script their own.
//! - Store operations never return errors. Auth failures surface as a
//!   self-expiring `error_message`, calendar failures as an [`Alert`].
//! - Dates are strings on the wire and `DateTime<Utc>` in the stores.

pub mod auth;
pub mod backend;
pub mod calendar;
pub mod client;
pub mod config;
pub mod context;
pub mod dates;
pub mod error;
pub mod expiry;
pub mod http;
pub mod observer;
pub mod storage;
pub mod types;

pub use auth::{AuthSessionManager, AuthState, AuthStatus, ResetOnLogout};
pub use backend::Backend;
pub use calendar::{CalendarEventStore, CalendarState};
pub use client::CalendarApi;
pub use config::ClientConfig;
pub use context::AppContext;
pub use dates::convert_events_to_date_events;
pub use error::{ApiError, ConfigError, StorageError};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
#[cfg(feature = "ureq")]
pub use http::UreqTransport;
pub use observer::{Alert, Notification, SubscriptionId};
pub use storage::{CalendarView, FileStorage, MemoryStorage, Storage};
pub use types::{
    AuthResponse, CalendarEvent, Credentials, EventOwner, Registration, User, ValidationError,
    WireEvent,
};

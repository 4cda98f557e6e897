//! Calendar event store: the local copy of the user's calendar.
//!
//! # Design
//! `CalendarState` carries the reducers; `CalendarEventStore` runs the CRUD
//! flows against the backend and applies a reducer once the server agrees.
//! Saves are merged optimistically from the submitted event (only the
//! assigned id is read back on create). `start_loading_events` is the one
//! place the local copy is reconciled with the server, and it replaces the
//! collection wholesale.

use crate::auth::ResetOnLogout;
use crate::backend::Backend;
use crate::dates::convert_events_to_date_events;
use crate::error::ApiError;
use crate::http::Transport;
use crate::observer::{Alert, Notification, Subscribers, SubscriptionId};
use crate::storage::Storage;
use crate::types::{CalendarEvent, EventOwner, User};

pub const SAVE_ERROR_TITLE: &str = "Error saving";
pub const DELETE_ERROR_TITLE: &str = "Error deleting";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarState {
    /// True until the first successful load.
    pub is_loading_events: bool,
    pub events: Vec<CalendarEvent>,
    pub active_event: Option<CalendarEvent>,
}

impl Default for CalendarState {
    fn default() -> Self {
        Self {
            is_loading_events: true,
            events: Vec::new(),
            active_event: None,
        }
    }
}

impl CalendarState {
    pub fn on_set_active_event(&mut self, event: Option<CalendarEvent>) {
        self.active_event = event;
    }

    pub fn on_add_new_event(&mut self, event: CalendarEvent) {
        self.events.push(event);
        self.active_event = None;
    }

    pub fn on_update_event(&mut self, event: CalendarEvent) {
        if let Some(slot) = self.events.iter_mut().find(|e| e.id == event.id) {
            *slot = event.clone();
        }
        if self
            .active_event
            .as_ref()
            .is_some_and(|active| active.id == event.id)
        {
            self.active_event = Some(event);
        }
    }

    /// Remove the active event from the collection and deselect it.
    pub fn on_delete_event(&mut self) {
        if let Some(active) = self.active_event.take() {
            if active.id.is_some() {
                self.events.retain(|e| e.id != active.id);
            }
        }
    }

    /// Replace the collection with a fresh snapshot.
    ///
    /// A saved active event is re-pointed at its fresh copy, or dropped if
    /// the server no longer has it. Drafts stay selected.
    pub fn on_load_events(&mut self, events: Vec<CalendarEvent>) {
        self.is_loading_events = false;
        self.events = events;
        if let Some(id) = self.active_event.as_ref().and_then(|e| e.id.clone()) {
            self.active_event = self
                .events
                .iter()
                .find(|e| e.id.as_deref() == Some(id.as_str()))
                .cloned();
        }
    }

    pub fn on_logout_calendar(&mut self) {
        *self = Self::default();
    }

    pub fn has_event_selected(&self) -> bool {
        self.active_event.is_some()
    }
}

#[derive(Debug, Default)]
pub struct CalendarEventStore {
    state: CalendarState,
    subscribers: Subscribers<CalendarState>,
}

impl CalendarEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CalendarState {
        &self.state
    }

    pub fn events(&self) -> &[CalendarEvent] {
        &self.state.events
    }

    pub fn active_event(&self) -> Option<&CalendarEvent> {
        self.state.active_event.as_ref()
    }

    pub fn has_event_selected(&self) -> bool {
        self.state.has_event_selected()
    }

    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&Notification<'_, CalendarState>) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    pub fn set_active_event(&mut self, event: Option<CalendarEvent>) {
        self.transition(|s| s.on_set_active_event(event));
    }

    /// Fetch every event and replace the local copy.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn start_loading_events<T: Transport, S: Storage>(&mut self, backend: &Backend<T, S>) {
        let token = backend.token();
        let result = backend
            .send(backend.api.build_list_events(token.as_deref()))
            .and_then(|res| backend.api.parse_list_events(res))
            .and_then(convert_events_to_date_events);

        match result {
            Ok(events) => {
                tracing::debug!(count = events.len(), "events loaded");
                self.transition(|s| s.on_load_events(events));
            }
            Err(e) => tracing::warn!(error = %e, "could not load events"),
        }
    }

    /// Update the event if it has an id, create it otherwise.
    ///
    /// The saved entry is owned by `current_user`.
    pub fn start_saving_event<T: Transport, S: Storage>(
        &mut self,
        backend: &Backend<T, S>,
        event: CalendarEvent,
        current_user: Option<&User>,
    ) {
        if let Err(e) = event.validate() {
            self.alert(SAVE_ERROR_TITLE, e.to_string());
            return;
        }

        let owner = current_user.map(EventOwner::from).or_else(|| event.user.clone());
        let token = backend.token();
        let wire = event.to_wire();

        let result = match event.id.as_deref() {
            Some(id) => backend
                .api
                .build_update_event(token.as_deref(), id, &wire)
                .and_then(|req| backend.send(req))
                .and_then(|res| backend.api.parse_update_event(res))
                .map(|()| None),
            None => backend
                .api
                .build_create_event(token.as_deref(), &wire)
                .and_then(|req| backend.send(req))
                .and_then(|res| backend.api.parse_create_event(res))
                .map(Some),
        };

        match result {
            Ok(None) => {
                let updated = CalendarEvent {
                    user: owner,
                    ..event
                };
                self.transition(|s| s.on_update_event(updated));
            }
            Ok(Some(id)) => {
                let created = CalendarEvent {
                    id: Some(id),
                    user: owner,
                    ..event
                };
                self.transition(|s| s.on_add_new_event(created));
            }
            Err(e) => self.fail(SAVE_ERROR_TITLE, e),
        }
    }

    /// Delete the active event on the server, then locally.
    pub fn start_delete_event<T: Transport, S: Storage>(&mut self, backend: &Backend<T, S>) {
        let Some(id) = self.state.active_event.as_ref().and_then(|e| e.id.clone()) else {
            tracing::debug!("delete requested without a saved active event");
            return;
        };

        let token = backend.token();
        let result = backend
            .send(backend.api.build_delete_event(token.as_deref(), &id))
            .and_then(|res| backend.api.parse_delete_event(res));

        match result {
            Ok(()) => self.transition(CalendarState::on_delete_event),
            Err(e) => self.fail(DELETE_ERROR_TITLE, e),
        }
    }

    fn fail(&mut self, title: &str, error: ApiError) {
        tracing::warn!(error = %error, "{title}");
        self.alert(title, error.user_message());
    }

    fn alert(&mut self, title: &str, message: String) {
        self.subscribers.alert(&Alert {
            title: title.to_string(),
            message,
        });
    }

    fn transition(&mut self, reducer: impl FnOnce(&mut CalendarState)) {
        reducer(&mut self.state);
        self.subscribers.changed(&self.state);
    }
}

impl ResetOnLogout for CalendarEventStore {
    fn reset_on_logout(&mut self) {
        self.transition(CalendarState::on_logout_calendar);
    }
}

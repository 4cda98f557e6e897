//! Application context: both state containers plus the backend they share.
//!
//! Hosts keep one `AppContext` and route UI actions to it. Logout is the
//! one operation that spans both stores, and it is wired explicitly here.

use std::time::Instant;

use crate::auth::{AuthSessionManager, AuthState, AuthStatus};
use crate::backend::Backend;
use crate::calendar::{CalendarEventStore, CalendarState};
use crate::client::CalendarApi;
use crate::config::ClientConfig;
use crate::error::StorageError;
use crate::http::Transport;
use crate::storage::{self, CalendarView, FileStorage, MemoryStorage, Storage};
use crate::types::{CalendarEvent, Credentials, Registration};

#[derive(Debug)]
pub struct AppContext<T, S> {
    backend: Backend<T, S>,
    auth: AuthSessionManager,
    calendar: CalendarEventStore,
}

impl<T: Transport> AppContext<T, MemoryStorage> {
    pub fn in_memory(config: &ClientConfig, transport: T) -> Self {
        Self::new(config, transport, MemoryStorage::new())
    }
}

impl<T: Transport> AppContext<T, FileStorage> {
    /// Persist at `config.storage_path`, or `fallback` when unset.
    pub fn with_file_storage(
        config: &ClientConfig,
        transport: T,
        fallback: &std::path::Path,
    ) -> Result<Self, StorageError> {
        let path = config.storage_path.as_deref().unwrap_or(fallback);
        Ok(Self::new(config, transport, FileStorage::open(path)?))
    }
}

impl<T: Transport, S: Storage> AppContext<T, S> {
    pub fn new(config: &ClientConfig, transport: T, storage: S) -> Self {
        Self {
            backend: Backend::new(CalendarApi::new(&config.base_url), transport, storage),
            auth: AuthSessionManager::new(config.error_display()),
            calendar: CalendarEventStore::new(),
        }
    }

    pub fn auth(&self) -> &AuthSessionManager {
        &self.auth
    }

    pub fn auth_mut(&mut self) -> &mut AuthSessionManager {
        &mut self.auth
    }

    pub fn calendar(&self) -> &CalendarEventStore {
        &self.calendar
    }

    pub fn calendar_mut(&mut self) -> &mut CalendarEventStore {
        &mut self.calendar
    }

    pub fn auth_state(&self) -> &AuthState {
        self.auth.state()
    }

    pub fn calendar_state(&self) -> &CalendarState {
        self.calendar.state()
    }

    pub fn storage(&self) -> &S {
        &self.backend.storage
    }

    // -- session ----------------------------------------------------------

    pub fn check_auth_token(&mut self) {
        self.auth.check_auth_token(&mut self.backend);
    }

    pub fn start_login(&mut self, credentials: &Credentials) {
        self.auth.start_login(&mut self.backend, credentials);
    }

    pub fn start_register(&mut self, registration: &Registration) {
        self.auth.start_register(&mut self.backend, registration);
    }

    pub fn start_logout(&mut self) {
        self.auth.start_logout(&mut self.backend, &mut self.calendar);
    }

    pub fn tick(&mut self, now: Instant) {
        self.auth.tick(now);
    }

    // -- calendar ---------------------------------------------------------

    pub fn start_loading_events(&mut self) {
        if self.auth.status() != AuthStatus::Authenticated {
            tracing::debug!("skipping event load without a session");
            return;
        }
        self.calendar.start_loading_events(&self.backend);
    }

    pub fn set_active_event(&mut self, event: Option<CalendarEvent>) {
        self.calendar.set_active_event(event);
    }

    /// A new unsaved event starting now, selected for editing.
    pub fn start_new_event(&mut self) {
        let draft = CalendarEvent::draft(chrono::Utc::now(), self.auth.user());
        self.calendar.set_active_event(Some(draft));
    }

    pub fn start_saving_event(&mut self, event: CalendarEvent) {
        self.calendar
            .start_saving_event(&self.backend, event, self.auth.user());
    }

    pub fn start_delete_event(&mut self) {
        self.calendar.start_delete_event(&self.backend);
    }

    pub fn has_event_selected(&self) -> bool {
        self.calendar.has_event_selected()
    }

    // -- preferences ------------------------------------------------------

    pub fn last_view(&self) -> CalendarView {
        storage::load_last_view(&self.backend.storage)
    }

    pub fn set_last_view(&mut self, view: CalendarView) {
        if let Err(e) = storage::save_last_view(&mut self.backend.storage, view) {
            tracing::warn!(error = %e, "could not remember calendar view");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::http::{HttpRequest, HttpResponse};
    use crate::storage::TOKEN_KEY;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Default)]
    struct Scripted {
        responses: RefCell<VecDeque<HttpResponse>>,
    }

    impl Scripted {
        fn reply(self, status: u16, body: &str) -> Self {
            self.responses
                .borrow_mut()
                .push_back(HttpResponse::new(status, body));
            self
        }
    }

    impl Transport for Scripted {
        fn execute(&self, _request: HttpRequest) -> Result<HttpResponse, ApiError> {
            self.responses
                .borrow_mut()
                .pop_front()
                .ok_or_else(|| ApiError::Transport("no scripted response".into()))
        }
    }

    const OK_AUTH: &str = r#"{"ok":true,"uid":"u1","name":"Test User","token":"T"}"#;
    const EVENTS: &str = r#"{"ok":true,"events":[
        {"id":"1","title":"A","notes":"","start":"2022-10-21T13:00:00Z","end":"2022-10-21T15:00:00Z","user":{"_id":"u1","name":"Test User"}}
    ]}"#;

    fn credentials() -> Credentials {
        Credentials {
            email: "test@google.com".to_string(),
            password: "123456".to_string(),
        }
    }

    #[test]
    fn logout_resets_both_stores() {
        let transport = Scripted::default().reply(200, OK_AUTH).reply(200, EVENTS);
        let mut ctx = AppContext::in_memory(&ClientConfig::default(), transport);

        ctx.start_login(&credentials());
        ctx.start_loading_events();
        let first = ctx.calendar().events()[0].clone();
        ctx.set_active_event(Some(first));
        assert!(ctx.has_event_selected());

        ctx.start_logout();

        assert_eq!(ctx.auth_state().status, AuthStatus::NotAuthenticated);
        assert_eq!(ctx.calendar_state(), &CalendarState::default());
        assert_eq!(ctx.storage().get(TOKEN_KEY), None);
    }

    #[test]
    fn new_event_draft_is_owned_by_session_user() {
        let transport = Scripted::default().reply(200, OK_AUTH);
        let mut ctx = AppContext::in_memory(&ClientConfig::default(), transport);
        ctx.start_login(&credentials());

        ctx.start_new_event();

        let draft = ctx.calendar().active_event().unwrap();
        assert!(!draft.is_saved());
        assert_eq!(draft.user.as_ref().unwrap().uid, "u1");
    }

    #[test]
    fn loading_requires_session() {
        let mut ctx = AppContext::in_memory(&ClientConfig::default(), Scripted::default());
        ctx.start_loading_events();
        assert!(ctx.calendar_state().is_loading_events);
    }

    #[test]
    fn last_view_round_trips() {
        let mut ctx = AppContext::in_memory(&ClientConfig::default(), Scripted::default());
        assert_eq!(ctx.last_view(), CalendarView::Week);
        ctx.set_last_view(CalendarView::Month);
        assert_eq!(ctx.last_view(), CalendarView::Month);
    }

    #[test]
    fn file_storage_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storage.json");
        let config = ClientConfig {
            storage_path: Some(path.clone()),
            ..ClientConfig::default()
        };

        let mut ctx = AppContext::with_file_storage(
            &config,
            Scripted::default().reply(200, OK_AUTH),
            &path,
        )
        .unwrap();
        ctx.start_login(&credentials());
        drop(ctx);

        let mut ctx = AppContext::with_file_storage(
            &config,
            Scripted::default().reply(200, OK_AUTH),
            &path,
        )
        .unwrap();
        ctx.check_auth_token();
        assert_eq!(ctx.auth_state().status, AuthStatus::Authenticated);
    }
}

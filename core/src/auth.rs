//! Authentication session state and the flows that drive it.
//!
//! # Design
//! `AuthState` is a plain value with reducer methods; every transition the
//! session can make is one of them. `AuthSessionManager` owns the state and
//! runs the network flows (login, register, token renewal, logout), turning
//! any failure into the transient `error_message`. Nothing here returns an
//! error to the caller.

use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;

use crate::backend::Backend;
use crate::error::ApiError;
use crate::expiry::{ErrorExpiry, DEFAULT_ERROR_DISPLAY};
use crate::http::Transport;
use crate::observer::{Subscribers, SubscriptionId, Notification};
use crate::storage::{Storage, TOKEN_INIT_DATE_KEY, TOKEN_KEY};
use crate::types::{AuthResponse, Credentials, Registration, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthStatus {
    #[default]
    Checking,
    Authenticated,
    NotAuthenticated,
}

/// Session snapshot. `user` is `Some` exactly when authenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AuthState {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub error_message: Option<String>,
}

impl AuthState {
    pub fn on_checking(&mut self) {
        self.status = AuthStatus::Checking;
        self.user = None;
        self.error_message = None;
    }

    pub fn on_login(&mut self, user: User) {
        self.status = AuthStatus::Authenticated;
        self.user = Some(user);
        self.error_message = None;
    }

    pub fn on_logout(&mut self, error_message: Option<String>) {
        self.status = AuthStatus::NotAuthenticated;
        self.user = None;
        self.error_message = error_message;
    }

    pub fn clear_error_message(&mut self) {
        self.error_message = None;
    }
}

/// What the session asks of other state on logout.
pub trait ResetOnLogout {
    fn reset_on_logout(&mut self);
}

#[derive(Debug)]
pub struct AuthSessionManager {
    state: AuthState,
    expiry: ErrorExpiry,
    error_display: Duration,
    subscribers: Subscribers<AuthState>,
}

impl Default for AuthSessionManager {
    fn default() -> Self {
        Self::new(DEFAULT_ERROR_DISPLAY)
    }
}

impl AuthSessionManager {
    pub fn new(error_display: Duration) -> Self {
        Self {
            state: AuthState::default(),
            expiry: ErrorExpiry::default(),
            error_display,
            subscribers: Subscribers::default(),
        }
    }

    pub fn state(&self) -> &AuthState {
        &self.state
    }

    pub fn status(&self) -> AuthStatus {
        self.state.status
    }

    pub fn user(&self) -> Option<&User> {
        self.state.user.as_ref()
    }

    pub fn error_message(&self) -> Option<&str> {
        self.state.error_message.as_deref()
    }

    /// When the pending error banner will clear, if one is showing.
    pub fn error_deadline(&self) -> Option<Instant> {
        self.expiry.deadline()
    }

    pub fn subscribe(
        &mut self,
        callback: impl FnMut(&Notification<'_, AuthState>) + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    /// Resume a persisted session, or settle on not-authenticated.
    pub fn check_auth_token<T: Transport, S: Storage>(&mut self, backend: &mut Backend<T, S>) {
        self.expiry.cancel();
        let Some(token) = backend.token() else {
            self.transition(|s| s.on_logout(None));
            return;
        };

        self.transition(AuthState::on_checking);
        let result = backend
            .send(backend.api.build_renew_token(&token))
            .and_then(|res| backend.api.parse_auth(res));

        match result {
            Ok(auth) => self.authenticate(backend, auth),
            Err(e) => {
                tracing::info!(error = %e, "stored token rejected");
                if let Err(e) = backend.storage.clear() {
                    tracing::warn!(error = %e, "could not clear storage");
                }
                self.transition(|s| s.on_logout(None));
            }
        }
    }

    pub fn start_login<T: Transport, S: Storage>(
        &mut self,
        backend: &mut Backend<T, S>,
        credentials: &Credentials,
    ) {
        self.expiry.cancel();
        self.transition(AuthState::on_checking);
        let result = backend
            .api
            .build_login(credentials)
            .and_then(|req| backend.send(req))
            .and_then(|res| backend.api.parse_auth(res));
        self.finish(backend, result);
    }

    pub fn start_register<T: Transport, S: Storage>(
        &mut self,
        backend: &mut Backend<T, S>,
        registration: &Registration,
    ) {
        self.expiry.cancel();
        self.transition(AuthState::on_checking);
        let result = backend
            .api
            .build_register(registration)
            .and_then(|req| backend.send(req))
            .and_then(|res| backend.api.parse_auth(res));
        self.finish(backend, result);
    }

    /// Drop the session and everything derived from it.
    pub fn start_logout<T: Transport, S: Storage>(
        &mut self,
        backend: &mut Backend<T, S>,
        dependents: &mut dyn ResetOnLogout,
    ) {
        self.expiry.cancel();
        if let Err(e) = backend.storage.clear() {
            tracing::warn!(error = %e, "could not clear storage on logout");
        }
        dependents.reset_on_logout();
        self.transition(|s| s.on_logout(None));
    }

    /// Run the error-clearing task if it is due.
    pub fn tick(&mut self, now: Instant) {
        if self.expiry.fire_if_due(now) {
            self.transition(AuthState::clear_error_message);
        }
    }

    fn finish<T: Transport, S: Storage>(
        &mut self,
        backend: &mut Backend<T, S>,
        result: Result<AuthResponse, ApiError>,
    ) {
        match result {
            Ok(auth) => self.authenticate(backend, auth),
            Err(e) => {
                tracing::info!(error = %e, "authentication failed");
                let message = e.user_message();
                self.transition(|s| s.on_logout(Some(message)));
                self.expiry.schedule(Instant::now(), self.error_display);
            }
        }
    }

    fn authenticate<T: Transport, S: Storage>(
        &mut self,
        backend: &mut Backend<T, S>,
        auth: AuthResponse,
    ) {
        let issued_at = Utc::now().timestamp_millis().to_string();
        let persisted = backend
            .storage
            .set(TOKEN_KEY, &auth.token)
            .and_then(|()| backend.storage.set(TOKEN_INIT_DATE_KEY, &issued_at));
        if let Err(e) = persisted {
            tracing::warn!(error = %e, "could not persist token");
        }
        let user = auth.user();
        tracing::debug!(uid = %user.uid, "authenticated");
        self.transition(|s| s.on_login(user));
    }

    fn transition(&mut self, reducer: impl FnOnce(&mut AuthState)) {
        reducer(&mut self.state);
        self.subscribers.changed(&self.state);
    }
}

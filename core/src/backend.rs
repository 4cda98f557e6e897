//! The pieces every store operation needs to reach the server.

use crate::client::CalendarApi;
use crate::error::ApiError;
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::storage::{Storage, TOKEN_KEY};

/// Request builder, transport and persisted storage, owned together.
#[derive(Debug)]
pub struct Backend<T, S> {
    pub api: CalendarApi,
    pub transport: T,
    pub storage: S,
}

impl<T: Transport, S: Storage> Backend<T, S> {
    pub fn new(api: CalendarApi, transport: T, storage: S) -> Self {
        Self {
            api,
            transport,
            storage,
        }
    }

    /// The token to attach to the next authenticated call.
    pub fn token(&self) -> Option<String> {
        self.storage.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn send(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        self.transport.execute(request)
    }
}

//! Stateless HTTP request builder and response parser for the calendar API.
//!
//! # Design
//! `CalendarApi` holds only a `base_url`. Each endpoint is split into a
//! `build_*` method producing an `HttpRequest` and a `parse_*` method
//! consuming an `HttpResponse`. The bearer token is passed in per call: the
//! caller reads it from storage right before sending, so a token renewed by
//! the auth flow is picked up by the very next request.

use crate::error::ApiError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::types::{
    AuthResponse, Credentials, EventCreatedResponse, EventListResponse, FailureBody,
    Registration, WireEvent,
};

const JSON: (&str, &str) = ("content-type", "application/json");

#[derive(Debug, Clone)]
pub struct CalendarApi {
    base_url: String,
}

impl CalendarApi {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: HttpMethod, path: &str, token: Option<&str>) -> HttpRequest {
        let mut headers = Vec::new();
        if let Some(token) = token {
            headers.push(("authorization".to_string(), format!("Bearer {token}")));
        }
        HttpRequest {
            method,
            url: format!("{}{path}", self.base_url),
            headers,
            body: None,
        }
    }

    fn json_request<B: serde::Serialize>(
        &self,
        method: HttpMethod,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<HttpRequest, ApiError> {
        let body =
            serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut req = self.request(method, path, token);
        req.headers.push((JSON.0.to_string(), JSON.1.to_string()));
        req.body = Some(body);
        Ok(req)
    }

    // -- auth -------------------------------------------------------------

    pub fn build_login(&self, credentials: &Credentials) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth", None, credentials)
    }

    pub fn build_register(&self, registration: &Registration) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/auth/new", None, registration)
    }

    pub fn build_renew_token(&self, token: &str) -> HttpRequest {
        self.request(HttpMethod::Get, "/auth/renew", Some(token))
    }

    /// Parse the answer of login, register or renew.
    pub fn parse_auth(&self, response: HttpResponse) -> Result<AuthResponse, ApiError> {
        check_status(&response)?;
        decode(&response)
    }

    // -- events -----------------------------------------------------------

    pub fn build_list_events(&self, token: Option<&str>) -> HttpRequest {
        self.request(HttpMethod::Get, "/events", token)
    }

    pub fn build_create_event(
        &self,
        token: Option<&str>,
        event: &WireEvent,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Post, "/events", token, event)
    }

    pub fn build_update_event(
        &self,
        token: Option<&str>,
        id: &str,
        event: &WireEvent,
    ) -> Result<HttpRequest, ApiError> {
        self.json_request(HttpMethod::Put, &format!("/events/{id}"), token, event)
    }

    pub fn build_delete_event(&self, token: Option<&str>, id: &str) -> HttpRequest {
        self.request(HttpMethod::Delete, &format!("/events/{id}"), token)
    }

    /// Wire events in server order; dates are still strings.
    pub fn parse_list_events(&self, response: HttpResponse) -> Result<Vec<WireEvent>, ApiError> {
        check_status(&response)?;
        let list: EventListResponse = decode(&response)?;
        Ok(list.events)
    }

    /// Only the server-assigned id is read back.
    pub fn parse_create_event(&self, response: HttpResponse) -> Result<String, ApiError> {
        check_status(&response)?;
        let created: EventCreatedResponse = decode(&response)?;
        Ok(created.event.id)
    }

    /// Success is all that matters; the echoed event is not read.
    pub fn parse_update_event(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }

    pub fn parse_delete_event(&self, response: HttpResponse) -> Result<(), ApiError> {
        check_status(&response)
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: &HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}

/// Map non-2xx statuses to an `ApiError` carrying the server's `msg`.
fn check_status(response: &HttpResponse) -> Result<(), ApiError> {
    if response.is_success() {
        return Ok(());
    }
    let msg = serde_json::from_str::<FailureBody>(&response.body)
        .unwrap_or_default()
        .msg;
    Err(match response.status {
        401 => ApiError::Unauthorized { msg },
        404 => ApiError::NotFound { msg },
        status => ApiError::Rejected { status, msg },
    })
}

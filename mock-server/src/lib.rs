use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

/// Owner as embedded in every event (a populated user document).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub title: String,
    pub notes: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub user: Owner,
}

#[derive(Clone, Debug)]
struct Account {
    uid: String,
    name: String,
    email: String,
    password: String,
}

#[derive(Deserialize)]
pub struct Login {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Event payload as sent by clients; any extra fields (id, user) are ignored.
#[derive(Deserialize)]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub notes: String,
    pub start: String,
    pub end: String,
}

#[derive(Default)]
pub struct Store {
    accounts: Vec<Account>,
    tokens: HashMap<String, String>,
    events: Vec<Event>,
}

pub type Db = Arc<RwLock<Store>>;

type Failure = (StatusCode, Json<Value>);
type Reply = Result<(StatusCode, Json<Value>), Failure>;

fn fail(status: StatusCode, msg: &str) -> Failure {
    (status, Json(json!({ "ok": false, "msg": msg })))
}

pub fn app() -> Router {
    app_with_db(Db::default())
}

pub fn app_with_db(db: Db) -> Router {
    let api = Router::new()
        .route("/auth", post(login))
        .route("/auth/new", post(register))
        .route("/auth/renew", get(renew))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", put(update_event).delete(delete_event))
        .with_state(db);
    Router::new().nest("/api", api)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn issue_token(store: &mut Store, uid: &str) -> String {
    let token = Uuid::new_v4().to_string();
    store.tokens.insert(token.clone(), uid.to_string());
    token
}

fn session_body(account: &Account, token: String) -> Json<Value> {
    Json(json!({
        "ok": true,
        "uid": account.uid,
        "name": account.name,
        "token": token,
    }))
}

/// Resolve the bearer token to its owner.
fn authorize(store: &Store, headers: &HeaderMap) -> Result<Owner, Failure> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Missing token"))?;
    let uid = store
        .tokens
        .get(token)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Invalid token"))?;
    let account = store
        .accounts
        .iter()
        .find(|a| &a.uid == uid)
        .ok_or_else(|| fail(StatusCode::UNAUTHORIZED, "Invalid token"))?;
    Ok(Owner {
        id: account.uid.clone(),
        name: account.name.clone(),
    })
}

/// Naive date-times are taken as UTC, same formats the client accepts.
const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

fn parse_date(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn validate(input: &EventInput) -> Result<(DateTime<Utc>, DateTime<Utc>), Failure> {
    if input.title.trim().is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "The title is required"));
    }
    let start = parse_date(&input.start)
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "Invalid start date"))?;
    let end =
        parse_date(&input.end).ok_or_else(|| fail(StatusCode::BAD_REQUEST, "Invalid end date"))?;
    if end < start {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "The end date must be after the start date",
        ));
    }
    Ok((start, end))
}

async fn login(State(db): State<Db>, Json(input): Json<Login>) -> Reply {
    let mut store = db.write().await;
    let account = store
        .accounts
        .iter()
        .find(|a| a.email == input.email)
        .cloned()
        .ok_or_else(|| fail(StatusCode::BAD_REQUEST, "No user exists with that email"))?;
    if account.password != input.password {
        return Err(fail(StatusCode::BAD_REQUEST, "Incorrect password"));
    }
    let token = issue_token(&mut store, &account.uid);
    tracing::info!(uid = %account.uid, "login");
    Ok((StatusCode::OK, session_body(&account, token)))
}

async fn register(State(db): State<Db>, Json(input): Json<NewUser>) -> Reply {
    if input.name.trim().is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "The name is required"));
    }
    if !input.email.contains('@') {
        return Err(fail(StatusCode::BAD_REQUEST, "The email is not valid"));
    }
    if input.password.len() < 6 {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "The password must be at least 6 characters",
        ));
    }

    let mut store = db.write().await;
    if store.accounts.iter().any(|a| a.email == input.email) {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "A user already exists with that email",
        ));
    }
    let account = Account {
        uid: Uuid::new_v4().simple().to_string(),
        name: input.name,
        email: input.email,
        password: input.password,
    };
    store.accounts.push(account.clone());
    let token = issue_token(&mut store, &account.uid);
    tracing::info!(uid = %account.uid, "registered");
    Ok((StatusCode::CREATED, session_body(&account, token)))
}

async fn renew(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let mut store = db.write().await;
    let owner = authorize(&store, &headers)?;
    let token = issue_token(&mut store, &owner.id);
    Ok((
        StatusCode::OK,
        Json(json!({ "ok": true, "uid": owner.id, "name": owner.name, "token": token })),
    ))
}

async fn list_events(State(db): State<Db>, headers: HeaderMap) -> Reply {
    let store = db.read().await;
    authorize(&store, &headers)?;
    Ok((
        StatusCode::OK,
        Json(json!({ "ok": true, "events": store.events })),
    ))
}

async fn create_event(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<EventInput>,
) -> Reply {
    let mut store = db.write().await;
    let owner = authorize(&store, &headers)?;
    let (start, end) = validate(&input)?;
    let event = Event {
        id: Uuid::new_v4().simple().to_string(),
        title: input.title,
        notes: input.notes,
        start,
        end,
        user: owner,
    };
    store.events.push(event.clone());
    Ok((
        StatusCode::CREATED,
        Json(json!({ "ok": true, "event": event })),
    ))
}

async fn update_event(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<EventInput>,
) -> Reply {
    let mut store = db.write().await;
    let owner = authorize(&store, &headers)?;
    let (start, end) = validate(&input)?;
    let event = store
        .events
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Event not found"))?;
    if event.user.id != owner.id {
        return Err(fail(
            StatusCode::UNAUTHORIZED,
            "No privilege to edit this event",
        ));
    }
    event.title = input.title;
    event.notes = input.notes;
    event.start = start;
    event.end = end;
    Ok((StatusCode::OK, Json(json!({ "ok": true, "event": event }))))
}

async fn delete_event(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Reply {
    let mut store = db.write().await;
    let owner = authorize(&store, &headers)?;
    let index = store
        .events
        .iter()
        .position(|e| e.id == id)
        .ok_or_else(|| fail(StatusCode::NOT_FOUND, "Event not found"))?;
    if store.events[index].user.id != owner.id {
        return Err(fail(
            StatusCode::UNAUTHORIZED,
            "No privilege to delete this event",
        ));
    }
    store.events.remove(index);
    Ok((StatusCode::OK, Json(json!({ "ok": true }))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, start: &str, end: &str) -> EventInput {
        EventInput {
            title: title.to_string(),
            notes: String::new(),
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    #[test]
    fn event_serializes_owner_as_populated_id() {
        let event = Event {
            id: "1".to_string(),
            title: "Test".to_string(),
            notes: String::new(),
            start: parse_date("2022-10-21T13:00:00Z").unwrap(),
            end: parse_date("2022-10-21T15:00:00Z").unwrap(),
            user: Owner {
                id: "u1".to_string(),
                name: "Fernando".to_string(),
            },
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["user"]["_id"], "u1");
        assert_eq!(json["start"], "2022-10-21T13:00:00Z");
    }

    #[test]
    fn event_input_ignores_client_fields() {
        let input: EventInput = serde_json::from_str(
            r#"{"id":"9","title":"x","start":"2022-10-21T13:00:00Z","end":"2022-10-21T15:00:00Z","user":{"uid":"u"}}"#,
        )
        .unwrap();
        assert_eq!(input.title, "x");
        assert!(input.notes.is_empty());
    }

    #[test]
    fn validate_accepts_naive_dates() {
        let (start, end) =
            validate(&input("x", "2022-10-21 13:00:00", "2022-10-21 15:00:00")).unwrap();
        assert!(start < end);
    }

    #[test]
    fn parse_date_matches_client_formats() {
        let expected = parse_date("2022-10-21T13:00:00Z").unwrap();
        for raw in [
            "2022-10-21T13:00:00",
            "2022-10-21 13:00:00",
            "2022-10-21T13:00:00.000",
            "2022-10-21T13:00",
            "2022-10-21 13:00",
            "2022-10-21T15:00:00+02:00",
        ] {
            assert_eq!(parse_date(raw), Some(expected), "{raw}");
        }
        assert_eq!(
            parse_date("2022-10-21T13:00:00.123456Z").unwrap().timestamp_subsec_nanos(),
            123_456_000
        );
    }

    #[test]
    fn validate_rejects_inverted_range() {
        let (status, body) = validate(&input(
            "x",
            "2022-10-21T15:00:00Z",
            "2022-10-21T13:00:00Z",
        ))
        .unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0["ok"], false);
    }

    #[test]
    fn validate_rejects_blank_title_and_bad_dates() {
        assert!(validate(&input(" ", "2022-10-21T13:00:00Z", "2022-10-21T15:00:00Z")).is_err());
        assert!(validate(&input("x", "tomorrow", "2022-10-21T15:00:00Z")).is_err());
    }
}

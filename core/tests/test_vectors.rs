//! Verify build/parse methods against JSON test vectors stored in `test-vectors/`.
//!
//! Each vector file describes inputs, expected requests, simulated responses,
//! and expected parse results or errors. Comparing parsed JSON (not raw
//! strings) avoids false negatives from field-ordering differences.

use calendar_core::{
    convert_events_to_date_events, ApiError, AuthResponse, CalendarApi, CalendarEvent,
    Credentials, HttpMethod, HttpRequest, HttpResponse, Registration, WireEvent,
};
use serde_json::Value;

const BASE_URL: &str = "http://localhost:4000/api";

fn api() -> CalendarApi {
    CalendarApi::new(BASE_URL)
}

fn load(raw: &str) -> Vec<Value> {
    let vectors: Value = serde_json::from_str(raw).unwrap();
    vectors["cases"].as_array().unwrap().clone()
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn token(case: &Value) -> Option<&str> {
    case["token"].as_str()
}

fn simulated(case: &Value) -> HttpResponse {
    let sim = &case["simulated_response"];
    HttpResponse::new(
        sim["status"].as_u64().unwrap() as u16,
        sim["body"].as_str().unwrap(),
    )
}

fn assert_request(name: &str, req: &HttpRequest, expected: &Value) {
    assert_eq!(req.method, parse_method(expected["method"].as_str().unwrap()), "{name}: method");
    assert_eq!(req.url, format!("{BASE_URL}{}", expected["path"].as_str().unwrap()), "{name}: path");

    let expected_headers: Vec<(String, String)> = expected["headers"]
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect();
    assert_eq!(req.headers, expected_headers, "{name}: headers");

    match expected.get("body") {
        Some(Value::Null) | None => assert!(req.body.is_none(), "{name}: body should be None"),
        Some(body) => {
            let actual: Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
            assert_eq!(&actual, body, "{name}: body");
        }
    }
}

fn assert_error(name: &str, err: ApiError, expected: &Value) {
    let msg = expected["msg"].as_str().unwrap();
    match expected["kind"].as_str().unwrap() {
        "Rejected" => assert!(
            matches!(err, ApiError::Rejected { msg: ref m, .. } if m == msg),
            "{name}: expected Rejected({msg}), got {err:?}"
        ),
        "Unauthorized" => assert!(
            matches!(err, ApiError::Unauthorized { msg: ref m } if m == msg),
            "{name}: expected Unauthorized({msg}), got {err:?}"
        ),
        "NotFound" => assert!(
            matches!(err, ApiError::NotFound { msg: ref m } if m == msg),
            "{name}: expected NotFound({msg}), got {err:?}"
        ),
        other => panic!("{name}: unknown expected_error: {other}"),
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[test]
fn auth_test_vectors() {
    let c = api();
    for case in load(include_str!("../../test-vectors/auth.json")) {
        let name = case["name"].as_str().unwrap();

        let req = match case["operation"].as_str().unwrap() {
            "login" => {
                let input: Credentials = serde_json::from_value(case["input"].clone()).unwrap();
                c.build_login(&input).unwrap()
            }
            "register" => {
                let input: Registration = serde_json::from_value(case["input"].clone()).unwrap();
                c.build_register(&input).unwrap()
            }
            "renew" => c.build_renew_token(token(&case).unwrap()),
            other => panic!("{name}: unknown operation {other}"),
        };
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_auth(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            let expected: AuthResponse =
                serde_json::from_value(case["expected_result"].clone()).unwrap();
            assert_eq!(result.unwrap(), expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

#[test]
fn list_test_vectors() {
    let c = api();
    for case in load(include_str!("../../test-vectors/list.json")) {
        let name = case["name"].as_str().unwrap();

        let req = c.build_list_events(token(&case));
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_list_events(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            let events = convert_events_to_date_events(result.unwrap()).unwrap();
            let expected: Vec<WireEvent> =
                serde_json::from_value(case["expected_result"].clone()).unwrap();
            let expected: Vec<CalendarEvent> = convert_events_to_date_events(expected).unwrap();
            assert_eq!(events, expected, "{name}: parsed result");
        }
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

#[test]
fn create_test_vectors() {
    let c = api();
    for case in load(include_str!("../../test-vectors/create.json")) {
        let name = case["name"].as_str().unwrap();
        let input: WireEvent = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_create_event(token(&case), &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_create_event(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            assert_eq!(
                result.unwrap(),
                case["expected_result"].as_str().unwrap(),
                "{name}: assigned id"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

#[test]
fn update_test_vectors() {
    let c = api();
    for case in load(include_str!("../../test-vectors/update.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();
        let input: WireEvent = serde_json::from_value(case["input"].clone()).unwrap();

        let req = c.build_update_event(token(&case), id, &input).unwrap();
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_update_event(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            assert!(result.is_ok(), "{name}: expected success");
        }
    }
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

#[test]
fn delete_test_vectors() {
    let c = api();
    for case in load(include_str!("../../test-vectors/delete.json")) {
        let name = case["name"].as_str().unwrap();
        let id = case["input_id"].as_str().unwrap();

        let req = c.build_delete_event(token(&case), id);
        assert_request(name, &req, &case["expected_request"]);

        let result = c.parse_delete_event(simulated(&case));
        if let Some(expected_error) = case.get("expected_error") {
            assert_error(name, result.unwrap_err(), expected_error);
        } else {
            assert!(result.is_ok(), "{name}: expected success");
        }
    }
}

//! Integration tests for the EMS Platform Rust client.
//!
//! Each test starts an in-process mock EMS server on a random port. The mock
//! records every request it receives (method, path, query, token header and
//! JSON body) and answers according to the path, so the tests can check what
//! actually went over the wire.
//!
//! Run with:
//!
//! ```bash
//! cargo test -- --nocapture
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, Method as HttpMethod, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use ems_platform_client::{
    ClientConfig, CreateReservationParams, EmsClient, EmsError, ListBookingsParams, PageParams,
    SearchBookingsParams, SearchParams,
};
use serde_json::{json, Value};

const TOKEN: &str = "tok-123";

// ---------------------------------------------------------------------------
// Mock server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    query: HashMap<String, Vec<String>>,
    token: Option<String>,
    body: Option<Value>,
}

impl Recorded {
    fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    fn body_object(&self) -> &serde_json::Map<String, Value> {
        self.body
            .as_ref()
            .and_then(Value::as_object)
            .expect("request had no JSON object body")
    }
}

type Log = Arc<Mutex<Vec<Recorded>>>;

struct MockEms {
    base_url: String,
    log: Log,
}

impl MockEms {
    fn start() -> Self {
        let log: Log = Arc::new(Mutex::new(Vec::new()));
        let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = std_listener.local_addr().unwrap();
        std_listener.set_nonblocking(true).unwrap();

        let app = Router::new().fallback(handle).with_state(log.clone());
        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async {
                let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
                axum::serve(listener, app).await
            })
            .unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api/v1"),
            log,
        }
    }

    fn config(&self) -> ClientConfig {
        ClientConfig::new(&self.base_url).with_default_page_size(25)
    }

    fn authenticated_client(&self) -> EmsClient {
        EmsClient::new(self.config().with_credentials("client", "s3cret")).unwrap()
    }

    fn requests(&self) -> Vec<Recorded> {
        self.log.lock().unwrap().clone()
    }

    fn last(&self) -> Recorded {
        self.requests().pop().expect("no request recorded")
    }
}

async fn handle(
    State(log): State<Log>,
    method: HttpMethod,
    uri: Uri,
    Query(pairs): Query<Vec<(String, String)>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let mut query: HashMap<String, Vec<String>> = HashMap::new();
    for (key, value) in pairs {
        query.entry(key).or_default().push(value);
    }

    let path = uri
        .path()
        .trim_start_matches("/api/v1/")
        .to_string();
    let recorded = Recorded {
        method: method.to_string(),
        path: path.clone(),
        query,
        token: headers
            .get("x-ems-api-token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: serde_json::from_slice(&body).ok(),
    };
    let body_json = recorded.body.clone().unwrap_or(Value::Null);
    log.lock().unwrap().push(recorded);

    let json_response = |status: StatusCode, value: Value| {
        (
            status,
            [("content-type", "application/json")],
            value.to_string(),
        )
            .into_response()
    };

    match path.as_str() {
        "clientauthentication" => {
            if body_json["clientId"] == "client" && body_json["secret"] == "s3cret" {
                json_response(StatusCode::OK, json!({ "clientToken": TOKEN }))
            } else {
                json_response(
                    StatusCode::UNAUTHORIZED,
                    json!({ "message": "Invalid client credentials" }),
                )
            }
        }
        "broken" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"errorCode":17}{"appMessage":"Room is already booked","detail":"x"}"#,
        )
            .into_response(),
        "truncated" => (
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"a":1}{"appMessage":"#,
        )
            .into_response(),
        "gateway" => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
        "bookings/404" => json_response(
            StatusCode::NOT_FOUND,
            json!({ "message": "Booking 404 was not found" }),
        ),
        "empty" => StatusCode::OK.into_response(),
        "areas" => json_response(
            StatusCode::OK,
            json!([{ "id": 1, "description": "Science Lab" }]),
        ),
        _ => json_response(StatusCode::OK, json!({ "path": path })),
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[test]
fn test_authentication_sets_token() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();
    assert_eq!(client.client_token(), Some(TOKEN));

    let auth = mock.last();
    assert_eq!(auth.method, "POST");
    assert_eq!(auth.path, "clientauthentication");
    assert_eq!(auth.token, None);
    assert_eq!(
        auth.body,
        Some(json!({ "clientId": "client", "secret": "s3cret" }))
    );
}

#[test]
fn test_calls_before_authentication_fail() {
    let mock = MockEms::start();
    let mut client = EmsClient::new(mock.config()).unwrap();
    assert!(client.client_token().is_none());

    let err = client.areas().list(&SearchParams::default()).unwrap_err();
    assert!(matches!(err, EmsError::AuthenticationRequired { .. }));
    assert!(mock.requests().is_empty(), "nothing may be sent without a token");

    client.authenticate("client", "s3cret").unwrap();
    assert_eq!(client.client_token(), Some(TOKEN));
    client.areas().list(&SearchParams::default()).unwrap();
    assert_eq!(mock.last().token.as_deref(), Some(TOKEN));
}

#[test]
fn test_bad_credentials_surface_message() {
    let mock = MockEms::start();
    let result = EmsClient::new(mock.config().with_credentials("client", "wrong"));
    match result {
        Err(EmsError::RequestFailed { status, message }) => {
            assert_eq!(status, Some(401));
            assert_eq!(message, "Invalid client credentials");
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("authentication should have failed"),
    }
}

// ---------------------------------------------------------------------------
// GET placement
// ---------------------------------------------------------------------------

#[test]
fn test_list_areas_uses_query_string() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    let areas = client
        .areas()
        .list(&SearchParams {
            page: Some(2),
            page_size: None,
            search_text: Some("lab".into()),
        })
        .unwrap();
    assert_eq!(areas, json!([{ "id": 1, "description": "Science Lab" }]));

    let req = mock.last();
    assert_eq!(req.method, "GET");
    assert_eq!(req.path, "areas");
    assert_eq!(req.query_value("page"), Some("2"));
    assert_eq!(req.query_value("pageSize"), Some("25"));
    assert_eq!(req.query_value("searchText"), Some("lab"));
    assert!(req.body.is_none());
    assert_eq!(req.token.as_deref(), Some(TOKEN));
}

#[test]
fn test_get_query_keeps_blank_and_false_values() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    client
        .bookings()
        .list(&ListBookingsParams {
            web_user_id: 9,
            search_text: Some(String::new()),
            include_cancelled: Some(false),
            ..Default::default()
        })
        .unwrap();

    let req = mock.last();
    assert_eq!(req.path, "bookings");
    assert_eq!(req.query_value("webUserId"), Some("9"));
    assert_eq!(req.query_value("searchText"), Some(""));
    assert_eq!(req.query_value("includeCancelled"), Some("false"));
    assert_eq!(req.query_value("pageSize"), Some("25"));
    assert!(req.query_value("roomId").is_none());
}

#[test]
fn test_path_parameters() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    let booking = client.bookings().get(77).unwrap();
    assert_eq!(booking, json!({ "path": "bookings/77" }));
    assert!(mock.last().query_value("id").is_none());

    client.reservations().get(5).unwrap();
    assert_eq!(mock.last().path, "reservations/5");
}

#[test]
fn test_explicit_page_size_wins_over_default() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    client
        .statuses()
        .list(&PageParams {
            page: None,
            page_size: Some(100),
        })
        .unwrap();
    assert_eq!(mock.last().query_value("pageSize"), Some("100"));
}

#[test]
fn test_unset_default_page_size_sends_no_page_size() {
    let mock = MockEms::start();
    let mut client = mock.authenticated_client();
    client.set_default_page_size(None);

    client.statuses().list(&PageParams::default()).unwrap();
    assert!(mock.last().query_value("pageSize").is_none());
}

// ---------------------------------------------------------------------------
// POST placement
// ---------------------------------------------------------------------------

#[test]
fn test_search_bookings_body_and_query() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    client
        .bookings()
        .search(&SearchBookingsParams {
            page: Some(3),
            building_ids: Some(vec![1, 2]),
            status_ids: Some(vec![]),
            include_cancelled: Some(false),
            kiosk_profile_id: Some(0),
            search_text: Some(String::new()),
            ..Default::default()
        })
        .unwrap();

    let req = mock.last();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "bookings/actions/search");
    assert_eq!(req.query_value("page"), Some("3"));
    assert_eq!(req.query_value("pageSize"), Some("25"));

    let body = req.body_object();
    assert!(!body.contains_key("page"));
    assert!(!body.contains_key("pageSize"));
    assert!(!body.contains_key("searchText"));
    assert_eq!(body.get("buildingIds"), Some(&json!([1, 2])));
    assert_eq!(body.get("statusIds"), Some(&json!([])));
    assert_eq!(body.get("includeCancelled"), Some(&json!(false)));
    assert_eq!(body.get("kioskProfileId"), Some(&json!(0)));
    for key in body.keys() {
        assert!(req.query_value(key).is_none(), "{key} sent twice");
    }
}

#[test]
fn test_create_reservation_routes_send_confirmation() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    client
        .reservations()
        .create(&CreateReservationParams {
            send_confirmation: Some(true),
            event_name: Some("Kickoff".into()),
            ..Default::default()
        })
        .unwrap();

    let req = mock.last();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "reservations/actions/create");
    assert_eq!(req.query_value("sendConfirmation"), Some("true"));
    assert_eq!(req.query_value("pageSize"), Some("25"));

    let body = req.body_object();
    assert_eq!(body.get("eventName"), Some(&json!("Kickoff")));
    assert!(!body.contains_key("sendConfirmation"));
    assert!(!body.contains_key("page"));
    assert!(!body.contains_key("pageSize"));
}

#[test]
fn test_web_users_are_searched_with_post() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    client
        .web_users()
        .list(&SearchParams {
            search_text: Some("smith".into()),
            ..Default::default()
        })
        .unwrap();

    let req = mock.last();
    assert_eq!(req.method, "POST");
    assert_eq!(req.path, "webusers/actions/search");
    assert_eq!(req.body, Some(json!({ "searchText": "smith" })));
}

// ---------------------------------------------------------------------------
// Positional calls and raw requests
// ---------------------------------------------------------------------------

#[test]
fn test_positional_call_coerces_id_lists() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    client
        .call(
            "searchBookings",
            vec![json!(1), Value::Null, json!(["4", 5])],
        )
        .unwrap();

    let req = mock.last();
    assert_eq!(req.path, "bookings/actions/search");
    assert_eq!(req.query_value("page"), Some("1"));
    assert_eq!(req.query_value("pageSize"), Some("25"));
    assert_eq!(req.body, Some(json!({ "buildingIds": [4, 5] })));
}

#[test]
fn test_raw_request_rejects_other_methods() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();
    let before = mock.requests().len();

    let err = client
        .request("DELETE", "areas", Default::default())
        .unwrap_err();
    assert!(matches!(err, EmsError::UnsupportedMethod { .. }));
    assert_eq!(mock.requests().len(), before);
}

#[test]
fn test_raw_reservation_request_routes_send_confirmation() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    let params = json!({ "sendConfirmation": true, "eventName": "Kickoff" })
        .as_object()
        .cloned()
        .unwrap();
    client
        .request("POST", "reservations/actions/create", params)
        .unwrap();

    let req = mock.last();
    assert_eq!(req.query_value("sendConfirmation"), Some("true"));
    assert_eq!(req.query_value("pageSize"), Some("25"));
    assert_eq!(req.body, Some(json!({ "eventName": "Kickoff" })));
}

#[test]
fn test_raw_authentication_accepts_leading_slash() {
    let mock = MockEms::start();
    let client = EmsClient::new(mock.config()).unwrap();

    let params = json!({ "clientId": "client", "secret": "s3cret" })
        .as_object()
        .cloned()
        .unwrap();
    let response = client
        .request("POST", "/clientauthentication", params)
        .unwrap();
    assert_eq!(response, json!({ "clientToken": TOKEN }));
    assert_eq!(mock.last().path, "clientauthentication");
}

#[test]
fn test_empty_success_body_is_null() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();
    assert_eq!(client.request("GET", "empty", Default::default()).unwrap(), Value::Null);
}

// ---------------------------------------------------------------------------
// Failure classification
// ---------------------------------------------------------------------------

#[test]
fn test_failure_uses_message_field() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    let err = client.bookings().get(404).unwrap_err();
    match err {
        EmsError::RequestFailed { status, message } => {
            assert_eq!(status, Some(404));
            assert_eq!(message, "Booking 404 was not found");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_concatenated_failure_body_uses_app_message() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    let err = client.request("POST", "broken", Default::default()).unwrap_err();
    assert_eq!(err.to_string(), "Room is already booked");
}

#[test]
fn test_truncated_concatenated_failure_body_is_used_verbatim() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    let err = client.request("POST", "truncated", Default::default()).unwrap_err();
    assert!(matches!(
        err,
        EmsError::RequestFailed { status: Some(500), ref message } if message == r#"{"a":1}{"appMessage":"#
    ));
}

#[test]
fn test_unparseable_failure_body_is_used_verbatim() {
    let mock = MockEms::start();
    let client = mock.authenticated_client();

    let err = client.request("GET", "gateway", Default::default()).unwrap_err();
    assert!(matches!(
        err,
        EmsError::RequestFailed { status: Some(502), ref message } if message == "upstream unavailable"
    ));
}

#[test]
fn test_debug_mode_dumps_request_and_response() {
    let mock = MockEms::start();
    let mut client = mock.authenticated_client();
    client.set_debug_mode(true).unwrap();

    let err = client
        .call("getBooking", vec![json!(404)])
        .unwrap_err();
    let message = err.to_string();
    assert!(message.contains("bookings/404"), "{message}");
    assert!(message.contains("status: 404"), "{message}");
    assert!(message.contains("Booking 404 was not found"), "{message}");
}

#[test]
fn test_connection_failure_is_classified() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let result = EmsClient::new(
        ClientConfig::new(format!("http://{addr}/api")).with_credentials("client", "s3cret"),
    );
    assert!(matches!(result, Err(EmsError::RequestFailed { status: None, .. })));
}

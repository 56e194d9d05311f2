//! HTTP-level tests of the Google Calendar client and token handling using wiremock.

use calendar_menu::components::google_calendar::auth::exchange_code;
use calendar_menu::components::google_calendar::models::EventStatus;
use calendar_menu::components::google_calendar::token::{ClientSecrets, StoredToken, TokenManager};
use calendar_menu::components::google_calendar::{
    CalendarHandle, CalendarService, GoogleCalendarClient, ListEventsRequest,
};
use calendar_menu::error::Error;
use chrono::Utc;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::matchers::{
    body_partial_json, body_string_contains, header, method, path, query_param,
    query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn secrets() -> ClientSecrets {
    ClientSecrets {
        client_id: "test_client_id".to_string(),
        client_secret: "test_client_secret".to_string(),
    }
}

fn write_token(path: &Path, access_token: &str, expires_in: i64) {
    let token = StoredToken {
        access_token: access_token.to_string(),
        refresh_token: Some("test_refresh".to_string()),
        expires_at: Utc::now().timestamp() + expires_in,
        scope: None,
        token_type: Some("Bearer".to_string()),
    };
    std::fs::write(path, serde_json::to_string(&token).unwrap()).unwrap();
}

/// Client against `server` with a valid cached token
fn client(server: &MockServer, dir: &TempDir) -> GoogleCalendarClient {
    let token_path = dir.path().join("token.json");
    write_token(&token_path, "valid_token", 3600);
    let manager =
        TokenManager::with_token_url(token_path, secrets(), &format!("{}/token", server.uri()));
    GoogleCalendarClient::with_base_url(manager, &server.uri())
}

fn list_request(query: &str) -> ListEventsRequest {
    ListEventsRequest {
        calendar_id: "primary".to_string(),
        time_min: "2020-10-3T00:00:00.0000Z".to_string(),
        time_max: "2020-10-3T23:59:59.0000Z".to_string(),
        max_results: 10,
        query: query.to_string(),
        single_events: true,
        order_by: "startTime".to_string(),
    }
}

fn event_json(id: &str, summary: &str) -> serde_json::Value {
    json!({
        "kind": "calendar#event",
        "id": id,
        "status": "confirmed",
        "summary": summary,
        "start": { "dateTime": "2020-10-03T10:00:00Z" },
        "end": { "dateTime": "2020-10-03T11:00:00Z" },
        "reminders": { "useDefault": true }
    })
}

#[tokio::test]
async fn test_list_events_sends_query_parameters() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer valid_token"))
        .and(query_param("timeMin", "2020-10-3T00:00:00.0000Z"))
        .and(query_param("timeMax", "2020-10-3T23:59:59.0000Z"))
        .and(query_param("maxResults", "10"))
        .and(query_param("singleEvents", "true"))
        .and(query_param("orderBy", "startTime"))
        .and(query_param("q", "dentist"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "kind": "calendar#events",
            "items": [event_json("abc", "Dentist")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let events = client(&server, &dir)
        .list_events(&list_request("dentist"))
        .await
        .unwrap();

    assert_eq!(events.len(), 1);
    assert_eq!(events[0].id, "abc");
    assert_eq!(events[0].summary.as_deref(), Some("Dentist"));
}

#[tokio::test]
async fn test_empty_keyword_omits_filter() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(query_param_is_missing("q"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "kind": "calendar#events" })))
        .expect(1)
        .mount(&server)
        .await;

    let events = client(&server, &dir)
        .list_events(&list_request(""))
        .await
        .unwrap();
    assert!(events.is_empty());
}

#[tokio::test]
async fn test_http_error_becomes_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .respond_with(ResponseTemplate::new(403).set_body_string("rateLimitExceeded"))
        .mount(&server)
        .await;

    let result = client(&server, &dir).list_events(&list_request("")).await;

    match result {
        Err(Error::GoogleCalendar(message)) => {
            assert!(message.contains("403"));
            assert!(message.contains("rateLimitExceeded"));
        }
        other => panic!("expected API error, got {:?}", other),
    }
}

/// Cancelling through the handle does a get followed by a full update
#[tokio::test]
async fn test_cancel_puts_cancelled_status() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json("abc", "Dentist")))
        .expect(1)
        .mount(&server)
        .await;

    let mut cancelled = event_json("abc", "Dentist");
    cancelled["status"] = json!("cancelled");
    Mock::given(method("PUT"))
        .and(path("/calendars/primary/events/abc"))
        .and(body_partial_json(json!({
            "id": "abc",
            "kind": "calendar#event",
            "status": "cancelled",
            "summary": "Dentist"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(cancelled))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = CalendarHandle::new(Arc::new(client(&server, &dir)), "primary", 10);
    calendar.cancel_event("abc").await.unwrap();
}

#[tokio::test]
async fn test_edit_puts_reminder_override() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json("abc", "Dentist")))
        .mount(&server)
        .await;

    Mock::given(method("PUT"))
        .and(path("/calendars/primary/events/abc"))
        .and(body_partial_json(json!({
            "summary": "Dentist at noon",
            "reminders": {
                "useDefault": false,
                "overrides": [{ "method": "popup", "minutes": 45 }]
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json("abc", "Dentist at noon")))
        .expect(1)
        .mount(&server)
        .await;

    let calendar = CalendarHandle::new(Arc::new(client(&server, &dir)), "primary", 10);
    let updated = calendar
        .edit_event("abc", "Dentist at noon", Some(45))
        .await
        .unwrap();
    assert_eq!(updated.summary.as_deref(), Some("Dentist at noon"));
}

#[tokio::test]
async fn test_get_and_delete_event() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events/abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json("abc", "Dentist")))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/calendars/primary/events/abc"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, &dir);
    let event = client.get_event("primary", "abc").await.unwrap();
    assert_eq!(event.status, Some(EventStatus::Confirmed));

    client.delete_event("primary", "abc").await.unwrap();
}

#[tokio::test]
async fn test_insert_event() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/calendars/primary/events"))
        .and(body_partial_json(json!({ "summary": "Appointment" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(event_json("new1", "Appointment")))
        .expect(1)
        .mount(&server)
        .await;

    let draft = calendar_menu::components::google_calendar::CalendarEvent {
        summary: Some("Appointment".to_string()),
        ..Default::default()
    };
    let created = client(&server, &dir)
        .insert_event("primary", &draft)
        .await
        .unwrap();
    assert_eq!(created.id, "new1");
}

/// An expired token is refreshed, persisted and then used
#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join("token.json");
    write_token(&token_path, "stale_token", -10);

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=test_refresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh_token",
            "expires_in": 3599,
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/calendars/primary/events"))
        .and(header("authorization", "Bearer fresh_token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "items": [] })))
        .expect(2)
        .mount(&server)
        .await;

    let manager = TokenManager::with_token_url(
        token_path.clone(),
        secrets(),
        &format!("{}/token", server.uri()),
    );
    let client = GoogleCalendarClient::with_base_url(manager, &server.uri());

    // Second call reuses the refreshed token
    client.list_events(&list_request("")).await.unwrap();
    client.list_events(&list_request("")).await.unwrap();

    let saved: StoredToken =
        serde_json::from_str(&std::fs::read_to_string(&token_path).unwrap()).unwrap();
    assert_eq!(saved.access_token, "fresh_token");
    assert_eq!(saved.refresh_token.as_deref(), Some("test_refresh"));
    assert!(!saved.is_expired());
}

#[tokio::test]
async fn test_failed_refresh_is_auth_error() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let token_path = dir.path().join("token.json");
    write_token(&token_path, "stale_token", -10);

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_string("invalid_grant"))
        .mount(&server)
        .await;

    let manager =
        TokenManager::with_token_url(token_path, secrets(), &format!("{}/token", server.uri()));

    assert!(matches!(manager.access_token().await, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_missing_token_file_is_auth_error() {
    let dir = TempDir::new().unwrap();
    let manager = TokenManager::new(dir.path().join("token.json"), secrets());

    assert!(manager.load().unwrap().is_none());
    assert!(matches!(manager.access_token().await, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_exchange_code() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=4%2F0Adeu"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "first_token",
            "refresh_token": "first_refresh",
            "expires_in": 3599,
            "scope": "https://www.googleapis.com/auth/calendar.events",
            "token_type": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let manager = TokenManager::with_token_url(
        dir.path().join("token.json"),
        secrets(),
        &format!("{}/token", server.uri()),
    );
    let token = exchange_code(&manager, "4/0Adeu", "http://127.0.0.1:4321")
        .await
        .unwrap();

    assert_eq!(token.access_token, "first_token");
    assert_eq!(token.refresh_token.as_deref(), Some("first_refresh"));

    manager.save(&token).await.unwrap();
    assert_eq!(manager.load().unwrap(), Some(token));
}

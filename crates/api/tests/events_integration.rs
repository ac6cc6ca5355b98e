//! Integration tests for event and participation endpoints.

mod common;

use axum::{body::Body, http::{Method, Request, StatusCode}};
use common::*;
use domain::services::NotificationKind;
use serde_json::json;
use tower::ServiceExt;

async fn create_event(app: &TestApp, owner: &TestUser, body: serde_json::Value) -> serde_json::Value {
    let response = app
        .router()
        .oneshot(json_request_with_auth(Method::POST, "/api/v1/events", body, &owner.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    parse_response_body(response).await
}

async fn join(app: &TestApp, event_id: &str, user: &TestUser) -> axum::response::Response {
    app.router()
        .oneshot(request_with_auth(
            Method::POST,
            &format!("/api/v1/events/{}/join", event_id),
            &user.token,
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_event_success() {
    let app = TestApp::new();
    let owner = app.user("Olivia").await;

    let body = create_event(&app, &owner, event_payload("football")).await;

    assert_eq!(body["sport"], "football");
    assert_eq!(body["owner_id"], owner.id.to_string());
    assert_eq!(body["visibility"], "public");
    assert_eq!(body["recurrence"], "none");
    assert_eq!(body["is_paid"], false);
}

#[tokio::test]
async fn test_create_event_requires_auth() {
    let app = TestApp::new();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/events")
        .header("content-type", "application/json")
        .body(Body::from(event_payload("tennis").to_string()))
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_create_event_in_the_past_is_rejected() {
    let app = TestApp::new();
    let owner = app.user("Olivia").await;
    let mut payload = event_payload("running");
    payload["date"] = json!("2020-01-01");
    payload["end_time"] = json!("17:00:00");

    let response = app
        .router()
        .oneshot(json_request_with_auth(Method::POST, "/api/v1/events", payload, &owner.token))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert!(fields.contains(&"date"));
    assert!(fields.contains(&"end_time"));
}

#[tokio::test]
async fn test_paid_event_requires_pro_owner() {
    let app = TestApp::new();
    let regular = app.user("Reg").await;
    let pro = app.pro_user("Coach").await;
    let mut payload = event_payload("yoga");
    payload["is_paid"] = json!(true);
    payload["price"] = json!(12.5);

    let response = app
        .router()
        .oneshot(json_request_with_auth(
            Method::POST,
            "/api/v1/events",
            payload.clone(),
            &regular.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = create_event(&app, &pro, payload).await;
    assert_eq!(body["is_paid"], true);
    assert_eq!(body["price"], 12.5);
}

#[tokio::test]
async fn test_capacity_scenario_on_public_event() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let x = app.user("X").await;
    let y = app.user("Y").await;
    let z = app.user("Z").await;

    let mut payload = event_payload("basketball");
    payload["max_participants"] = json!(2);
    let event = create_event(&app, &owner, payload).await;
    let event_id = event["id"].as_str().unwrap().to_string();

    assert_eq!(join(&app, &event_id, &x).await.status(), StatusCode::OK);
    let response = join(&app, &event_id, &y).await;
    assert_eq!(response.status(), StatusCode::OK);
    let detail = parse_response_body(response).await;
    assert_eq!(detail["confirmed_count"], 2);
    assert_eq!(detail["my_status"], "confirmed");

    let response = join(&app, &event_id, &z).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(parse_response_body(response).await["error"], "capacity_exceeded");

    let response = app
        .router()
        .oneshot(delete_request_with_auth(
            &format!("/api/v1/events/{}/leave", event_id),
            &y.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = join(&app, &event_id, &z).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["confirmed_count"], 2);

    let notifications = app.notifier.sent().await;
    assert_eq!(notifications.len(), 3);
    assert!(notifications
        .iter()
        .all(|n| n.kind == NotificationKind::ParticipantJoined && n.recipient_id == owner.id));
}

#[tokio::test]
async fn test_owner_cannot_join_own_event() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let event = create_event(&app, &owner, event_payload("padel")).await;

    let response = join(&app, event["id"].as_str().unwrap(), &owner).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_leave_without_participation() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let stranger = app.user("Stranger").await;
    let event = create_event(&app, &owner, event_payload("golf")).await;

    let response = app
        .router()
        .oneshot(delete_request_with_auth(
            &format!("/api/v1/events/{}/leave", event["id"].as_str().unwrap()),
            &stranger.token,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_response_body(response).await["error"], "not_participating");
}

#[tokio::test]
async fn test_private_event_approval_flow() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let first = app.user("First").await;
    let second = app.user("Second").await;

    let mut payload = event_payload("volleyball");
    payload["visibility"] = json!("private");
    payload["max_participants"] = json!(2);
    let event = create_event(&app, &owner, payload).await;
    let event_id = event["id"].as_str().unwrap().to_string();

    let response = join(&app, &event_id, &first).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["my_status"], "pending");
    assert_eq!(join(&app, &event_id, &second).await.status(), StatusCode::OK);

    // Only the owner sees the queue.
    let response = app
        .router()
        .oneshot(get_request_with_auth(
            &format!("/api/v1/events/{}/participants/pending", event_id),
            &first.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router()
        .oneshot(get_request_with_auth(
            &format!("/api/v1/events/{}/participants/pending", event_id),
            &owner.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let pending = parse_response_body(response).await;
    let pending = pending.as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0]["user_id"], first.id.to_string());
    let first_pid = pending[0]["id"].as_str().unwrap().to_string();
    let second_pid = pending[1]["id"].as_str().unwrap().to_string();

    let response = app
        .router()
        .oneshot(request_with_auth(
            Method::PUT,
            &format!("/api/v1/events/{}/participants/{}/approve", event_id, first_pid),
            &owner.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["confirmed_count"], 1);

    let response = app
        .router()
        .oneshot(request_with_auth(
            Method::PUT,
            &format!("/api/v1/events/{}/participants/{}/reject", event_id, second_pid),
            &owner.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Declined users cannot re-apply.
    assert_eq!(join(&app, &event_id, &second).await.status(), StatusCode::FORBIDDEN);

    let kinds: Vec<NotificationKind> = app.notifier.sent().await.iter().map(|n| n.kind).collect();
    assert_eq!(
        kinds,
        vec![
            NotificationKind::JoinRequested,
            NotificationKind::JoinRequested,
            NotificationKind::ParticipationApproved,
            NotificationKind::ParticipationDeclined,
        ]
    );
}

#[tokio::test]
async fn test_private_event_hidden_from_strangers() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let stranger = app.user("Stranger").await;
    let mut payload = event_payload("climbing");
    payload["visibility"] = json!("private");
    let event = create_event(&app, &owner, payload).await;
    let uri = format!("/api/v1/events/{}", event["id"].as_str().unwrap());

    let response = app
        .router()
        .oneshot(get_request_with_auth(&uri, &stranger.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router()
        .oneshot(get_request_with_auth(&uri, &owner.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_update_below_confirmed_count_conflicts() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let mut payload = event_payload("football");
    payload["max_participants"] = json!(5);
    let event = create_event(&app, &owner, payload.clone()).await;
    let event_id = event["id"].as_str().unwrap().to_string();

    for name in ["A", "B", "C"] {
        let user = app.user(name).await;
        assert_eq!(join(&app, &event_id, &user).await.status(), StatusCode::OK);
    }

    payload["max_participants"] = json!(2);
    let response = app
        .router()
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/events/{}", event_id),
            payload.clone(),
            &owner.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    payload["max_participants"] = json!(3);
    payload["title"] = json!("Five-a-side, three spots");
    let response = app
        .router()
        .oneshot(json_request_with_auth(
            Method::PUT,
            &format!("/api/v1/events/{}", event_id),
            payload,
            &owner.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(parse_response_body(response).await["max_participants"], 3);
}

#[tokio::test]
async fn test_delete_event_owner_only() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let other = app.user("Other").await;
    let event = create_event(&app, &owner, event_payload("rugby")).await;
    let uri = format!("/api/v1/events/{}", event["id"].as_str().unwrap());

    let response = app
        .router()
        .oneshot(delete_request_with_auth(&uri, &other.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .router()
        .oneshot(delete_request_with_auth(&uri, &owner.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .router()
        .oneshot(get_request_with_auth(&uri, &owner.token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_public_listing_without_auth() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    create_event(&app, &owner, event_payload("tennis")).await;
    create_event(&app, &owner, event_payload("football")).await;
    let mut private = event_payload("tennis");
    private["visibility"] = json!("private");
    create_event(&app, &owner, private).await;

    let request = Request::builder()
        .uri("/api/v1/events/public?sport=tennis")
        .body(Body::empty())
        .unwrap();
    let response = app.router().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["sport"], "tennis");
}

#[tokio::test]
async fn test_user_listing_hides_private_events() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let viewer = app.user("Viewer").await;
    create_event(&app, &owner, event_payload("squash")).await;
    let mut private = event_payload("squash");
    private["visibility"] = json!("private");
    create_event(&app, &owner, private).await;

    let response = app
        .router()
        .oneshot(get_request_with_auth(
            &format!("/api/v1/events/user/{}", owner.id),
            &viewer.token,
        ))
        .await
        .unwrap();
    assert_eq!(parse_response_body(response).await.as_array().unwrap().len(), 1);

    let response = app
        .router()
        .oneshot(get_request_with_auth("/api/v1/events/me/upcoming", &owner.token))
        .await
        .unwrap();
    assert_eq!(parse_response_body(response).await.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_participating_listing() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let player = app.user("Player").await;
    let event = create_event(&app, &owner, event_payload("hockey")).await;
    create_event(&app, &owner, event_payload("cricket")).await;
    join(&app, event["id"].as_str().unwrap(), &player).await;

    let response = app
        .router()
        .oneshot(get_request_with_auth("/api/v1/events/me/participating", &player.token))
        .await
        .unwrap();
    let body = parse_response_body(response).await;
    let events = body.as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["sport"], "hockey");
}

#[tokio::test]
async fn test_nearby_search() {
    let app = TestApp::new();
    let owner = app.user("Owner").await;
    let searcher = app.user("Searcher").await;

    let mut near = event_payload("football");
    near["latitude"] = json!(48.8566);
    near["longitude"] = json!(2.3522);
    create_event(&app, &owner, near).await;

    let mut far = event_payload("football");
    far["latitude"] = json!(51.5074);
    far["longitude"] = json!(-0.1278);
    create_event(&app, &owner, far).await;

    create_event(&app, &owner, event_payload("football")).await;

    let response = app
        .router()
        .oneshot(get_request_with_auth(
            "/api/v1/events/nearby?latitude=48.85&longitude=2.35&max_distance=10",
            &searcher.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    let results = body.as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0]["distance_km"].as_f64().unwrap() < 1.0);
}

#[tokio::test]
async fn test_nearby_search_requires_coordinates() {
    let app = TestApp::new();
    let searcher = app.user("Searcher").await;

    let response = app
        .router()
        .oneshot(get_request_with_auth(
            "/api/v1/events/nearby?longitude=2.35",
            &searcher.token,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(parse_response_body(response).await["error"], "invalid_location");
}

#[tokio::test]
async fn test_request_id_and_liveness() {
    let app = TestApp::new();
    let request = Request::builder()
        .uri("/api/health/live")
        .header("X-Request-ID", "probe-1")
        .body(Body::empty())
        .unwrap();

    let response = app.router().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "probe-1");
}

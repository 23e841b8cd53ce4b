//! Session establishment, logout, and the ambient HTTP surface.
//!
//! Run with: cargo test -p verdant-integration-tests

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;

use verdant_integration_tests::{RequestBuilder, StubProvider, TestApp, TestAppOptions, new_user_id};

fn app() -> (TestApp, verdant_core::UserId) {
    let id = new_user_id();
    let app = TestApp::build(TestAppOptions {
        provider: StubProvider::default().with_user("tok-carol", id, "Carol@Example.com"),
        ..TestAppOptions::default()
    });
    (app, id)
}

#[tokio::test]
async fn test_bearer_token_is_exchanged_for_a_session() {
    let (app, id) = app();

    let response = app
        .send(RequestBuilder::post("/auth/session").bearer("tok-carol").build())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["userId"], id.to_string());
    assert_eq!(response.body["email"], "carol@example.com");

    let set_cookie = response
        .headers
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let cookie = response.session_cookie().unwrap();
    let mine = app
        .send(RequestBuilder::get("/orders/mine").cookie(&cookie).build())
        .await;
    assert_eq!(mine.status, StatusCode::OK);
    assert_eq!(mine.body.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_session_requires_a_valid_bearer() {
    let (app, _) = app();

    let missing = app.send(RequestBuilder::post("/auth/session").build()).await;
    assert_eq!(missing.status, StatusCode::UNAUTHORIZED);

    let invalid = app
        .send(RequestBuilder::post("/auth/session").bearer("tok-mallory").build())
        .await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
    assert!(invalid.session_cookie().is_none());
}

#[tokio::test]
async fn test_logout_ends_the_session() {
    let (app, _) = app();
    let cookie = app.sign_in("tok-carol").await;

    let logout = app
        .send(RequestBuilder::post("/auth/logout").cookie(&cookie).build())
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);

    let mine = app
        .send(RequestBuilder::get("/orders/mine").cookie(&cookie).build())
        .await;
    assert_eq!(mine.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health_and_request_id() {
    let app = TestApp::new();

    let health = app.send(RequestBuilder::get("/health").build()).await;
    assert_eq!(health.status, StatusCode::OK);
    assert_eq!(health.body, "ok");
    assert!(health.headers.contains_key("x-request-id"));

    let ready = app.send(RequestBuilder::get("/health/ready").build()).await;
    assert_eq!(ready.status, StatusCode::OK);

    let echoed = app
        .send(
            axum::http::Request::builder()
                .uri("/health")
                .header("x-request-id", "req-1234")
                .body(axum::body::Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(echoed.headers["x-request-id"], "req-1234");
}

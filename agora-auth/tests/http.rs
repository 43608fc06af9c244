use std::sync::Arc;

use agora_auth::{AppState, Settings};
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

fn build_app() -> axum::Router {
    let settings = Settings {
        bind_addr: "127.0.0.1:0".into(),
        access_secret: "http-access-secret".into(),
        refresh_secret: "http-refresh-secret".into(),
        access_ttl_secs: 900,
        refresh_ttl_secs: 7 * 24 * 3600,
    };
    agora_auth::router(Arc::new(AppState::new(&settings)))
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

async fn body_json(resp: axum::http::Response<Body>) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn register(app: &axum::Router, email: &str) -> Value {
    let resp = app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({
                "email": email,
                "password": "Sup3rSecret",
                "role": "user",
                "full_name": "Test User"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await
}

async fn login(app: &axum::Router, email: &str) -> Value {
    let resp = app
        .clone()
        .oneshot(post_json(
            "/login",
            json!({ "email": email, "password": "Sup3rSecret" }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    body_json(resp).await["data"].clone()
}

#[tokio::test]
async fn register_returns_enveloped_user() {
    let app = build_app();
    let json = register(&app, "alice@example.com").await;

    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "registration successful");
    assert_eq!(json["data"]["email"], "alice@example.com");
    assert_eq!(json["data"]["role"], "user");
    assert!(json["data"]["id"].as_str().unwrap().len() > 10);
    assert!(json["data"].get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_email_rejected() {
    let app = build_app();
    register(&app, "alice@example.com").await;

    let resp = app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({
                "email": "alice@example.com",
                "password": "An0therPass",
                "role": "vendor"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = body_json(resp).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "invalid_request");
    assert_eq!(json["details"], "email already registered");
}

#[tokio::test]
async fn weak_passwords_rejected() {
    let app = build_app();
    for password in ["Ab1", "alllowercase1", "ALLUPPER123", "NoDigitsHere"] {
        let resp = app
            .clone()
            .oneshot(post_json(
                "/register",
                json!({
                    "email": "weak@example.com",
                    "password": password,
                    "role": "user"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "password {password:?}");
        let json = body_json(resp).await;
        assert_eq!(json["error"], "invalid_request");
    }
}

#[tokio::test]
async fn invalid_email_rejected() {
    let app = build_app();
    let resp = app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({
                "email": "not-an-email",
                "password": "Sup3rSecret",
                "role": "user"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["details"], "invalid email address");
}

#[tokio::test]
async fn unknown_role_rejected() {
    let app = build_app();
    let resp = app
        .clone()
        .oneshot(post_json(
            "/register",
            json!({
                "email": "root@example.com",
                "password": "Sup3rSecret",
                "role": "admin"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid_request");
}

#[tokio::test]
async fn login_issues_token_pair() {
    let app = build_app();
    register(&app, "alice@example.com").await;
    let pair = login(&app, "alice@example.com").await;

    assert_eq!(pair["token_type"], "bearer");
    assert!(pair["access_token"].as_str().unwrap().len() > 50);
    assert!(pair["refresh_token"].as_str().unwrap().len() > 50);
}

#[tokio::test]
async fn wrong_credentials_are_unauthenticated() {
    let app = build_app();
    register(&app, "alice@example.com").await;

    // Bad password and unknown email produce the same envelope.
    for body in [
        json!({ "email": "alice@example.com", "password": "WrongPass1" }),
        json!({ "email": "nobody@example.com", "password": "Sup3rSecret" }),
    ] {
        let resp = app.clone().oneshot(post_json("/login", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(resp).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "unauthenticated");
        assert_eq!(json["details"], "incorrect email or password");
    }
}

#[tokio::test]
async fn verify_reports_claims() {
    let app = build_app();
    let user = register(&app, "alice@example.com").await;
    let pair = login(&app, "alice@example.com").await;

    let resp = app
        .clone()
        .oneshot(get_bearer("/verify", pair["access_token"].as_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["sub"], user["data"]["id"]);
    assert_eq!(json["data"]["role"], "user");
    assert!(json["data"]["jti"].as_str().unwrap().len() > 10);
}

#[tokio::test]
async fn verify_without_token_is_unauthenticated() {
    let app = build_app();
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/verify").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(resp).await;
    assert_eq!(json["error"], "unauthenticated");
    assert_eq!(json["details"], "missing bearer token");
}

#[tokio::test]
async fn refresh_rotates_the_pair() {
    let app = build_app();
    register(&app, "alice@example.com").await;
    let pair = login(&app, "alice@example.com").await;
    let old_refresh = pair["refresh_token"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(post_json("/refresh", json!({ "refresh_token": old_refresh })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let rotated = body_json(resp).await["data"].clone();
    assert!(rotated["access_token"].as_str().unwrap().len() > 50);

    // The old refresh token was burned by the rotation.
    let resp = app
        .clone()
        .oneshot(post_json("/refresh", json!({ "refresh_token": old_refresh })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["details"], "token revoked");
}

#[tokio::test]
async fn logout_revokes_both_tokens() {
    let app = build_app();
    register(&app, "alice@example.com").await;
    let pair = login(&app, "alice@example.com").await;
    let access = pair["access_token"].as_str().unwrap().to_string();
    let refresh = pair["refresh_token"].as_str().unwrap().to_string();

    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/logout")
                .header("authorization", format!("Bearer {access}"))
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "refresh_token": refresh }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["message"], "logged out");

    let resp = app.clone().oneshot(get_bearer("/verify", &access)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["details"], "token revoked");

    let resp = app
        .clone()
        .oneshot(post_json("/refresh", json!({ "refresh_token": refresh })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn malformed_body_is_invalid_request() {
    let app = build_app();
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid_request");
}

#[tokio::test]
async fn health_reports_service_name() {
    let app = build_app();
    let resp = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let json = body_json(resp).await;
    assert_eq!(json["data"]["service"], "auth");
    assert_eq!(json["data"]["status"], "ok");
}

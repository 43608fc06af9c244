use std::sync::{Arc, Mutex};

use agora_core::{ApiError, Envelope};
use agora_payments::{AppState, Settings};
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use dashmap::DashMap;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Stands in for the orders service: serves owner-scoped order documents and
/// records every status callback it receives.
struct StubOrders {
    orders: DashMap<String, Value>,
    callbacks: Mutex<Vec<Value>>,
}

async fn get_order(
    State(stub): State<Arc<StubOrders>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let caller = headers
        .get("x-user-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    match stub.orders.get(&id) {
        Some(doc) if doc.value()["user_id"] == caller => {
            Json(Envelope::data(doc.value().clone())).into_response()
        }
        _ => ApiError::NotFound(format!("order {id} not found")).into_response(),
    }
}

async fn put_status(
    State(stub): State<Arc<StubOrders>>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(mut doc) = stub.orders.get_mut(&id) {
        doc.value_mut()["status"] = body["status"].clone();
    }
    stub.callbacks.lock().unwrap().push(json!({
        "order_id": id,
        "status": body["status"],
        "payment_id": body["payment_id"],
    }));
    Json(Envelope::<Value>::message("order status updated")).into_response()
}

async fn spawn_stub(stub: Arc<StubOrders>, with_status_route: bool) -> String {
    let mut app = Router::new().route("/orders/{id}", get(get_order));
    if with_status_route {
        app = app.route("/orders/{id}/status", put(put_status));
    }
    let app = app.with_state(stub);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    format!("http://{addr}")
}

async fn build_app(success_rate: f64) -> (Router, Arc<StubOrders>) {
    build_app_inner(success_rate, true).await
}

async fn build_app_inner(success_rate: f64, with_status_route: bool) -> (Router, Arc<StubOrders>) {
    let stub = Arc::new(StubOrders {
        orders: DashMap::new(),
        callbacks: Mutex::new(Vec::new()),
    });
    let settings = Settings {
        bind_addr: "127.0.0.1:0".into(),
        orders_url: spawn_stub(stub.clone(), with_status_route).await,
        success_rate,
        latency_ms: 0,
        rng_seed: Some(42),
        upstream_timeout_secs: 2,
    };
    (
        agora_payments::router(Arc::new(AppState::new(&settings))),
        stub,
    )
}

fn pending_order(stub: &StubOrders, id: &str, user: &str, amount: &str) {
    stub.orders.insert(
        id.to_string(),
        json!({
            "id": id,
            "user_id": user,
            "items": [],
            "total_amount": amount,
            "status": "pending",
            "payment_id": null,
            "created_at": "2026-08-25T12:00:00Z",
            "updated_at": "2026-08-25T12:00:00Z",
        }),
    );
}

fn request(method: &str, uri: &str, user: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-user-id", user)
        .header("x-user-role", "user");
    match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(resp: axum::http::Response<Body>) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn process(app: &Router, user: &str, order_id: &str) -> axum::http::Response<Body> {
    app.clone()
        .oneshot(request(
            "POST",
            "/payments/process",
            user,
            Some(json!({ "order_id": order_id, "method": "credit_card" })),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn successful_settlement_completes_and_reports_back() {
    let (app, stub) = build_app(1.0).await;
    pending_order(&stub, "o-1", "user-1", "39.98");

    let resp = process(&app, "user-1", "o-1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    let payment = &body["data"];
    assert_eq!(payment["status"], "completed");
    assert_eq!(payment["amount"], "39.98");
    assert_eq!(payment["method"], "credit_card");
    assert_eq!(payment["order_id"], "o-1");
    assert!(payment["transaction_id"].as_str().unwrap().starts_with("txn_"));

    let callbacks = stub.callbacks.lock().unwrap();
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0]["status"], "paid");
    assert_eq!(callbacks[0]["payment_id"], payment["id"]);
    drop(callbacks);
    assert_eq!(stub.orders.get("o-1").unwrap().value()["status"], "paid");
}

#[tokio::test]
async fn failed_settlement_is_a_normal_response() {
    let (app, stub) = build_app(0.0).await;
    pending_order(&stub, "o-1", "user-1", "10.00");

    let resp = process(&app, "user-1", "o-1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "failed");

    let callbacks = stub.callbacks.lock().unwrap();
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0]["status"], "cancelled");
}

#[tokio::test]
async fn settlement_is_idempotent_per_order() {
    let (app, stub) = build_app(1.0).await;
    pending_order(&stub, "o-1", "user-1", "10.00");

    let first = body_json(process(&app, "user-1", "o-1").await).await;

    let resp = process(&app, "user-1", "o-1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let second = body_json(resp).await;
    assert_eq!(second["message"], "payment already processed");
    assert_eq!(second["data"]["id"], first["data"]["id"]);
    assert_eq!(
        second["data"]["transaction_id"],
        first["data"]["transaction_id"]
    );

    // The repeat performed no callback.
    assert_eq!(stub.callbacks.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn foreign_order_reads_as_not_found() {
    let (app, stub) = build_app(1.0).await;
    pending_order(&stub, "o-1", "user-2", "10.00");

    let resp = process(&app, "user-1", "o-1").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"], "not_found");
    assert!(stub.callbacks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let (app, _) = build_app(1.0).await;
    let resp = process(&app, "user-1", "o-missing").await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_pending_order_cannot_be_settled() {
    let (app, stub) = build_app(1.0).await;
    pending_order(&stub, "o-1", "user-1", "10.00");
    stub.orders.get_mut("o-1").unwrap().value_mut()["status"] = json!("paid");

    let resp = process(&app, "user-1", "o-1").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body = body_json(resp).await;
    assert_eq!(body["error"], "invalid_transition");

    // Nothing was recorded.
    let resp = app
        .clone()
        .oneshot(request("GET", "/payments/order/o-1", "user-1", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(stub.callbacks.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unknown_method_rejected_at_the_boundary() {
    let (app, stub) = build_app(1.0).await;
    pending_order(&stub, "o-1", "user-1", "10.00");

    let resp = app
        .clone()
        .oneshot(request(
            "POST",
            "/payments/process",
            "user-1",
            Some(json!({ "order_id": "o-1", "method": "bitcoin" })),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(resp).await["error"], "invalid_request");
}

#[tokio::test]
async fn process_requires_identity_headers() {
    let (app, _) = build_app(1.0).await;
    let resp = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/payments/process")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({ "order_id": "o-1", "method": "paypal" }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn orders_service_down_is_upstream_unavailable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let settings = Settings {
        bind_addr: "127.0.0.1:0".into(),
        orders_url: format!("http://{addr}"),
        success_rate: 1.0,
        latency_ms: 0,
        rng_seed: Some(42),
        upstream_timeout_secs: 1,
    };
    let app = agora_payments::router(Arc::new(AppState::new(&settings)));

    let resp = process(&app, "user-1", "o-1").await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body_json(resp).await["error"], "upstream_unavailable");
}

#[tokio::test]
async fn callback_failure_still_records_the_payment() {
    // The stub has no status route, so the callback gets a 405 and is
    // dropped on the floor.
    let (app, stub) = build_app_inner(1.0, false).await;
    pending_order(&stub, "o-1", "user-1", "10.00");

    let resp = process(&app, "user-1", "o-1").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["status"], "completed");

    let resp = app
        .clone()
        .oneshot(request("GET", "/payments/order/o-1", "user-1", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn payment_lookup_is_owner_scoped() {
    let (app, stub) = build_app(1.0).await;
    pending_order(&stub, "o-1", "user-1", "10.00");
    process(&app, "user-1", "o-1").await;

    let resp = app
        .clone()
        .oneshot(request("GET", "/payments/order/o-1", "user-1", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await["data"]["order_id"], "o-1");

    let resp = app
        .clone()
        .oneshot(request("GET", "/payments/order/o-1", "user-2", None))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_settlements_share_one_record() {
    let (app, stub) = build_app(1.0).await;
    pending_order(&stub, "o-race", "user-1", "25.00");

    let mut handles = Vec::new();
    for _ in 0..8 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let resp = app
                .oneshot(request(
                    "POST",
                    "/payments/process",
                    "user-1",
                    Some(json!({ "order_id": "o-race", "method": "paypal" })),
                ))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            body_json(resp).await["data"]["id"]
                .as_str()
                .unwrap()
                .to_string()
        }));
    }

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 1, "every caller saw the same payment");
    assert_eq!(stub.callbacks.lock().unwrap().len(), 1);
}

//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use messaging::{EventPublisher, FailureMode, InMemoryBroker};
use metrics_exporter_prometheus::PrometheusHandle;
use store::InMemoryStore;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            builder
                .install_recorder()
                .expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    app: axum::Router,
    store: InMemoryStore,
    broker: InMemoryBroker,
    state: Arc<AppState<InMemoryStore>>,
}

fn setup() -> TestApp {
    let store = InMemoryStore::new();
    let broker = InMemoryBroker::new();
    let publisher = EventPublisher::new(Arc::new(broker.clone()));
    let state = api::create_state(store.clone(), publisher, CancellationToken::new());
    let app = api::create_app(state.clone(), get_metrics_handle());
    TestApp {
        app,
        store,
        broker,
        state,
    }
}

async fn send(app: &axum::Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn post_empty(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn upload(app: &axum::Router, tenant: &str, file_name: &str) -> serde_json::Value {
    let (status, json) = send(
        app,
        post_json(
            &format!("/tenants/{tenant}/receipts"),
            serde_json::json!({ "file_name": file_name }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "upload failed: {json}");
    json
}

#[tokio::test]
async fn test_health_check() {
    let test = setup();

    let (status, json) = send(&test.app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["broker"], "enabled");
}

#[tokio::test]
async fn test_health_reports_disabled_broker() {
    let state = api::create_state(
        InMemoryStore::new(),
        EventPublisher::disabled(),
        CancellationToken::new(),
    );
    let app = api::create_app(state, get_metrics_handle());

    let (status, json) = send(&app, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["broker"], "disabled");
}

#[tokio::test]
async fn test_upload_receipt() {
    let test = setup();

    let json = upload(&test.app, "T1", "x.pdf").await;

    assert_eq!(json["tenant_id"], "T1");
    assert_eq!(json["file_name"], "x.pdf");
    assert_eq!(json["format"], "pdf");
    assert_eq!(json["status"], "active");
    assert_eq!(json["is_verified"], false);

    assert_eq!(test.store.record_count().await, 1);
    let published = test.broker.published_with_key("receipt.uploaded");
    assert_eq!(published.len(), 1);
    let envelope = published[0].json().unwrap();
    assert_eq!(envelope["tenant_id"], "T1");
    assert_eq!(envelope["aggregate_id"], json["id"]);
}

#[tokio::test]
async fn test_upload_with_details() {
    let test = setup();

    let (status, json) = send(
        &test.app,
        post_json(
            "/tenants/T1/receipts",
            serde_json::json!({
                "file_name": "till.jpg",
                "store_name": "Hardware Hut",
                "receipt_number": "R-1001",
                "total_amount_cents": 4599,
                "receipt_date": "2026-10-01"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["format"], "image");
    assert_eq!(json["store_name"], "Hardware Hut");
    assert_eq!(json["total_amount_cents"], 4599);
    assert_eq!(json["receipt_date"], "2026-10-01");
}

#[tokio::test]
async fn test_upload_succeeds_when_broker_is_down() {
    let test = setup();
    test.broker.set_failure(FailureMode::DeclareTopic);

    let json = upload(&test.app, "T1", "x.pdf").await;

    assert!(json["id"].is_string());
    assert_eq!(test.store.record_count().await, 1);
    assert!(test.broker.published().is_empty());
}

#[tokio::test]
async fn test_upload_with_empty_file_name_is_rejected() {
    let test = setup();

    let (status, json) = send(
        &test.app,
        post_json("/tenants/T1/receipts", serde_json::json!({ "file_name": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("file_name"));
    assert_eq!(test.store.save_attempts(), 0);
    assert_eq!(test.broker.channels_opened(), 0);
}

#[tokio::test]
async fn test_upload_persistence_failure() {
    let test = setup();
    test.store.fail_saves("database offline").await;

    let (status, json) = send(
        &test.app,
        post_json("/tenants/T1/receipts", serde_json::json!({ "file_name": "x.pdf" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].is_string());
    assert!(test.broker.published().is_empty());
}

#[tokio::test]
async fn test_get_receipt() {
    let test = setup();
    let created = upload(&test.app, "T1", "x.pdf").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(&test.app, get(&format!("/tenants/T1/receipts/{id}"))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, created);
}

#[tokio::test]
async fn test_get_receipt_of_other_tenant_is_not_found() {
    let test = setup();
    let created = upload(&test.app, "T1", "x.pdf").await;
    let id = created["id"].as_str().unwrap();

    let (status, _) = send(&test.app, get(&format!("/tenants/T2/receipts/{id}"))).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_receipt_invalid_id() {
    let test = setup();

    let (status, _) = send(&test.app, get("/tenants/T1/receipts/not-a-uuid")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_and_archive_receipt() {
    let test = setup();
    let created = upload(&test.app, "T1", "x.pdf").await;
    let id = created["id"].as_str().unwrap();

    let (status, json) = send(
        &test.app,
        post_empty(&format!("/tenants/T1/receipts/{id}/verify")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["is_verified"], true);

    let (status, json) = send(
        &test.app,
        post_empty(&format!("/tenants/T1/receipts/{id}/archive")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "archived");

    assert_eq!(test.broker.published_with_key("receipt.verified").len(), 1);
    assert_eq!(test.broker.published_with_key("receipt.archived").len(), 1);
}

#[tokio::test]
async fn test_archive_twice_is_rejected() {
    let test = setup();
    let created = upload(&test.app, "T1", "x.pdf").await;
    let uri = format!("/tenants/T1/receipts/{}/archive", created["id"].as_str().unwrap());

    let (status, _) = send(&test.app, post_empty(&uri)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = send(&test.app, post_empty(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("archived"));
    assert_eq!(test.broker.published_with_key("receipt.archived").len(), 1);
}

#[tokio::test]
async fn test_verify_unknown_receipt() {
    let test = setup();

    let (status, _) = send(
        &test.app,
        post_empty(&format!(
            "/tenants/T1/receipts/{}/verify",
            uuid::Uuid::new_v4()
        )),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(test.broker.published().is_empty());
}

#[tokio::test]
async fn test_shutdown_cancels_pending_commands() {
    let test = setup();
    test.state.shutdown.cancel();

    let (status, _) = send(
        &test.app,
        post_json("/tenants/T1/receipts", serde_json::json!({ "file_name": "x.pdf" })),
    )
    .await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(test.store.save_attempts(), 0);
    assert!(test.broker.published().is_empty());
}

#[tokio::test]
async fn test_generate_and_get_audit_report() {
    let test = setup();
    let user_id = uuid::Uuid::new_v4();

    let (status, created) = send(
        &test.app,
        post_json(
            "/tenants/T2/audit-reports",
            serde_json::json!({
                "user_id": user_id,
                "title": "Week 41",
                "start_date": "2026-10-05",
                "end_date": "2026-10-11",
                "total_tracked_hours": 40.0,
                "productive_hours": 30.0,
                "summary": "Mostly deep work"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["productivity_percentage"], 75.0);
    assert_eq!(created["summary"], "Mostly deep work");

    let published = test.broker.published_with_key("auditreport.generated");
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].topic, "timeaudit-events");

    let id = created["id"].as_str().unwrap();
    let (status, json) = send(&test.app, get(&format!("/tenants/T2/audit-reports/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, created);
}

#[tokio::test]
async fn test_audit_report_with_inverted_period_is_rejected() {
    let test = setup();

    let (status, json) = send(
        &test.app,
        post_json(
            "/tenants/T2/audit-reports",
            serde_json::json!({
                "user_id": uuid::Uuid::new_v4(),
                "title": "Backwards",
                "start_date": "2026-10-11",
                "end_date": "2026-10-05",
                "total_tracked_hours": 1.0,
                "productive_hours": 1.0
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].as_str().unwrap().contains("end_date"));
    assert!(test.broker.published().is_empty());
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let test = setup();
    upload(&test.app, "T1", "x.pdf").await;

    let response = test.app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("commands_handled_total"));
    assert!(text.contains("events_published_total"));
}

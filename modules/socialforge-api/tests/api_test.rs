use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use tower::ServiceExt;
use uuid::Uuid;

use socialforge_api::{app, auth::sign, AppState};
use socialforge_common::{Platform, PlatformIdentifiers, PlatformResult};
use socialforge_orchestrator::{HttpNotifier, Orchestrator, PlatformTask, TaskInput};
use socialforge_store::JobStore;

const SECRET: &str = "webhook-test-secret";

struct StubTask(Platform);

#[async_trait]
impl PlatformTask for StubTask {
    fn platform(&self) -> Platform {
        self.0
    }

    async fn create(&self, input: &TaskInput) -> PlatformResult {
        PlatformResult::Success(match self.0 {
            Platform::Facebook => PlatformIdentifiers::Facebook {
                page_id: Some("42".into()),
                page_url: Some("https://facebook.com/p".into()),
                page_name: Some(input.handles.fb_page_name.clone()),
            },
            Platform::Youtube => PlatformIdentifiers::Youtube {
                channel_id: Some("UCx".into()),
                channel_url: Some("https://youtube.com/c".into()),
                channel_name: Some(input.handles.yt_channel_name.clone()),
                handle: Some(input.handles.yt_handle.clone()),
            },
            Platform::Instagram => PlatformIdentifiers::Instagram {
                username: Some(input.handles.ig_handle.clone()),
                password: Some("pw".into()),
                phone: None,
                device_id: None,
                url: None,
                warmup_triggered: false,
            },
        })
    }
}

async fn test_state() -> Arc<AppState> {
    let store = JobStore::in_memory().await.unwrap();
    let tasks: Vec<Arc<dyn PlatformTask>> = vec![
        Arc::new(StubTask(Platform::Facebook)),
        Arc::new(StubTask(Platform::Youtube)),
        Arc::new(StubTask(Platform::Instagram)),
    ];
    let orchestrator = Orchestrator::new(
        store,
        tasks,
        Arc::new(HttpNotifier::new()),
        "STAGE".into(),
        None,
        2,
        5,
    );
    Arc::new(AppState {
        orchestrator,
        webhook_secret: Some(SECRET.into()),
    })
}

fn signed_webhook(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/webhook/create-profiles")
        .header("Content-Type", "application/json")
        .header("X-Hub-Signature-256", format!("sha256={}", sign(SECRET, body.as_bytes())))
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_is_open() {
    let router = app(test_state().await);
    let response = router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn webhook_requires_a_valid_signature() {
    let state = test_state().await;
    let body = r#"{"title":"Banswara"}"#;

    // Missing signature
    let response = app(state.clone())
        .oneshot(
            Request::post("/webhook/create-profiles")
                .header("Content-Type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Wrong signature
    let response = app(state.clone())
        .oneshot(
            Request::post("/webhook/create-profiles")
                .header("Content-Type", "application/json")
                .header("X-Hub-Signature-256", "sha256=deadbeef")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn webhook_accepts_and_resubmission_returns_the_same_job() {
    let state = test_state().await;
    let body = r#"{"title":"Banswara"}"#;

    let response = app(state.clone()).oneshot(signed_webhook(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let first = json_body(response).await;
    assert_eq!(first["handles"]["ig_handle"], "stage.banswara");
    assert_eq!(first["external_key"], "banswara");

    let response = app(state.clone()).oneshot(signed_webhook(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second = json_body(response).await;
    assert_eq!(second["job_id"], first["job_id"]);
}

#[tokio::test]
async fn webhook_rejects_unknown_platform_names() {
    let state = test_state().await;
    let body = r#"{"title":"Kota","platforms":["facebook","tiktok"]}"#;

    let response = app(state).oneshot(signed_webhook(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn status_endpoint_round_trip() {
    let state = test_state().await;
    let response = app(state.clone())
        .oneshot(signed_webhook(r#"{"title":"Bundi"}"#))
        .await
        .unwrap();
    let submitted = json_body(response).await;
    let job_id = submitted["job_id"].as_str().unwrap().to_string();

    let response = app(state.clone())
        .oneshot(
            Request::get(format!("/status/{job_id}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let status = json_body(response).await;
    assert_eq!(status["title"], "Bundi");

    // Unknown id and malformed id
    let response = app(state.clone())
        .oneshot(
            Request::get(format!("/status/{}", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app(state)
        .oneshot(Request::get("/status/not-a-uuid").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn retry_of_a_fully_successful_job_conflicts() {
    let state = test_state().await;
    let response = app(state.clone())
        .oneshot(signed_webhook(r#"{"title":"Baran"}"#))
        .await
        .unwrap();
    let submitted = json_body(response).await;
    let job_id: Uuid = submitted["job_id"].as_str().unwrap().parse().unwrap();

    // Let the stub tasks finish
    let store = state.orchestrator.store().clone();
    for _ in 0..500 {
        if store.get(job_id).await.unwrap().status.is_terminal() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let response = app(state.clone())
        .oneshot(
            Request::post(format!("/jobs/{job_id}/retry"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app(state)
        .oneshot(
            Request::post(format!("/jobs/{}/retry", Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn job_listing_filters_by_status() {
    let state = test_state().await;
    app(state.clone())
        .oneshot(signed_webhook(r#"{"title":"Udaipur"}"#))
        .await
        .unwrap();

    let response = app(state.clone())
        .oneshot(Request::get("/jobs").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let listing = json_body(response).await;
    assert_eq!(listing["jobs"].as_array().unwrap().len(), 1);

    let response = app(state)
        .oneshot(Request::get("/jobs?status=nonsense").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use chrono::NaiveDate;
use comic_workflow::{
    MemoryStore, Project, StepStatus, StepType, WorkflowRun, WorkflowService, WorkflowStep,
    http_api,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::util::ServiceExt;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_router() -> axum::Router {
    let store = Arc::new(MemoryStore::new());
    store.insert_project(Project::new(1, "Nightfall #1", date(2025, 1, 6)));
    let service = WorkflowService::new(store).with_clock(|| date(2025, 1, 1));
    http_api::router(http_api::AppState::new(service))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok() {
    let response = new_router().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn workflow_lifecycle_via_http_api() {
    let app = new_router();

    // Initialize
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/projects/1/workflow",
            json!({ "actor": "editor" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let run: WorkflowRun = read_json(response).await;
    assert_eq!(run.steps.len(), 9);

    // A second, unconfirmed initialize is a conflict
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/projects/1/workflow",
            json!({ "actor": "editor" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "conflict");

    // Move plot into progress
    let plot = run
        .steps
        .iter()
        .find(|s| s.step_type == StepType::Plot)
        .unwrap();
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/steps/{}", plot.id),
            json!({ "actor": "writer", "status": "in_progress", "progress": 50 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated: WorkflowStep = read_json(response).await;
    assert_eq!(updated.status, StepStatus::InProgress);
    assert_eq!(updated.progress, 50);

    // Invalid transition
    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/steps/{}", plot.id),
            json!({ "actor": "writer", "status": "not_started" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Due date change rebuilds the workflow
    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            "/projects/1/due_date",
            json!({ "actor": "editor", "due_date": "2025-06-30" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rebuilt: Option<WorkflowRun> = read_json(response).await;
    let rebuilt = rebuilt.unwrap();
    let print = rebuilt
        .steps
        .iter()
        .find(|s| s.step_type == StepType::Print)
        .unwrap();
    assert_eq!(print.due_date, Some(date(2025, 6, 30)));
    let plot = rebuilt
        .steps
        .iter()
        .find(|s| s.step_type == StepType::Plot)
        .unwrap();
    assert_eq!(plot.status, StepStatus::InProgress);

    // Listing returns the rebuilt steps
    let response = app.clone().oneshot(get("/projects/1/workflow")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let steps: Vec<WorkflowStep> = read_json(response).await;
    assert_eq!(steps, rebuilt.steps);

    // Feasibility
    let response = app.oneshot(get("/projects/1/feasibility")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let report: Value = read_json(response).await;
    assert_eq!(report["days_late"], 0);
    assert_eq!(report["projected_completion"], "2025-06-30");
}

#[tokio::test]
async fn unknown_project_and_step_are_not_found() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(get("/projects/42/workflow"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "not_found");
    assert_eq!(body["message"], "project 42 not found");

    let response = app
        .oneshot(json_request(
            "PATCH",
            "/steps/77",
            json!({ "actor": "editor", "progress": 10 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn timeline_endpoint_calculates_dates() {
    let app = new_router();
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/timeline",
            json!({ "direction": "forward", "start_date": "2025-01-01" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["in_store_date"], "2025-02-03");

    let response = app
        .oneshot(json_request(
            "POST",
            "/timeline",
            json!({ "direction": "backward", "target_date": "2025-02-03", "printing_days": -2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = read_json(response).await;
    assert_eq!(body["error"], "invalid_request");
}

#[tokio::test]
async fn classify_endpoint_reports_status() {
    let response = new_router()
        .oneshot(json_request(
            "POST",
            "/progress/classify",
            json!({
                "total_pages": 20,
                "completed_pages": 5,
                "pages_per_week": 10,
                "start_date": "2025-01-01",
                "due_date": "2025-01-31",
                "today": "2025-01-16"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = read_json(response).await;
    assert_eq!(body["status"], "at_risk");
    assert_eq!(body["progress"], 25);
}

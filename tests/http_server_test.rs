//! JSON-RPC boundary tests driven through the axum router

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use co2_insights::{
    config::ModelConfig,
    dataset::DatasetStore,
    protocol::{codes, JsonRpcResponse},
    HttpJsonRpcServer, InsightsService,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const FIXTURE: &[u8] = include_bytes!("fixtures/emissions.csv");

fn router() -> Router {
    let service = InsightsService::new(Arc::new(DatasetStore::new()), ModelConfig::default());
    HttpJsonRpcServer::new(service, 64 * 1024).router()
}

async fn call(app: &Router, method: &str, params: Value) -> JsonRpcResponse {
    let body = json!({
        "jsonrpc": "2.0",
        "method": method,
        "params": params,
        "id": 7,
    });
    let request = Request::post("/rpc")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn upload_fixture(app: &Router) -> JsonRpcResponse {
    call(
        app,
        "upload_csv",
        json!({ "file_content": BASE64.encode(FIXTURE) }),
    )
    .await
}

#[tokio::test]
async fn test_upload_then_fetch_trend() {
    let app = router();

    let upload = upload_fixture(&app).await;
    assert!(upload.error.is_none());
    let result = upload.result.unwrap();
    assert_eq!(result["status"], "success");
    assert_eq!(result["rows"], 9);
    assert_eq!(result["unparseable_dates"], 1);

    let response = call(&app, "fetch_trend", json!({ "facility_name": "A" })).await;
    assert_eq!(response.id, Some(json!(7)));
    let trend = response.result.unwrap();
    assert_eq!(trend["facility_name"], "A");
    assert_eq!(
        trend["labels"],
        json!(["2024-01-02", "2024-01-11", "2024-01-20"])
    );
    assert_eq!(trend["total_emissions"], 345.0);
}

#[tokio::test]
async fn test_legacy_method_names() {
    let app = router();

    let upload = call(
        &app,
        "UploadCSV",
        json!({ "file_content": BASE64.encode(FIXTURE) }),
    )
    .await;
    assert!(upload.error.is_none());

    let insights = call(&app, "GetInsightsPlot", json!({ "facility_name": "B" })).await;
    let trend = insights.result.unwrap();
    assert_eq!(trend["labels"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_fetch_before_upload_is_invalid_params() {
    let app = router();
    for method in [
        "fetch_trend",
        "fetch_capture_efficiency",
        "fetch_storage_efficiency",
    ] {
        let response = call(&app, method, json!({ "facility_name": "A" })).await;
        let error = response.error.unwrap();
        assert_eq!(error.code, codes::INVALID_PARAMS, "{method}");
    }
}

#[tokio::test]
async fn test_unknown_facility_is_invalid_params() {
    let app = router();
    upload_fixture(&app).await;

    let response = call(
        &app,
        "fetch_storage_efficiency",
        json!({ "facility_name": "Z" }),
    )
    .await;
    assert!(response.result.is_none());
    assert_eq!(response.error.unwrap().code, codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_bad_csv_is_internal_error_with_details() {
    let app = router();
    let response = call(
        &app,
        "upload_csv",
        json!({ "file_content": BASE64.encode("facility_name,date\nA,2024-01-01\n") }),
    )
    .await;

    let error = response.error.unwrap();
    assert_eq!(error.code, codes::INTERNAL_ERROR);
    assert!(error.data.unwrap()["details"].is_string());
}

#[tokio::test]
async fn test_efficiency_and_storage_shapes() {
    let app = router();
    upload_fixture(&app).await;

    let efficiency = call(
        &app,
        "fetch_capture_efficiency",
        json!({ "facility_name": "A" }),
    )
    .await
    .result
    .unwrap();
    assert_eq!(efficiency["labels"].as_array().unwrap().len(), 3);
    assert_eq!(efficiency["inefficiency_flag"].as_array().unwrap().len(), 3);

    let storage = call(
        &app,
        "fetch_storage_efficiency",
        json!({ "facility_name": "A" }),
    )
    .await
    .result
    .unwrap();
    assert_eq!(storage["actual_stored_co2"], json!([80.0, 94.0, 95.0]));
    assert_eq!(
        storage["storage_issue_detected"].as_array().unwrap().len(),
        3
    );
}

#[tokio::test]
async fn test_malformed_json_is_parse_error() {
    let app = router();
    let request = Request::post("/rpc")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let response: JsonRpcResponse = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(response.error.unwrap().code, codes::PARSE_ERROR);
}

#[tokio::test]
async fn test_raw_upload_and_health() {
    let app = router();

    let health = app
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(health.into_body(), usize::MAX).await.unwrap();
    let health: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["dataset_loaded"], false);

    let upload = app
        .clone()
        .oneshot(
            Request::post("/upload")
                .header("content-type", "text/csv")
                .body(Body::from(FIXTURE))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(upload.status(), StatusCode::OK);

    let health = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = to_bytes(health.into_body(), usize::MAX).await.unwrap();
    let health: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(health["dataset_loaded"], true);
}

#[tokio::test]
async fn test_raw_upload_over_limit() {
    let service = InsightsService::new(Arc::new(DatasetStore::new()), ModelConfig::default());
    let app = HttpJsonRpcServer::new(service, 16).router();

    let response = app
        .oneshot(
            Request::post("/upload")
                .body(Body::from(FIXTURE))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

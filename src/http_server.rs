//! HTTP JSON-RPC Server for co2-insights
//!
//! This module provides an HTTP server that accepts JSON-RPC requests
//! and forwards them to the insights service.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    error::Error,
    protocol::{
        codes, FacilityParams, JsonRpcError, JsonRpcRequest, JsonRpcResponse, UploadCsvParams,
        UploadCsvResponse, JSONRPC_VERSION,
    },
    service::InsightsService,
};

#[derive(Clone)]
struct AppState {
    service: InsightsService,
    max_upload_bytes: usize,
}

pub struct HttpJsonRpcServer {
    state: AppState,
}

impl HttpJsonRpcServer {
    pub fn new(service: InsightsService, max_upload_bytes: usize) -> Self {
        Self {
            state: AppState {
                service,
                max_upload_bytes,
            },
        }
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        // base64 で膨らむ分を見込む
        let body_limit = self.state.max_upload_bytes.saturating_mul(4) / 3 + 4096;

        Router::new()
            .route("/", post(handle_json_rpc))
            .route("/rpc", post(handle_json_rpc))
            .route("/upload", post(handle_upload))
            .route("/health", get(handle_health))
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .with_state(self.state.clone())
    }

    pub async fn serve(&self, addr: &str) -> anyhow::Result<()> {
        let app = self.router();

        info!("Starting HTTP JSON-RPC server on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

async fn handle_json_rpc(State(state): State<AppState>, body: Bytes) -> Json<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Unparseable JSON-RPC body: {}", e);
            return Json(JsonRpcResponse::failure(
                None,
                JsonRpcError::new(codes::PARSE_ERROR, format!("Parse error: {}", e)),
            ));
        }
    };

    info!("Received JSON-RPC request: method={}", request.method);

    if request.jsonrpc != JSONRPC_VERSION {
        return Json(JsonRpcResponse::failure(
            request.id,
            JsonRpcError::new(codes::INVALID_REQUEST, "jsonrpc must be \"2.0\""),
        ));
    }

    let id = request.id.clone();
    match process_request(&state, &request).await {
        Ok(result) => Json(JsonRpcResponse::success(id, result)),
        Err(e) => {
            if e.code == codes::INTERNAL_ERROR {
                error!("JSON-RPC {} failed: {}", request.method, e.message);
            } else {
                info!("JSON-RPC {} returned no data: {}", request.method, e.message);
            }
            Json(JsonRpcResponse::failure(id, e))
        }
    }
}

async fn process_request(
    state: &AppState,
    request: &JsonRpcRequest,
) -> Result<Value, JsonRpcError> {
    let service = &state.service;

    match request.method.as_str() {
        "upload_csv" | "UploadCSV" => {
            let params: UploadCsvParams = parse_params(request)?;
            let bytes = BASE64
                .decode(params.file_content.trim())
                .map_err(|e| JsonRpcError::invalid_params(format!("file_content: {}", e)))?;
            if bytes.len() > state.max_upload_bytes {
                return Err(JsonRpcError::invalid_params(format!(
                    "upload of {} bytes exceeds limit of {}",
                    bytes.len(),
                    state.max_upload_bytes
                )));
            }
            let summary = service.ingest(&bytes).await?;
            to_value(UploadCsvResponse::success(&summary, upload_message(service)))
        }
        "fetch_trend" | "get_insights" | "GetInsightsPlot" => {
            let params: FacilityParams = parse_params(request)?;
            to_value(service.fetch_trend(&params.facility_name).await?)
        }
        "fetch_capture_efficiency" => {
            let params: FacilityParams = parse_params(request)?;
            to_value(service.fetch_capture_efficiency(&params.facility_name).await?)
        }
        "fetch_storage_efficiency" => {
            let params: FacilityParams = parse_params(request)?;
            to_value(service.fetch_storage_efficiency(&params.facility_name).await?)
        }
        other => Err(JsonRpcError::method_not_found(other)),
    }
}

/// Raw CSV upload: the body is the file itself
async fn handle_upload(State(state): State<AppState>, body: Bytes) -> Response {
    if body.len() > state.max_upload_bytes {
        return (
            StatusCode::PAYLOAD_TOO_LARGE,
            Json(json!({ "status": "failed", "message": "upload exceeds size limit" })),
        )
            .into_response();
    }

    match state.service.ingest(&body).await {
        Ok(summary) => {
            let response = UploadCsvResponse::success(&summary, upload_message(&state.service));
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => {
            error!("Upload failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "status": "failed", "message": e.to_string() })),
            )
                .into_response()
        }
    }
}

async fn handle_health(State(state): State<AppState>) -> Json<Value> {
    let dataset_loaded = state.service.store().is_loaded().await;
    Json(json!({
        "status": "ok",
        "dataset_loaded": dataset_loaded,
    }))
}

fn parse_params<T: DeserializeOwned>(request: &JsonRpcRequest) -> Result<T, JsonRpcError> {
    let params = request
        .params
        .clone()
        .ok_or_else(|| JsonRpcError::invalid_params("missing params"))?;
    serde_json::from_value(params).map_err(|e| JsonRpcError::invalid_params(e.to_string()))
}

fn to_value<T: serde::Serialize>(value: T) -> Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| Error::from(e).into())
}

fn upload_message(service: &InsightsService) -> String {
    match service.store().persist_path() {
        Some(path) => format!("CSV uploaded and saved to {}", path.display()),
        None => "CSV uploaded".to_string(),
    }
}

//! JSON-RPC 2.0 wire types for the insights boundary.

use crate::dataset::IngestSummary;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// Standard JSON-RPC error codes
pub mod codes {
    pub const PARSE_ERROR: i32 = -32700;
    pub const INVALID_REQUEST: i32 = -32600;
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
}

/// JSON-RPC 2.0 Request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// JSON-RPC 2.0 Response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 Error
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(codes::METHOD_NOT_FOUND, format!("Method not found: {}", method))
    }

    pub fn invalid_params(details: impl Into<String>) -> Self {
        Self::new(codes::INVALID_PARAMS, format!("Invalid params: {}", details.into()))
    }
}

impl From<Error> for JsonRpcError {
    fn from(err: Error) -> Self {
        match err {
            Error::DatasetUnavailable | Error::NoMatchingRecords { .. } => JsonRpcError {
                code: err.to_json_rpc_code(),
                message: err.to_string(),
                data: None,
            },
            Error::IngestionFailure(ref details) => JsonRpcError {
                code: err.to_json_rpc_code(),
                message: "Internal error: CSV could not be ingested".to_string(),
                data: Some(json!({ "details": details })),
            },
            _ => JsonRpcError {
                code: err.to_json_rpc_code(),
                message: err.to_string(),
                data: None,
            },
        }
    }
}

/// `upload_csv` parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCsvParams {
    /// Base64-encoded CSV bytes
    pub file_content: String,
}

/// Parameters shared by every fetch method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityParams {
    pub facility_name: String,
}

/// `upload_csv` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadCsvResponse {
    pub status: String,
    pub message: String,
    pub rows: usize,
    pub facilities: usize,
    pub unparseable_dates: usize,
}

impl UploadCsvResponse {
    pub fn success(summary: &IngestSummary, message: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: message.into(),
            rows: summary.rows,
            facilities: summary.facilities,
            unparseable_dates: summary.unparseable_dates,
        }
    }
}

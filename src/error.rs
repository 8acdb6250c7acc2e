//! Error types for the CO2 insights pipeline and its JSON-RPC boundary.

use thiserror::Error;

/// Result type alias for insights operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for dataset ingestion and pipeline evaluation
#[derive(Debug, Error)]
pub enum Error {
    /// No dataset has been ingested yet
    #[error("Dataset unavailable: upload a CSV before requesting insights")]
    DatasetUnavailable,

    /// Facility filter or completeness filter left nothing to analyse
    #[error("No data available for facility: {facility}")]
    NoMatchingRecords { facility: String },

    /// Uploaded bytes could not be parsed into the record schema
    #[error("Ingestion failure: {0}")]
    IngestionFailure(String),

    /// Shape or argument error inside the computation layer
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Convert error to JSON-RPC error code
    pub fn to_json_rpc_code(&self) -> i32 {
        match self {
            Error::DatasetUnavailable | Error::NoMatchingRecords { .. } => -32602,
            _ => -32603,
        }
    }

    /// "Not found / invalid argument" class of outcomes, as opposed to internal faults
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::DatasetUnavailable | Error::NoMatchingRecords { .. }
        )
    }

    pub(crate) fn no_matching(facility: &str) -> Self {
        Error::NoMatchingRecords {
            facility: facility.to_string(),
        }
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::IngestionFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_rpc_codes() {
        assert_eq!(Error::DatasetUnavailable.to_json_rpc_code(), -32602);
        assert_eq!(Error::no_matching("A").to_json_rpc_code(), -32602);
        assert_eq!(
            Error::IngestionFailure("bad header".into()).to_json_rpc_code(),
            -32603
        );
        // モデル内部の失敗はクライアントの引数の誤りではない
        assert_eq!(
            Error::InvalidInput("normal equations are singular".into()).to_json_rpc_code(),
            -32603
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(Error::DatasetUnavailable.is_not_found());
        assert!(Error::no_matching("A").is_not_found());
        assert!(!Error::IngestionFailure("x".into()).is_not_found());
    }

    #[test]
    fn test_error_message_contains_facility() {
        let err = Error::no_matching("Plant 7");
        assert!(err.to_string().contains("Plant 7"));
    }
}

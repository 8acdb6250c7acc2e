//! # co2-insights
//!
//! Facility-level CO2 emission, capture and storage analytics.
//!
//! An uploaded CSV becomes the active dataset. Each request narrows one facility's
//! rows to its most recent calendar month, fits a ridge regression for an in-sample
//! trend line, and derives efficiency or storage anomaly flags from the fit. Results
//! are served over a JSON-RPC boundary.

pub mod analytics;
pub mod config;
pub mod dataset;
pub mod error;
pub mod http_server;
pub mod logging;
pub mod protocol;
pub mod service;

pub use analytics::{AnalysisResult, EfficiencyResult, Pipeline, StorageResult, TrendResult};
pub use dataset::{Dataset, DatasetStore, MeasurementRecord};
pub use error::{Error, Result};
pub use http_server::HttpJsonRpcServer;
pub use service::InsightsService;

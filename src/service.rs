//! Insights service.
//!
//! The four logical operations exposed to the transport boundary. Each fetch takes
//! one dataset snapshot up front and runs every pipeline stage against it.

use crate::analytics::{
    self, AnalysisResult, EfficiencyResult, Pipeline, RidgeRegression, StorageResult, TrendResult,
};
use crate::config::ModelConfig;
use crate::dataset::{DatasetStore, IngestSummary};
use crate::error::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Entry point shared by every request handler
#[derive(Debug, Clone)]
pub struct InsightsService {
    store: Arc<DatasetStore>,
    model: RidgeRegression,
}

impl InsightsService {
    /// Create a service over an injected store
    pub fn new(store: Arc<DatasetStore>, model: ModelConfig) -> Self {
        Self {
            store,
            model: RidgeRegression::new(model.ridge_alpha),
        }
    }

    pub fn store(&self) -> &Arc<DatasetStore> {
        &self.store
    }

    /// Validate, parse and atomically activate an uploaded CSV
    pub async fn ingest(&self, bytes: &[u8]) -> Result<IngestSummary> {
        info!("Upload request received ({} bytes)", bytes.len());
        self.store.ingest(bytes).await.inspect_err(|e| {
            warn!("Upload rejected: {}", e);
        })
    }

    /// Emission vs capture trend
    pub async fn fetch_trend(&self, facility: &str) -> Result<TrendResult> {
        let snapshot = self.store.snapshot().await?;
        debug!("Trend request for '{}'", facility);
        analytics::trend_insights(snapshot.records(), facility, &self.model)
    }

    /// Capture-efficiency anomaly detection
    pub async fn fetch_capture_efficiency(&self, facility: &str) -> Result<EfficiencyResult> {
        let snapshot = self.store.snapshot().await?;
        debug!("Capture efficiency request for '{}'", facility);
        analytics::efficiency_insights(snapshot.records(), facility, &self.model)
    }

    /// Storage-shortfall detection
    pub async fn fetch_storage_efficiency(&self, facility: &str) -> Result<StorageResult> {
        let snapshot = self.store.snapshot().await?;
        debug!("Storage efficiency request for '{}'", facility);
        analytics::storage_insights(snapshot.records(), facility, &self.model)
    }

    /// Run any pipeline by kind
    pub async fn fetch(&self, pipeline: Pipeline, facility: &str) -> Result<AnalysisResult> {
        let snapshot = self.store.snapshot().await?;
        analytics::run_pipeline(snapshot.records(), facility, pipeline, &self.model)
    }
}

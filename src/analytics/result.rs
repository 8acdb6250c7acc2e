//! Analysis Results
//!
//! パイプラインごとの結果型と組み立て処理

use super::prediction::FittedTrend;
use super::window::FacilityWindow;
use crate::dataset::Field;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// 排出トレンド結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendResult {
    pub facility_name: String,
    /// 日付ラベル
    pub labels: Vec<String>,
    /// 実測排出量（特徴量列）
    pub actual_values: Vec<f64>,
    /// 回収量の予測値
    pub predicted_values: Vec<f64>,
    pub min_emissions: f64,
    pub max_emissions: f64,
    pub total_emissions: f64,
    pub total_captured: f64,
    /// 欠損により除外された行数
    pub rows_dropped: usize,
}

impl TrendResult {
    /// ウィンドウとフィット結果から組み立て
    ///
    /// 集計値はフィットに使ったウィンドウのみで計算する。
    pub fn assemble(window: &FacilityWindow, fit: &FittedTrend) -> Result<Self> {
        let emitted = window.column(Field::Emitted)?;
        let captured = window.column(Field::Captured)?;
        ensure_aligned(window, &fit.predictions)?;

        Ok(Self {
            facility_name: window.facility().to_string(),
            labels: window.labels(),
            min_emissions: emitted.iter().copied().fold(f64::INFINITY, f64::min),
            max_emissions: emitted.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            total_emissions: emitted.iter().sum(),
            total_captured: captured.iter().sum(),
            actual_values: emitted,
            predicted_values: fit.predictions.clone(),
            rows_dropped: window.dropped_incomplete(),
        })
    }
}

/// 回収効率結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EfficiencyResult {
    pub labels: Vec<String>,
    /// 実測回収効率（%）
    pub actual_values: Vec<f64>,
    /// 予測回収効率（%）
    pub predicted_values: Vec<f64>,
    /// 実測が予測より 5% 超低い行
    pub inefficiency_flag: Vec<bool>,
    pub rows_dropped: usize,
}

impl EfficiencyResult {
    pub fn assemble(window: &FacilityWindow, fit: &FittedTrend, flags: Vec<bool>) -> Result<Self> {
        ensure_aligned(window, &fit.predictions)?;
        ensure_aligned(window, &flags)?;

        Ok(Self {
            labels: window.labels(),
            actual_values: window.column(Field::Efficiency)?,
            predicted_values: fit.predictions.clone(),
            inefficiency_flag: flags,
            rows_dropped: window.dropped_incomplete(),
        })
    }
}

/// 貯留結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageResult {
    pub labels: Vec<String>,
    pub actual_stored_co2: Vec<f64>,
    pub predicted_stored_co2: Vec<f64>,
    /// 実測貯留量が予測を下回った行
    pub storage_issue_detected: Vec<bool>,
    pub rows_dropped: usize,
}

impl StorageResult {
    pub fn assemble(window: &FacilityWindow, fit: &FittedTrend, flags: Vec<bool>) -> Result<Self> {
        ensure_aligned(window, &fit.predictions)?;
        ensure_aligned(window, &flags)?;

        Ok(Self {
            labels: window.labels(),
            actual_stored_co2: window.column(Field::Stored)?,
            predicted_stored_co2: fit.predictions.clone(),
            storage_issue_detected: flags,
            rows_dropped: window.dropped_incomplete(),
        })
    }
}

/// パイプライン結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pipeline", rename_all = "snake_case")]
pub enum AnalysisResult {
    Trend(TrendResult),
    Efficiency(EfficiencyResult),
    Storage(StorageResult),
}

impl AnalysisResult {
    /// ラベル数（= ウィンドウのレコード数）
    pub fn len(&self) -> usize {
        self.labels().len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels().is_empty()
    }

    pub fn labels(&self) -> &[String] {
        match self {
            AnalysisResult::Trend(r) => &r.labels,
            AnalysisResult::Efficiency(r) => &r.labels,
            AnalysisResult::Storage(r) => &r.labels,
        }
    }

    /// すべての系列が同じ長さか
    pub fn is_aligned(&self) -> bool {
        let n = self.len();
        match self {
            AnalysisResult::Trend(r) => {
                r.actual_values.len() == n && r.predicted_values.len() == n
            }
            AnalysisResult::Efficiency(r) => {
                r.actual_values.len() == n
                    && r.predicted_values.len() == n
                    && r.inefficiency_flag.len() == n
            }
            AnalysisResult::Storage(r) => {
                r.actual_stored_co2.len() == n
                    && r.predicted_stored_co2.len() == n
                    && r.storage_issue_detected.len() == n
            }
        }
    }
}

fn ensure_aligned<T>(window: &FacilityWindow, series: &[T]) -> Result<()> {
    if series.len() != window.len() {
        return Err(Error::InvalidInput(format!(
            "series length {} does not match window length {}",
            series.len(),
            window.len()
        )));
    }
    Ok(())
}

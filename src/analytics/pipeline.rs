//! Insight Pipelines
//!
//! フィルタ → 回帰 → フラグ判定 → 結果組み立て の共通パイプライン

use super::anomaly::{FlagEvaluator, FlagRule};
use super::prediction::{FittedTrend, RidgeRegression};
use super::result::{AnalysisResult, EfficiencyResult, StorageResult, TrendResult};
use super::window::{FacilityWindow, RecordFilter};
use crate::dataset::{Field, MeasurementRecord};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// パイプライン種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pipeline {
    /// 排出量 → 回収量
    Trend,
    /// 排出量 → 回収効率
    Efficiency,
    /// 排出量・回収量 → 貯留量
    Storage,
}

impl Pipeline {
    pub const ALL: [Pipeline; 3] = [Pipeline::Trend, Pipeline::Efficiency, Pipeline::Storage];

    /// 日付以外の必須フィールド
    pub fn required_fields(&self) -> &'static [Field] {
        match self {
            Pipeline::Trend => &[Field::Emitted, Field::Efficiency, Field::Captured],
            Pipeline::Efficiency => &[Field::Emitted, Field::Efficiency],
            Pipeline::Storage => &[Field::Emitted, Field::Captured, Field::Stored],
        }
    }

    /// 特徴量
    pub fn features(&self) -> &'static [Field] {
        match self {
            Pipeline::Trend | Pipeline::Efficiency => &[Field::Emitted],
            Pipeline::Storage => &[Field::Emitted, Field::Captured],
        }
    }

    /// 目的変数
    pub fn target(&self) -> Field {
        match self {
            Pipeline::Trend => Field::Captured,
            Pipeline::Efficiency => Field::Efficiency,
            Pipeline::Storage => Field::Stored,
        }
    }

    /// フラグ判定ルール（トレンドはフラグなし）
    pub fn flag_rule(&self) -> Option<FlagRule> {
        match self {
            Pipeline::Trend => None,
            Pipeline::Efficiency => Some(FlagRule::capture_efficiency()),
            Pipeline::Storage => Some(FlagRule::StorageShortfall),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Pipeline::Trend => "trend",
            Pipeline::Efficiency => "efficiency",
            Pipeline::Storage => "storage",
        }
    }
}

impl fmt::Display for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pipeline {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trend" | "emission" => Ok(Pipeline::Trend),
            "efficiency" | "capture_efficiency" => Ok(Pipeline::Efficiency),
            "storage" | "storage_efficiency" => Ok(Pipeline::Storage),
            other => Err(Error::InvalidInput(format!("unknown pipeline '{}'", other))),
        }
    }
}

/// 施設ウィンドウの抽出と回帰フィット
fn fit_window(
    records: &[MeasurementRecord],
    facility: &str,
    pipeline: Pipeline,
    model: &RidgeRegression,
) -> Result<(FacilityWindow, FittedTrend)> {
    let window = RecordFilter::new(pipeline.required_fields()).select(records, facility)?;

    let features = window.feature_matrix(pipeline.features())?;
    let target = window.column(pipeline.target())?;
    let fit = model.fit(&features, &target)?;

    debug!(
        "{} fit for '{}' ({}): coefficients={:?}, intercept={:.4}",
        pipeline,
        facility,
        window.period(),
        fit.coefficients,
        fit.intercept
    );

    Ok((window, fit))
}

fn evaluate_flags(pipeline: Pipeline, actual: &[f64], fit: &FittedTrend) -> Result<Vec<bool>> {
    match pipeline.flag_rule() {
        Some(rule) => FlagEvaluator::new(rule).evaluate_series(actual, &fit.predictions),
        None => Ok(Vec::new()),
    }
}

/// 排出トレンド
pub fn trend_insights(
    records: &[MeasurementRecord],
    facility: &str,
    model: &RidgeRegression,
) -> Result<TrendResult> {
    let (window, fit) = fit_window(records, facility, Pipeline::Trend, model)?;
    TrendResult::assemble(&window, &fit)
}

/// 回収効率の異常検知
pub fn efficiency_insights(
    records: &[MeasurementRecord],
    facility: &str,
    model: &RidgeRegression,
) -> Result<EfficiencyResult> {
    let pipeline = Pipeline::Efficiency;
    let (window, fit) = fit_window(records, facility, pipeline, model)?;
    let actual = window.column(pipeline.target())?;
    let flags = evaluate_flags(pipeline, &actual, &fit)?;
    EfficiencyResult::assemble(&window, &fit, flags)
}

/// 貯留不足の検知
pub fn storage_insights(
    records: &[MeasurementRecord],
    facility: &str,
    model: &RidgeRegression,
) -> Result<StorageResult> {
    let pipeline = Pipeline::Storage;
    let (window, fit) = fit_window(records, facility, pipeline, model)?;
    let actual = window.column(pipeline.target())?;
    let flags = evaluate_flags(pipeline, &actual, &fit)?;
    StorageResult::assemble(&window, &fit, flags)
}

/// 種別を指定してパイプラインを実行
pub fn run_pipeline(
    records: &[MeasurementRecord],
    facility: &str,
    pipeline: Pipeline,
    model: &RidgeRegression,
) -> Result<AnalysisResult> {
    match pipeline {
        Pipeline::Trend => trend_insights(records, facility, model).map(AnalysisResult::Trend),
        Pipeline::Efficiency => {
            efficiency_insights(records, facility, model).map(AnalysisResult::Efficiency)
        }
        Pipeline::Storage => {
            storage_insights(records, facility, model).map(AnalysisResult::Storage)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        facility: &str,
        date: &str,
        emitted: f64,
        captured: f64,
        stored: f64,
        efficiency: f64,
    ) -> MeasurementRecord {
        MeasurementRecord::new(
            facility,
            NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            emitted,
            captured,
            stored,
            efficiency,
        )
    }

    fn sample() -> Vec<MeasurementRecord> {
        vec![
            record("A", "2024-01-15", 120.0, 96.0, 90.0, 80.0),
            record("A", "2023-12-20", 500.0, 100.0, 50.0, 20.0),
            record("A", "2024-01-03", 100.0, 85.0, 70.0, 85.0),
            record("B", "2024-02-01", 10.0, 5.0, 4.0, 50.0),
            record("A", "2024-01-09", 110.0, 88.0, 88.0, 80.0),
            record("A", "2023-12-02", 400.0, 90.0, 60.0, 22.5),
        ]
    }

    #[test]
    fn test_trend_uses_latest_month_in_date_order() {
        let result = trend_insights(&sample(), "A", &RidgeRegression::default()).unwrap();

        assert_eq!(result.facility_name, "A");
        assert_eq!(result.labels, vec!["2024-01-03", "2024-01-09", "2024-01-15"]);
        assert_eq!(result.actual_values, vec![100.0, 110.0, 120.0]);
        assert_eq!(result.predicted_values.len(), 3);
        assert_eq!(result.min_emissions, 100.0);
        assert_eq!(result.max_emissions, 120.0);
        assert_eq!(result.total_emissions, 330.0);
        assert_eq!(result.total_captured, 269.0);
    }

    #[test]
    fn test_trend_predictions_follow_ridge_fit() {
        let records = sample();
        let result = trend_insights(&records, "A", &RidgeRegression::default()).unwrap();

        let expected = RidgeRegression::default()
            .fit(
                &[vec![100.0], vec![110.0], vec![120.0]],
                &[85.0, 88.0, 96.0],
            )
            .unwrap();
        assert_eq!(result.predicted_values, expected.predictions);
    }

    #[test]
    fn test_trend_requires_efficiency_column() {
        let mut records = sample();
        for r in records.iter_mut().filter(|r| r.facility_name == "A") {
            r.capture_efficiency_percent = None;
        }
        let err = trend_insights(&records, "A", &RidgeRegression::default()).unwrap_err();
        assert!(matches!(err, Error::NoMatchingRecords { .. }));
    }

    #[test]
    fn test_efficiency_flags_align_with_labels() {
        let result = efficiency_insights(&sample(), "A", &RidgeRegression::default()).unwrap();
        assert_eq!(result.labels.len(), 3);
        assert_eq!(result.inefficiency_flag.len(), 3);
        assert_eq!(result.actual_values, vec![85.0, 80.0, 80.0]);
    }

    #[test]
    fn test_storage_flags_are_strict_comparison() {
        let result = storage_insights(&sample(), "A", &RidgeRegression::default()).unwrap();
        for ((actual, predicted), flag) in result
            .actual_stored_co2
            .iter()
            .zip(&result.predicted_stored_co2)
            .zip(&result.storage_issue_detected)
        {
            assert_eq!(*flag, actual < predicted);
        }
    }

    #[test]
    fn test_storage_with_collinear_features_never_singular() {
        // 回収量 = 2 × 排出量、貯留量 = 3 × 排出量
        for alpha in [RidgeRegression::DEFAULT_ALPHA, 1e-20] {
            for scale in [1e4, 1e8] {
                let records: Vec<_> = (1..=3)
                    .map(|i| {
                        let emitted = scale * i as f64;
                        let date = format!("2024-03-0{}", i);
                        record("S", &date, emitted, 2.0 * emitted, 3.0 * emitted, 80.0)
                    })
                    .collect();

                let result = storage_insights(&records, "S", &RidgeRegression::new(alpha))
                    .unwrap_or_else(|e| panic!("alpha {alpha}, scale {scale}: {e}"));

                for (predicted, actual) in result
                    .predicted_stored_co2
                    .iter()
                    .zip(&result.actual_stored_co2)
                {
                    assert!((predicted - actual).abs() <= 1e-6 * actual);
                }
            }
        }
    }

    #[test]
    fn test_single_row_window() {
        let records = vec![record("B", "2024-02-01", 10.0, 5.0, 4.0, 50.0)];
        let result = storage_insights(&records, "B", &RidgeRegression::default()).unwrap();
        assert_eq!(result.predicted_stored_co2, vec![4.0]);
        assert_eq!(result.storage_issue_detected, vec![false]);
    }

    #[test]
    fn test_run_pipeline_results_are_aligned() {
        let records = sample();
        for pipeline in Pipeline::ALL {
            let result = run_pipeline(&records, "A", pipeline, &RidgeRegression::default()).unwrap();
            assert_eq!(result.len(), 3);
            assert!(result.is_aligned());
        }
    }

    #[test]
    fn test_unknown_facility() {
        let err = run_pipeline(&sample(), "Nope", Pipeline::Storage, &RidgeRegression::default())
            .unwrap_err();
        assert!(matches!(err, Error::NoMatchingRecords { .. }));
    }

    #[test]
    fn test_pipeline_from_str() {
        assert_eq!("trend".parse::<Pipeline>().unwrap(), Pipeline::Trend);
        assert_eq!(" Storage ".parse::<Pipeline>().unwrap(), Pipeline::Storage);
        assert!("forecast".parse::<Pipeline>().is_err());
    }
}

//! Prediction Types
//!
//! 回帰予測用の型定義

use serde::{Deserialize, Serialize};

/// 1 回の回帰フィットの結果
///
/// 予測値はフィットに使った行と同じ順序で並ぶ（サンプル内予測）。永続化しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedTrend {
    /// 係数（特徴量ごと）
    pub coefficients: Vec<f64>,
    /// 切片
    pub intercept: f64,
    /// 正則化強度
    pub alpha: f64,
    /// サンプル内予測値
    pub predictions: Vec<f64>,
}

impl FittedTrend {
    /// 1 行分の予測
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(row)
                .map(|(w, x)| w * x)
                .sum::<f64>()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

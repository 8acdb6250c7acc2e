//! Flag Evaluator
//!
//! 実測値と予測値の組から異常フラグを導出する

use super::types::FlagRule;
use crate::error::{Error, Result};

/// フラグ評価器
#[derive(Debug, Clone, Copy)]
pub struct FlagEvaluator {
    /// 判定ルール
    rule: FlagRule,
}

impl FlagEvaluator {
    /// 新しい評価器を作成
    pub fn new(rule: FlagRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> FlagRule {
        self.rule
    }

    /// 1 組を評価
    pub fn evaluate(&self, actual: f64, predicted: f64) -> bool {
        match self.rule {
            FlagRule::CaptureEfficiency { tolerance } => {
                Self::efficiency_shortfall(actual, predicted, tolerance)
            }
            FlagRule::StorageShortfall => actual < predicted,
        }
    }

    /// 系列を行単位で評価
    pub fn evaluate_series(&self, actual: &[f64], predicted: &[f64]) -> Result<Vec<bool>> {
        if actual.len() != predicted.len() {
            return Err(Error::InvalidInput(format!(
                "actual ({}) and predicted ({}) series differ in length",
                actual.len(),
                predicted.len()
            )));
        }

        Ok(actual
            .iter()
            .zip(predicted)
            .map(|(a, p)| self.evaluate(*a, *p))
            .collect())
    }

    /// 予測値が 0 以下なら比率が定義できないので false
    fn efficiency_shortfall(actual: f64, predicted: f64, tolerance: f64) -> bool {
        if predicted <= 0.0 {
            return false;
        }
        (predicted - actual) / predicted > tolerance
    }
}

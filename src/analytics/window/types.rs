//! Window Types
//!
//! 施設ウィンドウ用の型定義

use crate::dataset::{Field, MeasurementRecord};
use crate::error::{Error, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// ラベル用の日付フォーマット
pub const LABEL_DATE_FORMAT: &str = "%Y-%m-%d";

/// 暦月 (年, 月)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }
}

impl From<NaiveDate> for YearMonth {
    fn from(date: NaiveDate) -> Self {
        Self::new(date.year(), date.month())
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// 1 施設・1 暦月分の分析対象レコード
///
/// すべてのレコードは同じ (年, 月) に属し、日付昇順に並ぶ。リクエストごとに再計算する。
#[derive(Debug, Clone)]
pub struct FacilityWindow {
    facility: String,
    period: YearMonth,
    records: Vec<MeasurementRecord>,
    dropped_incomplete: usize,
    outside_window: usize,
}

impl FacilityWindow {
    pub(crate) fn new(
        facility: impl Into<String>,
        period: YearMonth,
        records: Vec<MeasurementRecord>,
        dropped_incomplete: usize,
        outside_window: usize,
    ) -> Self {
        Self {
            facility: facility.into(),
            period,
            records,
            dropped_incomplete,
            outside_window,
        }
    }

    pub fn facility(&self) -> &str {
        &self.facility
    }

    pub fn period(&self) -> YearMonth {
        self.period
    }

    pub fn records(&self) -> &[MeasurementRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 欠損により除外された行数
    pub fn dropped_incomplete(&self) -> usize {
        self.dropped_incomplete
    }

    /// 直近月以外として除外された行数
    pub fn outside_window(&self) -> usize {
        self.outside_window
    }

    /// 日付ラベル（`YYYY-MM-DD`）
    pub fn labels(&self) -> Vec<String> {
        self.records
            .iter()
            .map(|r| {
                r.date
                    .map(|d| d.format(LABEL_DATE_FORMAT).to_string())
                    .unwrap_or_default()
            })
            .collect()
    }

    /// 指定フィールドの列を取得
    pub fn column(&self, field: Field) -> Result<Vec<f64>> {
        self.records
            .iter()
            .map(|r| {
                r.value(field).ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "column '{}' is not guaranteed complete in this window",
                        field.column_name()
                    ))
                })
            })
            .collect()
    }

    /// 特徴量行列（1 レコード 1 行）
    pub fn feature_matrix(&self, features: &[Field]) -> Result<Vec<Vec<f64>>> {
        self.records
            .iter()
            .map(|r| {
                features
                    .iter()
                    .map(|f| {
                        r.value(*f).ok_or_else(|| {
                            Error::InvalidInput(format!(
                                "feature '{}' missing in window",
                                f.column_name()
                            ))
                        })
                    })
                    .collect::<Result<Vec<f64>>>()
            })
            .collect()
    }
}

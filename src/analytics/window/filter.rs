//! Record Filter
//!
//! 施設・完全性・直近月によるレコード絞り込み

use super::types::{FacilityWindow, YearMonth};
use crate::dataset::{Field, MeasurementRecord};
use crate::error::{Error, Result};
use tracing::debug;

/// レコードフィルタ
pub struct RecordFilter<'a> {
    /// 日付以外の必須フィールド
    required: &'a [Field],
}

impl<'a> RecordFilter<'a> {
    /// 新しいフィルタを作成
    pub fn new(required: &'a [Field]) -> Self {
        Self { required }
    }

    /// 施設の直近月ウィンドウを抽出
    ///
    /// 施設名一致 → 欠損行の除外 → 最新の (年, 月) に限定 → 日付昇順。
    /// 残りが空なら `NoMatchingRecords`。
    pub fn select(&self, records: &[MeasurementRecord], facility: &str) -> Result<FacilityWindow> {
        let mut matched = 0usize;
        let mut complete: Vec<&MeasurementRecord> = Vec::new();

        for record in records.iter().filter(|r| r.facility_name == facility) {
            matched += 1;
            if record.is_complete(self.required) {
                complete.push(record);
            }
        }

        let dropped_incomplete = matched - complete.len();

        let period = complete
            .iter()
            .filter_map(|r| r.date)
            .map(YearMonth::from)
            .max()
            .ok_or_else(|| Error::no_matching(facility))?;

        let mut selected: Vec<MeasurementRecord> = complete
            .iter()
            .filter(|r| r.date.map(YearMonth::from) == Some(period))
            .map(|r| (*r).clone())
            .collect();
        selected.sort_by_key(|r| r.date);

        let outside_window = complete.len() - selected.len();

        debug!(
            "Window for '{}': {} rows in {}, {} incomplete, {} outside window",
            facility,
            selected.len(),
            period,
            dropped_incomplete,
            outside_window
        );

        Ok(FacilityWindow::new(
            facility,
            period,
            selected,
            dropped_incomplete,
            outside_window,
        ))
    }
}

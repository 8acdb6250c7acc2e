//! CSV Dataset Reader
//!
//! アップロードされた CSV バイト列をレコード集合に変換する

use super::record::{
    parse_date, parse_measurement, MeasurementRecord, CAPTURED_COLUMN, DATE_COLUMN,
    EFFICIENCY_COLUMN, EMITTED_COLUMN, FACILITY_COLUMN, STORED_COLUMN,
};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// 取り込み済みデータセット（取り込み後は読み取り専用）
#[derive(Debug, Clone)]
pub struct Dataset {
    records: Vec<MeasurementRecord>,
    unparseable_dates: usize,
    loaded_at: DateTime<Utc>,
}

impl Dataset {
    /// CSV バイト列から解析
    pub fn from_csv_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(Error::IngestionFailure("uploaded file is empty".to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader.headers()?.clone();
        let columns = ColumnIndex::resolve(&headers)?;

        let mut records = Vec::new();
        let mut unparseable_dates = 0;

        for (line, row) in reader.records().enumerate() {
            let row = row.map_err(|e| {
                Error::IngestionFailure(format!("row {}: {}", line + 2, e))
            })?;

            let raw_date = row.get(columns.date).unwrap_or_default();
            let date = parse_date(raw_date);
            if date.is_none() && !raw_date.trim().is_empty() {
                unparseable_dates += 1;
            }

            let cell = |idx: usize| row.get(idx).and_then(parse_measurement);

            records.push(MeasurementRecord {
                facility_name: row.get(columns.facility).unwrap_or_default().to_string(),
                date,
                co2_emitted_tonnes: cell(columns.emitted),
                co2_captured_tonnes: cell(columns.captured),
                co2_stored_tonnes: cell(columns.stored),
                capture_efficiency_percent: cell(columns.efficiency),
            });
        }

        debug!(
            "Parsed {} rows ({} unparseable dates)",
            records.len(),
            unparseable_dates
        );

        Ok(Self {
            records,
            unparseable_dates,
            loaded_at: Utc::now(),
        })
    }

    /// 解析済みレコードから作成
    pub fn from_records(records: Vec<MeasurementRecord>) -> Self {
        Self {
            records,
            unparseable_dates: 0,
            loaded_at: Utc::now(),
        }
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

    /// 日付が解析できなかった行数
    pub fn unparseable_dates(&self) -> usize {
        self.unparseable_dates
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// 施設名一覧（重複なし・昇順）
    pub fn facilities(&self) -> BTreeSet<&str> {
        self.records
            .iter()
            .map(|r| r.facility_name.as_str())
            .collect()
    }

    /// 取り込み結果の要約
    pub fn summary(&self) -> IngestSummary {
        IngestSummary {
            rows: self.records.len(),
            unparseable_dates: self.unparseable_dates,
            facilities: self.facilities().len(),
        }
    }
}

/// 取り込み結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// 読み込んだ行数
    pub rows: usize,
    /// 日付解析に失敗した行数
    pub unparseable_dates: usize,
    /// 施設数
    pub facilities: usize,
}

/// ヘッダー上のカラム位置
struct ColumnIndex {
    facility: usize,
    date: usize,
    emitted: usize,
    captured: usize,
    stored: usize,
    efficiency: usize,
}

impl ColumnIndex {
    fn resolve(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim_start_matches('\u{feff}') == name)
                .ok_or_else(|| {
                    Error::IngestionFailure(format!("missing required column '{}'", name))
                })
        };

        Ok(Self {
            facility: find(FACILITY_COLUMN)?,
            date: find(DATE_COLUMN)?,
            emitted: find(EMITTED_COLUMN)?,
            captured: find(CAPTURED_COLUMN)?,
            stored: find(STORED_COLUMN)?,
            efficiency: find(EFFICIENCY_COLUMN)?,
        })
    }
}

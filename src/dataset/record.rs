//! Measurement Record
//!
//! 施設ごとの計測レコードとフィールド定義

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// CSV カラム名
pub const FACILITY_COLUMN: &str = "facility_name";
pub const DATE_COLUMN: &str = "date";
pub const EMITTED_COLUMN: &str = "co2_emitted_tonnes";
pub const CAPTURED_COLUMN: &str = "co2_captured_tonnes";
pub const STORED_COLUMN: &str = "co2_stored_tonnes";
pub const EFFICIENCY_COLUMN: &str = "capture_efficiency_percent";

/// 1 行分の計測値
///
/// 欠損・解析不能なセルは `None` として保持する。取り込み後は変更しない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// 施設名
    pub facility_name: String,
    /// 計測日（解析できなかった場合は `None`）
    pub date: Option<NaiveDate>,
    /// CO2 排出量（トン）
    pub co2_emitted_tonnes: Option<f64>,
    /// CO2 回収量（トン）
    pub co2_captured_tonnes: Option<f64>,
    /// CO2 貯留量（トン）
    pub co2_stored_tonnes: Option<f64>,
    /// 回収効率（%）
    pub capture_efficiency_percent: Option<f64>,
}

impl MeasurementRecord {
    /// 全フィールドが揃ったレコードを作成
    pub fn new(
        facility_name: impl Into<String>,
        date: NaiveDate,
        emitted: f64,
        captured: f64,
        stored: f64,
        efficiency: f64,
    ) -> Self {
        Self {
            facility_name: facility_name.into(),
            date: Some(date),
            co2_emitted_tonnes: Some(emitted),
            co2_captured_tonnes: Some(captured),
            co2_stored_tonnes: Some(stored),
            capture_efficiency_percent: Some(efficiency),
        }
    }

    /// 数値フィールドの値を取得
    pub fn value(&self, field: Field) -> Option<f64> {
        match field {
            Field::Emitted => self.co2_emitted_tonnes,
            Field::Captured => self.co2_captured_tonnes,
            Field::Stored => self.co2_stored_tonnes,
            Field::Efficiency => self.capture_efficiency_percent,
        }
    }

    /// 日付と指定フィールドがすべて揃っているか
    pub fn is_complete(&self, required: &[Field]) -> bool {
        self.date.is_some() && required.iter().all(|f| self.value(*f).is_some())
    }
}

/// 数値フィールド
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Field {
    /// 排出量
    Emitted,
    /// 回収量
    Captured,
    /// 貯留量
    Stored,
    /// 回収効率
    Efficiency,
}

impl Field {
    /// 対応する CSV カラム名
    pub fn column_name(&self) -> &'static str {
        match self {
            Field::Emitted => EMITTED_COLUMN,
            Field::Captured => CAPTURED_COLUMN,
            Field::Stored => STORED_COLUMN,
            Field::Efficiency => EFFICIENCY_COLUMN,
        }
    }
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// 日付文字列を解析
///
/// ISO-8601 を優先し、曖昧な数値表記は月→日の順で試す。解析できなければ `None`。
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
}

/// 数値セルを解析（欠損表記・非有限値は `None`）
pub fn parse_measurement(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    match value.to_ascii_lowercase().as_str() {
        "nan" | "na" | "n/a" | "null" | "none" | "-" => return None,
        _ => {}
    }
    value.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(parse_date("2024-01-15"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date(" 2024-01-15 "), Some(ymd(2024, 1, 15)));
    }

    #[test]
    fn test_parse_datetime_variants() {
        assert_eq!(parse_date("2024-01-15T08:30:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(parse_date("2024-01-15 08:30:00"), Some(ymd(2024, 1, 15)));
        assert_eq!(
            parse_date("2024-01-15T08:30:00+09:00"),
            Some(ymd(2024, 1, 15))
        );
    }

    #[test]
    fn test_parse_month_first_before_day_first() {
        assert_eq!(parse_date("01/02/2024"), Some(ymd(2024, 1, 2)));
        // 13 は月として不正なので日→月で解釈される
        assert_eq!(parse_date("13/02/2024"), Some(ymd(2024, 2, 13)));

        assert_eq!(parse_date("01-05-2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date("01.05.2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date("25-05-2024"), Some(ymd(2024, 5, 25)));
        assert_eq!(parse_date("25.05.2024"), Some(ymd(2024, 5, 25)));
    }

    #[test]
    fn test_parse_named_month() {
        assert_eq!(parse_date("Jan 5, 2024"), Some(ymd(2024, 1, 5)));
        assert_eq!(parse_date("5 March 2024"), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn test_unparseable_date() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-45"), None);
    }

    #[test]
    fn test_parse_measurement() {
        assert_eq!(parse_measurement("12.5"), Some(12.5));
        assert_eq!(parse_measurement(" 3 "), Some(3.0));
        assert_eq!(parse_measurement(""), None);
        assert_eq!(parse_measurement("NaN"), None);
        assert_eq!(parse_measurement("N/A"), None);
        assert_eq!(parse_measurement("inf"), None);
        assert_eq!(parse_measurement("abc"), None);
    }

    #[test]
    fn test_is_complete() {
        let mut record = MeasurementRecord::new("A", ymd(2024, 1, 1), 100.0, 80.0, 70.0, 80.0);
        assert!(record.is_complete(&[Field::Emitted, Field::Stored]));

        record.co2_stored_tonnes = None;
        assert!(record.is_complete(&[Field::Emitted, Field::Captured]));
        assert!(!record.is_complete(&[Field::Emitted, Field::Stored]));

        record.date = None;
        assert!(!record.is_complete(&[]));
    }
}

//! Analytics Module
//!
//! 施設別トレンド回帰・異常フラグ判定システム

pub mod anomaly;
pub mod pipeline;
pub mod prediction;
pub mod result;
pub mod window;

pub use anomaly::{FlagEvaluator, FlagRule, EFFICIENCY_TOLERANCE};
pub use pipeline::{efficiency_insights, run_pipeline, storage_insights, trend_insights, Pipeline};
pub use prediction::{FittedTrend, RidgeRegression};
pub use result::{AnalysisResult, EfficiencyResult, StorageResult, TrendResult};
pub use window::{FacilityWindow, RecordFilter, YearMonth};

//! Anomaly Flag Types
//!
//! 異常フラグ判定ルールの型定義

use serde::{Deserialize, Serialize};

/// 回収効率フラグの相対許容幅（5%）
pub const EFFICIENCY_TOLERANCE: f64 = 0.05;

/// フラグ判定ルール
///
/// 効率は相対 5% の許容幅、貯留は許容幅なしの厳密比較。両者を統一しないこと。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FlagRule {
    /// `(predicted - actual) / predicted > tolerance`（predicted <= 0 は false）
    CaptureEfficiency { tolerance: f64 },
    /// `actual < predicted`
    StorageShortfall,
}

impl FlagRule {
    /// 回収効率ルール（既定の許容幅）
    pub fn capture_efficiency() -> Self {
        FlagRule::CaptureEfficiency {
            tolerance: EFFICIENCY_TOLERANCE,
        }
    }
}

//! Anomaly Flag Module
//!
//! 効率低下・貯留不足の異常フラグ

mod evaluator;
mod types;

pub use evaluator::FlagEvaluator;
pub use types::{FlagRule, EFFICIENCY_TOLERANCE};

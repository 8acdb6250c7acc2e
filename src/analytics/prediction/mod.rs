//! Prediction Analytics Module
//!
//! トレンド回帰（サンプル内予測）

mod ridge;
mod types;

pub use ridge::RidgeRegression;
pub use types::FittedTrend;

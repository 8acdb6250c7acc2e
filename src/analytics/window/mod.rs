//! Facility Window Module
//!
//! 施設別・直近月のレコード抽出

mod filter;
mod types;

pub use filter::RecordFilter;
pub use types::{FacilityWindow, YearMonth, LABEL_DATE_FORMAT};

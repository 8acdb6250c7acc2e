//! Dataset Module
//!
//! 計測データの取り込みと保持

mod reader;
mod record;
mod store;

pub use reader::{Dataset, IngestSummary};
pub use record::{parse_date, parse_measurement, Field, MeasurementRecord};
pub use store::DatasetStore;

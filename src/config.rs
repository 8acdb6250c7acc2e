//! Configuration for the insights server.
//!
//! デフォルト値 → 設定ファイル → 環境変数 (`CO2_` 接頭辞) → CLI の順に上書きする。

mod loader;
mod types;

pub use loader::ConfigLoader;
pub use types::{DatasetConfig, InsightsConfig, ModelConfig, ServerConfig};

use std::path::Path;

/// サンプル設定ファイルを生成
pub fn generate_sample_config(path: &Path) -> crate::Result<()> {
    let sample = InsightsConfig::sample_toml()?;
    std::fs::write(path, sample)?;
    tracing::info!("📝 サンプル設定ファイルを生成しました: {}", path.display());
    Ok(())
}

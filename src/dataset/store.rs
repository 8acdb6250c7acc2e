//! Dataset Store
//!
//! アクティブなデータセットの保持・差し替え・スナップショット取得

use super::reader::{Dataset, IngestSummary};
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// アクティブデータセットのストア
///
/// 読み手は `snapshot()` で取得した `Arc<Dataset>` のみを参照するため、
/// 差し替え中でも旧データか新データのどちらか一方だけが見える。
#[derive(Debug, Default)]
pub struct DatasetStore {
    /// 現在のデータセット
    active: RwLock<Option<Arc<Dataset>>>,
    /// 永続化先（`None` の場合はメモリのみ）
    persist_path: Option<PathBuf>,
    /// 取り込み処理の直列化
    ingest_lock: Mutex<()>,
}

impl DatasetStore {
    /// メモリのみのストアを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 永続化先付きのストアを作成
    pub fn with_persist_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            persist_path: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn persist_path(&self) -> Option<&Path> {
        self.persist_path.as_deref()
    }

    /// 現在のデータセットのスナップショットを取得
    pub async fn snapshot(&self) -> Result<Arc<Dataset>> {
        self.active
            .read()
            .await
            .clone()
            .ok_or(Error::DatasetUnavailable)
    }

    /// データセットが取り込み済みか
    pub async fn is_loaded(&self) -> bool {
        self.active.read().await.is_some()
    }

    /// CSV バイト列を検証・解析し、アクティブデータセットを差し替える
    ///
    /// 解析と永続化がすべて成功した場合のみ差し替える。失敗時は旧データセットが残る。
    pub async fn ingest(&self, bytes: &[u8]) -> Result<IngestSummary> {
        let _guard = self.ingest_lock.lock().await;

        let dataset = parse_blocking(bytes.to_vec()).await?;

        if let Some(path) = &self.persist_path {
            write_atomically(path, bytes).await?;
        }

        let summary = dataset.summary();
        self.swap(dataset).await;

        info!(
            "Dataset ingested: {} rows, {} facilities, {} unparseable dates",
            summary.rows, summary.facilities, summary.unparseable_dates
        );
        Ok(summary)
    }

    /// 永続化済みファイルがあれば読み込む
    pub async fn load_persisted(&self) -> Result<Option<IngestSummary>> {
        let Some(path) = &self.persist_path else {
            return Ok(None);
        };

        let _guard = self.ingest_lock.lock().await;

        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No persisted dataset at {}", path.display());
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let dataset = parse_blocking(bytes).await?;
        let summary = dataset.summary();
        self.swap(dataset).await;

        info!(
            "Persisted dataset loaded from {}: {} rows",
            path.display(),
            summary.rows
        );
        Ok(Some(summary))
    }

    async fn swap(&self, dataset: Dataset) {
        let mut active = self.active.write().await;
        *active = Some(Arc::new(dataset));
    }
}

/// CSV の解析はブロッキングスレッドで行う
async fn parse_blocking(bytes: Vec<u8>) -> Result<Dataset> {
    tokio::task::spawn_blocking(move || Dataset::from_csv_bytes(&bytes))
        .await
        .map_err(|e| Error::IngestionFailure(format!("CSV parser task failed: {}", e)))?
}

/// 一時ファイルに書き込んでからリネームする
async fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        warn!("Failed to write {}: {}", tmp_path.display(), e);
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }

    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        warn!("Failed to move {} into place: {}", tmp_path.display(), e);
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(e.into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "facility_name,date,co2_emitted_tonnes,co2_captured_tonnes,co2_stored_tonnes,capture_efficiency_percent\n\
                       A,2024-01-01,100,80,70,80\n";

    #[tokio::test]
    async fn test_snapshot_before_ingest_is_unavailable() {
        let store = DatasetStore::new();
        assert!(matches!(
            store.snapshot().await,
            Err(Error::DatasetUnavailable)
        ));
        assert!(!store.is_loaded().await);
    }

    #[tokio::test]
    async fn test_ingest_then_snapshot() {
        let store = DatasetStore::new();
        let summary = store.ingest(CSV.as_bytes()).await.unwrap();
        assert_eq!(summary.rows, 1);

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_ingest_keeps_previous_dataset() {
        let store = DatasetStore::new();
        store.ingest(CSV.as_bytes()).await.unwrap();

        let result = store.ingest(b"garbage,header\n1,2\n").await;
        assert!(matches!(result, Err(Error::IngestionFailure(_))));

        let snapshot = store.snapshot().await.unwrap();
        assert_eq!(snapshot.records()[0].facility_name, "A");
    }

    #[tokio::test]
    async fn test_snapshot_survives_replacement() {
        let store = DatasetStore::new();
        store.ingest(CSV.as_bytes()).await.unwrap();
        let old = store.snapshot().await.unwrap();

        let replacement = CSV.replace("A,", "B,");
        store.ingest(replacement.as_bytes()).await.unwrap();

        assert_eq!(old.records()[0].facility_name, "A");
        let new = store.snapshot().await.unwrap();
        assert_eq!(new.records()[0].facility_name, "B");
    }

    #[tokio::test]
    async fn test_load_persisted_without_path() {
        let store = DatasetStore::new();
        assert!(store.load_persisted().await.unwrap().is_none());
    }
}

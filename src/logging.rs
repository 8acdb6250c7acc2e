use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// ログファイル名
const LOG_FILE_NAME: &str = "co2-insights.log";

/// ログ設定
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// ログレベル (trace, debug, info, warn, error) または EnvFilter 式
    pub level: String,
    /// ログディレクトリ
    pub log_dir: PathBuf,
    /// ファイルローテーション設定
    pub rotation: LogRotation,
    /// コンソール出力有効
    pub console_enabled: bool,
    /// ファイル出力有効
    pub file_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRotation {
    /// 日次ローテーション
    Daily,
    /// 時間毎ローテーション
    Hourly,
    /// ローテーションなし
    Never,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: PathBuf::from("logs"),
            rotation: LogRotation::Daily,
            console_enabled: true,
            file_enabled: false,
        }
    }
}

impl LogConfig {
    /// サーバー設定からログ設定を作成
    pub fn from_server_config(server_config: &crate::config::ServerConfig) -> Self {
        let mut config = Self::default();
        config.level = server_config.log_level.clone();

        if let Some(ref dir) = server_config.log_dir {
            config.log_dir = dir.clone();
            config.file_enabled = true;
        }

        config
    }

    /// カスタムログディレクトリを設定
    pub fn with_log_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.log_dir = dir.into();
        self
    }

    /// ローテーション設定
    pub fn with_rotation(mut self, rotation: LogRotation) -> Self {
        self.rotation = rotation;
        self
    }

    /// コンソール出力制御
    pub fn with_console(mut self, enabled: bool) -> Self {
        self.console_enabled = enabled;
        self
    }

    /// ファイル出力制御
    pub fn with_file(mut self, enabled: bool) -> Self {
        self.file_enabled = enabled;
        self
    }

    /// EnvFilter を作成（不正な式は info にフォールバック）
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// ログディレクトリを確保
fn ensure_log_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    Ok(())
}

/// ログシステムを初期化
///
/// ファイル出力時は返された `WorkerGuard` を保持し続けること（破棄するとバッファが失われる）。
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = config.env_filter();

    let guard = match (config.console_enabled, config.file_enabled) {
        (console, true) => {
            ensure_log_dir(&config.log_dir)?;
            let file_appender = match config.rotation {
                LogRotation::Daily => rolling::daily(&config.log_dir, LOG_FILE_NAME),
                LogRotation::Hourly => rolling::hourly(&config.log_dir, LOG_FILE_NAME),
                LogRotation::Never => rolling::never(&config.log_dir, LOG_FILE_NAME),
            };
            let (file_writer, guard) = non_blocking(file_appender);

            let builder = tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_target(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true);

            let init = if console {
                builder.with_writer(std::io::stderr.and(file_writer)).try_init()
            } else {
                builder.with_writer(file_writer).with_ansi(false).try_init()
            };
            init.map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;

            Some(guard)
        }
        (true, false) => {
            // コンソールのみ
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;
            None
        }
        (false, false) => {
            // 最低限のコンソール出力
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::WARN)
                .with_writer(std::io::stderr)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialise logging: {}", e))?;
            None
        }
    };

    tracing::info!("📝 ログシステム初期化完了");
    tracing::info!("📊 ログレベル: {}", config.level);
    if config.file_enabled {
        tracing::info!(
            "📂 ログディレクトリ: {} ({:?})",
            config.log_dir.display(),
            config.rotation
        );
    }

    Ok(guard)
}

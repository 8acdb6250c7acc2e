use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Active dataset configuration
    pub dataset: DatasetConfig,

    /// Regression model configuration
    pub model: ModelConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// JSON-RPC bind address
    pub bind_addr: String,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,

    /// Log directory; console only when unset
    pub log_dir: Option<PathBuf>,

    /// Maximum accepted upload size in bytes
    pub max_upload_bytes: usize,
}

/// Dataset persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Where the uploaded CSV is persisted; memory only when unset
    pub path: Option<PathBuf>,

    /// Load the persisted CSV on startup
    pub load_on_startup: bool,
}

/// Ridge regression configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelConfig {
    /// L2 penalty applied to coefficients (not the intercept)
    pub ridge_alpha: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:50051".to_string(),
            log_level: "info".to_string(),
            log_dir: None,
            max_upload_bytes: 16 * 1024 * 1024,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("csv_dataset.csv")),
            load_on_startup: true,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self { ridge_alpha: 1.0 }
    }
}

impl InsightsConfig {
    /// Validate semantic constraints the deserializer cannot express
    pub fn validate(&self) -> crate::Result<()> {
        if !self.model.ridge_alpha.is_finite() || self.model.ridge_alpha <= 0.0 {
            return Err(crate::Error::Config(format!(
                "model.ridge_alpha must be a positive finite number, got {}",
                self.model.ridge_alpha
            )));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(crate::Error::Config(
                "server.max_upload_bytes must be greater than zero".to_string(),
            ));
        }

        if self.server.bind_addr.trim().is_empty() {
            return Err(crate::Error::Config(
                "server.bind_addr must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Render a commented sample configuration file
    pub fn sample_toml() -> crate::Result<String> {
        let body = toml::to_string_pretty(&InsightsConfig::default())
            .map_err(|e| crate::Error::Config(e.to_string()))?;

        Ok(format!(
            r#"# co2-insights configuration
#
# Save as co2-insights.toml. Every key can be overridden from the environment,
# e.g. CO2_SERVER__BIND_ADDR=0.0.0.0:50051 or CO2_MODEL__RIDGE_ALPHA=0.5

{}
# [server]
# bind_addr        = JSON-RPC listen address
# log_level        = trace, debug, info, warn, error
# log_dir          = write rolling log files here as well as the console
# max_upload_bytes = largest CSV accepted by upload_csv / POST /upload
#
# [dataset]
# path            = where the active CSV is persisted (written via temp file + rename)
# load_on_startup = reload the persisted CSV when the server starts
#
# [model]
# ridge_alpha = L2 penalty; must be > 0 so single-row and collinear windows stay solvable
"#,
            body
        ))
    }
}

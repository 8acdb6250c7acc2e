use super::types::InsightsConfig;
use anyhow::{Context, Result};
use config::{Config, Environment, File};
use std::path::PathBuf;

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    config_file: Option<PathBuf>,
    load_env: bool,
    bind_override: Option<String>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self {
            config_file: None,
            load_env: false,
            bind_override: None,
        }
    }

    /// Load configuration from file
    pub fn load_from_file<P: Into<PathBuf>>(mut self, path: Option<P>) -> Self {
        self.config_file = path.map(Into::into);
        self
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        self.load_env = true;
        self
    }

    /// Override the bind address from the command line
    pub fn with_bind_addr(mut self, bind_addr: Option<String>) -> Self {
        self.bind_override = bind_addr;
        self
    }

    /// Build the final configuration
    pub fn build(self) -> Result<InsightsConfig> {
        let mut builder =
            Config::builder().add_source(Config::try_from(&InsightsConfig::default())?);

        // Add configuration file if specified
        if let Some(config_path) = &self.config_file {
            builder = builder.add_source(File::from(config_path.as_path()).required(true));
        } else {
            // Try to load from standard locations
            builder = builder
                .add_source(File::with_name("co2-insights").required(false))
                .add_source(File::with_name("config/co2-insights").required(false));
        }

        // Add environment variables if requested
        if self.load_env {
            builder = builder.add_source(
                Environment::with_prefix("CO2")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        if let Some(bind_addr) = self.bind_override {
            builder = builder
                .set_override("server.bind_addr", bind_addr)
                .context("Failed to apply bind address override")?;
        }

        // Build the configuration
        let config: InsightsConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate().context("Invalid configuration")?;

        Ok(config)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

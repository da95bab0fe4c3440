use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix, e.g. `APPROVAL_WORKFLOWS__STORE__SWEEP_INTERVAL_SECONDS`
pub const ENV_PREFIX: &str = "APPROVAL_WORKFLOWS";

/// Default configuration file name (without extension)
pub const CONFIG_FILE_STEM: &str = "approval-workflows";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ApprovalConfig {
    /// Workflow store settings
    pub store: StoreConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Timeout applied when a create request omits one
    pub default_timeout_minutes: u32,
    /// Interval for the background expiry sweep; 0 disables it
    pub sweep_interval_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            default_timeout_minutes: 30,
            sweep_interval_seconds: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level or full `EnvFilter` directive
    pub log_level: String,
    /// Emit JSON logs instead of compact text
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl ApprovalConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. `approval-workflows.toml` in the working directory
    /// 3. Environment variables (prefixed with APPROVAL_WORKFLOWS)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new(&format!("{CONFIG_FILE_STEM}.toml")).exists() {
            builder = builder.add_source(File::with_name(CONFIG_FILE_STEM));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        Ok(builder.build()?.try_deserialize()?)
    }

    /// Load from an explicit file, still allowing environment overrides
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

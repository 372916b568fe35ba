use anyhow::{ensure, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Certify
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CertifyConfig {
    /// Workflow timing and validation settings
    pub workflow: WorkflowConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Simulated CAQH/NPI lookup latency
    pub retrieval_delay_ms: u64,
    /// Simulated validation latency
    pub validation_delay_ms: u64,
    /// Validation samples at or below this value fail (0.0 - 1.0)
    pub failure_threshold: f64,
    /// Let a failed validation be re-run
    pub allow_retry_from_error: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is unset
    pub log_level: String,
    /// Emit JSON log lines instead of compact text
    pub json_logs: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            retrieval_delay_ms: 2000,
            validation_delay_ms: 1500,
            failure_threshold: 0.2,
            allow_retry_from_error: false,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl CertifyConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (certify.toml, .certify-rc)
    /// 3. Environment variables (prefixed with CERTIFY_, nested with __)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("certify.toml").exists() {
            builder = builder.add_source(File::with_name("certify"));
        }

        if Path::new(".certify-rc").exists() {
            builder = builder.add_source(
                File::with_name(".certify-rc").format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("CERTIFY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let certify_config: CertifyConfig = builder.build()?.try_deserialize()?;
        certify_config.validate()?;
        Ok(certify_config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(
            (0.0..=1.0).contains(&self.workflow.failure_threshold),
            "workflow.failure_threshold must be between 0.0 and 1.0, got {}",
            self.workflow.failure_threshold
        );
        Ok(())
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

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<CertifyConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = CertifyConfig::load_env_file();
        CertifyConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static CertifyConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

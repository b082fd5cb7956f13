use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for BuildBridge
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct BuildBridgeConfig {
    /// One-time code settings shared by registration and signing
    pub otp: OtpConfig,
    /// Signed document upload settings
    pub signing: SigningConfig,
    /// In-memory backend behaviour
    pub mock_api: MockApiConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OtpConfig {
    /// Number of digits in issued codes
    pub code_length: usize,
    /// Lifetime of an issued code
    pub ttl_seconds: u64,
    /// Minimum wait between two code requests
    pub resend_cooldown_seconds: u64,
    /// Demo mode: the mock backend issues this code instead of a random one
    pub fixed_test_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Base URL for mock-generated signed document links
    pub document_base_url: String,
    /// Upper bound on uploaded document size
    pub max_document_bytes: usize,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct MockApiConfig {
    /// Simulated network latency per call
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
    /// Emit JSON lines instead of human-readable output
    pub json_output: bool,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: 6,
            ttl_seconds: 300, // 5 minutes
            resend_cooldown_seconds: 60,
            fixed_test_code: None,
        }
    }
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self {
            document_base_url: "https://files.buildbridge.local/contracts".to_string(),
            max_document_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_output: true,
        }
    }
}

impl OtpConfig {
    pub fn resend_cooldown(&self) -> Duration {
        Duration::from_secs(self.resend_cooldown_seconds)
    }

    pub fn ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.ttl_seconds as i64)
    }
}

impl BuildBridgeConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (buildbridge.toml, .buildbridge-rc)
    /// 3. Environment variables (prefixed with BUILDBRIDGE_, nested with __)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder();

        if Path::new("buildbridge.toml").exists() {
            builder = builder.add_source(File::with_name("buildbridge"));
        }

        if Path::new(".buildbridge-rc").exists() {
            builder = builder.add_source(
                File::with_name(".buildbridge-rc").format(config::FileFormat::Toml),
            );
        }

        builder = builder.add_source(
            Environment::with_prefix("BUILDBRIDGE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let loaded: BuildBridgeConfig = config.try_deserialize()?;
        Ok(loaded)
    }

    /// Load configuration from an explicit TOML file, still honouring
    /// environment overrides.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()).format(config::FileFormat::Toml))
            .add_source(
                Environment::with_prefix("BUILDBRIDGE")
                    .prefix_separator("_")
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

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<BuildBridgeConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        let _ = BuildBridgeConfig::load_env_file();
        BuildBridgeConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static BuildBridgeConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = BuildBridgeConfig::default();
        assert_eq!(config.otp.code_length, 6);
        assert_eq!(config.otp.resend_cooldown(), Duration::from_secs(60));
        assert!(config.otp.fixed_test_code.is_none());
        assert_eq!(config.mock_api.latency_ms, 0);
    }

    #[test]
    fn test_save_and_reload_partial_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("buildbridge.toml");

        std::fs::write(&path, "[otp]\nfixed_test_code = \"123456\"\nresend_cooldown_seconds = 30\n").unwrap();
        let loaded = BuildBridgeConfig::load_from(&path).unwrap();
        assert_eq!(loaded.otp.fixed_test_code.as_deref(), Some("123456"));
        assert_eq!(loaded.otp.resend_cooldown_seconds, 30);
        // Untouched sections keep their defaults
        assert_eq!(loaded.otp.code_length, 6);
        assert_eq!(loaded.observability.log_level, "info");

        let saved = dir.path().join("saved.toml");
        loaded.save_to_file(&saved).unwrap();
        let reloaded = BuildBridgeConfig::load_from(&saved).unwrap();
        assert_eq!(reloaded.otp.resend_cooldown_seconds, 30);
    }
}

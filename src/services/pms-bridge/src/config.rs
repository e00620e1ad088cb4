//! Configuration module for the PMS Bridge Service
//!
//! Settings are layered with the `config` crate: built-in defaults, an optional file
//! named by `PMS_BRIDGE_CONFIG_FILE`, then `PMS_BRIDGE__*` environment variables
//! (for example `PMS_BRIDGE__RGBRIDGE__MAX_RETRIES=5`).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

/// Main configuration structure for the PMS Bridge Service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Tenant configuration storage
    pub storage: StorageConfig,
    /// Downstream RGBridge delivery
    pub rgbridge: RgbridgeConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 8005)
    pub port: u16,
    /// Request timeout in seconds (default: 30)
    pub request_timeout: u64,
    /// Maximum request body size in bytes (default: 10MB)
    pub max_body_size: usize,
    /// Enable CORS (default: true)
    pub cors_enabled: bool,
}

/// Tenant configuration storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory holding one sub-directory per tenant code
    pub pms_root: PathBuf,
}

/// RGBridge delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RgbridgeConfig {
    /// Downstream endpoint receiving `application/xml` payloads
    pub endpoint: String,
    /// HTTP Basic username
    pub username: String,
    /// HTTP Basic password
    pub password: String,
    /// Total attempts per delivery, including the first
    pub max_retries: u32,
    /// Backoff unit; attempt N waits N times this before the next try
    pub retry_base_delay_ms: u64,
    /// Per-attempt network timeout in seconds
    pub request_timeout_secs: u64,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Log format (json, pretty, compact)
    pub log_format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8005,
            request_timeout: 30,
            max_body_size: 10 * 1024 * 1024, // 10MB
            cors_enabled: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            pms_root: PathBuf::from("../pms"),
        }
    }
}

impl Default for RgbridgeConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://internal-api.example.com/rgbridge".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
            max_retries: 3,
            retry_base_delay_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl RgbridgeConfig {
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl BridgeConfig {
    /// Load configuration from defaults, an optional file and environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut cfg = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8005)?
            .set_default("server.request_timeout", 30)?
            .set_default("server.max_body_size", 10485760)?
            .set_default("server.cors_enabled", true)?
            .set_default("storage.pms_root", "../pms")?
            .set_default("rgbridge.endpoint", "https://internal-api.example.com/rgbridge")?
            .set_default("rgbridge.username", "user")?
            .set_default("rgbridge.password", "pass")?
            .set_default("rgbridge.max_retries", 3)?
            .set_default("rgbridge.retry_base_delay_ms", 1000)?
            .set_default("rgbridge.request_timeout_secs", 30)?
            .set_default("observability.log_level", "info")?
            .set_default("observability.log_format", "json")?;

        if let Ok(config_path) = std::env::var("PMS_BRIDGE_CONFIG_FILE") {
            cfg = cfg.add_source(config::File::with_name(&config_path).required(false));
        }

        cfg.add_source(
            config::Environment::with_prefix("PMS_BRIDGE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("Server port cannot be 0".to_string());
        }

        if self.storage.pms_root.as_os_str().is_empty() {
            return Err("Storage root (pms_root) cannot be empty".to_string());
        }

        if self.rgbridge.max_retries == 0 {
            return Err("RGBridge max_retries must be at least 1".to_string());
        }

        let endpoint = Url::parse(&self.rgbridge.endpoint)
            .map_err(|e| format!("Invalid RGBridge endpoint URL: {}", e))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(format!(
                "RGBridge endpoint must be http or https, got '{}'",
                endpoint.scheme()
            ));
        }

        Ok(())
    }
}

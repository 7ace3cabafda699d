//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `STORAGECAGE_CONFIG`
//! environment variable. A missing file is not an error: every field has a default.
//!
//! ## Loading Priority
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `STORAGECAGE_` override YAML values
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `STORAGECAGE_LIMITS__FILES__MAX_FILE_SIZE=1048576` sets `limits.files.max_file_size`.
//!
//! ## Usage
//!
//! ```no_run
//! use clap::Parser;
//! use storagecage::config::{Args, Config};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//!
//! println!("Serving {} on {}", config.storage_dir.display(), config.bind_address());
//! # Ok(())
//! # }
//! ```
//!
//! ## Example
//!
//! ```yaml
//! host: 127.0.0.1
//! port: 8080
//! storage_dir: /var/lib/storagecage
//! limits:
//!   files:
//!     max_file_size: 10485760
//! cors:
//!   allowed_origins:
//!     - http://localhost:5173
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "STORAGECAGE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// All fields have defaults defined in the `Default` implementation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Directory holding the stored files. Fixed for the lifetime of the process.
    pub storage_dir: PathBuf,
    /// Create `storage_dir` on startup if it does not exist
    pub create_storage_dir: bool,
    /// Resource limits
    pub limits: LimitsConfig,
    /// CORS configuration for browser clients
    pub cors: CorsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Resource limits for protecting the host.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Upload limits
    pub files: FileLimitsConfig,
}

/// File limits configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileLimitsConfig {
    /// Maximum size in bytes of an uploaded file.
    /// Set to 0 for unlimited (not recommended for production).
    /// Default: 10MB
    pub max_file_size: u64,
}

impl Default for FileLimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// CORS (Cross-Origin Resource Sharing) configuration.
///
/// Allowed methods and request headers are fixed; origins, credentials, preflight caching and
/// exposed headers are configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Attach the CORS layer at all
    pub enabled: bool,
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
    /// Headers to expose to the browser (in addition to CORS-safelisted headers)
    pub exposed_headers: Vec<String>,
}

/// A single allowed CORS origin
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard", serialize_with = "serialize_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    #[serde(deserialize_with = "parse_url")]
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

fn serialize_wildcard<S>(serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str("*")
}

fn parse_url<'de, D>(deserializer: D) -> Result<Url, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Url::parse(&s).map_err(serde::de::Error::custom)
}

impl CorsOrigin {
    /// The origin as it appears in an `Origin` request header (no trailing slash)
    pub fn as_header_value(&self) -> String {
        match self {
            CorsOrigin::Wildcard => "*".to_string(),
            CorsOrigin::Url(url) => url.origin().ascii_serialization(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            storage_dir: PathBuf::from("./storage"),
            create_storage_dir: true,
            limits: LimitsConfig::default(),
            cors: CorsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec![CorsOrigin::Url(
                Url::parse("http://localhost:5173").expect("static origin URL is valid"), // Development frontend (Vite)
            )],
            allow_credentials: true,
            max_age: Some(300),
            exposed_headers: vec!["link".to_string()],
        }
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    pub fn validate(&self) -> Result<(), Error> {
        if self.storage_dir.as_os_str().is_empty() {
            return Err(Error::Internal {
                operation: "Config validation: storage_dir cannot be empty".to_string(),
            });
        }

        if self.cors.enabled {
            if self.cors.allowed_origins.is_empty() {
                return Err(Error::Internal {
                    operation: "Config validation: CORS allowed_origins cannot be empty. Add at least one allowed origin or disable CORS."
                        .to_string(),
                });
            }

            // Browsers reject a wildcard origin on credentialed requests
            let has_wildcard = self.cors.allowed_origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard));
            if has_wildcard && self.cors.allow_credentials {
                return Err(Error::Internal {
                    operation: "Config validation: CORS cannot use wildcard origin '*' with allow_credentials=true. Specify explicit origins."
                        .to_string(),
                });
            }
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables override specific values
            .merge(Env::prefixed("STORAGECAGE_").ignore(&["config"]).split("__"))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

//! Configuration management
//!
//! Adapter configuration is stored in TOML. The file is looked up at, in order,
//! an explicit path, `$COSFS_CONFIG`, then `<config dir>/cosfs/config.toml`.
//! Key names follow the COS console, so both `app_id` and `appId` are accepted.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "COSFS_CONFIG";

/// Region used when none is configured
pub const DEFAULT_REGION: &str = "ap-guangzhou";

/// Scheme used for unsigned URLs when none is configured
const DEFAULT_SCHEME: &str = "http";

/// Relative expiry used when a signed URL is produced without an explicit one
const DEFAULT_SIGNED_URL_EXPIRES: &str = "+60 minutes";

/// Static credentials for the storage service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// SecretId from the cloud console
    #[serde(alias = "secretId")]
    pub secret_id: String,

    /// SecretKey from the cloud console
    #[serde(alias = "secretKey")]
    pub secret_key: String,

    /// Account app id, used when the top-level `app_id` is absent
    #[serde(default, alias = "appId", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Optional temporary session token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Adapter configuration, immutable once the adapter is built
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Bucket name, with or without the `-<app_id>` suffix
    pub bucket: String,

    /// Account app id
    #[serde(default, alias = "appId", skip_serializing_if = "Option::is_none")]
    pub app_id: Option<String>,

    /// Bucket region
    #[serde(default = "default_region")]
    pub region: String,

    /// Root prefix every logical path is placed under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// CDN host that public and signed URLs are rewritten through
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn: Option<String>,

    /// Scheme for generated URLs: "http" or "https"
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Produce signed URLs by default when no CDN is set
    #[serde(default)]
    pub signed_url: bool,

    /// Read object bytes through a signed URL instead of the API
    #[serde(default)]
    pub read_from_cdn: bool,

    /// Relative expiry for implicitly signed URLs
    #[serde(default = "default_signed_url_expires")]
    pub signed_url_expires: String,

    /// Credentials for the API
    #[serde(default)]
    pub credentials: Credentials,

    /// Endpoint override for S3-compatible test servers (path-style addressing)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Transport timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_scheme() -> String {
    DEFAULT_SCHEME.to_string()
}

fn default_signed_url_expires() -> String {
    DEFAULT_SIGNED_URL_EXPIRES.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            app_id: None,
            region: default_region(),
            prefix: None,
            cdn: None,
            scheme: default_scheme(),
            signed_url: false,
            read_from_cdn: false,
            signed_url_expires: default_signed_url_expires(),
            credentials: Credentials::default(),
            endpoint: None,
            timeout: None,
        }
    }
}

impl Config {
    /// Create a configuration for a bucket with every other option defaulted
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the adapter relies on
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(Error::Config("bucket must not be empty".into()));
        }

        if self.scheme != "http" && self.scheme != "https" {
            return Err(Error::Config(format!(
                "scheme must be \"http\" or \"https\", got \"{}\"",
                self.scheme
            )));
        }

        if self.region.trim().is_empty() {
            return Err(Error::Config("region must not be empty".into()));
        }

        Ok(())
    }

    /// App id from the top level, else from `[credentials]`
    pub fn app_id(&self) -> Option<&str> {
        let top = self.app_id.as_deref().map(str::trim).filter(|id| !id.is_empty());
        top.or_else(|| {
            self.credentials
                .app_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
        })
    }

    /// Whether requests go to an endpoint override with path-style addressing
    pub fn path_style(&self) -> bool {
        self.endpoint.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    /// Bucket name as the service knows it: `<bucket>-<app_id>`
    pub fn full_bucket(&self) -> String {
        match self.app_id() {
            Some(app_id) if !self.bucket.ends_with(&format!("-{app_id}")) => {
                format!("{}-{app_id}", self.bucket)
            }
            _ => self.bucket.clone(),
        }
    }

    /// Configured CDN host, ignoring blank values
    pub fn cdn_host(&self) -> Option<&str> {
        self.cdn.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }
}

/// Locates and loads the configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager using `$COSFS_CONFIG` or the default location
    pub fn new() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(Self::with_path(PathBuf::from(path)));
        }

        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        Ok(Self::with_path(config_dir.join("cosfs").join("config.toml")))
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Load and validate the configuration
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Err(Error::Config(format!(
                "Configuration file not found: {}",
                self.config_path.display()
            )));
        }

        tracing::debug!(path = %self.config_path.display(), "loading configuration");
        let content = std::fs::read_to_string(&self.config_path)?;
        Config::from_toml(&content)
    }
}

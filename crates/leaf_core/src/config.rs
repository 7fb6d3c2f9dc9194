use crate::error::ConfigError;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

/// Endpoint baked in at build time (see `build.rs`).
pub const DEFAULT_ENDPOINT: &str = env!("LEAF_DOCTOR_ENDPOINT");

const FALLBACK_ENDPOINT: &str = "http://127.0.0.1:8000/plants/detect";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

static DEFAULT_URL: LazyLock<Url> = LazyLock::new(|| {
    parse_endpoint(DEFAULT_ENDPOINT).unwrap_or_else(|e| {
        tracing::warn!("build-time endpoint rejected: {e}");
        Url::parse(FALLBACK_ENDPOINT).expect("fallback endpoint is a valid URL")
    })
});

/// Resolved settings for the diagnosis client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub endpoint: Url,
    /// Client-side bound on a whole request; `None` waits indefinitely.
    pub timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_URL.clone(),
            timeout: Some(DEFAULT_TIMEOUT),
        }
    }
}

impl ClientConfig {
    pub fn with_endpoint(endpoint: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: parse_endpoint(endpoint)?,
            ..Self::default()
        })
    }

    /// Apply user overrides on top of the defaults.
    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Some(endpoint) = settings.endpoint.as_deref().map(str::trim)
            && !endpoint.is_empty()
        {
            cfg.endpoint = parse_endpoint(endpoint)?;
        }
        if let Some(secs) = settings.timeout_secs {
            cfg.timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        Ok(cfg)
    }

    /// Settings that reproduce this configuration.
    pub fn to_settings(&self) -> ClientSettings {
        ClientSettings {
            endpoint: Some(self.endpoint.to_string()),
            timeout_secs: Some(self.timeout.map(|t| t.as_secs()).unwrap_or(0)),
        }
    }
}

/// User-editable overrides, persisted as TOML.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub endpoint: Option<String>,
    /// Seconds; `0` disables the client-side timeout.
    pub timeout_secs: Option<u64>,
}

impl ClientSettings {
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(raw)?)
    }

    /// Load settings from `path`; a missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!("no settings file at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let raw = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        }
        fs::write(path, raw).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Parse an endpoint, accepting only http(s) URLs.
pub fn parse_endpoint(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidEndpoint {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidEndpoint {
            url: raw.to_string(),
            reason: format!("unsupported scheme {other}"),
        }),
    }
}

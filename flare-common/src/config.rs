//! Configuration loading and credential resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! Configuration is resolved once at startup. The NASA API key is wrapped in
//! [`ApiKey`], whose `Debug` output is redacted so it cannot leak into logs.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable holding the NASA API key
pub const API_KEY_ENV: &str = "NASA_API_KEY";

/// Environment variable overriding the listen address
pub const BIND_ENV: &str = "FLARE_VIEWER_BIND";

/// NASA's shared, heavily rate-limited public key
pub const DEMO_API_KEY: &str = "DEMO_KEY";

pub const DEFAULT_BIND: &str = "127.0.0.1:5730";
pub const DEFAULT_DONKI_BASE_URL: &str = "https://api.nasa.gov/DONKI";
pub const DEFAULT_HELIOVIEWER_BASE_URL: &str = "https://api.helioviewer.org/v2";
pub const DEFAULT_IMAGE_WORKERS: usize = 1;

/// Server-held NASA API credential
///
/// Never forwarded to the browser and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Raw key, for building the upstream request only
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_demo(&self) -> bool {
        self.0 == DEMO_API_KEY
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

/// On-disk TOML configuration
///
/// Every field is optional; absent fields fall through to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    pub nasa_api_key: Option<String>,
    pub bind: Option<String>,
    pub donki_base_url: Option<String>,
    pub helioviewer_base_url: Option<String>,
    /// Concurrent image resolutions per search (1 = sequential)
    pub image_workers: Option<usize>,
    /// Upstream request timeout; no timeout when absent
    pub request_timeout_secs: Option<u64>,
}

impl TomlConfig {
    /// Load a TOML config file
    ///
    /// A missing file is not an error: the defaults are returned and a note is
    /// logged. A file that exists but does not parse is a configuration error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {} (using defaults)", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: TomlConfig = toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e))
        })?;

        info!("Loaded config file: {}", path.display());
        Ok(config)
    }

    /// Platform config file location: `<config_dir>/flare-viewer/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("flare-viewer").join("config.toml"))
    }
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub api_key: Option<String>,
    pub image_workers: Option<usize>,
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ViewerConfig {
    pub bind: String,
    pub api_key: ApiKey,
    pub donki_base_url: String,
    pub helioviewer_base_url: String,
    pub image_workers: usize,
    pub request_timeout: Option<Duration>,
}

impl ViewerConfig {
    /// Resolve configuration from CLI, environment and TOML
    pub fn resolve(cli: &CliOverrides, toml_config: &TomlConfig) -> Self {
        let api_key = resolve_api_key(cli.api_key.as_deref(), toml_config);
        let bind = resolve_bind(cli.bind.as_deref(), toml_config);

        let image_workers = cli
            .image_workers
            .or(toml_config.image_workers)
            .unwrap_or(DEFAULT_IMAGE_WORKERS)
            .max(1);

        Self {
            bind,
            api_key,
            donki_base_url: base_url(
                toml_config.donki_base_url.as_deref(),
                DEFAULT_DONKI_BASE_URL,
            ),
            helioviewer_base_url: base_url(
                toml_config.helioviewer_base_url.as_deref(),
                DEFAULT_HELIOVIEWER_BASE_URL,
            ),
            image_workers,
            request_timeout: toml_config.request_timeout_secs.map(Duration::from_secs),
        }
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

/// Resolve the NASA API key: CLI → `NASA_API_KEY` → TOML → `DEMO_KEY`
pub fn resolve_api_key(cli_key: Option<&str>, toml_config: &TomlConfig) -> ApiKey {
    let env_key = std::env::var(API_KEY_ENV).ok();
    resolve_api_key_from(cli_key, env_key.as_deref(), toml_config.nasa_api_key.as_deref())
}

/// Key resolution over explicit sources
pub fn resolve_api_key_from(
    cli_key: Option<&str>,
    env_key: Option<&str>,
    toml_key: Option<&str>,
) -> ApiKey {
    let candidates = [
        ("command line", cli_key),
        ("environment", env_key),
        ("TOML", toml_key),
    ];

    let valid: Vec<(&str, &str)> = candidates
        .iter()
        .filter_map(|(source, key)| key.filter(|k| is_valid_key(k)).map(|k| (*source, k)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(s, _)| *s).collect();
        warn!(
            "NASA API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    match valid.first() {
        Some((source, key)) => {
            info!("NASA API key loaded from {}", source);
            ApiKey::new(key.trim())
        }
        None => {
            warn!(
                "NASA API key not configured; falling back to {}. Set {} or nasa_api_key in \
                 the config file. Obtain a key at https://api.nasa.gov/",
                DEMO_API_KEY, API_KEY_ENV
            );
            ApiKey::new(DEMO_API_KEY)
        }
    }
}

/// Resolve the listen address: CLI → `FLARE_VIEWER_BIND` → TOML → default
pub fn resolve_bind(cli_bind: Option<&str>, toml_config: &TomlConfig) -> String {
    if let Some(bind) = cli_bind {
        return bind.to_string();
    }
    if let Ok(bind) = std::env::var(BIND_ENV) {
        if !bind.trim().is_empty() {
            return bind;
        }
    }
    toml_config
        .bind
        .clone()
        .unwrap_or_else(|| DEFAULT_BIND.to_string())
}

fn base_url(configured: Option<&str>, default: &str) -> String {
    configured
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

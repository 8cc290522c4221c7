//! Client configuration: where the session service lives and how patiently to poll it.

use std::{env, fs, io::ErrorKind, path::Path, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::remote::{
    error::{ApiError, ApiResult},
    http::ApiConfig,
};

/// Default location on disk where the client looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/scatter.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "SCATTER_CONFIG_PATH";

const API_BASE_URL_ENV: &str = "SCATTER_API_BASE_URL";
const API_TOKEN_ENV: &str = "SCATTER_API_TOKEN";
const DELAY_ENV: &str = "SCATTER_DELAY_BETWEEN_REFRESH_MS";
const MAX_REFRESH_ENV: &str = "SCATTER_MAX_STATUS_REFRESH_COUNT";
const APP_ORIGIN_ENV: &str = "SCATTER_APP_ORIGIN";

const DEFAULT_DELAY_BETWEEN_REFRESH_MS: u64 = 500;
const DEFAULT_MAX_STATUS_REFRESH_COUNT: u32 = 50;
const DEFAULT_APP_ORIGIN: &str = "http://localhost:8000";

/// Polling settings handed to each [`SessionMachine`](crate::state::SessionMachine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Pause between two status fetches while waiting for other players.
    pub delay_between_refresh: Duration,
    /// Retries allowed after the first fetch before asking the player to reload.
    pub max_status_refresh_count: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            delay_between_refresh: Duration::from_millis(DEFAULT_DELAY_BETWEEN_REFRESH_MS),
            max_status_refresh_count: DEFAULT_MAX_STATUS_REFRESH_COUNT,
        }
    }
}

/// Immutable runtime configuration for the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScatterConfig {
    /// Root URL of the session service.
    pub api_base_url: Option<String>,
    /// Bearer token for owner-only calls.
    pub api_token: Option<String>,
    /// Pause between status fetches while waiting, in milliseconds.
    pub delay_between_refresh_ms: u64,
    /// Polling retries before the player is asked to reload.
    pub max_status_refresh_count: u32,
    /// Origin used to build shareable session links.
    pub app_origin: String,
}

impl Default for ScatterConfig {
    fn default() -> Self {
        Self {
            api_base_url: None,
            api_token: None,
            delay_between_refresh_ms: DEFAULT_DELAY_BETWEEN_REFRESH_MS,
            max_status_refresh_count: DEFAULT_MAX_STATUS_REFRESH_COUNT,
            app_origin: DEFAULT_APP_ORIGIN.to_string(),
        }
    }
}

impl ScatterConfig {
    /// Load the configuration file, then let environment variables override individual values.
    pub fn load() -> Self {
        Self::load_from_path(&resolve_config_path())
            .with_overrides(|name| env::var(name).ok().filter(|value| !value.is_empty()))
    }

    /// Read the JSON file at `path`, falling back to defaults when it is missing or invalid.
    pub fn load_from_path(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    info!(path = %path.display(), "loaded scatter client config");
                    raw.into()
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Apply overrides looked up by environment variable name.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(API_BASE_URL_ENV) {
            self.api_base_url = Some(url);
        }
        if let Some(token) = lookup(API_TOKEN_ENV) {
            self.api_token = Some(token);
        }
        if let Some(origin) = lookup(APP_ORIGIN_ENV) {
            self.app_origin = origin;
        }
        if let Some(raw) = lookup(DELAY_ENV) {
            match raw.parse() {
                Ok(delay) => self.delay_between_refresh_ms = delay,
                Err(_) => warn!(var = DELAY_ENV, value = %raw, "ignoring non-numeric override"),
            }
        }
        if let Some(raw) = lookup(MAX_REFRESH_ENV) {
            match raw.parse() {
                Ok(count) => self.max_status_refresh_count = count,
                Err(_) => warn!(var = MAX_REFRESH_ENV, value = %raw, "ignoring non-numeric override"),
            }
        }
        self
    }

    /// Polling settings for session state machines.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            delay_between_refresh: Duration::from_millis(self.delay_between_refresh_ms),
            max_status_refresh_count: self.max_status_refresh_count,
        }
    }

    /// Connection settings for the HTTP session service.
    pub fn api_config(&self) -> ApiResult<ApiConfig> {
        let base_url = self
            .api_base_url
            .clone()
            .ok_or(ApiError::MissingEnvVar {
                var: API_BASE_URL_ENV,
            })?;
        let config = ApiConfig::new(base_url);
        Ok(match &self.api_token {
            Some(token) => config.with_token(token.clone()),
            None => config,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    api_base_url: Option<String>,
    api_token: Option<String>,
    delay_between_refresh_ms: Option<u64>,
    max_status_refresh_count: Option<u32>,
    app_origin: Option<String>,
}

impl From<RawConfig> for ScatterConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            api_base_url: value.api_base_url,
            api_token: value.api_token,
            delay_between_refresh_ms: value
                .delay_between_refresh_ms
                .unwrap_or(defaults.delay_between_refresh_ms),
            max_status_refresh_count: value
                .max_status_refresh_count
                .unwrap_or(defaults.max_status_refresh_count),
            app_origin: value.app_origin.unwrap_or(defaults.app_origin),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

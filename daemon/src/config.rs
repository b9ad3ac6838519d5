//! Configuration loading and management
//!
//! Settings come from a TOML file with environment overrides:
//!
//! ```toml
//! [default]
//! url = "https://hooks.example.com/notify"
//! user_uid = "42"
//!
//! [detector]
//! cooldown_ms = 1000
//! request_timeout_secs = 10
//!
//! [ipc]
//! socket_path = "/tmp/keyhook.sock"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_COOLDOWN_MS: u64 = 1000;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised while loading configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("notification url not set (settings `default.url` or KEYHOOK_URL)")]
    MissingUrl,

    #[error("user id not set (settings `default.user_uid` or KEYHOOK_USER_UID)")]
    MissingUserUid,

    #[error("`{field}` must be greater than zero")]
    NotPositive { field: &'static str },
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    #[serde(default)]
    default: DefaultSection,
    #[serde(default)]
    detector: DetectorSection,
    #[serde(default)]
    ipc: IpcSection,
}

#[derive(Debug, Default, Deserialize)]
struct DefaultSection {
    url: Option<String>,
    user_uid: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetectorSection {
    #[serde(default = "default_cooldown_ms")]
    cooldown_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            cooldown_ms: default_cooldown_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct IpcSection {
    socket_path: Option<PathBuf>,
}

fn default_cooldown_ms() -> u64 {
    DEFAULT_COOLDOWN_MS
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL notifications are posted to
    pub url: String,

    /// User identifier sent with every notification
    pub user_uid: String,

    /// Minimum interval between two dispatches
    pub cooldown: Duration,

    /// Upper bound on a single notification request
    pub request_timeout: Duration,

    /// Path to the Unix domain socket for the status server
    pub socket_path: PathBuf,
}

impl Config {
    /// Load configuration from a settings file and the process environment
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        Self::from_settings(&text, |key| std::env::var(key).ok())
    }

    /// Build configuration from settings text, resolving environment
    /// variables through `env`
    pub fn from_settings(
        text: &str,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let settings: SettingsFile = toml::from_str(text)?;

        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());
        let url = non_empty(env("KEYHOOK_URL"))
            .or_else(|| non_empty(settings.default.url.clone()))
            .ok_or(ConfigError::MissingUrl)?;
        let user_uid = non_empty(env("KEYHOOK_USER_UID"))
            .or_else(|| non_empty(settings.default.user_uid.clone()))
            .ok_or(ConfigError::MissingUserUid)?;

        if settings.detector.request_timeout_secs == 0 {
            return Err(ConfigError::NotPositive {
                field: "detector.request_timeout_secs",
            });
        }

        let socket_path = settings
            .ipc
            .socket_path
            .unwrap_or_else(|| default_socket_path(env("HOME")));

        Ok(Self {
            url,
            user_uid,
            cooldown: Duration::from_millis(settings.detector.cooldown_ms),
            request_timeout: Duration::from_secs(settings.detector.request_timeout_secs),
            socket_path,
        })
    }
}

fn default_socket_path(home: Option<String>) -> PathBuf {
    let data_dir = match home {
        Some(home) => PathBuf::from(home).join(".local").join("share"),
        None => std::env::temp_dir(),
    };
    data_dir.join("keyhook").join("daemon.sock")
}

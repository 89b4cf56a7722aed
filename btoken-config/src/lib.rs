//! # btoken Config
//!
//! Configuration management for the btoken authorization service.
//!
//! A configuration can be created manually, through the builder, or loaded
//! from JSON files, TOML files (feature `toml`, enabled by default), or
//! environment variables. [`try_load_default_config`] walks the standard
//! locations in order and returns the first configuration it finds.
//!
//! The one value with real policy weight is `expire_after`, the expiry
//! ceiling: the maximum (and default) lifetime of any issued token. It is
//! kept in its humantime string form ("8h", "1h30m") so it round-trips
//! through config files unchanged, and parsed on demand.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default expiry ceiling applied when the configuration does not set one.
pub const DEFAULT_EXPIRE_AFTER: &str = "8h";

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_expire_after() -> String {
    DEFAULT_EXPIRE_AFTER.to_string()
}

/// Errors that can occur when loading or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("invalid duration {value:?}: {reason}")]
    InvalidDuration { value: String, reason: String },

    #[error("listen address must not be empty")]
    MissingListenAddr,

    #[error("environment variable error: {0}")]
    EnvVar(#[from] env::VarError),
}

impl From<serde_json::Error> for ConfigError {
    fn from(error: serde_json::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

#[cfg(feature = "toml")]
impl From<toml::de::Error> for ConfigError {
    fn from(error: toml::de::Error) -> Self {
        ConfigError::Parse(error.to_string())
    }
}

/// Configuration for the btoken service.
///
/// # Examples
///
/// ```
/// use btoken_config::BtokenConfig;
///
/// let config = BtokenConfig::builder()
///     .listen_addr("127.0.0.1:9090")
///     .expire_after("30m")
///     .user("jtkirk", "Beam me up, Scotty!")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.expiry_ceiling().unwrap().as_secs(), 30 * 60);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BtokenConfig {
    /// Address the HTTP front end binds to, e.g. `"0.0.0.0:8080"`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Maximum and default token lifetime, in humantime form ("8h").
    #[serde(default = "default_expire_after")]
    pub expire_after: String,

    /// PostgreSQL connection string. When absent the in-memory store is used.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Static username/password table consumed by the built-in authorizer.
    /// Deployments with a real user directory leave this empty.
    #[serde(default)]
    pub users: HashMap<String, String>,
}

impl Default for BtokenConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            expire_after: default_expire_after(),
            database_url: None,
            users: HashMap::new(),
        }
    }
}

impl BtokenConfig {
    pub fn builder() -> BtokenConfigBuilder {
        BtokenConfigBuilder::default()
    }

    /// The expiry ceiling as a parsed duration.
    pub fn expiry_ceiling(&self) -> Result<Duration, ConfigError> {
        parse_expire_after(&self.expire_after)
    }

    /// Replace the expiry ceiling.
    ///
    /// An empty string preserves the current value rather than erroring, so
    /// callers can pass through an unset CLI flag or form field unchanged.
    /// Returns the ceiling now in effect.
    pub fn set_expire_after(&mut self, value: &str) -> Result<Duration, ConfigError> {
        if value.is_empty() {
            return self.expiry_ceiling();
        }
        let parsed = parse_expire_after(value)?;
        self.expire_after = value.to_string();
        Ok(parsed)
    }

    /// Check that all fields are present and parse.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.listen_addr.is_empty() {
            return Err(ConfigError::MissingListenAddr);
        }
        self.expiry_ceiling()?;
        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: BtokenConfig = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a TOML file.
    #[cfg(feature = "toml")]
    pub fn from_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: BtokenConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from environment variables.
    ///
    /// With the prefix `"BTOKEN"` the recognized variables are:
    /// - `BTOKEN_LISTEN_ADDR`
    /// - `BTOKEN_EXPIRE_AFTER`
    /// - `BTOKEN_DATABASE_URL`
    ///
    /// Absent variables keep their defaults. The user table cannot be set
    /// from the environment; use a configuration file for that.
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let mut config = BtokenConfig::default();
        if let Some(listen_addr) = optional_var(&format!("{prefix}_LISTEN_ADDR"))? {
            config.listen_addr = listen_addr;
        }
        if let Some(expire_after) = optional_var(&format!("{prefix}_EXPIRE_AFTER"))? {
            config.expire_after = expire_after;
        }
        config.database_url = optional_var(&format!("{prefix}_DATABASE_URL"))?;
        config.validate()?;
        Ok(config)
    }
}

fn optional_var(name: &str) -> Result<Option<String>, ConfigError> {
    match env::var(name) {
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parse_expire_after(value: &str) -> Result<Duration, ConfigError> {
    let parsed = humantime::parse_duration(value).map_err(|err| ConfigError::InvalidDuration {
        value: value.to_string(),
        reason: err.to_string(),
    })?;
    if parsed.is_zero() {
        return Err(ConfigError::InvalidDuration {
            value: value.to_string(),
            reason: "ceiling must be greater than zero".to_string(),
        });
    }
    Ok(parsed)
}

/// Builder for [`BtokenConfig`].
#[derive(Debug, Default)]
pub struct BtokenConfigBuilder {
    listen_addr: Option<String>,
    expire_after: Option<String>,
    database_url: Option<String>,
    users: HashMap<String, String>,
}

impl BtokenConfigBuilder {
    pub fn listen_addr(mut self, listen_addr: impl Into<String>) -> Self {
        self.listen_addr = Some(listen_addr.into());
        self
    }

    pub fn expire_after(mut self, expire_after: impl Into<String>) -> Self {
        self.expire_after = Some(expire_after.into());
        self
    }

    pub fn database_url(mut self, database_url: impl Into<String>) -> Self {
        self.database_url = Some(database_url.into());
        self
    }

    /// Add a user to the static authorizer table.
    pub fn user(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(username.into(), password.into());
        self
    }

    pub fn build(self) -> Result<BtokenConfig, ConfigError> {
        let config = BtokenConfig {
            listen_addr: self.listen_addr.unwrap_or_else(default_listen_addr),
            expire_after: self.expire_after.unwrap_or_else(default_expire_after),
            database_url: self.database_url,
            users: self.users,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Try to load a configuration from standard locations.
///
/// Attempts, in order:
/// 1. Environment variables with the `BTOKEN` prefix (when any is set)
/// 2. `./btoken.json`, `~/.btoken/config.json`, `/etc/btoken/config.json`
/// 3. The TOML equivalents of those paths, when the `toml` feature is on
///
/// Returns `None` when no configuration could be found.
pub fn try_load_default_config() -> Option<BtokenConfig> {
    let env_keys = ["LISTEN_ADDR", "EXPIRE_AFTER", "DATABASE_URL"];
    if env_keys
        .iter()
        .any(|key| env::var(format!("BTOKEN_{key}")).is_ok())
    {
        if let Ok(config) = BtokenConfig::from_env("BTOKEN") {
            return Some(config);
        }
    }

    let json_paths = [
        "./btoken.json",
        "~/.btoken/config.json",
        "/etc/btoken/config.json",
    ];
    for path in expand_paths(&json_paths) {
        if path.exists() {
            if let Ok(config) = BtokenConfig::from_file(&path) {
                return Some(config);
            }
        }
    }

    #[cfg(feature = "toml")]
    {
        let toml_paths = [
            "./btoken.toml",
            "~/.btoken/config.toml",
            "/etc/btoken/config.toml",
        ];
        for path in expand_paths(&toml_paths) {
            if path.exists() {
                if let Ok(config) = BtokenConfig::from_toml(&path) {
                    return Some(config);
                }
            }
        }
    }

    None
}

fn expand_paths(paths: &[&str]) -> Vec<std::path::PathBuf> {
    paths
        .iter()
        .filter_map(|path| {
            if let Some(stripped) = path.strip_prefix("~/") {
                dirs::home_dir().map(|home| home.join(stripped))
            } else {
                Some(Path::new(path).to_path_buf())
            }
        })
        .collect()
}

//! Configuration management for botdesk
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{ConsoleError, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Main configuration structure for botdesk
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Backend REST API settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Session provider settings
    #[serde(default)]
    pub auth: AuthConfig,

    /// View behaviour settings
    #[serde(default)]
    pub console: ConsoleConfig,

    /// Embed snippet template settings
    #[serde(default)]
    pub embed: EmbedConfig,

    /// Guarded HTTP console settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which data source backs the views
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum BackendMode {
    /// Talk to the backend; failures surface as errors
    #[default]
    Live,
    /// Serve illustrative in-memory data only
    Demo,
    /// Talk to the backend and substitute demo data when a call fails
    Fallback,
}

impl BackendMode {
    /// Parse a mode name (case-insensitive)
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "live" => Ok(Self::Live),
            "demo" => Ok(Self::Demo),
            "fallback" => Ok(Self::Fallback),
            other => Err(ConsoleError::Config(format!(
                "Invalid backend mode: {}. Must be one of: live, demo, fallback",
                other
            ))
            .into()),
        }
    }
}

impl std::fmt::Display for BackendMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Live => write!(f, "live"),
            Self::Demo => write!(f, "demo"),
            Self::Fallback => write!(f, "fallback"),
        }
    }
}

/// Backend REST API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL every endpoint path is appended to
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Credential used when the identity carries no `apiKey`
    #[serde(default)]
    pub api_key: String,

    /// Data source selection
    #[serde(default)]
    pub mode: BackendMode,

    /// HTTP client timeout (seconds)
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: String::new(),
            mode: BackendMode::default(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

/// Session provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the GoTrue-compatible auth service
    ///
    /// When unset the stored session snapshot is used offline.
    #[serde(default)]
    pub url: Option<String>,

    /// Public (anon) key sent as the `apikey` header
    #[serde(default)]
    pub public_key: String,

    /// Name of the cookie carrying the session marker
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    /// Override for the session file location
    #[serde(default)]
    pub session_file: Option<PathBuf>,
}

fn default_session_cookie() -> String {
    "sb-auth-token".to_string()
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            url: None,
            public_key: String::new(),
            session_cookie: default_session_cookie(),
            session_file: None,
        }
    }
}

/// View behaviour configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Seconds a success banner stays visible
    #[serde(default = "default_banner_seconds")]
    pub banner_seconds: u64,
}

fn default_banner_seconds() -> u64 {
    5
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            banner_seconds: default_banner_seconds(),
        }
    }
}

/// Embed snippet configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedConfig {
    /// Widget loader script URL
    #[serde(default = "default_script_url")]
    pub script_url: String,

    /// Global variable the widget reads its settings from
    #[serde(default = "default_global_name")]
    pub global_name: String,
}

fn default_script_url() -> String {
    "https://cdn.vocata.ai/widget.js".to_string()
}

fn default_global_name() -> String {
    "vocataConfig".to_string()
}

impl Default for EmbedConfig {
    fn default() -> Self {
        Self {
            script_url: default_script_url(),
            global_name: default_global_name(),
        }
    }
}

/// Guarded HTTP console configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConsoleError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ConsoleError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("BOTDESK_API_URL") {
            self.backend.base_url = base_url;
        }

        if let Ok(api_key) = std::env::var("BOTDESK_API_KEY") {
            self.backend.api_key = api_key;
            tracing::debug!("Env override: BOTDESK_API_KEY");
        }

        if let Ok(mode) = std::env::var("BOTDESK_MODE") {
            match BackendMode::parse_str(&mode) {
                Ok(m) => self.backend.mode = m,
                Err(_) => tracing::warn!("Invalid BOTDESK_MODE: {}, keeping {}", mode, self.backend.mode),
            }
        }

        if let Ok(timeout) = std::env::var("BOTDESK_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.backend.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid BOTDESK_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(auth_url) = std::env::var("BOTDESK_AUTH_URL") {
            self.auth.url = Some(auth_url).filter(|u| !u.is_empty());
        }

        if let Ok(public_key) = std::env::var("BOTDESK_AUTH_PUBLIC_KEY") {
            self.auth.public_key = public_key;
        }

        if let Ok(session_file) = std::env::var("BOTDESK_SESSION_FILE") {
            self.auth.session_file = Some(PathBuf::from(session_file));
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }

        if let Some(mode) = cli.mode {
            self.backend.mode = mode;
        }

        if let Some(session_file) = &cli.session_file {
            self.auth.session_file = Some(session_file.clone());
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.backend.base_url).map_err(|e| {
            ConsoleError::Config(format!(
                "backend.base_url is not a valid URL ({}): {}",
                self.backend.base_url, e
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(ConsoleError::Config(format!(
                "backend.base_url must use http or https, got {}",
                base.scheme()
            ))
            .into());
        }

        if self.backend.timeout_seconds == 0 {
            return Err(ConsoleError::Config(
                "backend.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if let Some(auth_url) = &self.auth.url {
            url::Url::parse(auth_url).map_err(|e| {
                ConsoleError::Config(format!("auth.url is not a valid URL ({}): {}", auth_url, e))
            })?;
        }

        if self.auth.session_cookie.trim().is_empty() {
            return Err(
                ConsoleError::Config("auth.session_cookie cannot be empty".to_string()).into(),
            );
        }

        if self.console.banner_seconds == 0 {
            return Err(ConsoleError::Config(
                "console.banner_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.embed.global_name.trim().is_empty() {
            return Err(ConsoleError::Config("embed.global_name cannot be empty".to_string()).into());
        }

        self.server.bind.parse::<SocketAddr>().map_err(|e| {
            ConsoleError::Config(format!(
                "server.bind is not a socket address ({}): {}",
                self.server.bind, e
            ))
        })?;

        Ok(())
    }

    /// Location of the persisted session file
    ///
    /// Uses the configured override, otherwise the platform data directory.
    pub fn session_path(&self) -> PathBuf {
        if let Some(path) = &self.auth.session_file {
            return path.clone();
        }

        directories::ProjectDirs::from("ai", "botdesk", "botdesk")
            .map(|dirs| dirs.data_dir().join("session.json"))
            .unwrap_or_else(|| PathBuf::from(".botdesk-session.json"))
    }
}

//! Configuration for kiln.
//!
//! Provides an optional TOML config file at `~/.config/kiln/config.toml` and
//! a resolution chain: CLI flag > env var > config file > default.
//!
//! Everything is resolved once at startup into a [`KilnConfig`] and passed
//! down. Apart from locating the config file (`XDG_CONFIG_HOME`), settings
//! are only read from the environment through the lookup passed to
//! [`KilnConfig::resolve_with`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use kiln_core::provider::ProviderConfig;

/// Env vars checked for the provider API key, in order.
pub const API_KEY_VARS: [&str; 2] = ["OPENROUTER_API_KEY", "OPENAI_API_KEY"];

/// Origins allowed when nothing is configured (the Vite dev server).
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8000;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "ProviderSection::is_empty")]
    pub provider: ProviderSection,
    #[serde(default, skip_serializing_if = "ServerSection::is_empty")]
    pub server: ServerSection,
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ProviderSection {
    fn is_empty(&self) -> bool {
        self.api_key.is_none() && self.base_url.is_none() && self.model.is_none()
    }
}

#[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct ServerSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    /// Comma-separated, `*` for any origin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_origins: Option<String>,
}

impl ServerSection {
    fn is_empty(&self) -> bool {
        self.bind.is_none() && self.port.is_none() && self.cors_origins.is_none()
    }
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// Return the kiln config directory: `$XDG_CONFIG_HOME/kiln` or
/// `~/.config/kiln`.
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("kiln");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("kiln")
}

/// Return the path to the kiln config file.
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load the config file at `path`.
///
/// A missing file yields `Ok(None)`; a file that exists but cannot be read
/// or parsed is an error.
pub fn load_config_from(path: &Path) -> Result<Option<ConfigFile>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(e)
                .with_context(|| format!("failed to read config file at {}", path.display()));
        }
    };
    let config = toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file at {}", path.display()))?;
    Ok(Some(config))
}

/// Serialize and write a config file, creating parent dirs as needed.
/// Sets file permissions to 0600 on Unix since it may hold an API key.
pub fn save_config_to(path: &Path, config: &ConfigFile) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create config directory {}", dir.display()))?;
    }

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(path, perms)
            .with_context(|| format!("failed to set permissions on {}", path.display()))?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Listener and CORS settings for `kiln serve`.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub bind: String,
    pub port: u16,
    pub cors: CorsSettings,
}

/// Which origins may call the API cross-origin.
#[derive(Debug, Clone, PartialEq)]
pub enum CorsSettings {
    AnyOrigin,
    Origins(Vec<String>),
}

impl CorsSettings {
    /// Parse a comma-separated origin list. Entries are trimmed and empty
    /// ones dropped; a `*` entry allows any origin.
    pub fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect();
        if origins.iter().any(|o| o == "*") {
            Self::AnyOrigin
        } else {
            Self::Origins(origins)
        }
    }
}

/// CLI flags that take precedence over everything else.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved configuration, ready for use.
#[derive(Debug, Clone)]
pub struct KilnConfig {
    pub provider: ProviderConfig,
    pub server: ServerSettings,
}

impl KilnConfig {
    /// Resolve from the process environment and the default config file.
    pub fn resolve(overrides: &CliOverrides) -> Result<Self> {
        let file = load_config_from(&config_path())?;
        Self::resolve_with(overrides, |name| std::env::var(name).ok(), file.as_ref())
    }

    /// Resolve using the chain: CLI flag > env var > config file > default.
    ///
    /// - API key: `OPENROUTER_API_KEY` > `OPENAI_API_KEY` > `provider.api_key` > none
    /// - Model: `KILN_MODEL` > `provider.model` > default
    /// - Base URL: `KILN_BASE_URL` > `provider.base_url` > default
    /// - Bind: `--bind` > `KILN_BIND` > `server.bind` > `0.0.0.0`
    /// - Port: `--port` > `PORT` > `server.port` > 8000
    /// - Origins: `CORS_ORIGINS` > `server.cors_origins` > localhost:5173
    ///
    /// Empty env values count as unset. A missing API key is not an error
    /// here; generation reports it per request.
    pub fn resolve_with<F>(overrides: &CliOverrides, env: F, file: Option<&ConfigFile>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| env(name).filter(|v| !v.trim().is_empty());
        let provider_file = file.map(|f| &f.provider);
        let server_file = file.map(|f| &f.server);

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|name| env(*name))
            .or_else(|| provider_file.and_then(|p| p.api_key.clone()))
            .filter(|k| !k.trim().is_empty());

        let model = env("KILN_MODEL")
            .or_else(|| provider_file.and_then(|p| p.model.clone()))
            .unwrap_or_else(|| ProviderConfig::DEFAULT_MODEL.to_string());

        let base_url = env("KILN_BASE_URL")
            .or_else(|| provider_file.and_then(|p| p.base_url.clone()))
            .unwrap_or_else(|| ProviderConfig::DEFAULT_BASE_URL.to_string());

        let bind = overrides
            .bind
            .clone()
            .or_else(|| env("KILN_BIND"))
            .or_else(|| server_file.and_then(|s| s.bind.clone()))
            .unwrap_or_else(|| DEFAULT_BIND.to_string());

        let port = match (overrides.port, env("PORT")) {
            (Some(p), _) => p,
            (None, Some(raw)) => raw
                .trim()
                .parse()
                .with_context(|| format!("PORT env var is not a valid port: {raw:?}"))?,
            (None, None) => server_file.and_then(|s| s.port).unwrap_or(DEFAULT_PORT),
        };

        let origins = env("CORS_ORIGINS")
            .or_else(|| server_file.and_then(|s| s.cors_origins.clone()))
            .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string());

        Ok(Self {
            provider: ProviderConfig {
                api_key,
                base_url,
                model,
                ..ProviderConfig::default()
            },
            server: ServerSettings {
                bind,
                port,
                cors: CorsSettings::parse(&origins),
            },
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

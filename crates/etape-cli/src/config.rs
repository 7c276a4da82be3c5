//! Configuration for étape: a TOML file at `~/.config/etape/config.toml`
//! with a `[database]` section and an optional `[serve]` section, resolved
//! through the chain CLI flag > env var > config file > default.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use etape_db::config::DbConfig;

// -----------------------------------------------------------------------
// Config file types
// -----------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize)]
pub struct ConfigFile {
    pub database: DatabaseSection,
    /// Defaults for `etape serve`; absent section means built-in defaults.
    #[serde(default)]
    pub serve: ServeSection,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DatabaseSection {
    pub url: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ServeSection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

// -----------------------------------------------------------------------
// Paths
// -----------------------------------------------------------------------

/// The étape config directory.
///
/// Always uses XDG layout: `$XDG_CONFIG_HOME/etape` or `~/.config/etape`.
/// We intentionally ignore the platform-specific `dirs::config_dir()`
/// (which returns `~/Library/Application Support` on macOS).
pub fn config_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(xdg).join("etape");
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("etape")
}

pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}

// -----------------------------------------------------------------------
// Read / write
// -----------------------------------------------------------------------

/// Load and parse the config file. Returns an error if it does not exist.
pub fn load_config() -> Result<ConfigFile> {
    let path = config_path();
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read config file at {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&contents).context("failed to parse config file")?;
    Ok(config)
}

/// Serialize and write the config file, creating parent dirs as needed.
pub fn save_config(config: &ConfigFile) -> Result<()> {
    let path = config_path();
    let dir = config_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create config directory {}", dir.display()))?;

    let contents = toml::to_string_pretty(config).context("failed to serialize config")?;
    std::fs::write(&path, &contents)
        .with_context(|| format!("failed to write config file at {}", path.display()))?;

    Ok(())
}

// -----------------------------------------------------------------------
// Resolved config
// -----------------------------------------------------------------------

/// Resolved serve-command defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServeConfig {
    pub bind: String,
    pub port: u16,
}

impl ServeConfig {
    pub const DEFAULT_BIND: &str = "127.0.0.1";
    pub const DEFAULT_PORT: u16 = 3000;
}

/// Fully resolved configuration, ready for use.
#[derive(Debug)]
pub struct EtapeConfig {
    pub db_config: DbConfig,
    pub serve: ServeConfig,
}

impl EtapeConfig {
    /// Resolve configuration using the chain: CLI flag > env var > config file > default.
    ///
    /// DB URL: `cli_db_url` > `ETAPE_DATABASE_URL` env > `config_file.database.url`
    /// > `DbConfig::DEFAULT_URL`. Serve bind/port come from the `[serve]`
    /// section, falling back to `127.0.0.1:3000`; CLI overrides are applied
    /// by the serve command itself.
    pub fn resolve(cli_db_url: Option<&str>) -> Result<Self> {
        let file_config = load_config().ok();

        let db_url = if let Some(url) = cli_db_url {
            url.to_string()
        } else if let Ok(url) = std::env::var("ETAPE_DATABASE_URL") {
            url
        } else if let Some(ref cfg) = file_config {
            cfg.database.url.clone()
        } else {
            DbConfig::DEFAULT_URL.to_string()
        };

        let serve_section = file_config.map(|cfg| cfg.serve).unwrap_or_default();
        let serve = ServeConfig {
            bind: serve_section
                .bind
                .unwrap_or_else(|| ServeConfig::DEFAULT_BIND.to_string()),
            port: serve_section.port.unwrap_or(ServeConfig::DEFAULT_PORT),
        };

        Ok(Self {
            db_config: DbConfig::new(db_url),
            serve,
        })
    }
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------

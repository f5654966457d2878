use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use authinfo_core::{paths::default_store_path, resolve::DEFAULT_PROVIDERS, MatchPolicy};
use authinfo_gpg::DEFAULT_GPG_ARGS;
use color_eyre::Result;
use dirs::config_dir;
use serde::{Deserialize, Serialize};

/// User-level configuration loaded from `~/.config/authinfo/config.toml` (platform-specific).
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Encrypted store; `~` is expanded at read time.
    pub store_path: Option<PathBuf>,
    /// Provider aliases callers may request.
    pub providers: Option<Vec<String>>,
    pub match_policy: Option<MatchPolicy>,
    /// Seconds to keep a decrypted store in memory; 0 or absent disables caching.
    pub cache_ttl_secs: Option<u64>,
    pub gpg: Option<GpgConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
pub struct GpgConfig {
    pub program: Option<String>,
    pub args: Option<Vec<String>>,
    /// Upper bound on a single decrypt; absent means wait indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Config {
    /// Fully populated config, used by `config init`.
    pub fn with_defaults() -> Self {
        Self {
            store_path: Some(default_store_path()),
            providers: Some(DEFAULT_PROVIDERS.iter().map(|p| p.to_string()).collect()),
            match_policy: Some(MatchPolicy::default()),
            cache_ttl_secs: Some(0),
            gpg: Some(GpgConfig {
                program: Some("gpg".to_string()),
                args: Some(DEFAULT_GPG_ARGS.iter().map(|a| a.to_string()).collect()),
                timeout_secs: None,
            }),
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.gpg
            .as_ref()
            .and_then(|g| g.timeout_secs)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

/// Load config from the default path; if missing, return defaults.
pub fn load() -> Result<Config> {
    let path = default_path()?;
    load_from_path(path)
}

/// Load config from a given path; if missing or empty, return defaults.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let contents = fs::read_to_string(path)?;
    if contents.trim().is_empty() {
        return Ok(Config::default());
    }
    let cfg: Config = toml::from_str(&contents)?;
    Ok(cfg)
}

/// Resolve the default config path (platform aware).
pub fn default_path() -> Result<PathBuf> {
    let base = config_dir().ok_or_else(|| color_eyre::eyre::eyre!("no config dir available"))?;
    Ok(base.join("authinfo").join("config.toml"))
}

/// Write the given config unless a file already exists at `path`.
pub fn write_if_missing(config: &Config, path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let body = toml::to_string_pretty(config)?;
    fs::write(path, body)?;
    Ok(path.to_path_buf())
}

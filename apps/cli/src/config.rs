//! CLI configuration.
//!
//! Stored as TOML:
//! - Linux: `~/.config/vodup/config.toml`
//! - Windows: `%APPDATA%/vodup/config.toml`
//!
//! `VODUP_TOKEN` in the environment overrides the stored token.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use vodup_client::ClientConfig;
use vodup_uploader::UploaderConfig;

pub const TOKEN_ENV: &str = "VODUP_TOKEN";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// `[client]`: project, region, token and endpoint overrides.
    #[serde(default)]
    pub client: ClientConfig,

    /// `[upload]`: chunk size and asset metadata.
    #[serde(default)]
    pub upload: UploaderConfig,
}

impl Config {
    /// Loads `path`, or the platform default when `None`.
    ///
    /// A missing default file is created with defaults. A missing explicit
    /// path is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(path) => Self::read(path)?,
            None => {
                let path = config_path();
                if path.exists() {
                    Self::read(&path)?
                } else {
                    let config = Config::default();
                    config.save(&path)?;
                    config
                }
            }
        };
        config.apply_token_override(std::env::var(TOKEN_ENV).ok());
        Ok(config)
    }

    fn read(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("reading {}: {e}", path.display()))?;
        Ok(toml::from_str(&content)?)
    }

    /// Writes the configuration to `path`, readable by the owner only.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;

        // The file holds the auth token.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
        }

        tracing::debug!(path = %path.display(), "configuration saved");
        Ok(())
    }

    fn apply_token_override(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.client.token = token;
        }
    }

    /// Overrides the chunk size when given, in MiB.
    pub fn apply_chunk_size_mib(&mut self, mib: Option<u64>) {
        if let Some(mib) = mib.filter(|&m| m > 0) {
            self.upload.chunk_size = mib.saturating_mul(1024 * 1024);
        }
    }
}

/// Returns the platform-specific configuration file path.
pub fn config_path() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        PathBuf::from(home)
            .join(".config")
            .join("vodup")
            .join("config.toml")
    }

    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        PathBuf::from(appdata).join("vodup").join("config.toml")
    }

    #[cfg(not(any(target_os = "linux", target_os = "windows")))]
    {
        PathBuf::from("/tmp/vodup/config.toml")
    }
}

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dirs_next::config_dir;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{PortalError, Result};

pub const DEFAULT_BASE_URL: &str = "https://careon-r10p.onrender.com";
pub const CONFIG_ENV: &str = "CAREON_CONFIG";
pub const BASE_URL_ENV: &str = "CAREON_API_BASE_URL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub base_url: String,
    /// Unset means the client never gives up on a request by itself.
    pub timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: None,
            user_agent: format!("careon/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl PortalConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).map_err(|e| PortalError::Config(e.to_string()))
    }

    pub fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .map_err(|e| PortalError::Config(format!("reading {}: {}", path.display(), e)))?;
        toml::from_str(&text)
            .map_err(|e| PortalError::Config(format!("parsing {}: {}", path.display(), e)))
    }

    /// Explicit path, then `$CAREON_CONFIG`, then the per-user file if present.
    /// `$CAREON_API_BASE_URL` overrides the base URL last.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from))
            .or_else(|| default_config_path().filter(|path| path.exists()));
        let mut config = match path {
            Some(path) => {
                debug!("loading portal config from {}", path.display());
                Self::read(&path)?
            }
            None => Self::default(),
        };
        if let Ok(url) = env::var(BASE_URL_ENV) {
            if !url.trim().is_empty() {
                config.base_url = url;
            }
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("careon/portal.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn partial_files_fall_back_to_defaults() {
        let config = PortalConfig::from_toml("timeout_secs = 20\n").unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, Some(20));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portal.toml");
        fs::write(&path, "base_url = \"http://localhost:8000\"\n").unwrap();
        let config = PortalConfig::read(&path).unwrap();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, None);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("portal.toml");
        fs::write(&path, "base_url = [").unwrap();
        assert!(matches!(
            PortalConfig::read(&path),
            Err(PortalError::Config(_))
        ));
    }
}

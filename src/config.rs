//! Application configuration: a JSON file under the user's config directory,
//! overlaid by `NEXTCLOUD_*` environment variables.

use cloudnav_dav::{DavConfig, DavError, DavResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Filter used when neither the file nor `RUST_LOG` sets one.
pub const DEFAULT_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppConfig {
    pub dav: DavConfig,
    /// `tracing-subscriber` filter directive, e.g. `cloudnav=debug`.
    pub log_filter: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dav: DavConfig::default(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/cloudnav/config.json`, when the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("cloudnav").join("config.json"))
    }

    /// Read a JSON config file. Missing fields keep their defaults.
    pub fn load(path: &Path) -> DavResult<Self> {
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            DavError::invalid_config(format!("{}: {}", path.display(), e))
        })
    }

    /// Write the config as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> DavResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| DavError::internal(format!("serialize config: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load `path` if it exists (defaults otherwise), then apply the
    /// environment and validate.
    pub fn resolve(path: Option<&Path>) -> DavResult<Self> {
        let mut cfg = match path {
            Some(p) if p.exists() => Self::load(p)?,
            _ => Self::default(),
        };
        cfg.dav.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// [`resolve`](Self::resolve) against [`default_path`](Self::default_path).
    pub fn resolve_default() -> DavResult<Self> {
        Self::resolve(Self::default_path().as_deref())
    }

    pub fn validate(&self) -> DavResult<()> {
        self.dav.validate()
    }
}

// ──────────────────────────────────────────────────────────────────────────────
// cloudnav-dav · config
// ──────────────────────────────────────────────────────────────────────────────
// Connection settings for a WebDAV store: base URL, credentials, storage root
// and request timeout, loadable from `NEXTCLOUD_*` environment variables.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::{DavError, DavResult};
use crate::paths::canonical_path;
use serde::{Deserialize, Serialize};

pub const ENV_BASE_URL: &str = "NEXTCLOUD_BASE_URL";
pub const ENV_USER: &str = "NEXTCLOUD_USER";
pub const ENV_APP_PASSWORD: &str = "NEXTCLOUD_APP_PASSWORD";
pub const ENV_WEBDAV_PATH: &str = "NEXTCLOUD_WEBDAV_PATH";
pub const ENV_TIMEOUT_SECS: &str = "NEXTCLOUD_TIMEOUT_SECS";

pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How to reach and authenticate against the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DavConfig {
    /// Server root, e.g. `https://cloud.example.com`.
    pub base_url: String,
    pub username: String,
    pub app_password: String,
    /// Takes priority over basic auth when set.
    pub bearer_token: Option<String>,
    /// Storage root on the server. Empty means `/remote.php/dav/files/<username>`.
    pub webdav_path: String,
    /// Per-request timeout; 0 disables it.
    pub timeout_secs: u64,
}

impl Default for DavConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            username: String::new(),
            app_password: String::new(),
            bearer_token: None,
            webdav_path: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl DavConfig {
    pub fn new(base_url: &str, username: &str, app_password: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            username: username.to_string(),
            app_password: app_password.to_string(),
            ..Default::default()
        }
    }

    /// Read every `NEXTCLOUD_*` variable; unset ones keep their defaults.
    pub fn from_env() -> DavResult<Self> {
        let mut cfg = Self::default();
        cfg.apply_env()?;
        Ok(cfg)
    }

    /// Overlay whichever `NEXTCLOUD_*` variables are set onto `self`.
    pub fn apply_env(&mut self) -> DavResult<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay values from an arbitrary lookup (environment, test maps).
    pub fn apply_vars<F>(&mut self, lookup: F) -> DavResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_BASE_URL) {
            self.base_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Some(v) = get(ENV_USER) {
            self.username = v.trim().to_string();
        }
        if let Some(v) = get(ENV_APP_PASSWORD) {
            self.app_password = v;
        }
        if let Some(v) = get(ENV_WEBDAV_PATH) {
            self.webdav_path = v.trim().to_string();
        }
        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            self.timeout_secs = v.trim().parse().map_err(|_| {
                DavError::invalid_config(format!("{} must be a number of seconds, got {:?}", ENV_TIMEOUT_SECS, v))
            })?;
        }
        Ok(())
    }

    /// Canonical storage root, defaulted from the username when unset.
    pub fn storage_root(&self) -> String {
        if self.webdav_path.trim().is_empty() {
            canonical_path(&format!("/remote.php/dav/files/{}", self.username))
        } else {
            canonical_path(&self.webdav_path)
        }
    }

    pub fn uses_bearer(&self) -> bool {
        self.bearer_token.as_deref().map(|t| !t.is_empty()).unwrap_or(false)
    }

    /// Credential suitable for log lines.
    pub fn masked_credential(&self) -> String {
        let secret = if self.uses_bearer() {
            self.bearer_token.as_deref().unwrap_or("")
        } else {
            self.app_password.as_str()
        };
        if secret.chars().count() <= 4 {
            return "****".to_string();
        }
        let head: String = secret.chars().take(4).collect();
        format!("{}****", head)
    }

    pub fn validate(&self) -> DavResult<()> {
        if self.base_url.trim().is_empty() {
            return Err(DavError::invalid_config("base URL is not set"));
        }
        let parsed = url::Url::parse(&self.base_url)
            .map_err(|e| DavError::invalid_config(format!("invalid base URL {:?}: {}", self.base_url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(DavError::invalid_config(format!(
                "base URL must be http or https, got {}",
                parsed.scheme()
            )));
        }
        if self.uses_bearer() {
            return Ok(());
        }
        if self.username.trim().is_empty() {
            return Err(DavError::invalid_config("username is not set"));
        }
        if self.app_password.is_empty() {
            return Err(DavError::invalid_config("app password is not set"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DavErrorKind;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn storage_root_defaults_from_username() {
        let cfg = DavConfig::new("https://cloud.test/", "alice", "secret");
        assert_eq!(cfg.base_url, "https://cloud.test");
        assert_eq!(cfg.storage_root(), "/remote.php/dav/files/alice");

        let mut cfg = cfg;
        cfg.webdav_path = "remote.php/dav/files/admus/".into();
        assert_eq!(cfg.storage_root(), "/remote.php/dav/files/admus");
    }

    #[test]
    fn apply_vars_overlays_set_values() {
        let env = vars(&[
            (ENV_BASE_URL, "https://cloud.test/"),
            (ENV_USER, "bob"),
            (ENV_APP_PASSWORD, "pw-123456"),
            (ENV_TIMEOUT_SECS, "15"),
            (ENV_WEBDAV_PATH, ""),
        ]);
        let mut cfg = DavConfig::default();
        cfg.webdav_path = "/custom".into();
        cfg.apply_vars(|k| env.get(k).cloned()).unwrap();
        assert_eq!(cfg.base_url, "https://cloud.test");
        assert_eq!(cfg.username, "bob");
        assert_eq!(cfg.timeout_secs, 15);
        assert_eq!(cfg.webdav_path, "/custom");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn apply_vars_rejects_bad_timeout() {
        let env = vars(&[(ENV_TIMEOUT_SECS, "soon")]);
        let err = DavConfig::default().apply_vars(|k| env.get(k).cloned()).unwrap_err();
        assert!(err.is(DavErrorKind::InvalidConfig));
    }

    #[test]
    fn validate_rejects_incomplete_configs() {
        assert!(DavConfig::default().validate().is_err());
        assert!(DavConfig::new("ftp://cloud.test", "a", "b").validate().is_err());
        assert!(DavConfig::new("not a url", "a", "b").validate().is_err());
        assert!(DavConfig::new("https://cloud.test", "", "b").validate().is_err());
        assert!(DavConfig::new("https://cloud.test", "a", "").validate().is_err());

        let mut bearer = DavConfig::new("https://cloud.test", "", "");
        bearer.bearer_token = Some("tok".into());
        assert!(bearer.validate().is_ok());
    }

    #[test]
    fn masked_credential_hides_secret() {
        assert_eq!(DavConfig::new("https://x", "u", "abc").masked_credential(), "****");
        assert_eq!(
            DavConfig::new("https://x", "u", "abcdefgh").masked_credential(),
            "abcd****"
        );
    }

    #[test]
    fn deserializes_with_defaults() {
        let cfg: DavConfig =
            serde_json::from_str(r#"{"baseUrl":"https://cloud.test","username":"carol"}"#).unwrap();
        assert_eq!(cfg.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cfg.bearer_token, None);
        assert_eq!(cfg.storage_root(), "/remote.php/dav/files/carol");
    }
}

// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::path::{Path, PathBuf};

use davgate_dav::{AuthMethod, DavConfig};

use crate::error::ConfigError;

/// The name of the application, used for state and config directories.
pub const APP_NAME: &str = "davgate";

const ENV_BASE_URL: &str = "DAVGATE_BASE_URL";
const ENV_USERNAME: &str = "DAVGATE_USERNAME";
const ENV_PASSWORD: &str = "DAVGATE_PASSWORD";
const ENV_AUDIT_LOG: &str = "DAVGATE_AUDIT_LOG";

/// Configuration for the gateway.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct Config {
    /// DAV server connection.
    #[serde(default)]
    pub dav: DavConfig,

    /// Audit log location; defaults to `<state dir>/davgate/audit.log`.
    #[serde(default)]
    pub audit_log: Option<PathBuf>,
}

impl Config {
    /// Applies `DAVGATE_*` overrides from the process environment.
    pub fn apply_env_vars(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Applies `DAVGATE_*` overrides read through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key| lookup(key).filter(|v: &String| !v.is_empty());

        if let Some(url) = lookup(ENV_BASE_URL) {
            tracing::debug!(%url, "base url from environment");
            self.dav.base_url = url;
        }
        if let Some(username) = lookup(ENV_USERNAME) {
            tracing::debug!(%username, "credentials from environment");
            self.dav.auth = AuthMethod::Basic {
                username,
                password: lookup(ENV_PASSWORD).unwrap_or_default(),
            };
        }
        if let Some(path) = lookup(ENV_AUDIT_LOG) {
            self.audit_log = Some(PathBuf::from(path));
        }
    }

    /// Validates the configuration and fills in derived defaults.
    ///
    /// Collection homes default to the Nextcloud layout for the configured
    /// user, and the audit log defaults to the user's state directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is missing or a path cannot be
    /// expanded.
    pub fn normalize(&mut self) -> Result<(), ConfigError> {
        if self.dav.base_url.trim().is_empty() {
            return Err(ConfigError::MissingBaseUrl);
        }

        if let AuthMethod::Basic { username, .. } = &self.dav.auth {
            if self.dav.addressbook_home.is_empty() {
                self.dav.addressbook_home = format!("/remote.php/dav/addressbooks/users/{username}/");
            }
            if self.dav.calendar_home.is_empty() {
                self.dav.calendar_home = format!("/remote.php/dav/calendars/{username}/");
            }
        }

        self.audit_log = Some(match &self.audit_log {
            Some(path) => expand_path(path)?,
            None => default_audit_log()?,
        });
        Ok(())
    }

    /// Audit log location after [`Config::normalize`].
    #[must_use]
    pub fn audit_log_path(&self) -> PathBuf {
        self.audit_log
            .clone()
            .unwrap_or_else(|| PathBuf::from("audit.log"))
    }
}

fn default_audit_log() -> Result<PathBuf, ConfigError> {
    dirs::state_dir()
        .or_else(dirs::data_local_dir)
        .map(|dir| dir.join(APP_NAME).join("audit.log"))
        .ok_or_else(|| ConfigError::Path {
            path: "<state dir>".to_string(),
            reason: "user-specific state directory not found".to_string(),
        })
}

/// Handle tilde (~) and `$HOME` in the path
fn expand_path(path: &Path) -> Result<PathBuf, ConfigError> {
    if path.is_absolute() {
        return Ok(path.to_owned());
    }

    let text = path.to_str().ok_or_else(|| ConfigError::Path {
        path: path.display().to_string(),
        reason: "not valid UTF-8".to_string(),
    })?;

    let home_prefixes: &[&str] = if cfg!(unix) {
        &["~/", "$HOME/", "${HOME}/"]
    } else {
        &[r"~\", "~/", r"%UserProfile%\", r"%UserProfile%/"]
    };
    for prefix in home_prefixes {
        if let Some(stripped) = text.strip_prefix(prefix) {
            let home = dirs::home_dir().ok_or_else(|| ConfigError::Path {
                path: text.to_string(),
                reason: "user-specific home directory not found".to_string(),
            })?;
            return Ok(home.join(stripped));
        }
    }

    Ok(path.to_owned())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn base() -> Config {
        Config {
            dav: DavConfig {
                base_url: "https://cloud.example.com".to_string(),
                ..Default::default()
            },
            audit_log: Some(PathBuf::from("/var/log/davgate/audit.log")),
        }
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("DAVGATE_BASE_URL", "https://other.example.com"),
            ("DAVGATE_USERNAME", "alice"),
            ("DAVGATE_PASSWORD", "secret"),
            ("DAVGATE_AUDIT_LOG", "/tmp/audit.jsonl"),
        ]
        .into_iter()
        .collect();

        let mut config = base();
        config.apply_env(|k| env.get(k).map(ToString::to_string));
        assert_eq!(config.dav.base_url, "https://other.example.com");
        assert!(matches!(
            &config.dav.auth,
            AuthMethod::Basic { username, password } if username == "alice" && password == "secret"
        ));
        assert_eq!(config.audit_log, Some(PathBuf::from("/tmp/audit.jsonl")));
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut config = base();
        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.dav.base_url, "https://cloud.example.com");
        assert!(matches!(config.dav.auth, AuthMethod::None));
    }

    #[test]
    fn normalize_derives_nextcloud_homes() {
        let mut config = base();
        config.dav.auth = AuthMethod::Basic {
            username: "alice".to_string(),
            password: "secret".to_string(),
        };
        config.normalize().unwrap();
        assert_eq!(
            config.dav.addressbook_home,
            "/remote.php/dav/addressbooks/users/alice/"
        );
        assert_eq!(config.dav.calendar_home, "/remote.php/dav/calendars/alice/");
        assert_eq!(
            config.audit_log_path(),
            PathBuf::from("/var/log/davgate/audit.log")
        );
    }

    #[test]
    fn normalize_requires_base_url() {
        let mut config = Config::default();
        assert!(matches!(config.normalize(), Err(ConfigError::MissingBaseUrl)));
    }

    #[test]
    fn expands_home_in_audit_path() {
        let Some(home) = dirs::home_dir() else { return };
        let path = expand_path(Path::new("~/logs/audit.log")).unwrap();
        assert_eq!(path, home.join("logs/audit.log"));

        let relative = expand_path(Path::new("logs/audit.log")).unwrap();
        assert_eq!(relative, PathBuf::from("logs/audit.log"));
    }

    #[test]
    fn deserializes_from_toml() {
        let config: Config = toml::from_str(
            r#"
audit_log = "~/davgate/audit.log"

[dav]
base_url = "https://cloud.example.com"
default_addressbook = "family"
timeout_secs = 5

[dav.auth]
type = "bearer"
token = "abc"
"#,
        )
        .unwrap();

        assert_eq!(config.dav.base_url, "https://cloud.example.com");
        assert_eq!(config.dav.default_addressbook, "family");
        assert_eq!(config.dav.default_calendar, "personal");
        assert_eq!(config.dav.timeout_secs, 5);
        assert!(matches!(config.dav.auth, AuthMethod::Bearer { ref token } if token == "abc"));
        assert_eq!(config.audit_log, Some(PathBuf::from("~/davgate/audit.log")));
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.dav.base_url.is_empty());
        assert!(config.audit_log.is_none());
    }
}

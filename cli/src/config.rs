// SPDX-FileCopyrightText: 2025-2026 Zexin Yuan <aim@yzx9.xyz>
//
// SPDX-License-Identifier: Apache-2.0

use std::{error::Error, path::PathBuf, str::FromStr};

use davgate_core::{APP_NAME, Config as CoreConfig};
use tokio::fs;

const DAVGATE_CONFIG_ENV: &str = "DAVGATE_CONFIG";

/// Loads the gateway configuration.
///
/// The file is taken from `--config`, then `$DAVGATE_CONFIG`, then the user
/// config directory. A missing default file is not an error: the
/// `DAVGATE_*` variables alone can configure the gateway. Environment
/// overrides are applied last.
#[tracing::instrument]
pub async fn parse_config(path: Option<PathBuf>) -> Result<CoreConfig, Box<dyn Error>> {
    let path = if let Some(path) = path {
        Some(path)
    } else if let Ok(env_path) = std::env::var(DAVGATE_CONFIG_ENV) {
        Some(PathBuf::from(env_path))
    } else {
        let config = get_config_dir()?.join(APP_NAME).join("config.toml");
        if config.exists() {
            Some(config)
        } else {
            tracing::debug!(path = %config.display(), "no config file, using environment only");
            None
        }
    };

    let mut config = match path {
        Some(path) => {
            fs::read_to_string(&path)
                .await
                .map_err(|e| format!("Failed to read config file at {}: {e}", path.display()))?
                .parse::<ConfigRaw>()?
                .core
        }
        None => CoreConfig::default(),
    };
    config.apply_env_vars();
    Ok(config)
}

#[derive(Debug, serde::Deserialize)]
struct ConfigRaw {
    #[serde(default)]
    core: CoreConfig,
}

impl FromStr for ConfigRaw {
    type Err = Box<dyn Error>;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(toml::from_str(s)?)
    }
}

fn get_config_dir() -> Result<PathBuf, Box<dyn Error>> {
    #[cfg(unix)]
    let config_dir = xdg::BaseDirectories::new().get_config_home();
    #[cfg(not(unix))]
    let config_dir = dirs::config_dir();
    config_dir.ok_or_else(|| "User-specific config directory not found".into())
}

//! # Viewer configuration
//!
//! TOML configuration stored under `<config_dir>/padview/config.toml`. Every
//! section falls back to its defaults field by field, so a partial file is valid.
//! A broken file never stops the viewer from starting: [`ViewerConfig::load_or_default`]
//! logs the problem and continues with [`ViewerConfig::default`].

use crate::acquisition::ContentFilter;
use crate::content::ImportMode;
use crate::controller::binding::DisconnectPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = "padview";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub controller: ControllerConfig,
    pub navigation: NavigationConfig,
    pub import: ImportConfig,
    pub ui: UIConfig,
}

/// Timing of the controller poll loop
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ControllerConfig {
    /// Nominal tick interval
    pub poll_interval_ms: u64,
    /// Lateness accepted before a tick is reported as delayed
    pub poll_tolerance_ms: u64,
    /// Minimum time between two accepted controller actions, 0 disables it
    pub debounce_ms: u64,
    pub disconnect_policy: DisconnectPolicy,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            poll_tolerance_ms: 10,
            debounce_ms: 500,
            disconnect_policy: DisconnectPolicy::default(),
        }
    }
}

impl ControllerConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn poll_tolerance(&self) -> Duration {
        Duration::from_millis(self.poll_tolerance_ms)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct NavigationConfig {
    pub zoom_factor: f32,
    pub pan_step: f32,
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            zoom_factor: 1.1,
            pan_step: 50.0,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ImportConfig {
    pub mode: ImportMode,
    pub filter: ContentFilter,
    pub allow_multiple: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            mode: ImportMode::Replace,
            filter: ContentFilter::All,
            allow_multiple: true,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct UIConfig {
    pub fullscreen: bool,
    /// Upper bound between two frames while idle
    pub repaint_ms: u64,
}

impl Default for UIConfig {
    fn default() -> Self {
        Self {
            fullscreen: false,
            repaint_ms: 33,
        }
    }
}

impl ViewerConfig {
    /// Location of the config file, `./padview/config.toml` if no config dir is known
    pub fn default_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config = toml::from_str(&content)?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(())
    }

    /// Writes the default configuration if no file exists yet
    pub async fn ensure_default_config(path: &Path) -> Result<(), ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;

        if !exists {
            info!("Creating default configuration at {}", path.display());
            Self::default().save(path).await?;
        }
        Ok(())
    }

    pub async fn load_or_default(path: &Path) -> Self {
        if let Err(e) = Self::ensure_default_config(path).await {
            warn!("Unable to write default configuration: {}", e);
        }

        match Self::load(path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Unable to load configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }
}

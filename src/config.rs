//! Service configuration.
//!
//! Settings live in an optional TOML file. A missing file or missing keys
//! fall back to defaults: the artifact at `model/model.json` under the
//! deployment root and `[14, 25]` for every band.
//!
//! The deployment root is `$STARCLASS_HOME` when set, otherwise the directory
//! holding the running executable, so the default artifact does not depend on
//! the working directory.
//!
//! ```toml
//! model_path = "model/model.json"
//!
//! [bounds.z]
//! low = 14.0
//! high = 24.5
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::classifier::artifact::DEFAULT_MODEL_PATH;
use crate::data::validate::MagnitudeBounds;

/// Default configuration file name, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "starclass.toml";

/// Overrides the deployment root.
pub const HOME_ENV: &str = "STARCLASS_HOME";

/// Errors that may occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The file is not valid TOML for [`ServiceConfig`].
    #[error("Invalid config in {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// A band interval is empty or non-finite.
    #[error("Invalid magnitude bounds: {0}")]
    InvalidBounds(String),
}

// ---------------------------------------------------------------------------
// Deployment root
// ---------------------------------------------------------------------------

/// Directory the default artifact path is anchored to.
pub fn deployment_root() -> PathBuf {
    resolve_deployment_root(
        std::env::var_os(HOME_ENV).map(PathBuf::from),
        std::env::current_exe().ok(),
        std::env::current_dir().ok(),
    )
}

/// Pick the root from, in order: an explicit home, the executable's
/// directory, the working directory.
pub fn resolve_deployment_root(
    home: Option<PathBuf>,
    exe: Option<PathBuf>,
    cwd: Option<PathBuf>,
) -> PathBuf {
    home.filter(|h| !h.as_os_str().is_empty())
        .or_else(|| exe.and_then(|e| e.parent().map(Path::to_path_buf)))
        .or(cwd)
        .unwrap_or_else(|| PathBuf::from("."))
}

// ---------------------------------------------------------------------------
// ServiceConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Artifact location. Defaults to `model/model.json` under
    /// [`deployment_root`]; relative paths in a config file are resolved
    /// against the file's directory.
    pub model_path: PathBuf,
    /// Validation gate ranges.
    pub bounds: MagnitudeBounds,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: deployment_root().join(DEFAULT_MODEL_PATH),
            bounds: MagnitudeBounds::default(),
        }
    }
}

impl ServiceConfig {
    pub fn with_model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.model_path = path.into();
        self
    }

    pub fn check(&self) -> Result<(), ConfigError> {
        match self.bounds.first_malformed() {
            Some((band, interval)) => Err(ConfigError::InvalidBounds(format!(
                "{band} has [{}, {}]",
                interval.low, interval.high
            ))),
            None => Ok(()),
        }
    }
}

/// Load configuration from `path`, returning defaults if the file is missing.
pub fn load_or_default(path: &Path) -> Result<ServiceConfig, ConfigError> {
    if !path.exists() {
        log::debug!("no config at {}, using defaults", path.display());
        return Ok(ServiceConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut config: ServiceConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    if config.model_path.is_relative() {
        if let Some(dir) = path.parent() {
            config.model_path = dir.join(&config.model_path);
        }
    }
    config.check()?;
    Ok(config)
}

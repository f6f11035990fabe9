//! Handle configuration files
//!
//! A TOML document naming the model and the configuration parameters to
//! apply to a fresh handle:
//!
//! ```toml
//! model = 1
//!
//! [conf]
//! rot_pathname = "/dev/ttyUSB0"
//! serial_speed = 9600
//! mcfg = "DX"
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rot_core::{RotModel, RotResult};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::manager::{RotId, RotManager};

/// Failure to load a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Model selection plus parameter values for one handle
#[derive(Debug, Clone, Deserialize)]
pub struct RotatorConfig {
    pub model: RotModel,
    /// Parameter name to value; non-string values are stringified
    #[serde(default)]
    pub conf: BTreeMap<String, toml::Value>,
}

impl RotatorConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parameters in name order, values in `set_conf` string form
    pub fn entries(&self) -> impl Iterator<Item = (&str, String)> + '_ {
        self.conf.iter().map(|(name, value)| {
            let value = match value {
                toml::Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.as_str(), value)
        })
    }
}

impl RotManager {
    /// Apply every parameter of `cfg` to a handle.
    ///
    /// Names are resolved like [`RotManager::token_lookup`]; the first
    /// unknown name or rejected value aborts, leaving earlier values set.
    pub fn apply_config(&mut self, id: RotId, cfg: &RotatorConfig) -> RotResult<()> {
        for (name, value) in cfg.entries() {
            let token = self.token_lookup(id, name)?;
            debug!(%id, name, value = %value, "Applying configuration");
            self.set_conf(id, token, &value)?;
        }
        info!(%id, params = cfg.conf.len(), "Configuration applied");
        Ok(())
    }
}

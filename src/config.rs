//! Cursor configuration
//!
//! Defaults applied to every cursor a connection hands out. Loadable from
//! YAML or JSON so applications can keep driver settings next to the rest of
//! their configuration.

use crate::error::{Error, Result};
use crate::paramstyle::Paramstyle;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable overriding the configured paramstyle
pub const PARAMSTYLE_ENV: &str = "REDSHIFT_PARAMSTYLE";

/// Settings a new cursor starts with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorConfig {
    /// Placeholder convention for statements passed to `execute`
    #[serde(default)]
    pub paramstyle: Paramstyle,

    /// Default row count for `fetchmany`
    #[serde(default = "default_arraysize")]
    pub arraysize: usize,
}

fn default_arraysize() -> usize {
    1
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            paramstyle: Paramstyle::default(),
            arraysize: default_arraysize(),
        }
    }
}

impl CursorConfig {
    /// Parse a YAML document
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: CursorConfig = serde_yaml::from_str(yaml)
            .map_err(|e| Error::config(format!("Failed to parse cursor config YAML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a JSON document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: CursorConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file; `.json` files are read as JSON, anything else as YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Failed to read cursor config '{}': {}",
                path.display(),
                e
            ))
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&content),
            _ => Self::from_yaml_str(&content),
        }
    }

    /// Apply `REDSHIFT_PARAMSTYLE` if it is set
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_paramstyle_override(std::env::var(PARAMSTYLE_ENV).ok().as_deref())
    }

    fn with_paramstyle_override(mut self, value: Option<&str>) -> Result<Self> {
        if let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) {
            self.paramstyle = value.parse()?;
            tracing::debug!("Paramstyle overridden from {}: {}", PARAMSTYLE_ENV, self.paramstyle);
        }
        Ok(self)
    }

    /// Check values serde cannot
    pub fn validate(&self) -> Result<()> {
        if self.arraysize < 1 {
            return Err(Error::config("arraysize must be at least 1"));
        }
        Ok(())
    }
}

//! Configuration loading from enumgen.toml.

use serde::Deserialize;
use std::{fs, path::Path};

use crate::error::{EnumgenError, EnumgenResult, IoResultExt};

/// Main configuration structure for enumgen.toml.
#[derive(Debug, Deserialize, Default)]
pub struct EnumgenConfig {
    /// Enum names or patterns to skip even when opted in.
    pub ignore: Option<Vec<String>>,
    /// Whether to keep the cross-pass description cache (default true).
    pub cache: Option<bool>,
    /// Output configuration.
    pub output: Option<OutputConfig>,
}

/// Output configuration.
#[derive(Debug, Deserialize, Default)]
pub struct OutputConfig {
    /// Directory generated units are written to, relative to the project root.
    pub dir: Option<String>,
    /// Report format: "plain" or "json".
    pub format: Option<String>,
}

/// Loads configuration from enumgen.toml if it exists.
pub fn load_config(root: &Path) -> EnumgenResult<Option<EnumgenConfig>> {
    let path = root.join("enumgen.toml");
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(&path).with_path(&path)?;
    let cfg =
        toml::from_str(&content).map_err(|e| EnumgenError::config(&path, e.to_string()))?;
    Ok(Some(cfg))
}

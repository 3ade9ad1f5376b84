// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Application settings.
//!
//! Settings come from an optional YAML file; anything the file leaves out
//! keeps its default. The storage directory can also be overridden through
//! the `SCALEPLAN_STORAGE_DIR` environment variable.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding [`Config::storage_dir`].
pub const STORAGE_DIR_ENV: &str = "SCALEPLAN_STORAGE_DIR";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding the saved project.
    pub storage_dir: PathBuf,
    /// Canvas size used to place new objects and fit images.
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub default_shape_width_m: f64,
    pub default_shape_height_m: f64,
    pub default_shape_color: String,
    pub default_line_width: f64,
    pub default_line_color: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(".scaleplan"),
            canvas_width: 1280.0,
            canvas_height: 720.0,
            default_shape_width_m: 2.0,
            default_shape_height_m: 2.0,
            default_shape_color: "rgba(52, 152, 219, 0.6)".to_string(),
            default_line_width: 3.0,
            default_line_color: "#e74c3c".to_string(),
        }
    }
}

impl Config {
    /// Load settings from `path` (or defaults), then apply the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let yaml = std::fs::read_to_string(path)
                    .with_context(|| format!("could not read config {}", path.display()))?;
                Self::from_yaml(&yaml).with_context(|| format!("invalid config {}", path.display()))?
            }
            None => Self::default(),
        };

        if let Some(dir) = std::env::var_os(STORAGE_DIR_ENV) {
            config.storage_dir = PathBuf::from(dir);
        }

        log::debug!("Using config: {:?}", config);
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

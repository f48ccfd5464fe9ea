// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! RHI configuration via `foundry.yaml`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::services::{FileManager, StdFileManager};
use crate::{Result, RhiBackend, RhiError};

/// Runtime configuration for RHI construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RhiConfig {
    /// Explicit backend. `None` defers to [`RhiBackend::resolve`].
    pub backend: Option<RhiBackend>,

    /// Probe and use optional driver extensions. `false` runs core-profile only.
    pub use_extensions: bool,

    /// Forward driver debug output into the log.
    pub debug_output: bool,

    /// Emulate per-draw base instance through a uniform when the driver lacks it.
    pub emulate_draw_id: bool,

    /// Uniform receiving the start instance on the emulation path.
    pub draw_id_uniform: String,

    /// Load this library instead of the platform probe list.
    pub library_path: Option<PathBuf>,

    /// Raise the minimum accepted API version (never lowers the backend floor).
    pub minimum_version: Option<(u32, u32)>,
}

impl Default for RhiConfig {
    fn default() -> Self {
        Self {
            backend: None,
            use_extensions: true,
            debug_output: false,
            emulate_draw_id: true,
            draw_id_uniform: "drawIdUniform".to_string(),
            library_path: None,
            minimum_version: None,
        }
    }
}

impl RhiConfig {
    /// Configuration file name.
    pub const FILE_NAME: &'static str = "foundry.yaml";

    /// Backend after applying the explicit → environment → platform chain.
    pub fn resolved_backend(&self) -> RhiBackend {
        RhiBackend::resolve(self.backend)
    }

    /// Load configuration from a directory. Returns error if the file is
    /// missing or cannot be parsed.
    pub fn load(dir: &Path) -> Result<Self> {
        Self::load_with(&StdFileManager, dir)
    }

    /// Same as [`RhiConfig::load`], reading through the given file manager.
    pub fn load_with(files: &dyn FileManager, dir: &Path) -> Result<Self> {
        let config_path = dir.join(Self::FILE_NAME);

        let content = files.read_to_string(&config_path).map_err(|e| {
            RhiError::Configuration(format!("Failed to read {}: {}", config_path.display(), e))
        })?;

        let config = Self::parse(&content).map_err(|e| {
            RhiError::Configuration(format!("Failed to parse {}: {}", config_path.display(), e))
        })?;

        tracing::info!("Loaded RHI config from {}", config_path.display());
        Ok(config)
    }

    /// Load configuration from a directory, returning defaults if the file is
    /// missing or unparseable.
    pub fn load_or_default(dir: &Path) -> Self {
        let config_path = dir.join(Self::FILE_NAME);

        if !StdFileManager.does_file_exist(&config_path) {
            tracing::debug!(
                "No {} found in {}, using defaults",
                Self::FILE_NAME,
                dir.display()
            );
            return Self::default();
        }

        match Self::load(dir) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("{}, using defaults", e);
                Self::default()
            }
        }
    }

    fn parse(content: &str) -> std::result::Result<Self, String> {
        let config: Self = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        if config.draw_id_uniform.is_empty() {
            return Err("draw_id_uniform must not be empty".to_string());
        }
        Ok(config)
    }
}
